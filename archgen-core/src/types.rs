//! Data models shared by the analysis stages and the diagram synthesizers.
//!
//! Every record is built once by its producing stage and then only read.
//! Lists default to empty rather than absent so consumers never need to
//! distinguish "missing" from "empty".

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Project configuration
// ============================================================================

/// Fallback labels used when the project files do not say otherwise.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectDefaults {
    pub name: String,
    pub hosting: String,
    pub repository: String,
    pub framework: String,
    pub build_tool: String,
}

impl Default for ProjectDefaults {
    fn default() -> Self {
        Self {
            name: "website".to_string(),
            hosting: "Static Hosting".to_string(),
            repository: "Git Repository".to_string(),
            framework: "Astro".to_string(),
            build_tool: "Vite".to_string(),
        }
    }
}

/// Optional CI features detected in the CI workflow.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiFeatures {
    pub lighthouse: bool,
    pub tests: bool,
    pub build_verification: bool,
    pub docs_deployment: bool,
}

/// CI/CD facts scraped from the workflow files.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CiCdConfig {
    pub platform: String,
    pub workflows: Vec<String>,
    pub deploy_target: String,
    pub build_command: String,
    pub output_dir: String,
    pub triggers: Vec<String>,
    pub features: CiFeatures,
    pub environment: String,
    pub project_name: String,
}

impl CiCdConfig {
    /// Whether any workflow file was found and parsed.
    pub fn has_workflows(&self) -> bool {
        !self.workflows.is_empty()
    }
}

/// Flat description of the project, built once per run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    pub site_url: String,
    pub hosting: String,
    pub repository: String,
    /// Runtime and build-time dependencies merged, name to version.
    pub dependencies: BTreeMap<String, String>,
    pub integrations: Vec<String>,
    pub build_tool: String,
    pub framework: String,
    pub ci: CiCdConfig,
}

impl ProjectConfig {
    /// A config holding only the fallback labels.
    pub fn with_defaults(defaults: &ProjectDefaults) -> Self {
        Self {
            name: defaults.name.clone(),
            hosting: defaults.hosting.clone(),
            repository: defaults.repository.clone(),
            framework: defaults.framework.clone(),
            build_tool: defaults.build_tool.clone(),
            ..Default::default()
        }
    }

    /// Check whether a dependency is declared in either dependency table.
    pub fn has_dependency(&self, name: &str) -> bool {
        self.dependencies.contains_key(name)
    }
}

// ============================================================================
// Component structure and routes
// ============================================================================

/// Source subdirectories that the structure analyzer knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Pages,
    Components,
    Layouts,
    Services,
    Utils,
    Data,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Category; 6] = [
        Category::Pages,
        Category::Components,
        Category::Layouts,
        Category::Services,
        Category::Utils,
        Category::Data,
    ];

    /// Directory name under the source root.
    pub fn dir_name(self) -> &'static str {
        match self {
            Category::Pages => "pages",
            Category::Components => "components",
            Category::Layouts => "layouts",
            Category::Services => "services",
            Category::Utils => "utils",
            Category::Data => "data",
        }
    }

    /// Human-readable title used in diagrams.
    pub fn title(self) -> &'static str {
        match self {
            Category::Pages => "Pages",
            Category::Components => "Components",
            Category::Layouts => "Layouts",
            Category::Services => "Services",
            Category::Utils => "Utilities",
            Category::Data => "Data",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// One discovered source file within a category.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentEntry {
    /// File name without extension.
    pub name: String,
    /// Path relative to the source root, `/`-separated.
    pub path: String,
    /// Type tag derived from the extension (`astro`, `react`, ...).
    pub kind: String,
}

/// Files bucketed by category. Every category is always present.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentStructure {
    pub categories: BTreeMap<Category, Vec<ComponentEntry>>,
}

impl Default for ComponentStructure {
    fn default() -> Self {
        Self {
            categories: Category::ALL.iter().map(|c| (*c, Vec::new())).collect(),
        }
    }
}

impl ComponentStructure {
    /// Entries of one category, empty when nothing was found.
    pub fn get(&self, category: Category) -> &[ComponentEntry] {
        self.categories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has(&self, category: Category) -> bool {
        !self.get(category).is_empty()
    }

    /// Replace the entries of one category.
    pub fn set(&mut self, category: Category, entries: Vec<ComponentEntry>) {
        self.categories.insert(category, entries);
    }

    /// Total number of entries across all categories.
    pub fn total(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }
}

/// A page file and the URL path it serves.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub file: String,
    pub path: String,
}

// ============================================================================
// Code structure
// ============================================================================

/// Member visibility as declared in source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl Visibility {
    /// UML visibility marker.
    pub fn symbol(self) -> char {
        match self {
            Visibility::Public => '+',
            Visibility::Protected => '#',
            Visibility::Private => '-',
        }
    }
}

/// A method parameter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterInfo {
    pub name: String,
    /// Absent when the type is `any` or cannot be determined.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_text: Option<String>,
    pub optional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedMethod {
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_async: bool,
    pub parameters: Vec<ParameterInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedProperty {
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_readonly: bool,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_text: Option<String>,
}

/// A named class declaration with its non-private members.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedClass {
    pub name: String,
    pub is_exported: bool,
    pub is_abstract: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    pub implements: Vec<String>,
    pub methods: Vec<ExtractedMethod>,
    pub properties: Vec<ExtractedProperty>,
    pub file_path: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceProperty {
    pub name: String,
    #[serde(rename = "type")]
    pub type_text: String,
    pub optional: bool,
    pub readonly: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceMethod {
    pub name: String,
    pub parameters: Vec<ParameterInfo>,
    pub return_type: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedInterface {
    pub name: String,
    pub is_exported: bool,
    pub extends: Vec<String>,
    pub properties: Vec<InterfaceProperty>,
    pub methods: Vec<InterfaceMethod>,
    pub file_path: String,
}

/// An import declaration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedImport {
    /// Module specifier, e.g. `./ThemeStorage`.
    pub source: String,
    /// Named imports, then the default binding, then `* as ns`.
    pub imported_names: Vec<String>,
    pub is_type_only: bool,
}

/// Everything extracted from one source file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileExtraction {
    pub file_path: String,
    pub classes: Vec<ExtractedClass>,
    pub interfaces: Vec<ExtractedInterface>,
    pub imports: Vec<ExtractedImport>,
}

impl FileExtraction {
    /// An extraction with no declarations, used when a file fails.
    pub fn empty(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            ..Default::default()
        }
    }

    /// Re-label the record and its declarations, e.g. to a project-relative path.
    pub fn with_path(mut self, file_path: &str) -> Self {
        self.file_path = file_path.to_string();
        for class in &mut self.classes {
            class.file_path = file_path.to_string();
        }
        for iface in &mut self.interfaces {
            iface.file_path = file_path.to_string();
        }
        self
    }
}

/// Extraction policy switches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractOptions {
    /// Keep `private` and `#private` members.
    pub include_private: bool,
    /// Keep unnamed classes, recorded as `(anonymous)`.
    pub include_anonymous: bool,
}
