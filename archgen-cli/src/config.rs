//! archgen configuration loading from `.archgenrc.toml`.
//!
//! Configuration is optional. Every section falls back to the values the
//! generator uses for a stock Astro project when the file or a key is
//! missing.
//!
//! # Example Configuration
//!
//! ```toml
//! [output]
//! dir = "docs/architecture"
//! format = "table"
//! color = true
//!
//! [source]
//! root = "src"
//! pages = "src/pages"
//!
//! [project]
//! name = "portfolio"
//! hosting = "Static Hosting"
//!
//! [extract]
//! include_private = false
//! dirs = ["src/services", "src/utils"]
//!
//! [madge]
//! enabled = true
//! command = "npx madge"
//!
//! [csp]
//! dist = "dist"
//! allowlist = ["'self'"]
//!
//! [lighthouse]
//! dir = ".lighthouseci"
//! document = "docs/features/performance.md"
//! ```

use std::path::{Path, PathBuf};

use archgen_core::csp::CspPolicy;
use archgen_core::depgraph::MadgeTool;
use archgen_core::lighthouse::LighthouseSettings;
use archgen_core::types::{ExtractOptions, ProjectDefaults};
use serde::Deserialize;

/// Name of the optional configuration file at the project root.
pub const CONFIG_FILE: &str = ".archgenrc.toml";

/// Root configuration structure loaded from `.archgenrc.toml`.
#[derive(Debug, Deserialize, Default)]
pub struct ArchgenConfig {
    /// Where artifacts go and how results are printed.
    #[serde(default)]
    pub output: OutputSettings,

    /// Source tree layout.
    #[serde(default)]
    pub source: SourceConfig,

    /// Labels used when the manifests do not say.
    #[serde(default)]
    pub project: ProjectDefaults,

    /// Code structure extraction.
    #[serde(default)]
    pub extract: ExtractConfig,

    /// Module dependency analysis tool.
    #[serde(default)]
    pub madge: MadgeConfig,

    /// Content-Security-Policy generation.
    #[serde(default)]
    pub csp: CspConfig,

    /// Lighthouse score maintenance.
    #[serde(default)]
    pub lighthouse: LighthouseSettings,
}

#[derive(Debug, Deserialize)]
pub struct OutputSettings {
    /// Artifact directory, relative to the project root.
    #[serde(default = "default_output_dir")]
    pub dir: String,

    /// Default output format ("table" or "json").
    #[serde(default)]
    pub format: Option<String>,

    /// Force color on or off.
    #[serde(default)]
    pub color: Option<bool>,
}

fn default_output_dir() -> String {
    "docs/architecture".to_string()
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            format: None,
            color: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SourceConfig {
    /// Source root holding the category directories.
    #[serde(default = "default_source_root")]
    pub root: String,

    /// Page directory, relative to the project root.
    #[serde(default = "default_pages_dir")]
    pub pages: String,
}

fn default_source_root() -> String {
    "src".to_string()
}

fn default_pages_dir() -> String {
    "src/pages".to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            root: default_source_root(),
            pages: default_pages_dir(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExtractConfig {
    #[serde(default)]
    pub include_private: bool,

    #[serde(default)]
    pub include_anonymous: bool,

    /// Directories searched for `.ts`/`.tsx` files by `archgen docs`.
    #[serde(default = "default_extract_dirs")]
    pub dirs: Vec<String>,
}

fn default_extract_dirs() -> Vec<String> {
    vec!["src".to_string()]
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            include_private: false,
            include_anonymous: false,
            dirs: default_extract_dirs(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MadgeConfig {
    /// Skip the dependency graph stage entirely.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub command: Option<String>,

    #[serde(default)]
    pub extensions: Option<String>,

    #[serde(default)]
    pub exclude: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for MadgeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: None,
            extensions: None,
            exclude: None,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct CspConfig {
    /// Build output directory, relative to the project root.
    #[serde(default)]
    pub dist: Option<String>,

    /// Leading `script-src` sources.
    #[serde(default)]
    pub allowlist: Option<Vec<String>>,

    /// Extra `sha256-...` hashes that are always allowed.
    #[serde(default)]
    pub hashes: Option<Vec<String>>,

    /// Directives after `script-src`.
    #[serde(default)]
    pub directives: Option<Vec<String>>,
}

impl ArchgenConfig {
    /// Load `.archgenrc.toml` from `root`, or defaults when it is missing
    /// or broken.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse {}: {}", CONFIG_FILE, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", CONFIG_FILE, e);
                }
            }
        }
        Self::default()
    }

    pub fn default_format(&self) -> Option<&str> {
        self.output.format.as_deref()
    }

    pub fn use_color(&self) -> Option<bool> {
        self.output.color
    }

    pub fn output_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.output.dir)
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            include_private: self.extract.include_private,
            include_anonymous: self.extract.include_anonymous,
        }
    }

    /// madge settings, running in `root`.
    pub fn madge_tool(&self, root: &Path) -> MadgeTool {
        let defaults = MadgeTool::default();
        MadgeTool {
            command: self.madge.command.clone().unwrap_or(defaults.command),
            extensions: self.madge.extensions.clone().unwrap_or(defaults.extensions),
            exclude: self.madge.exclude.clone().unwrap_or(defaults.exclude),
            cwd: root.to_path_buf(),
        }
    }

    pub fn csp_policy(&self) -> CspPolicy {
        let defaults = CspPolicy::default();
        CspPolicy {
            script_src: self.csp.allowlist.clone().unwrap_or(defaults.script_src),
            manual_hashes: self.csp.hashes.clone().unwrap_or(defaults.manual_hashes),
            directives: self.csp.directives.clone().unwrap_or(defaults.directives),
        }
    }

    pub fn csp_dist(&self) -> &str {
        self.csp.dist.as_deref().unwrap_or("dist")
    }
}
