//! C4-PlantUML diagrams for the context, container and component levels.
//!
//! Optional boxes are keyed off what the project analysis found. A box is
//! only ever referenced by a `Rel` line when it was declared in the same
//! diagram.

use std::fmt::Write;

use crate::types::{Category, ComponentEntry, ComponentStructure, ProjectConfig};

/// Most items listed per category in the component diagram.
pub const DISPLAY_CAP: usize = 5;

const C4_STDLIB: &str = "https://raw.githubusercontent.com/plantuml-stdlib/C4-PlantUML/master";

/// Relationships between categories: (from, to, label).
const CATEGORY_RELATIONS: &[(Category, Category, &str)] = &[
    (Category::Pages, Category::Layouts, "Wrapped by"),
    (Category::Pages, Category::Components, "Renders"),
    (Category::Layouts, Category::Components, "Composes"),
    (Category::Components, Category::Services, "Calls"),
    (Category::Components, Category::Utils, "Uses"),
    (Category::Services, Category::Utils, "Uses"),
    (Category::Pages, Category::Data, "Reads"),
    (Category::Components, Category::Data, "Reads"),
];

/// Accumulates PlantUML lines with the standard C4 preamble.
struct PumlWriter {
    out: String,
}

impl PumlWriter {
    fn new(library: &str, title: &str) -> Self {
        let mut out = String::new();
        let _ = writeln!(out, "@startuml");
        let _ = writeln!(out, "!include {}/{}.puml", C4_STDLIB, library);
        let _ = writeln!(out);
        let _ = writeln!(out, "LAYOUT_WITH_LEGEND()");
        let _ = writeln!(out);
        let _ = writeln!(out, "title {}", title);
        let _ = writeln!(out);
        Self { out }
    }

    fn line(&mut self, indent: usize, text: &str) {
        let _ = writeln!(self.out, "{}{}", "    ".repeat(indent), text);
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn finish(mut self) -> String {
        self.out.push_str("@enduml\n");
        self.out
    }
}

/// Quote a PlantUML macro argument.
fn q(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "'"))
}

fn element(kind: &str, alias: &str, args: &[&str]) -> String {
    let args: Vec<String> = args.iter().map(|a| q(a)).collect();
    format!("{}({}, {})", kind, alias, args.join(", "))
}

fn rel(from: &str, to: &str, label: &str, technology: &str) -> String {
    if technology.is_empty() {
        format!("Rel({}, {}, {})", from, to, q(label))
    } else {
        format!("Rel({}, {}, {}, {})", from, to, q(label), q(technology))
    }
}

/// Where the site is served from: the workflow's deploy target wins.
fn hosting_label(config: &ProjectConfig) -> &str {
    if config.ci.deploy_target.is_empty() {
        &config.hosting
    } else {
        &config.ci.deploy_target
    }
}

fn ci_label(config: &ProjectConfig) -> &str {
    if config.ci.platform.is_empty() {
        "CI/CD"
    } else {
        &config.ci.platform
    }
}

fn website_description(config: &ProjectConfig) -> String {
    let mut description = format!("Static website built with {}", config.framework);
    if !config.site_url.is_empty() {
        let _ = write!(description, ", served at {}", config.site_url);
    }
    description
}

/// Level 1: the site, its visitor and the external systems around it.
///
/// The visitor, the website and the hosting platform are always present.
/// CI/CD, Lighthouse and documentation-site boxes appear only when the
/// workflows show them.
pub fn system_context_diagram(config: &ProjectConfig) -> String {
    let features = &config.ci.features;
    let hosting = hosting_label(config);
    let mut w = PumlWriter::new(
        "C4_Context",
        &format!("System Context diagram for {}", config.name),
    );

    w.line(0, &element("Person", "user", &["Visitor", "A person visiting the website"]));
    w.blank();
    w.line(
        0,
        &element("System", "website", &[&config.name, &website_description(config)]),
    );
    w.blank();
    w.line(0, &element("System_Ext", "hosting", &[hosting, "Hosts the static website"]));
    if config.ci.has_workflows() {
        w.line(
            0,
            &element("System_Ext", "cicd", &[ci_label(config), "Builds, checks and deploys the site"]),
        );
    }
    if features.lighthouse {
        w.line(
            0,
            &element("System_Ext", "lighthouse", &["Lighthouse CI", "Performance and accessibility audits"]),
        );
    }
    if features.docs_deployment {
        w.line(
            0,
            &element("System_Ext", "docs", &["Documentation Site", "Published architecture documentation"]),
        );
    }
    w.blank();

    w.line(0, &rel("user", "website", "Views content", "HTTPS"));
    w.line(0, &rel("website", "hosting", "Deployed to", "HTTPS"));
    if config.ci.has_workflows() {
        let build: &str = if config.ci.build_command.is_empty() {
            "CI"
        } else {
            &config.ci.build_command
        };
        w.line(0, &rel("cicd", "website", "Builds and tests", build));
        w.line(0, &rel("cicd", "hosting", "Deploys to", ""));
    }
    if features.lighthouse {
        w.line(0, &rel("lighthouse", "website", "Audits", "HTTPS"));
    }
    if features.docs_deployment {
        w.line(0, &rel("website", "docs", "Documented by", "HTTPS"));
    }
    w.blank();

    w.finish()
}

/// Level 2: the containers that make up the site.
///
/// Pages, static assets and the build pipeline are always present. React
/// islands, Tailwind styles and diagram rendering follow the dependency
/// table.
pub fn container_diagram(config: &ProjectConfig) -> String {
    let has_react = config.has_dependency("react");
    let has_tailwind =
        config.has_dependency("tailwindcss") || config.has_dependency("@tailwindcss/vite");
    let has_mermaid = config.has_dependency("mermaid");
    let framework = config.framework.as_str();

    let mut w = PumlWriter::new(
        "C4_Container",
        &format!("Container diagram for {}", config.name),
    );

    w.line(0, &element("Person", "user", &["Visitor", "A person visiting the website"]));
    w.blank();
    w.line(0, &format!("System_Boundary(website, {}) {{", q(&config.name)));
    w.line(
        1,
        &element(
            "Container",
            "pages",
            &[
                &format!("{} Pages", framework),
                framework,
                "Statically generated pages and layouts",
            ],
        ),
    );
    if has_react {
        w.line(
            1,
            &element(
                "Container",
                "islands",
                &["React Islands", "React/TypeScript", "Interactive client-side components"],
            ),
        );
    }
    if has_tailwind {
        w.line(
            1,
            &element("Container", "styles", &["Tailwind Styles", "Tailwind CSS", "Utility-first styling"]),
        );
    }
    if has_mermaid {
        w.line(
            1,
            &element("Container", "diagrams", &["Diagram Rendering", "Mermaid", "Client-side diagrams"]),
        );
    }
    w.line(
        1,
        &element("Container", "assets", &["Static Assets", "CSS/Images/Fonts", "Styling and media files"]),
    );
    w.line(
        1,
        &element(
            "Container",
            "build",
            &["Build Pipeline", &config.build_tool, "Bundles and optimises the site"],
        ),
    );
    w.line(0, "}");
    w.blank();
    w.line(
        0,
        &element("System_Ext", "hosting", &[hosting_label(config), "Serves the static build"]),
    );
    w.blank();

    w.line(0, &rel("user", "pages", "Requests pages", "HTTPS"));
    if has_react {
        w.line(0, &rel("pages", "islands", "Hydrates", "JavaScript"));
    }
    if has_tailwind {
        w.line(0, &rel("pages", "styles", "Styled by", "CSS"));
    }
    if has_mermaid {
        w.line(0, &rel("pages", "diagrams", "Renders diagrams with", "JavaScript"));
    }
    w.line(0, &rel("pages", "assets", "Uses", ""));
    w.line(0, &rel("build", "pages", "Builds", &config.build_tool));
    w.line(0, &rel("build", "hosting", "Deploys to", ""));
    w.line(0, &rel("hosting", "pages", "Serves", "HTTPS"));
    w.blank();

    w.finish()
}

/// Level 3: one boundary per non-empty category, one box per file.
///
/// Categories longer than [`DISPLAY_CAP`] list their first entries and a
/// `+N more` box.
pub fn component_diagram(structure: &ComponentStructure, config: &ProjectConfig) -> String {
    let mut w = PumlWriter::new(
        "C4_Component",
        &format!("Component diagram for {}", config.name),
    );

    w.line(
        0,
        &format!(
            "Container_Boundary(app, {}) {{",
            q(&format!("{} Application", config.framework))
        ),
    );
    for category in Category::ALL {
        let entries = structure.get(category);
        if entries.is_empty() {
            continue;
        }
        write_category(&mut w, category, entries);
    }
    w.line(0, "}");
    w.blank();

    let mut any_rel = false;
    for (from, to, label) in CATEGORY_RELATIONS {
        if structure.has(*from) && structure.has(*to) {
            w.line(0, &rel(from.dir_name(), to.dir_name(), label, ""));
            any_rel = true;
        }
    }
    if any_rel {
        w.blank();
    }

    w.finish()
}

fn write_category(w: &mut PumlWriter, category: Category, entries: &[ComponentEntry]) {
    let alias = category.dir_name();
    w.line(1, &format!("Boundary({}, {}) {{", alias, q(category.title())));

    for (i, entry) in entries.iter().take(DISPLAY_CAP).enumerate() {
        w.line(
            2,
            &element(
                "Component",
                &format!("{}_{}", alias, i + 1),
                &[&entry.name, kind_label(&entry.kind), &entry.path],
            ),
        );
    }

    if entries.len() > DISPLAY_CAP {
        let hidden = entries.len() - DISPLAY_CAP;
        w.line(
            2,
            &element(
                "Component",
                &format!("{}_more", alias),
                &[
                    &format!("+{} more", hidden),
                    "",
                    &format!("Additional {}", category.title().to_lowercase()),
                ],
            ),
        );
    }

    w.line(1, "}");
}

fn kind_label(kind: &str) -> &str {
    match kind {
        "astro" => "Astro",
        "react" => "React",
        "typescript" => "TypeScript",
        "javascript" => "JavaScript",
        "markdown" => "Markdown",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CiFeatures, ProjectDefaults};

    fn minimal_config() -> ProjectConfig {
        ProjectConfig::with_defaults(&ProjectDefaults::default())
    }

    fn entries(category: &str, count: usize) -> Vec<ComponentEntry> {
        (0..count)
            .map(|i| ComponentEntry {
                name: format!("Item{}", i),
                path: format!("{}/Item{}.tsx", category, i),
                kind: "react".to_string(),
            })
            .collect()
    }

    /// Aliases used on the left of every `Rel(` line.
    fn rel_aliases(text: &str) -> Vec<String> {
        text.lines()
            .filter_map(|l| l.trim().strip_prefix("Rel("))
            .flat_map(|rest| rest.split(',').take(2).map(|s| s.trim().to_string()))
            .collect()
    }

    #[test]
    fn test_system_context_minimal() {
        let text = system_context_diagram(&minimal_config());

        assert!(text.starts_with("@startuml\n!include "));
        assert!(text.contains("C4_Context.puml"));
        assert!(text.contains("Person(user, \"Visitor\""));
        assert!(text.contains("System(website, \"website\""));
        assert!(text.contains("System_Ext(hosting, \"Static Hosting\""));
        assert!(!text.contains("cicd"));
        assert!(!text.contains("lighthouse"));
        assert!(!text.contains("docs"));
        assert_eq!(text.matches("Rel(").count(), 2);
        assert!(text.ends_with("@enduml\n"));
    }

    #[test]
    fn test_system_context_with_ci_features() {
        let mut config = minimal_config();
        config.ci.platform = "GitHub Actions".to_string();
        config.ci.workflows = vec!["CI".to_string()];
        config.ci.deploy_target = "Cloudflare Pages".to_string();
        config.ci.features = CiFeatures {
            lighthouse: true,
            docs_deployment: true,
            ..Default::default()
        };
        let text = system_context_diagram(&config);

        assert!(text.contains("System_Ext(hosting, \"Cloudflare Pages\""));
        assert!(text.contains("System_Ext(cicd, \"GitHub Actions\""));
        assert!(text.contains("System_Ext(lighthouse, \"Lighthouse CI\""));
        assert!(text.contains("System_Ext(docs, \"Documentation Site\""));
        assert!(text.contains("Rel(lighthouse, website, \"Audits\", \"HTTPS\")"));
    }

    #[test]
    fn test_container_minimal_has_no_dangling_relations() {
        let text = container_diagram(&minimal_config());

        assert!(text.contains("Container(pages, \"Astro Pages\""));
        assert!(text.contains("Container(assets,"));
        assert!(text.contains("Container(build, \"Build Pipeline\", \"Vite\""));
        for alias in ["islands", "styles", "diagrams"] {
            assert!(!text.contains(alias), "unexpected {}", alias);
        }
        for alias in rel_aliases(&text) {
            assert!(
                text.contains(&format!("({}, ", alias)),
                "relation references undeclared {}",
                alias
            );
        }
    }

    #[test]
    fn test_container_with_dependencies() {
        let mut config = minimal_config();
        for dep in ["react", "@tailwindcss/vite", "mermaid"] {
            config.dependencies.insert(dep.to_string(), "*".to_string());
        }
        let text = container_diagram(&config);

        assert!(text.contains("Container(islands, \"React Islands\""));
        assert!(text.contains("Container(styles, \"Tailwind Styles\""));
        assert!(text.contains("Container(diagrams, \"Diagram Rendering\""));
        assert!(text.contains("Rel(pages, islands, \"Hydrates\", \"JavaScript\")"));
        assert!(text.contains("Rel(pages, styles,"));
        assert!(text.contains("Rel(pages, diagrams,"));
    }

    #[test]
    fn test_component_truncation() {
        let mut structure = ComponentStructure::default();
        structure.set(Category::Components, entries("components", 7));
        let text = component_diagram(&structure, &minimal_config());

        let named = text
            .lines()
            .filter(|l| l.trim().starts_with("Component(components_"))
            .filter(|l| !l.contains("components_more"))
            .count();
        assert_eq!(named, 5);
        assert!(text.contains("Component(components_more, \"+2 more\""));
        assert!(!text.contains("Item5"));
    }

    #[test]
    fn test_component_skips_empty_categories() {
        let mut structure = ComponentStructure::default();
        structure.set(Category::Pages, entries("pages", 1));
        structure.set(Category::Components, entries("components", 2));
        let text = component_diagram(&structure, &minimal_config());

        assert!(text.contains("Boundary(pages, \"Pages\")"));
        assert!(text.contains("Boundary(components, \"Components\")"));
        assert!(!text.contains("Boundary(services"));
        assert!(text.contains("Rel(pages, components, \"Renders\")"));
        assert_eq!(text.matches("Rel(").count(), 1);
        assert!(!text.contains("_more"));
    }

    #[test]
    fn test_component_empty_structure() {
        let text = component_diagram(&ComponentStructure::default(), &minimal_config());
        assert!(text.contains("Container_Boundary(app, \"Astro Application\")"));
        assert!(!text.contains("Rel("));
    }

    #[test]
    fn test_quotes_in_names_are_neutralised() {
        let mut config = minimal_config();
        config.name = "my \"site\"".to_string();
        let text = system_context_diagram(&config);
        assert!(text.contains("System(website, \"my 'site'\""));
    }
}
