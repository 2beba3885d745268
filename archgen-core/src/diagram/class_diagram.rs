//! Mermaid class diagram for the code level.

use std::collections::HashSet;
use std::fmt::Write;

use crate::types::{
    ExtractedClass, ExtractedInterface, ExtractedMethod, ExtractedProperty, FileExtraction,
    ParameterInfo,
};

/// Render classes, interfaces and their inheritance as a `classDiagram`.
///
/// A name declared in more than one file is drawn once, from the first file.
pub fn class_diagram(files: &[FileExtraction]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "classDiagram");
    let _ = writeln!(out, "  %% Code structure");

    let mut declared = HashSet::new();
    let mut relations = Vec::new();

    for file in files {
        for iface in &file.interfaces {
            if declared.insert(iface.name.clone()) {
                write_interface(&mut out, iface);
                for parent in &iface.extends {
                    relations.push(format!("{} <|-- {}", base_name(parent), iface.name));
                }
            }
        }
        for class in &file.classes {
            if declared.insert(class.name.clone()) {
                write_class(&mut out, class);
                if let Some(parent) = &class.extends {
                    relations.push(format!("{} <|-- {}", base_name(parent), class_id(class)));
                }
                for iface in &class.implements {
                    relations.push(format!("{} <|.. {}", base_name(iface), class_id(class)));
                }
            }
        }
    }

    if !relations.is_empty() {
        out.push('\n');
        for relation in relations {
            let _ = writeln!(out, "  {}", relation);
        }
    }

    out
}

/// Mermaid-safe class id; anonymous classes have no usable name.
fn class_id(class: &ExtractedClass) -> String {
    class
        .name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '$' { c } else { '_' })
        .collect()
}

/// `Base<T>` and `ns.Base` both relate to `Base`.
fn base_name(type_text: &str) -> &str {
    let head = type_text.split('<').next().unwrap_or(type_text).trim();
    head.rsplit('.').next().unwrap_or(head)
}

/// Mermaid writes generics as `~T~`.
fn mermaid_type(type_text: &str) -> String {
    type_text
        .replace(['<', '>'], "~")
        .replace(['{', '}'], "")
        .replace('\n', " ")
}

fn write_class(out: &mut String, class: &ExtractedClass) {
    let _ = writeln!(out);
    let _ = writeln!(out, "  class {} {{", class_id(class));
    if class.is_abstract {
        let _ = writeln!(out, "    <<abstract>>");
    }
    for property in &class.properties {
        let _ = writeln!(out, "    {}", property_line(property));
    }
    for method in &class.methods {
        let _ = writeln!(out, "    {}", method_line(method));
    }
    let _ = writeln!(out, "  }}");
}

fn write_interface(out: &mut String, iface: &ExtractedInterface) {
    let _ = writeln!(out);
    let _ = writeln!(out, "  class {} {{", iface.name);
    let _ = writeln!(out, "    <<interface>>");
    for property in &iface.properties {
        let optional = if property.optional { "?" } else { "" };
        let _ = writeln!(
            out,
            "    +{}{} : {}",
            property.name,
            optional,
            mermaid_type(&property.type_text)
        );
    }
    for method in &iface.methods {
        let _ = writeln!(
            out,
            "    +{}({}) {}",
            method.name,
            parameter_list(&method.parameters),
            mermaid_type(&method.return_type)
        );
    }
    let _ = writeln!(out, "  }}");
}

fn property_line(property: &ExtractedProperty) -> String {
    let mut line = format!(
        "{}{}",
        property.visibility.symbol(),
        property.name.trim_start_matches('#')
    );
    if let Some(ty) = &property.type_text {
        let _ = write!(line, " : {}", mermaid_type(ty));
    }
    if property.is_static {
        line.push('$');
    }
    line
}

fn method_line(method: &ExtractedMethod) -> String {
    let mut line = format!(
        "{}{}({})",
        method.visibility.symbol(),
        method.name.trim_start_matches('#'),
        parameter_list(&method.parameters)
    );
    if let Some(ty) = &method.return_type {
        let _ = write!(line, " {}", mermaid_type(ty));
    }
    if method.is_static {
        line.push('$');
    }
    line
}

fn parameter_list(parameters: &[ParameterInfo]) -> String {
    parameters
        .iter()
        .map(|p| {
            let optional = if p.optional { "?" } else { "" };
            match &p.type_text {
                Some(ty) => format!("{}{}: {}", p.name, optional, mermaid_type(ty)),
                None => format!("{}{}", p.name, optional),
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InterfaceMethod, Visibility};

    fn theme_files() -> Vec<FileExtraction> {
        let manager = ExtractedClass {
            name: "ThemeManager".to_string(),
            is_exported: true,
            extends: Some("BaseManager<Theme>".to_string()),
            implements: vec!["IThemeManager".to_string()],
            methods: vec![
                ExtractedMethod {
                    name: "init".to_string(),
                    is_async: true,
                    parameters: vec![ParameterInfo {
                        name: "root".to_string(),
                        type_text: Some("HTMLElement".to_string()),
                        ..Default::default()
                    }],
                    return_type: Some("Promise<void>".to_string()),
                    ..Default::default()
                },
                ExtractedMethod {
                    name: "create".to_string(),
                    is_static: true,
                    ..Default::default()
                },
            ],
            properties: vec![ExtractedProperty {
                name: "instances".to_string(),
                visibility: Visibility::Protected,
                is_static: true,
                type_text: Some("number".to_string()),
                ..Default::default()
            }],
            file_path: "src/services/ThemeManager.ts".to_string(),
            ..Default::default()
        };
        let iface = ExtractedInterface {
            name: "IThemeManager".to_string(),
            is_exported: true,
            methods: vec![InterfaceMethod {
                name: "init".to_string(),
                parameters: Vec::new(),
                return_type: "void".to_string(),
            }],
            ..Default::default()
        };

        vec![
            FileExtraction {
                file_path: "src/services/interfaces/IThemeManager.ts".to_string(),
                interfaces: vec![iface],
                ..Default::default()
            },
            FileExtraction {
                file_path: "src/services/ThemeManager.ts".to_string(),
                classes: vec![manager],
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_class_diagram() {
        let text = class_diagram(&theme_files());

        assert!(text.starts_with("classDiagram\n"));
        assert!(text.contains("class IThemeManager {\n    <<interface>>\n    +init() void\n  }"));
        assert!(text.contains("class ThemeManager {"));
        assert!(text.contains("    #instances : number$"));
        assert!(text.contains("    +init(root: HTMLElement) Promise~void~"));
        assert!(text.contains("    +create()$"));
        assert!(text.contains("BaseManager <|-- ThemeManager"));
        assert!(text.contains("IThemeManager <|.. ThemeManager"));
    }

    #[test]
    fn test_duplicate_names_drawn_once() {
        let mut files = theme_files();
        files.extend(theme_files());
        let text = class_diagram(&files);
        assert_eq!(text.matches("class ThemeManager {").count(), 1);
        assert_eq!(text.matches("BaseManager <|-- ThemeManager").count(), 1);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(class_diagram(&[]), "classDiagram\n  %% Code structure\n");
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("BaseManager<Theme>"), "BaseManager");
        assert_eq!(base_name("React.Component<Props>"), "Component");
        assert_eq!(base_name("Plain"), "Plain");
    }
}
