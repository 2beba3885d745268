//! Import declaration extraction.

use tree_sitter::Node;

use super::helpers::{find_child_by_type, get_node_text, get_start_line, string_value};
use crate::error::{ArchgenError, Result};
use crate::types::ExtractedImport;

/// Extract one `import_statement` node.
///
/// Names are ordered: named imports (by imported name), the default
/// binding, then the namespace binding as `* as ns`.
pub fn extract_import(node: &Node, source: &str) -> Result<ExtractedImport> {
    let specifier = node
        .child_by_field_name("source")
        .map(|s| string_value(&s, source))
        .unwrap_or_default();

    if node.has_error() || specifier.is_empty() {
        return Err(ArchgenError::Extraction {
            kind: "import",
            name: if specifier.is_empty() {
                get_node_text(node, source).to_string()
            } else {
                specifier
            },
            message: format!("syntax error near line {}", get_start_line(node)),
        });
    }

    let mut is_type_only = false;
    let mut named = Vec::new();
    let mut default = None;
    let mut namespace = None;

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "type" if !child.is_named() => is_type_only = true,
            "import_clause" => {
                let mut clause_cursor = child.walk();
                for part in child.children(&mut clause_cursor) {
                    match part.kind() {
                        "identifier" => {
                            default = Some(get_node_text(&part, source).to_string());
                        }
                        "named_imports" => {
                            let mut spec_cursor = part.walk();
                            for spec in part.named_children(&mut spec_cursor) {
                                if spec.kind() != "import_specifier" {
                                    continue;
                                }
                                if let Some(name) = spec.child_by_field_name("name") {
                                    named.push(string_value(&name, source));
                                }
                            }
                        }
                        "namespace_import" => {
                            if let Some(id) = find_child_by_type(&part, "identifier") {
                                namespace = Some(get_node_text(&id, source).to_string());
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    let mut imported_names = named;
    imported_names.extend(default);
    imported_names.extend(namespace.map(|ns| format!("* as {}", ns)));

    Ok(ExtractedImport {
        source: specifier,
        imported_names,
        is_type_only,
    })
}
