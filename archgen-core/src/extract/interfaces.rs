//! Interface declaration extraction.

use tree_sitter::Node;

use super::classes::extract_parameters;
use super::helpers::{
    field_annotation, find_child_by_type, get_node_text, get_start_line, has_child_of_type,
    member_name,
};
use crate::error::{ArchgenError, Result};
use crate::types::{ExtractedInterface, InterfaceMethod, InterfaceProperty, ParameterInfo};

/// Extract one `interface_declaration` node.
pub fn extract_interface(
    node: &Node,
    source: &str,
    file_path: &str,
    is_exported: bool,
) -> Result<ExtractedInterface> {
    let name = node
        .child_by_field_name("name")
        .map(|n| get_node_text(&n, source).to_string())
        .unwrap_or_default();

    if node.has_error() || name.is_empty() {
        return Err(ArchgenError::Extraction {
            kind: "interface",
            name: if name.is_empty() {
                "<anonymous>".to_string()
            } else {
                name
            },
            message: format!("syntax error near line {}", get_start_line(node)),
        });
    }

    let mut interface = ExtractedInterface {
        name,
        is_exported,
        file_path: file_path.to_string(),
        ..Default::default()
    };

    if let Some(clause) = find_child_by_type(node, "extends_type_clause") {
        let mut cursor = clause.walk();
        for ty in clause.named_children(&mut cursor) {
            interface.extends.push(get_node_text(&ty, source).to_string());
        }
    }

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            match member.kind() {
                "property_signature" => {
                    if let Some(name) = member_name(&member, source) {
                        interface.properties.push(InterfaceProperty {
                            name,
                            type_text: field_annotation(&member, "type", source)
                                .unwrap_or_else(|| "any".to_string()),
                            optional: has_child_of_type(&member, "?"),
                            readonly: has_child_of_type(&member, "readonly"),
                        });
                    }
                }
                "method_signature" => {
                    if let Some(name) = member_name(&member, source) {
                        interface.methods.push(InterfaceMethod {
                            name,
                            parameters: interface_parameters(&member, source),
                            return_type: field_annotation(&member, "return_type", source)
                                .unwrap_or_else(|| "void".to_string()),
                        });
                    }
                }
                _ => {}
            }
        }
    }

    Ok(interface)
}

/// Parameters of a method signature; untyped ones read as `any`.
fn interface_parameters(member: &Node, source: &str) -> Vec<ParameterInfo> {
    let mut params = member
        .child_by_field_name("parameters")
        .map(|p| extract_parameters(&p, source))
        .unwrap_or_default();
    for param in &mut params {
        param.type_text.get_or_insert_with(|| "any".to_string());
    }
    params
}
