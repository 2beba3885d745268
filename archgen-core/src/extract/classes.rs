//! Class declaration extraction.

use std::collections::HashSet;

use tree_sitter::Node;

use super::helpers::{
    field_annotation, find_child_by_type, get_node_text, get_start_line, has_child_of_type,
    literal_type, member_name,
};
use crate::error::{ArchgenError, Result};
use crate::types::{
    ExtractOptions, ExtractedClass, ExtractedMethod, ExtractedProperty, ParameterInfo, Visibility,
};

/// Name recorded for unnamed classes when they are kept.
pub const ANONYMOUS_CLASS: &str = "(anonymous)";

/// Whether a node kind is a class of any flavour.
pub fn is_class_node(kind: &str) -> bool {
    matches!(kind, "class_declaration" | "abstract_class_declaration" | "class")
}

/// Extract one class node.
///
/// Returns `Ok(None)` for anonymous classes unless the options keep them.
/// A class whose subtree contains syntax errors fails extraction.
pub fn extract_class(
    node: &Node,
    source: &str,
    file_path: &str,
    is_exported: bool,
    options: &ExtractOptions,
) -> Result<Option<ExtractedClass>> {
    let name = node
        .child_by_field_name("name")
        .map(|n| get_node_text(&n, source).to_string())
        .filter(|n| !n.is_empty());

    let name = match name {
        Some(name) => name,
        None if options.include_anonymous => ANONYMOUS_CLASS.to_string(),
        None => return Ok(None),
    };

    if node.has_error() {
        return Err(ArchgenError::Extraction {
            kind: "class",
            name,
            message: format!("syntax error near line {}", get_start_line(node)),
        });
    }

    let mut class = ExtractedClass {
        name,
        is_exported,
        is_abstract: node.kind() == "abstract_class_declaration",
        file_path: file_path.to_string(),
        ..Default::default()
    };

    if let Some(heritage) = find_child_by_type(node, "class_heritage") {
        extract_heritage(&heritage, source, &mut class);
    }

    if let Some(body) = node.child_by_field_name("body") {
        extract_class_body(&body, source, options, &mut class);
    }

    Ok(Some(class))
}

/// Extract `extends` and `implements` clauses as written.
fn extract_heritage(node: &Node, source: &str, class: &mut ExtractedClass) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "extends_clause" => {
                let text = get_node_text(&child, source);
                let parent = text.trim_start_matches("extends").trim();
                if !parent.is_empty() {
                    class.extends = Some(parent.to_string());
                }
            }
            "implements_clause" => {
                let mut inner = child.walk();
                for ty in child.named_children(&mut inner) {
                    class
                        .implements
                        .push(get_node_text(&ty, source).to_string());
                }
            }
            _ => {}
        }
    }
}

fn extract_class_body(
    node: &Node,
    source: &str,
    options: &ExtractOptions,
    class: &mut ExtractedClass,
) {
    let mut cursor = node.walk();
    let members: Vec<Node> = node.children(&mut cursor).collect();

    // Overload signatures collapse into their implementation
    let implemented: HashSet<(String, bool)> = members
        .iter()
        .filter(|m| m.kind() == "method_definition" && !is_accessor(m))
        .filter_map(|m| member_name(m, source).map(|name| (name, has_child_of_type(m, "static"))))
        .collect();
    let mut recorded = HashSet::new();

    for child in &members {
        match child.kind() {
            "method_definition" | "method_signature" | "abstract_method_signature" => {
                if is_accessor(child) {
                    continue;
                }
                let Some(method) = extract_method(child, source) else {
                    continue;
                };
                let key = (method.name.clone(), method.is_static);
                if child.kind() != "method_definition" && implemented.contains(&key) {
                    continue;
                }
                if !recorded.insert(key) {
                    continue;
                }
                if options.include_private || method.visibility != Visibility::Private {
                    class.methods.push(method);
                }
            }
            "public_field_definition" => {
                if let Some(property) = extract_property(child, source) {
                    if options.include_private || property.visibility != Visibility::Private {
                        class.properties.push(property);
                    }
                }
            }
            _ => {}
        }
    }
}

/// `get`/`set` accessors are properties, not methods.
fn is_accessor(node: &Node) -> bool {
    has_child_of_type(node, "get") || has_child_of_type(node, "set")
}

/// Visibility from an `accessibility_modifier` child or a `#private` name.
fn member_visibility(node: &Node, name: &str, source: &str) -> Visibility {
    if name.starts_with('#') {
        return Visibility::Private;
    }
    match find_child_by_type(node, "accessibility_modifier")
        .map(|m| get_node_text(&m, source).trim())
    {
        Some("private") => Visibility::Private,
        Some("protected") => Visibility::Protected,
        _ => Visibility::Public,
    }
}

fn extract_method(node: &Node, source: &str) -> Option<ExtractedMethod> {
    let name = member_name(node, source)?;
    if name == "constructor" {
        return None;
    }

    let mut parameters = node
        .child_by_field_name("parameters")
        .map(|params| extract_parameters(&params, source))
        .unwrap_or_default();
    for param in &mut parameters {
        if param.type_text.as_deref() == Some("any") {
            param.type_text = None;
        }
    }

    let is_async = has_child_of_type(node, "async");
    let return_type = field_annotation(node, "return_type", source)
        .or_else(|| inferred_return_type(node, is_async));

    Some(ExtractedMethod {
        visibility: member_visibility(node, &name, source),
        is_static: has_child_of_type(node, "static"),
        is_async,
        parameters,
        return_type,
        name,
    })
}

/// Return type of an unannotated method body.
///
/// `void` when nothing is returned, the widened literal type when every
/// `return` yields a literal of one type, wrapped in `Promise` for `async`.
/// Anything else is left to the reader.
fn inferred_return_type(node: &Node, is_async: bool) -> Option<String> {
    if has_child_of_type(node, "*") {
        return None;
    }
    let body = node.child_by_field_name("body")?;

    let mut returned = Vec::new();
    collect_returns(&body, &mut returned);

    let inner = if returned.iter().all(Option::is_none) {
        "void"
    } else {
        let mut types = returned
            .iter()
            .map(|value| value.as_ref().and_then(literal_type));
        let first = types.next().flatten()?;
        if !types.all(|ty| ty == Some(first)) {
            return None;
        }
        first
    };

    Some(if is_async {
        format!("Promise<{}>", inner)
    } else {
        inner.to_string()
    })
}

/// Returned expressions of a function body, skipping nested functions.
fn collect_returns<'t>(node: &Node<'t>, returned: &mut Vec<Option<Node<'t>>>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "return_statement" => {
                let mut inner = child.walk();
                let value = child
                    .named_children(&mut inner)
                    .find(|n| n.kind() != "comment");
                returned.push(value);
            }
            "function_declaration"
            | "function_expression"
            | "function"
            | "arrow_function"
            | "generator_function"
            | "generator_function_declaration"
            | "method_definition"
            | "class"
            | "class_declaration" => {}
            _ => collect_returns(&child, returned),
        }
    }
}

fn extract_property(node: &Node, source: &str) -> Option<ExtractedProperty> {
    let name = member_name(node, source)?;

    let type_text = field_annotation(node, "type", source).or_else(|| {
        node.child_by_field_name("value")
            .and_then(|value| literal_type(&value))
            .map(str::to_string)
    });

    Some(ExtractedProperty {
        visibility: member_visibility(node, &name, source),
        is_static: has_child_of_type(node, "static"),
        is_readonly: has_child_of_type(node, "readonly"),
        type_text,
        name,
    })
}

/// Extract parameters from `formal_parameters`.
///
/// The type is the annotation, or the widened type of a literal default.
pub fn extract_parameters(node: &Node, source: &str) -> Vec<ParameterInfo> {
    let mut params = Vec::new();

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if !matches!(child.kind(), "required_parameter" | "optional_parameter") {
            continue;
        }

        let Some(pattern) = child.child_by_field_name("pattern") else {
            continue;
        };
        let is_rest = pattern.kind() == "rest_pattern";
        let name = if is_rest {
            find_child_by_type(&pattern, "identifier")
                .map(|id| get_node_text(&id, source).to_string())
                .unwrap_or_else(|| get_node_text(&pattern, source).to_string())
        } else {
            get_node_text(&pattern, source).to_string()
        };
        if name.is_empty() || name == "this" {
            continue;
        }

        let value = child.child_by_field_name("value");
        let type_text = field_annotation(&child, "type", source)
            .or_else(|| value.and_then(|v| literal_type(&v)).map(str::to_string));

        params.push(ParameterInfo {
            name,
            type_text,
            optional: child.kind() == "optional_parameter" || value.is_some() || is_rest,
            default_value: value.map(|v| get_node_text(&v, source).to_string()),
        });
    }

    params
}
