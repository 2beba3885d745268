//! Helper functions for tree-sitter AST navigation.

use tree_sitter::Node;

/// Get the text content of a node.
pub fn get_node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    let start = node.start_byte();
    let end = node.end_byte();
    if start < source.len() && end <= source.len() && start < end {
        &source[start..end]
    } else {
        ""
    }
}

/// Find the first child of a specific type.
#[allow(clippy::manual_find)]
pub fn find_child_by_type<'a>(node: &Node<'a>, type_name: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == type_name {
            return Some(child);
        }
    }
    None
}

/// Check if a node has a child of a specific type.
///
/// Works for keyword tokens too (`static`, `async`, `readonly`, `?`).
pub fn has_child_of_type(node: &Node, type_name: &str) -> bool {
    find_child_by_type(node, type_name).is_some()
}

/// Text of a `type_annotation` node without the leading colon.
pub fn annotation_text(node: &Node, source: &str) -> Option<String> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() != ":" {
            let text = get_node_text(&child, source).trim();
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
    }
    None
}

/// Type text of a field holding a `type_annotation`, e.g. `type` or `return_type`.
pub fn field_annotation(node: &Node, field: &str, source: &str) -> Option<String> {
    node.child_by_field_name(field)
        .and_then(|annotation| annotation_text(&annotation, source))
}

/// Widened type of a literal initializer, the way a checker would infer it.
pub fn literal_type(node: &Node) -> Option<&'static str> {
    match node.kind() {
        "number" => Some("number"),
        "string" | "template_string" => Some("string"),
        "true" | "false" => Some("boolean"),
        "unary_expression" => {
            // -1, +2
            let operand = node.child_by_field_name("argument")?;
            (operand.kind() == "number").then_some("number")
        }
        _ => None,
    }
}

/// Declared name of a member (`name` field), keeping `#` on private names.
pub fn member_name(node: &Node, source: &str) -> Option<String> {
    let name = node.child_by_field_name("name")?;
    let text = get_node_text(&name, source);
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Strip the quotes from a string literal node.
pub fn string_value(node: &Node, source: &str) -> String {
    get_node_text(node, source)
        .trim_matches('"')
        .trim_matches('\'')
        .trim_matches('`')
        .to_string()
}

/// Get line number (1-indexed) from a node.
pub fn get_start_line(node: &Node) -> u32 {
    node.start_position().row as u32 + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    fn parse(source: &str) -> tree_sitter::Tree {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
            .unwrap();
        parser.parse(source, None).unwrap()
    }

    #[test]
    fn test_get_node_text() {
        let source = "const answer = 42;";
        let tree = parse(source);
        let root = tree.root_node();
        assert_eq!(get_node_text(&root, source), source);
    }

    #[test]
    fn test_find_child_by_type() {
        let source = "import { a } from './a';\nclass Foo {}\n";
        let tree = parse(source);
        let root = tree.root_node();
        assert!(find_child_by_type(&root, "class_declaration").is_some());
        assert!(find_child_by_type(&root, "interface_declaration").is_none());
        assert!(has_child_of_type(&root, "import_statement"));
    }

    #[test]
    fn test_string_value() {
        let source = "import x from '@astrojs/react';";
        let tree = parse(source);
        let import = tree.root_node().child(0).unwrap();
        let literal = import.child_by_field_name("source").unwrap();
        assert_eq!(string_value(&literal, source), "@astrojs/react");
    }
}
