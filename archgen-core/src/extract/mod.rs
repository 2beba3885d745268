//! Code-structure extraction from TypeScript sources.
//!
//! Each file is parsed with tree-sitter (TypeScript grammar, or TSX for
//! `.tsx`/`.jsx`) and its module-level and namespaced declarations are
//! lifted into [`FileExtraction`] records.
//!
//! Extraction is best-effort. A file that cannot be read yields an empty
//! record; a declaration that fails to extract empties the matching list of
//! its own file and nothing else.

use std::fmt::Display;
use std::path::Path;

use tree_sitter::{Node, Parser};

use crate::error::{ArchgenError, Result};
use crate::scanner::to_slash_path;
use crate::types::{
    ExtractOptions, ExtractedClass, ExtractedImport, ExtractedInterface, FileExtraction,
};

pub mod classes;
pub mod imports;
pub mod interfaces;

mod helpers;

/// Parse every path into a [`FileExtraction`], in input order.
pub fn parse_files<P: AsRef<Path>>(paths: &[P], options: &ExtractOptions) -> Vec<FileExtraction> {
    paths
        .iter()
        .map(|path| {
            let path = path.as_ref();
            let shown = to_slash_path(path);
            match std::fs::read_to_string(path) {
                Ok(source) => extract_source(&source, &shown, options),
                Err(e) => {
                    tracing::warn!("Parse error in {}: {}", shown, e);
                    FileExtraction::empty(shown)
                }
            }
        })
        .collect()
}

/// Extract classes, interfaces and imports from one source text.
pub fn extract_source(source: &str, file_path: &str, options: &ExtractOptions) -> FileExtraction {
    match try_extract_source(source, file_path, options) {
        Ok(extraction) => extraction,
        Err(e) => {
            tracing::warn!("{}", e);
            FileExtraction::empty(file_path)
        }
    }
}

fn try_extract_source(
    source: &str,
    file_path: &str,
    options: &ExtractOptions,
) -> Result<FileExtraction> {
    let mut parser = Parser::new();
    let is_tsx = matches!(
        Path::new(file_path).extension().and_then(|e| e.to_str()),
        Some("tsx") | Some("jsx")
    );
    let language = if is_tsx {
        tree_sitter_typescript::LANGUAGE_TSX.into()
    } else {
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
    };

    parser
        .set_language(&language)
        .map_err(|e| ArchgenError::Parse {
            path: file_path.to_string(),
            message: format!("Failed to set language: {}", e),
        })?;

    let tree = parser.parse(source, None).ok_or_else(|| ArchgenError::Parse {
        path: file_path.to_string(),
        message: "Failed to parse source".to_string(),
    })?;

    let mut collector = Collector {
        source,
        file_path,
        options,
        classes: Vec::new(),
        interfaces: Vec::new(),
        imports: Vec::new(),
    };
    collector.visit_statements(&tree.root_node());

    Ok(FileExtraction {
        file_path: file_path.to_string(),
        classes: collect_or_empty(file_path, collector.classes)
            .into_iter()
            .flatten()
            .collect(),
        interfaces: collect_or_empty(file_path, collector.interfaces),
        imports: collect_or_empty(file_path, collector.imports),
    })
}

/// Per-file extraction results, gathered in source order.
struct Collector<'s> {
    source: &'s str,
    file_path: &'s str,
    options: &'s ExtractOptions,
    classes: Vec<Result<Option<ExtractedClass>>>,
    interfaces: Vec<Result<ExtractedInterface>>,
    imports: Vec<Result<ExtractedImport>>,
}

impl Collector<'_> {
    /// Visit the statements of a program or namespace body.
    fn visit_statements(&mut self, node: &Node) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.visit_statement(&child, false);
        }
    }

    fn visit_statement(&mut self, node: &Node, is_exported: bool) {
        match node.kind() {
            "import_statement" => self
                .imports
                .push(imports::extract_import(node, self.source)),
            "export_statement" => {
                // `export class`, `export default class {}`
                if let Some(decl) = node
                    .child_by_field_name("declaration")
                    .or_else(|| node.child_by_field_name("value"))
                {
                    self.visit_statement(&decl, true);
                }
            }
            "interface_declaration" => self.interfaces.push(interfaces::extract_interface(
                node,
                self.source,
                self.file_path,
                is_exported,
            )),
            "internal_module" | "module" => {
                if let Some(body) = node.child_by_field_name("body") {
                    self.visit_statements(&body);
                }
            }
            "expression_statement" | "ambient_declaration" => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    self.visit_statement(&child, is_exported);
                }
            }
            kind if classes::is_class_node(kind) => self.classes.push(classes::extract_class(
                node,
                self.source,
                self.file_path,
                is_exported,
                self.options,
            )),
            _ => {}
        }
    }
}

/// All extracted items, or an empty list when any of them failed.
///
/// The failure is logged with the offending declaration's name.
pub fn collect_or_empty<T, E: Display>(
    file_path: &str,
    results: Vec<std::result::Result<T, E>>,
) -> Vec<T> {
    let mut items = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(item) => items.push(item),
            Err(e) => {
                tracing::warn!("Error in {}: {}", file_path, e);
                return Vec::new();
            }
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_collect_or_empty() {
        let ok: Vec<std::result::Result<u32, String>> = vec![Ok(1), Ok(2)];
        assert_eq!(collect_or_empty("a.ts", ok), vec![1, 2]);

        let failed: Vec<std::result::Result<u32, String>> =
            vec![Ok(1), Err("Broken".to_string()), Ok(3)];
        assert!(collect_or_empty("a.ts", failed).is_empty());
    }

    #[test]
    fn test_broken_class_empties_only_classes() {
        let source = r#"
import { helper } from './helper';

export interface Options { verbose: boolean; }

export class Good {}

export class Broken {
    run() {
        const value = ;
    }
}
"#;
        let result = extract_source(source, "src/utils/broken.ts", &ExtractOptions::default());
        assert!(result.classes.is_empty());
        assert_eq!(result.interfaces.len(), 1);
        assert_eq!(result.imports.len(), 1);
    }

    #[test]
    fn test_parse_files_missing_file_yields_empty_record() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("Good.ts");
        fs::write(&good, "export class Good { run(): void {} }\n").unwrap();
        let missing = dir.path().join("Missing.ts");

        let results = parse_files(&[missing.clone(), good], &ExtractOptions::default());

        assert_eq!(results.len(), 2);
        assert!(results[0].file_path.ends_with("Missing.ts"));
        assert!(results[0].classes.is_empty());
        assert_eq!(results[1].classes.len(), 1);
        assert_eq!(results[1].classes[0].name, "Good");
    }

    #[test]
    fn test_classes_inside_namespace() {
        let source = r#"
namespace Widgets {
    export class Slider {}
    class Hidden {}
}
"#;
        let result = extract_source(source, "src/utils/widgets.ts", &ExtractOptions::default());
        let names: Vec<&str> = result.classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Slider", "Hidden"]);
        assert!(result.classes[0].is_exported);
        assert!(!result.classes[1].is_exported);
    }

    #[test]
    fn test_tsx_file() {
        let source = r#"
import { useState } from 'react';

export class Counter extends Component<Props> {
    render() { return <div>{this.props.count}</div>; }
}
"#;
        let result = extract_source(source, "src/components/Counter.tsx", &ExtractOptions::default());
        assert_eq!(result.classes.len(), 1);
        assert_eq!(result.classes[0].extends.as_deref(), Some("Component<Props>"));
        assert_eq!(result.imports[0].imported_names, vec!["useState"]);
    }
}
