//! Structure command - show source files bucketed by category

use anyhow::Result;
use archgen_core::structure::analyze_components;
use archgen_core::types::Category;
use archgen_core::ComponentStructure;
use colored::Colorize;
use serde::Serialize;

use super::resolve_root;
use crate::config::ArchgenConfig;
use crate::output::{Output, OutputFormat, TableDisplay, TableOutput};

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct StructureResult(pub ComponentStructure);

impl TableDisplay for StructureResult {
    fn to_table(&self) -> String {
        let rows = Category::ALL
            .iter()
            .map(|&category| {
                let entries = self.0.get(category);
                let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
                vec![
                    category.title().to_string(),
                    entries.len().to_string(),
                    names.join(", "),
                ]
            })
            .collect();
        format!(
            "{} ({} files)\n{}",
            "Component structure".cyan().bold(),
            self.0.total(),
            TableOutput::format_rows(&["Category", "Count", "Items"], rows)
        )
    }
}

pub async fn run(path: &str, config: &ArchgenConfig, format: OutputFormat) -> Result<()> {
    let root = resolve_root(path)?;
    let structure = analyze_components(&root.join(&config.source.root));
    Output::new(StructureResult(structure), format).render()
}
