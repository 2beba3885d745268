//! Extract command - classes, interfaces and imports of TypeScript files

use anyhow::Result;
use archgen_core::extract::parse_files;
use archgen_core::FileExtraction;
use colored::Colorize;
use serde::Serialize;

use crate::config::ArchgenConfig;
use crate::output::{Output, OutputFormat, TableDisplay, TableOutput};

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ExtractResult(pub Vec<FileExtraction>);

impl TableDisplay for ExtractResult {
    fn to_table(&self) -> String {
        let rows = self
            .0
            .iter()
            .map(|file| {
                let classes: Vec<&str> = file.classes.iter().map(|c| c.name.as_str()).collect();
                let interfaces: Vec<&str> =
                    file.interfaces.iter().map(|i| i.name.as_str()).collect();
                vec![
                    file.file_path.clone(),
                    classes.join(", "),
                    interfaces.join(", "),
                    file.imports.len().to_string(),
                ]
            })
            .collect();
        format!(
            "{}\n{}",
            "Code structure".cyan().bold(),
            TableOutput::format_rows(&["File", "Classes", "Interfaces", "Imports"], rows)
        )
    }
}

pub async fn run(
    files: &[String],
    include_private: bool,
    include_anonymous: bool,
    config: &ArchgenConfig,
    format: OutputFormat,
) -> Result<()> {
    // Flags can only switch on what the config leaves off
    let mut options = config.extract_options();
    options.include_private |= include_private;
    options.include_anonymous |= include_anonymous;

    let extractions = parse_files(files, &options);
    Output::new(ExtractResult(extractions), format).render()
}
