//! Lighthouse command - average CI results into the performance document

use anyhow::{Context, Result};
use archgen_core::lighthouse::{update_performance_doc, LighthouseReport};
use colored::Colorize;
use serde::Serialize;

use super::resolve_root;
use crate::config::ArchgenConfig;
use crate::output::{Output, OutputFormat, TableDisplay, TableOutput};

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct LighthouseResult(pub LighthouseReport);

impl TableDisplay for LighthouseResult {
    fn to_table(&self) -> String {
        let report = &self.0;
        let scores = &report.scores;
        let rows = vec![
            vec!["Performance".to_string(), scores.performance.to_string()],
            vec!["Accessibility".to_string(), scores.accessibility.to_string()],
            vec!["Best Practices".to_string(), scores.best_practices.to_string()],
            vec!["SEO".to_string(), scores.seo.to_string()],
        ];

        let mut out = format!(
            "{} {} ({} runs)\n{}",
            "Updated".green().bold(),
            report.document.display(),
            report.runs,
            TableOutput::format_rows(&["Metric", "Score"], rows)
        );
        if let Some(link) = &report.link {
            out.push_str(&format!("\n{}: {}", "Report".cyan(), link));
        }
        out
    }
}

pub async fn run(path: &str, config: &ArchgenConfig, format: OutputFormat) -> Result<()> {
    let root = resolve_root(path)?;
    let report = update_performance_doc(&root, &config.lighthouse)
        .context("Failed to update Lighthouse scores")?;
    Output::new(LighthouseResult(report), format).render()
}
