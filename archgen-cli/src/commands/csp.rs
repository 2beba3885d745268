//! CSP command - hash inline scripts of the build and write `_headers`

use anyhow::{Context, Result};
use archgen_core::csp::{generate_headers, CspReport};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

use crate::config::ArchgenConfig;
use crate::output::{Output, OutputFormat, TableDisplay};

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct CspResult(pub CspReport);

impl TableDisplay for CspResult {
    fn to_table(&self) -> String {
        let report = &self.0;
        let mut lines = vec![format!(
            "{} {} inline script hashes from {} HTML files",
            "Generated CSP header with".green().bold(),
            report.hashes.len(),
            report.html_files
        )];
        for hash in &report.hashes {
            lines.push(format!("  {}", hash.dimmed()));
        }
        lines.push(format!("  {}: {}", "Written".cyan(), report.output.display()));
        lines.join("\n")
    }
}

pub async fn run(dist: Option<&str>, config: &ArchgenConfig, format: OutputFormat) -> Result<()> {
    let dist = Path::new(dist.unwrap_or_else(|| config.csp_dist()));
    let report = generate_headers(dist, &config.csp_policy())
        .with_context(|| format!("Failed to generate CSP headers for {}", dist.display()))?;
    Output::new(CspResult(report), format).render()
}
