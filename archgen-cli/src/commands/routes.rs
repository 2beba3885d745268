//! Routes command - list page files and the URL paths they serve

use anyhow::Result;
use archgen_core::structure::enumerate_routes;
use archgen_core::types::RouteEntry;
use colored::Colorize;
use serde::Serialize;

use super::resolve_root;
use crate::config::ArchgenConfig;
use crate::output::{Output, OutputFormat, TableDisplay, TableOutput};

#[derive(Debug, Serialize)]
pub struct RoutesResult {
    pub pages_dir: String,
    pub routes: Vec<RouteEntry>,
}

impl TableDisplay for RoutesResult {
    fn to_table(&self) -> String {
        let rows = self
            .routes
            .iter()
            .map(|r| vec![r.path.clone(), r.file.clone()])
            .collect();
        format!(
            "{} {} ({} routes)\n{}",
            "Routes in".cyan().bold(),
            self.pages_dir,
            self.routes.len(),
            TableOutput::format_rows(&["Path", "File"], rows)
        )
    }
}

pub async fn run(path: &str, config: &ArchgenConfig, format: OutputFormat) -> Result<()> {
    let root = resolve_root(path)?;
    let routes = enumerate_routes(&root, &config.source.pages);

    Output::new(
        RoutesResult {
            pages_dir: config.source.pages.clone(),
            routes,
        },
        format,
    )
    .render()
}
