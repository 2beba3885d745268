//! Config command - show what the manifests and workflows say about the project

use anyhow::Result;
use archgen_core::manifest::parse_project_config;
use archgen_core::ProjectConfig;
use colored::Colorize;
use serde::Serialize;

use super::resolve_root;
use crate::config::ArchgenConfig;
use crate::output::{Output, OutputFormat, TableDisplay, TableOutput};

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ConfigResult(pub ProjectConfig);

fn yes_no(flag: bool) -> String {
    let text = if flag { "yes" } else { "no" };
    text.to_string()
}

fn or_dash(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

impl TableDisplay for ConfigResult {
    fn to_table(&self) -> String {
        let c = &self.0;
        let ci = &c.ci;
        let pairs = [
            ("Name", c.name.clone()),
            ("Site URL", or_dash(&c.site_url)),
            ("Framework", c.framework.clone()),
            ("Build tool", c.build_tool.clone()),
            ("Hosting", c.hosting.clone()),
            ("Repository", c.repository.clone()),
            ("Dependencies", c.dependencies.len().to_string()),
            ("Integrations", or_dash(&c.integrations.join(", "))),
            ("CI platform", or_dash(&ci.platform)),
            ("Workflows", or_dash(&ci.workflows.join(", "))),
            ("Triggers", or_dash(&ci.triggers.join(", "))),
            ("Deploy target", or_dash(&ci.deploy_target)),
            ("Project name", or_dash(&ci.project_name)),
            ("Output dir", or_dash(&ci.output_dir)),
            ("Build command", or_dash(&ci.build_command)),
            ("Environment", or_dash(&ci.environment)),
            ("Lighthouse CI", yes_no(ci.features.lighthouse)),
            ("Tests", yes_no(ci.features.tests)),
            ("Build verification", yes_no(ci.features.build_verification)),
            ("Docs deployment", yes_no(ci.features.docs_deployment)),
        ];
        format!(
            "{}\n{}",
            "Project configuration".cyan().bold(),
            TableOutput::format_key_value(&pairs)
        )
    }
}

pub async fn run(path: &str, config: &ArchgenConfig, format: OutputFormat) -> Result<()> {
    let root = resolve_root(path)?;
    let project = parse_project_config(&root, &config.project);
    Output::new(ConfigResult(project), format).render()
}
