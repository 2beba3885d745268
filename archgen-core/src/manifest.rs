//! Project manifest and CI/CD configuration parsing.
//!
//! [`parse_project_config`] reads up to five files from the project root and
//! folds them into one [`ProjectConfig`]. Every file is optional and every
//! read is guarded on its own: a missing or malformed file logs a warning
//! and leaves the defaults for the fields it would have supplied.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;
use tree_sitter::{Node, Parser};

use crate::error::{ArchgenError, Result};
use crate::types::{CiCdConfig, ProjectConfig, ProjectDefaults};

/// Framework config candidates, first match wins.
pub const FRAMEWORK_CONFIG_FILES: &[&str] =
    &["astro.config.mjs", "astro.config.ts", "astro.config.js"];

pub const DEPLOYMENT_MANIFEST: &str = "wrangler.toml";
pub const DEPLOY_WORKFLOW: &str = ".github/workflows/deploy.yml";
pub const CI_WORKFLOW: &str = ".github/workflows/ci.yml";

const CLOUDFLARE_PAGES: &str = "Cloudflare Pages";
const GITHUB_ACTIONS: &str = "GitHub Actions";
const BUILD_COMMAND: &str = "npm run build";

/// Trigger events reported for the deploy workflow.
const TRACKED_TRIGGERS: &[&str] = &["workflow_run", "workflow_dispatch", "push"];

/// Dependency name to framework label, checked in order.
const FRAMEWORKS: &[(&str, &str)] = &[
    ("astro", "Astro"),
    ("next", "Next.js"),
    ("@sveltejs/kit", "SvelteKit"),
    ("nuxt", "Nuxt"),
];

/// Dependency name to build tool label, checked in order.
const BUILD_TOOLS: &[(&str, &str)] = &[
    ("vite", "Vite"),
    ("webpack", "Webpack"),
    ("rollup", "Rollup"),
    ("esbuild", "esbuild"),
];

/// Build the project configuration for `root`. Never fails.
pub fn parse_project_config(root: &Path, defaults: &ProjectDefaults) -> ProjectConfig {
    let mut config = ProjectConfig::with_defaults(defaults);

    match read_json(&root.join("package.json")) {
        Ok(Some(manifest)) => apply_package_json(&mut config, &manifest),
        Ok(None) => tracing::warn!("No package.json in {}", root.display()),
        Err(e) => tracing::warn!("Could not read package.json: {}", e),
    }

    if let Some(path) = FRAMEWORK_CONFIG_FILES
        .iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
    {
        match fs::read_to_string(&path) {
            Ok(source) => apply_framework_config(&mut config, &source),
            Err(e) => tracing::warn!("Could not read {}: {}", path.display(), e),
        }
    }

    match read_yaml(&root.join(DEPLOY_WORKFLOW)) {
        Ok(Some(workflow)) => apply_deploy_workflow(&mut config.ci, &workflow),
        Ok(None) => tracing::debug!("No deploy workflow"),
        Err(e) => tracing::warn!("Could not parse {}: {}", DEPLOY_WORKFLOW, e),
    }

    match read_yaml(&root.join(CI_WORKFLOW)) {
        Ok(Some(workflow)) => apply_ci_workflow(&mut config.ci, &workflow),
        Ok(None) => tracing::debug!("No CI workflow"),
        Err(e) => tracing::warn!("Could not parse {}: {}", CI_WORKFLOW, e),
    }

    // Wrangler only fills what the workflows left blank.
    match read_toml(&root.join(DEPLOYMENT_MANIFEST)) {
        Ok(Some(manifest)) => apply_wrangler(&mut config, &manifest),
        Ok(None) => tracing::debug!("No {}", DEPLOYMENT_MANIFEST),
        Err(e) => tracing::warn!("Could not parse {}: {}", DEPLOYMENT_MANIFEST, e),
    }

    config
}

// ============================================================================
// Readers
// ============================================================================

fn read_optional(path: &Path) -> Result<Option<String>> {
    if !path.is_file() {
        return Ok(None);
    }
    Ok(Some(fs::read_to_string(path)?))
}

fn read_json(path: &Path) -> Result<Option<JsonValue>> {
    read_optional(path)?
        .map(|text| serde_json::from_str(&text).map_err(ArchgenError::from))
        .transpose()
}

fn read_yaml(path: &Path) -> Result<Option<YamlValue>> {
    read_optional(path)?
        .map(|text| serde_yaml::from_str(&text).map_err(ArchgenError::from))
        .transpose()
}

fn read_toml(path: &Path) -> Result<Option<toml::Table>> {
    read_optional(path)?
        .map(|text| text.parse::<toml::Table>().map_err(ArchgenError::from))
        .transpose()
}

// ============================================================================
// package.json
// ============================================================================

fn apply_package_json(config: &mut ProjectConfig, manifest: &JsonValue) {
    if let Some(name) = manifest.get("name").and_then(JsonValue::as_str) {
        if !name.is_empty() {
            config.name = name.to_string();
        }
    }

    let repository = match manifest.get("repository") {
        Some(JsonValue::String(url)) => Some(url.as_str()),
        Some(JsonValue::Object(repo)) => repo.get("url").and_then(JsonValue::as_str),
        _ => None,
    };
    if let Some(url) = repository {
        config.repository = repository_label(url);
    }

    config.dependencies = merge_dependencies(manifest);

    if let Some((_, label)) = FRAMEWORKS
        .iter()
        .find(|(dep, _)| config.dependencies.contains_key(*dep))
    {
        config.framework = label.to_string();
    }
    if let Some((_, label)) = BUILD_TOOLS
        .iter()
        .find(|(dep, _)| config.dependencies.contains_key(*dep))
    {
        config.build_tool = label.to_string();
    }
}

/// Hosting label for a repository URL.
pub fn repository_label(url: &str) -> String {
    if url.contains("github.com") {
        "GitHub".to_string()
    } else if url.contains("gitlab.com") {
        "GitLab".to_string()
    } else {
        url.to_string()
    }
}

/// Runtime dependencies, then dev dependencies that are not already present.
fn merge_dependencies(manifest: &JsonValue) -> BTreeMap<String, String> {
    let mut merged = BTreeMap::new();
    for table in ["dependencies", "devDependencies"] {
        let Some(entries) = manifest.get(table).and_then(JsonValue::as_object) else {
            continue;
        };
        for (name, version) in entries {
            merged
                .entry(name.clone())
                .or_insert_with(|| version.as_str().unwrap_or_default().to_string());
        }
    }
    merged
}

// ============================================================================
// astro.config.*
// ============================================================================

fn apply_framework_config(config: &mut ProjectConfig, source: &str) {
    let mut parser = Parser::new();
    if let Err(e) = parser.set_language(&tree_sitter_javascript::LANGUAGE.into()) {
        tracing::warn!("Failed to load JavaScript grammar: {}", e);
        return;
    }
    let Some(tree) = parser.parse(source, None) else {
        tracing::warn!("Failed to parse framework config");
        return;
    };
    let root = tree.root_node();

    if let Some(site) = find_site_url(&root, source) {
        config.site_url = site;
    }

    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        if child.kind() != "import_statement" {
            continue;
        }
        let Some(specifier) = child
            .child_by_field_name("source")
            .map(|s| unquote(node_text(&s, source)))
        else {
            continue;
        };
        if is_scoped_package(&specifier) && !config.integrations.contains(&specifier) {
            config.integrations.push(specifier);
        }
    }
}

/// First `site: '<literal>'` pair anywhere in the file.
fn find_site_url(node: &Node, source: &str) -> Option<String> {
    if node.kind() == "pair" {
        let key = node.child_by_field_name("key").map(|k| unquote(node_text(&k, source)));
        let value = node.child_by_field_name("value");
        if let (Some("site"), Some(value)) = (key.as_deref(), value) {
            if value.kind() == "string" {
                return Some(unquote(node_text(&value, source)));
            }
        }
    }

    let mut cursor = node.walk();
    let children: Vec<Node> = node.named_children(&mut cursor).collect();
    children
        .iter()
        .find_map(|child| find_site_url(child, source))
}

fn is_scoped_package(specifier: &str) -> bool {
    specifier
        .strip_prefix('@')
        .and_then(|rest| rest.split_once('/'))
        .is_some_and(|(scope, name)| !scope.is_empty() && !name.is_empty())
}

fn node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    source.get(node.start_byte()..node.end_byte()).unwrap_or("")
}

fn unquote(text: &str) -> String {
    text.trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .to_string()
}

// ============================================================================
// wrangler.toml
// ============================================================================

fn apply_wrangler(config: &mut ProjectConfig, manifest: &toml::Table) {
    let output_dir = manifest
        .get("pages_build_output_dir")
        .and_then(toml::Value::as_str);

    if output_dir.is_some() || manifest.contains_key("site") || manifest.contains_key("pages") {
        config.hosting = CLOUDFLARE_PAGES.to_string();
    }

    if config.ci.project_name.is_empty() {
        if let Some(name) = manifest.get("name").and_then(toml::Value::as_str) {
            config.ci.project_name = name.to_string();
        }
    }
    if config.ci.output_dir.is_empty() {
        if let Some(dir) = output_dir {
            config.ci.output_dir = dir.to_string();
        }
    }
}

// ============================================================================
// GitHub Actions workflows
// ============================================================================

fn apply_deploy_workflow(ci: &mut CiCdConfig, workflow: &YamlValue) {
    ci.platform = GITHUB_ACTIONS.to_string();
    ci.workflows.push(workflow_name(workflow, "deploy"));

    for trigger in workflow_triggers(workflow) {
        if TRACKED_TRIGGERS.contains(&trigger.as_str()) && !ci.triggers.contains(&trigger) {
            ci.triggers.push(trigger);
        }
    }

    for job in jobs(workflow) {
        if ci.environment.is_empty() {
            match job.get("environment") {
                Some(YamlValue::String(env)) => ci.environment = env.clone(),
                Some(env) => {
                    if let Some(name) = env.get("name").and_then(YamlValue::as_str) {
                        ci.environment = name.to_string();
                    }
                }
                None => {}
            }
        }

        for step in steps(job) {
            if let Some(uses) = step.get("uses").and_then(YamlValue::as_str) {
                if uses.contains("cloudflare/pages-action")
                    || uses.contains("cloudflare/wrangler-action")
                {
                    ci.deploy_target = CLOUDFLARE_PAGES.to_string();
                    let with = step.get("with");
                    if let Some(project) = with
                        .and_then(|w| w.get("projectName"))
                        .and_then(YamlValue::as_str)
                    {
                        ci.project_name = project.to_string();
                    }
                    if let Some(dir) = with
                        .and_then(|w| w.get("directory"))
                        .and_then(YamlValue::as_str)
                    {
                        ci.output_dir = dir.to_string();
                    }
                }
            }
            if let Some(run) = step.get("run").and_then(YamlValue::as_str) {
                if run.contains(BUILD_COMMAND) {
                    ci.build_command = BUILD_COMMAND.to_string();
                }
            }
        }
    }
}

fn apply_ci_workflow(ci: &mut CiCdConfig, workflow: &YamlValue) {
    ci.platform = GITHUB_ACTIONS.to_string();
    ci.workflows.push(workflow_name(workflow, "ci"));

    for job in jobs(workflow) {
        for step in steps(job) {
            let text = ["uses", "run", "name"]
                .iter()
                .filter_map(|key| step.get(*key).and_then(YamlValue::as_str))
                .collect::<Vec<_>>()
                .join("\n")
                .to_lowercase();

            if text.contains("lighthouse") || text.contains("lhci") {
                ci.features.lighthouse = true;
            }
            if text.contains("npm test") || text.contains("npm run test") {
                ci.features.tests = true;
            }
            if text.contains(BUILD_COMMAND) {
                ci.features.build_verification = true;
            }
            if text.contains("deploy-pages")
                || text.contains("gh-pages")
                || text.contains("upload-pages-artifact")
            {
                ci.features.docs_deployment = true;
            }
        }
    }
}

fn workflow_name(workflow: &YamlValue, fallback: &str) -> String {
    workflow
        .get("name")
        .and_then(YamlValue::as_str)
        .unwrap_or(fallback)
        .to_string()
}

/// Event names under `on:` in any of its three shapes.
fn workflow_triggers(workflow: &YamlValue) -> Vec<String> {
    // YAML 1.1 readers turn a bare `on` key into `true`
    let on = workflow.as_mapping().and_then(|root| {
        root.iter()
            .find(|(key, _)| key.as_str() == Some("on") || key.as_bool() == Some(true))
            .map(|(_, value)| value)
    });

    match on {
        Some(YamlValue::String(event)) => vec![event.clone()],
        Some(YamlValue::Sequence(events)) => events
            .iter()
            .filter_map(YamlValue::as_str)
            .map(str::to_string)
            .collect(),
        Some(YamlValue::Mapping(events)) => events
            .keys()
            .filter_map(YamlValue::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn jobs(workflow: &YamlValue) -> impl Iterator<Item = &YamlValue> {
    workflow
        .get("jobs")
        .and_then(YamlValue::as_mapping)
        .into_iter()
        .flat_map(|jobs| jobs.values())
}

fn steps(job: &YamlValue) -> impl Iterator<Item = &YamlValue> {
    job.get("steps")
        .and_then(YamlValue::as_sequence)
        .into_iter()
        .flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PACKAGE_JSON: &str = r#"{
  "name": "portfolio",
  "repository": { "type": "git", "url": "https://github.com/example/portfolio.git" },
  "dependencies": { "astro": "^5.0.0", "react": "^19.0.0", "mermaid": "^11.0.0" },
  "devDependencies": { "vite": "^6.0.0", "react": "^18.0.0", "@tailwindcss/vite": "^4.0.0" }
}"#;

    const ASTRO_CONFIG: &str = r#"
import { defineConfig } from 'astro/config';
import react from '@astrojs/react';
import sitemap from '@astrojs/sitemap';
import tailwindcss from '@tailwindcss/vite';

export default defineConfig({
  site: 'https://example.dev',
  integrations: [react(), sitemap()],
  vite: { plugins: [tailwindcss()] },
});
"#;

    const DEPLOY_YML: &str = r#"
name: Deploy to Cloudflare Pages
on:
  workflow_run:
    workflows: [CI]
    types: [completed]
  workflow_dispatch:
  pull_request:
jobs:
  deploy:
    runs-on: ubuntu-latest
    environment:
      name: production
    steps:
      - uses: actions/checkout@v4
      - run: npm ci && npm run build
      - uses: cloudflare/pages-action@v1
        with:
          projectName: portfolio-site
          directory: dist
"#;

    const CI_YML: &str = r#"
name: CI
on: [push, pull_request]
jobs:
  test:
    runs-on: ubuntu-latest
    steps:
      - run: npm test
      - run: npm run build
      - name: Run Lighthouse CI
        run: npx @lhci/cli autorun
  docs:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/upload-pages-artifact@v3
      - uses: actions/deploy-pages@v4
"#;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_empty_project_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = parse_project_config(dir.path(), &ProjectDefaults::default());

        assert_eq!(config.name, "website");
        assert_eq!(config.hosting, "Static Hosting");
        assert_eq!(config.repository, "Git Repository");
        assert_eq!(config.framework, "Astro");
        assert_eq!(config.build_tool, "Vite");
        assert!(config.site_url.is_empty());
        assert!(config.dependencies.is_empty());
        assert!(!config.ci.has_workflows());
    }

    #[test]
    fn test_package_json() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "package.json", PACKAGE_JSON);
        let config = parse_project_config(dir.path(), &ProjectDefaults::default());

        assert_eq!(config.name, "portfolio");
        assert_eq!(config.repository, "GitHub");
        assert!(config.has_dependency("mermaid"));
        assert!(config.has_dependency("@tailwindcss/vite"));
        // runtime entry wins over the dev entry
        assert_eq!(config.dependencies["react"], "^19.0.0");
        assert_eq!(config.framework, "Astro");
        assert_eq!(config.build_tool, "Vite");
    }

    #[test]
    fn test_malformed_package_json_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "package.json", "{ not json");
        let config = parse_project_config(dir.path(), &ProjectDefaults::default());
        assert_eq!(config.name, "website");
    }

    #[test]
    fn test_framework_config() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "astro.config.mjs", ASTRO_CONFIG);
        let config = parse_project_config(dir.path(), &ProjectDefaults::default());

        assert_eq!(config.site_url, "https://example.dev");
        assert_eq!(
            config.integrations,
            vec!["@astrojs/react", "@astrojs/sitemap", "@tailwindcss/vite"]
        );
    }

    #[test]
    fn test_workflows() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), DEPLOY_WORKFLOW, DEPLOY_YML);
        write(dir.path(), CI_WORKFLOW, CI_YML);
        let config = parse_project_config(dir.path(), &ProjectDefaults::default());
        let ci = &config.ci;

        assert_eq!(ci.platform, "GitHub Actions");
        assert_eq!(ci.workflows, vec!["Deploy to Cloudflare Pages", "CI"]);
        assert_eq!(ci.triggers, vec!["workflow_run", "workflow_dispatch"]);
        assert_eq!(ci.deploy_target, "Cloudflare Pages");
        assert_eq!(ci.project_name, "portfolio-site");
        assert_eq!(ci.output_dir, "dist");
        assert_eq!(ci.build_command, "npm run build");
        assert_eq!(ci.environment, "production");

        assert!(ci.features.lighthouse);
        assert!(ci.features.tests);
        assert!(ci.features.build_verification);
        assert!(ci.features.docs_deployment);
    }

    #[test]
    fn test_unparseable_workflow_is_skipped() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), DEPLOY_WORKFLOW, "jobs: [unclosed");
        write(dir.path(), CI_WORKFLOW, CI_YML);
        let config = parse_project_config(dir.path(), &ProjectDefaults::default());

        assert_eq!(config.ci.workflows, vec!["CI"]);
        assert!(config.ci.deploy_target.is_empty());
    }

    #[test]
    fn test_wrangler_fills_blanks() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            DEPLOYMENT_MANIFEST,
            "name = \"from-wrangler\"\npages_build_output_dir = \"./dist\"\n",
        );
        let config = parse_project_config(dir.path(), &ProjectDefaults::default());

        assert_eq!(config.hosting, "Cloudflare Pages");
        assert_eq!(config.ci.project_name, "from-wrangler");
        assert_eq!(config.ci.output_dir, "./dist");
    }

    #[test]
    fn test_repository_label() {
        assert_eq!(repository_label("git+https://github.com/a/b.git"), "GitHub");
        assert_eq!(repository_label("https://gitlab.com/a/b"), "GitLab");
        assert_eq!(repository_label("https://example.org/repo"), "https://example.org/repo");
    }

    #[test]
    fn test_is_scoped_package() {
        assert!(is_scoped_package("@astrojs/react"));
        assert!(!is_scoped_package("astro/config"));
        assert!(!is_scoped_package("@astrojs"));
    }
}
