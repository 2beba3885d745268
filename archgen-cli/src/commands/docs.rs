//! Docs command - generate every architecture artifact in one run
//!
//! Stages run in a fixed order and each writes its artifacts as soon as
//! they exist. A failing stage is logged and recorded in the report; the
//! run continues with the next stage. Stages that need the project config
//! or the component structure always have one, because both producers fall
//! back to defaults instead of failing.

use anyhow::{bail, Context, Result};
use archgen_core::depgraph::{
    dependency_diagram, parse_circular, parse_dot_edges, CircularReport, DependencyGraph,
    DependencyTool,
};
use archgen_core::diagram::{
    class_diagram, component_diagram, container_diagram, routes_diagram, system_context_diagram,
};
use archgen_core::extract::parse_files;
use archgen_core::manifest::parse_project_config;
use archgen_core::scanner;
use archgen_core::structure::{analyze_components, enumerate_routes};
use archgen_core::{ComponentStructure, ProjectConfig};
use colored::Colorize;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use super::resolve_root;
use crate::config::ArchgenConfig;
use crate::output::{Output, OutputFormat, TableDisplay, TableOutput};

/// Marker that stops GitHub Pages from running Jekyll over the output.
pub const NOJEKYLL: &str = ".nojekyll";

/// Bundle visualizer config written at the project root.
pub const BUNDLE_CONFIG_FILE: &str = "rollup.config.js";

const CODE_EXTENSIONS: &[&str] = &["ts", "tsx"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Ok,
    Skipped,
    Failed,
}

/// Outcome of one pipeline stage.
#[derive(Debug, Serialize)]
pub struct StageReport {
    pub name: String,
    pub status: StageStatus,
    /// Files written, relative to the output directory (or project root
    /// for the bundle config).
    pub artifacts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Result of `archgen docs`.
#[derive(Debug, Serialize)]
pub struct DocsReport {
    pub output_dir: String,
    pub stages: Vec<StageReport>,
    pub duration_ms: u64,
}

impl DocsReport {
    pub fn failed(&self) -> usize {
        self.stages
            .iter()
            .filter(|s| s.status == StageStatus::Failed)
            .count()
    }

    pub fn artifacts(&self) -> impl Iterator<Item = &str> {
        self.stages
            .iter()
            .flat_map(|s| s.artifacts.iter().map(String::as_str))
    }
}

impl TableDisplay for DocsReport {
    fn to_table(&self) -> String {
        let rows = self
            .stages
            .iter()
            .map(|stage| {
                let status = match stage.status {
                    StageStatus::Ok => "ok".green().to_string(),
                    StageStatus::Skipped => "skipped".yellow().to_string(),
                    StageStatus::Failed => "failed".red().bold().to_string(),
                };
                vec![
                    stage.name.clone(),
                    status,
                    stage.artifacts.join("\n"),
                    stage.message.clone().unwrap_or_default(),
                ]
            })
            .collect();

        let headline = if self.failed() == 0 {
            "Architecture documentation generated".green().bold()
        } else {
            "Architecture documentation generated with errors".red().bold()
        };

        format!(
            "{}\n{}\n{}: {}\n{}",
            headline,
            TableOutput::format_rows(&["Stage", "Status", "Artifacts", "Note"], rows),
            "Output directory".cyan(),
            self.output_dir,
            format!("({} ms)", self.duration_ms).dimmed()
        )
    }
}

/// What a stage produced when it did not fail.
#[derive(Debug, Default)]
struct StageOutcome {
    artifacts: Vec<String>,
    message: Option<String>,
    skipped: bool,
}

impl StageOutcome {
    fn wrote(artifacts: Vec<String>) -> Self {
        Self {
            artifacts,
            ..Default::default()
        }
    }

    fn skipped(reason: impl Into<String>) -> Self {
        Self {
            message: Some(reason.into()),
            skipped: true,
            ..Default::default()
        }
    }

    fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Raw dependency analysis before anything is written.
#[derive(Debug)]
pub struct DependencyAnalysis {
    pub cycles: CircularReport,
    /// DOT text, absent when the graph run failed.
    pub dot: Option<String>,
}

/// Run both dependency tool passes over `src`.
///
/// The circular check must succeed; a failed graph pass only drops the
/// DOT output.
pub fn analyze_dependencies<T: DependencyTool>(
    tool: &T,
    src: &Path,
) -> archgen_core::Result<DependencyAnalysis> {
    let cycles = parse_circular(&tool.circular_json(src)?)?;
    let dot = match tool.dot(src) {
        Ok(dot) => Some(dot),
        Err(e) => {
            tracing::warn!("Skipping DOT graph generation: {}", e);
            None
        }
    };
    Ok(DependencyAnalysis { cycles, dot })
}

/// Rollup visualizer config pointing at `output_dir`.
pub fn bundle_config(output_dir: &str) -> String {
    format!(
        r#"import {{ visualizer }} from 'rollup-plugin-visualizer';

export default {{
  plugins: [
    visualizer({{
      filename: './{}/bundle-stats.html',
      open: false,
      gzipSize: true,
      brotliSize: true,
      template: 'treemap'
    }})
  ]
}};
"#,
        output_dir.trim_start_matches("./").trim_end_matches('/')
    )
}

struct Pipeline<'a> {
    root: PathBuf,
    out: PathBuf,
    config: &'a ArchgenConfig,
    stages: Vec<StageReport>,
}

impl Pipeline<'_> {
    fn record(&mut self, name: &str, result: Result<StageOutcome>) {
        let report = match result {
            Ok(outcome) => {
                tracing::info!("{}: {} artifacts", name, outcome.artifacts.len());
                StageReport {
                    name: name.to_string(),
                    status: if outcome.skipped {
                        StageStatus::Skipped
                    } else {
                        StageStatus::Ok
                    },
                    artifacts: outcome.artifacts,
                    message: outcome.message,
                }
            }
            Err(e) => {
                tracing::error!("Failed to generate {}: {:#}", name, e);
                StageReport {
                    name: name.to_string(),
                    status: StageStatus::Failed,
                    artifacts: Vec::new(),
                    message: Some(format!("{:#}", e)),
                }
            }
        };
        self.stages.push(report);
    }

    async fn write(&self, name: &str, contents: impl AsRef<[u8]>) -> Result<String> {
        let path = self.out.join(name);
        tokio::fs::write(&path, contents)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(name.to_string())
    }

    async fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<String> {
        let json = serde_json::to_string_pretty(value)?;
        self.write(name, json).await
    }

    async fn dependency_graph(&self) -> Result<StageOutcome> {
        if !self.config.madge.enabled {
            return Ok(StageOutcome::skipped("disabled by [madge] enabled = false"));
        }

        let tool = self.config.madge_tool(&self.root);
        let src = PathBuf::from(&self.config.source.root);
        let analysis = tokio::task::spawn_blocking(move || analyze_dependencies(&tool, &src))
            .await
            .context("Dependency analysis task panicked")??;

        let mut artifacts = Vec::new();
        let graph = analysis
            .dot
            .as_deref()
            .map(|dot| DependencyGraph::from_edges(&parse_dot_edges(dot)));

        // madge is authoritative; the graph only fills in when it saw none
        let cycles = match (&graph, analysis.cycles.is_empty()) {
            (Some(graph), true) => graph.find_cycles(),
            _ => analysis.cycles,
        };
        if !cycles.is_empty() {
            tracing::warn!("Circular dependencies detected: {}", cycles.len());
            artifacts.push(self.write_json("circular-dependencies.json", &cycles).await?);
        }

        let (Some(dot), Some(graph)) = (analysis.dot, graph) else {
            return Ok(StageOutcome::wrote(artifacts)
                .with_message("DOT graph skipped, dependency tool failed"));
        };
        artifacts.push(self.write("dependencies.dot", dot).await?);
        artifacts.push(
            self.write("module-dependencies.mmd", dependency_diagram(&graph))
                .await?,
        );

        let message = format!("{} modules, {} edges", graph.node_count(), graph.edge_count());
        Ok(StageOutcome::wrote(artifacts).with_message(message))
    }

    async fn bundle_analysis(&self) -> Result<StageOutcome> {
        let path = self.root.join(BUNDLE_CONFIG_FILE);
        tokio::fs::write(&path, bundle_config(&self.config.output.dir))
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(StageOutcome::wrote(vec![BUNDLE_CONFIG_FILE.to_string()])
            .with_message("run the build to produce bundle-stats.html"))
    }

    async fn routes(&self) -> Result<StageOutcome> {
        let routes = enumerate_routes(&self.root, &self.config.source.pages);
        let artifacts = vec![
            self.write("routes-map.mmd", routes_diagram(&routes)).await?,
            self.write_json("routes.json", &routes).await?,
        ];
        Ok(StageOutcome::wrote(artifacts).with_message(format!("{} routes", routes.len())))
    }

    async fn project_config(&self, project: &ProjectConfig) -> Result<StageOutcome> {
        let artifact = self.write_json("project-config.json", project).await?;
        Ok(StageOutcome::wrote(vec![artifact]))
    }

    async fn component_structure(&self, structure: &ComponentStructure) -> Result<StageOutcome> {
        let artifact = self
            .write_json("component-structure.json", structure)
            .await?;
        Ok(StageOutcome::wrote(vec![artifact])
            .with_message(format!("{} files", structure.total())))
    }

    async fn code_structure(&self) -> Result<StageOutcome> {
        let mut seen = HashSet::new();
        let mut relative = Vec::new();
        let mut absolute = Vec::new();

        for dir in &self.config.extract.dirs {
            let dir = dir.trim_end_matches('/');
            let abs = self.root.join(dir);
            if !abs.is_dir() {
                tracing::warn!("Extraction directory not found: {}", abs.display());
                continue;
            }
            let scan = scanner::scan_directory(&abs, Some(CODE_EXTENSIONS), &[])?;
            for file in scan.files {
                let rel = format!("{}/{}", dir, file.path);
                if seen.insert(rel.clone()) {
                    relative.push(rel);
                    absolute.push(file.absolute);
                }
            }
        }

        let files: Vec<_> = parse_files(&absolute, &self.config.extract_options())
            .into_iter()
            .zip(&relative)
            .map(|(extraction, rel)| extraction.with_path(rel))
            .collect();

        let classes: usize = files.iter().map(|f| f.classes.len()).sum();
        let interfaces: usize = files.iter().map(|f| f.interfaces.len()).sum();
        let artifacts = vec![
            self.write_json("code-structure.json", &files).await?,
            self.write("class-diagram.mmd", class_diagram(&files)).await?,
        ];
        Ok(StageOutcome::wrote(artifacts).with_message(format!(
            "{} files, {} classes, {} interfaces",
            files.len(),
            classes,
            interfaces
        )))
    }

    async fn diagram(&self, name: &str, text: String) -> Result<StageOutcome> {
        Ok(StageOutcome::wrote(vec![self.write(name, text).await?]))
    }
}

/// Run every stage for the project at `root`, writing into `out`.
///
/// # Errors
///
/// Fails only when the output directory cannot be created; stage failures
/// are recorded in the report.
pub async fn generate(root: &Path, out: &Path, config: &ArchgenConfig) -> Result<DocsReport> {
    let start = Instant::now();

    tokio::fs::create_dir_all(out)
        .await
        .with_context(|| format!("Failed to create output directory {}", out.display()))?;

    let mut pipeline = Pipeline {
        root: root.to_path_buf(),
        out: out.to_path_buf(),
        config,
        stages: Vec::new(),
    };

    tracing::info!("Generating architecture documentation in {}", out.display());

    let result = pipeline.write(NOJEKYLL, "").await.map(|a| StageOutcome::wrote(vec![a]));
    pipeline.record("marker", result);

    let result = pipeline.dependency_graph().await;
    pipeline.record("dependency graph", result);

    let result = pipeline.bundle_analysis().await;
    pipeline.record("bundle analysis", result);

    let result = pipeline.routes().await;
    pipeline.record("routes map", result);

    let project = parse_project_config(root, &config.project);
    let result = pipeline.project_config(&project).await;
    pipeline.record("project config", result);

    let structure = analyze_components(&root.join(&config.source.root));
    let result = pipeline.component_structure(&structure).await;
    pipeline.record("component structure", result);

    let result = pipeline.code_structure().await;
    pipeline.record("code structure", result);

    let result = pipeline
        .diagram("c4-system-context.puml", system_context_diagram(&project))
        .await;
    pipeline.record("c4 system context", result);

    let result = pipeline
        .diagram("c4-container.puml", container_diagram(&project))
        .await;
    pipeline.record("c4 container", result);

    let result = pipeline
        .diagram("c4-component.puml", component_diagram(&structure, &project))
        .await;
    pipeline.record("c4 component", result);

    Ok(DocsReport {
        output_dir: out.display().to_string(),
        stages: pipeline.stages,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

pub async fn run(
    path: &str,
    out: Option<&str>,
    config: &ArchgenConfig,
    format: OutputFormat,
) -> Result<()> {
    let root = resolve_root(path)?;
    let out_dir = match out {
        Some(dir) => PathBuf::from(dir),
        None => config.output_dir(&root),
    };

    let report = generate(&root, &out_dir, config).await?;
    let failed = report.failed();
    let total = report.stages.len();
    Output::new(report, format).render()?;

    if failed > 0 {
        bail!("{} of {} documentation stages failed", failed, total);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use archgen_core::ArchgenError;
    use std::fs;
    use tempfile::TempDir;

    const DOT: &str = r#"digraph G {
  "pages/index.astro" -> "components/Nav.tsx";
  "components/Nav.tsx" -> "utils/theme.ts";
}
"#;

    struct CannedTool {
        circular: &'static str,
        dot: Option<&'static str>,
    }

    impl DependencyTool for CannedTool {
        fn circular_json(&self, _src: &Path) -> archgen_core::Result<String> {
            Ok(self.circular.to_string())
        }

        fn dot(&self, _src: &Path) -> archgen_core::Result<String> {
            self.dot.map(str::to_string).ok_or_else(|| ArchgenError::Tool {
                tool: "madge --dot".to_string(),
                message: "graphviz missing".to_string(),
            })
        }
    }

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn no_madge() -> ArchgenConfig {
        toml::from_str("[madge]\nenabled = false\n").unwrap()
    }

    fn sample_project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(
            root,
            "package.json",
            r#"{"name": "portfolio", "dependencies": {"astro": "^4", "react": "^18"}}"#,
        );
        write(root, "src/pages/index.astro", "---\n---\n<h1>Home</h1>");
        write(root, "src/pages/about/index.astro", "<h1>About</h1>");
        write(root, "src/components/Nav.tsx", "export const Nav = () => null;");
        write(
            root,
            "src/services/ThemeManager.ts",
            "export class ThemeManager implements IThemeManager { init(): void {} }",
        );
        dir
    }

    #[test]
    fn test_analyze_dependencies() {
        let tool = CannedTool {
            circular: r#"[["a.ts", "b.ts"]]"#,
            dot: Some(DOT),
        };
        let analysis = analyze_dependencies(&tool, Path::new("src")).unwrap();
        assert_eq!(analysis.cycles, vec![vec!["a.ts".to_string(), "b.ts".to_string()]]);
        assert!(analysis.dot.is_some());
    }

    #[test]
    fn test_dot_failure_is_not_fatal() {
        let tool = CannedTool {
            circular: "[]",
            dot: None,
        };
        let analysis = analyze_dependencies(&tool, Path::new("src")).unwrap();
        assert!(analysis.cycles.is_empty());
        assert!(analysis.dot.is_none());
    }

    #[test]
    fn test_bad_circular_output_fails() {
        let tool = CannedTool {
            circular: "Error: cannot find module",
            dot: Some(DOT),
        };
        assert!(analyze_dependencies(&tool, Path::new("src")).is_err());
    }

    #[test]
    fn test_bundle_config() {
        let text = bundle_config("docs/architecture/");
        assert!(text.starts_with("import { visualizer } from 'rollup-plugin-visualizer';"));
        assert!(text.contains("filename: './docs/architecture/bundle-stats.html',"));
        assert!(text.contains("template: 'treemap'"));
    }

    #[tokio::test]
    async fn test_generate_writes_all_artifacts() {
        let project = sample_project();
        let out = project.path().join("docs/architecture");

        let report = generate(project.path(), &out, &no_madge()).await.unwrap();

        assert_eq!(report.failed(), 0);
        assert_eq!(report.stages.len(), 10);
        assert_eq!(report.stages[1].status, StageStatus::Skipped);

        for name in [
            NOJEKYLL,
            "routes-map.mmd",
            "routes.json",
            "project-config.json",
            "component-structure.json",
            "code-structure.json",
            "class-diagram.mmd",
            "c4-system-context.puml",
            "c4-container.puml",
            "c4-component.puml",
        ] {
            assert!(out.join(name).exists(), "missing {}", name);
        }
        assert!(project.path().join(BUNDLE_CONFIG_FILE).exists());
        assert!(!out.join("module-dependencies.mmd").exists());

        let routes: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join("routes.json")).unwrap()).unwrap();
        let paths: Vec<&str> = routes
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["path"].as_str().unwrap())
            .collect();
        assert_eq!(paths, vec!["/about/", "/"]);

        let code = fs::read_to_string(out.join("code-structure.json")).unwrap();
        assert!(code.contains("\"file_path\": \"src/services/ThemeManager.ts\""));

        let container = fs::read_to_string(out.join("c4-container.puml")).unwrap();
        assert!(container.contains("islands"));

        let context = fs::read_to_string(out.join("c4-system-context.puml")).unwrap();
        assert!(!context.contains("lighthouse"));
    }

    #[tokio::test]
    async fn test_failed_tool_is_recorded_and_run_continues() {
        let project = sample_project();
        let out = project.path().join("out");
        let config: ArchgenConfig =
            toml::from_str("[madge]\ncommand = \"archgen-no-such-tool-xyz\"\n").unwrap();

        let report = generate(project.path(), &out, &config).await.unwrap();

        assert_eq!(report.failed(), 1);
        assert_eq!(report.stages[1].status, StageStatus::Failed);
        assert!(report.stages[1].message.is_some());
        assert!(out.join("c4-component.puml").exists());
        assert!(report.artifacts().any(|a| a == "routes.json"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_reported_cycles_are_written() {
        let project = sample_project();
        let out = project.path().join("out");
        write(
            project.path(),
            "madge.sh",
            "case \"$*\" in\n  *--circular*) echo '[[\"a.ts\",\"b.ts\"]]'; exit 1 ;;\n  *) printf 'digraph G {\\n  \"a.ts\" -> \"b.ts\";\\n  \"b.ts\" -> \"a.ts\";\\n}\\n' ;;\nesac\n",
        );
        let config: ArchgenConfig =
            toml::from_str("[madge]\ncommand = \"sh madge.sh\"\n").unwrap();

        let report = generate(project.path(), &out, &config).await.unwrap();

        assert_eq!(report.failed(), 0);
        assert_eq!(report.stages[1].status, StageStatus::Ok);
        let cycles: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(out.join("circular-dependencies.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(cycles, serde_json::json!([["a.ts", "b.ts"]]));
        assert!(out.join("dependencies.dot").exists());
        let diagram = fs::read_to_string(out.join("module-dependencies.mmd")).unwrap();
        assert!(diagram.contains("a_ts"));
    }
}
