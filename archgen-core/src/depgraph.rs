//! Module dependency graph via the external `madge` tool.
//!
//! The tool runs twice per analysis: once for the circular-dependency
//! report (JSON) and once for the full graph (Graphviz DOT). Both outputs
//! are parsed here; the DOT edges feed a petgraph [`DependencyGraph`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use once_cell::sync::Lazy;
use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::diagram::module_dependency_diagram;
use crate::error::{ArchgenError, Result};

/// Module cycles, each listed as the module paths involved.
pub type CircularReport = Vec<Vec<String>>;

static DOT_EDGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]+)"\s*->\s*"([^"]+)""#).unwrap());

/// Source of raw dependency analysis output.
pub trait DependencyTool {
    /// Circular-dependency report as JSON text.
    fn circular_json(&self, src: &Path) -> Result<String>;

    /// Full dependency graph as Graphviz DOT text.
    fn dot(&self, src: &Path) -> Result<String>;
}

/// Settings for invoking madge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MadgeTool {
    /// Command line prefix, split on whitespace.
    pub command: String,
    /// Comma-separated file extensions.
    pub extensions: String,
    /// Exclude regex passed through to madge.
    pub exclude: String,
    /// Directory the tool runs in; the source path is relative to it.
    pub cwd: PathBuf,
}

impl Default for MadgeTool {
    fn default() -> Self {
        Self {
            command: "npx madge".to_string(),
            extensions: "ts,tsx,astro,jsx,js".to_string(),
            exclude: "node_modules|.astro".to_string(),
            cwd: PathBuf::from("."),
        }
    }
}

/// Exit status madge uses when it reports circular dependencies.
const CYCLES_FOUND_STATUS: i32 = 1;

impl MadgeTool {
    fn invocation(&self, mode: &[&str]) -> String {
        format!("{} {}", self.command, mode.join(" "))
    }

    fn execute(&self, mode: &[&str], src: &Path) -> Result<Output> {
        let mut parts = self.command.split_whitespace();
        let program = parts.next().ok_or_else(|| ArchgenError::Tool {
            tool: self.command.clone(),
            message: "empty command".to_string(),
        })?;

        let mut cmd = Command::new(program);
        cmd.args(parts)
            .args(mode)
            .arg("--extensions")
            .arg(&self.extensions);
        if !self.exclude.is_empty() {
            cmd.arg("--exclude").arg(&self.exclude);
        }
        cmd.arg(src).current_dir(&self.cwd);

        tracing::debug!("Running {} on {}", self.invocation(mode), src.display());

        cmd.output().map_err(|e| ArchgenError::Tool {
            tool: self.invocation(mode),
            message: e.to_string(),
        })
    }

    fn failure(&self, mode: &[&str], output: &Output) -> ArchgenError {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        ArchgenError::Tool {
            tool: self.invocation(mode),
            message: if stderr.is_empty() {
                format!("exited with {}", output.status)
            } else {
                stderr
            },
        }
    }

    fn run(&self, mode: &[&str], src: &Path) -> Result<String> {
        let output = self.execute(mode, src)?;
        if !output.status.success() {
            return Err(self.failure(mode, &output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl DependencyTool for MadgeTool {
    /// Exit status 1 with a JSON report on stdout means cycles were found,
    /// not that the run failed.
    fn circular_json(&self, src: &Path) -> Result<String> {
        let mode = ["--circular", "--json"];
        let output = self.execute(&mode, src)?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

        let reported_cycles = output.status.code() == Some(CYCLES_FOUND_STATUS)
            && serde_json::from_str::<Value>(&stdout).is_ok();
        if output.status.success() || reported_cycles {
            Ok(stdout)
        } else {
            Err(self.failure(&mode, &output))
        }
    }

    fn dot(&self, src: &Path) -> Result<String> {
        self.run(&["--dot"], src)
    }
}

/// Parse madge's circular output: an array of module paths per cycle, or
/// an object keyed by module.
pub fn parse_circular(json: &str) -> Result<CircularReport> {
    let value: Value = serde_json::from_str(json)?;
    let report = match value {
        Value::Array(cycles) => cycles
            .into_iter()
            .filter_map(|cycle| match cycle {
                Value::Array(modules) => Some(
                    modules
                        .into_iter()
                        .filter_map(|m| m.as_str().map(str::to_string))
                        .collect(),
                ),
                _ => None,
            })
            .collect(),
        Value::Object(modules) => modules.keys().map(|k| vec![k.clone()]).collect(),
        other => {
            return Err(ArchgenError::MissingInput(format!(
                "unexpected circular report shape: {}",
                other
            )))
        }
    };
    Ok(report)
}

/// Every `"a" -> "b"` edge in DOT text, in order.
pub fn parse_dot_edges(dot: &str) -> Vec<(String, String)> {
    DOT_EDGE
        .captures_iter(dot)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .collect()
}

/// Directed module graph.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Build from `(from, to)` edges; duplicate edges collapse.
    pub fn from_edges(edges: &[(String, String)]) -> Self {
        let mut graph = Self::default();
        for (from, to) in edges {
            let a = graph.node(from);
            let b = graph.node(to);
            graph.graph.update_edge(a, b, ());
        }
        graph
    }

    fn node(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.node_map.insert(name.to_string(), idx);
        idx
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Edges as module path pairs, in insertion order.
    pub fn edges(&self) -> Vec<(String, String)> {
        self.graph
            .edge_references()
            .map(|e| (self.graph[e.source()].clone(), self.graph[e.target()].clone()))
            .collect()
    }

    /// Modules that depend on each other, directly or transitively.
    ///
    /// Each cycle is sorted and the list of cycles is sorted.
    pub fn find_cycles(&self) -> CircularReport {
        let mut cycles: CircularReport = kosaraju_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0]))
            .map(|scc| {
                let mut names: Vec<String> =
                    scc.into_iter().map(|idx| self.graph[idx].clone()).collect();
                names.sort();
                names
            })
            .collect();
        cycles.sort();
        cycles
    }
}

/// Mermaid flowchart of the module graph.
pub fn dependency_diagram(graph: &DependencyGraph) -> String {
    module_dependency_diagram(&graph.edges())
}
