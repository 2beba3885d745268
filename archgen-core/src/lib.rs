//! archgen core - project analysis and diagram synthesis.
//!
//! This crate turns the source tree of a static web project into
//! architecture documentation: component inventories, routes, code-level
//! structure, module dependency graphs, and C4/Mermaid diagram text.
//!
//! # Features
//!
//! - **Manifest parsing**: `package.json`, framework config, `wrangler.toml`
//!   and CI/CD workflows collapse into one [`ProjectConfig`]
//! - **AST extraction**: classes, interfaces and imports from TypeScript via tree-sitter
//! - **Diagram synthesis**: Mermaid flowcharts and class diagrams, C4-PlantUML
//! - **Dependency graphs**: `madge` output parsed into a petgraph module graph
//! - **Post-build tools**: CSP `_headers` generation and Lighthouse score upkeep
//!
//! Everything here is synchronous. Callers that run the external dependency
//! tool from async code should do so on a blocking thread.
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//! use archgen_core::{diagram, manifest, structure, types::ProjectDefaults};
//!
//! let root = Path::new(".");
//! let config = manifest::parse_project_config(root, &ProjectDefaults::default());
//! let components = structure::analyze_components(&root.join("src"));
//! let puml = diagram::c4::component_diagram(&components, &config);
//! println!("{puml}");
//! ```

pub mod csp;
pub mod depgraph;
pub mod diagram;
pub mod error;
pub mod extract;
pub mod lighthouse;
pub mod manifest;
pub mod scanner;
pub mod structure;
pub mod types;

pub use error::{ArchgenError, Result};
pub use types::{ComponentStructure, FileExtraction, ProjectConfig};
