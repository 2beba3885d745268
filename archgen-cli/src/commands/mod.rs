//! Command implementations for archgen CLI
//!
//! Each command module provides a `run` function that executes the command logic.

pub mod csp;
pub mod docs;
pub mod extract;
pub mod lighthouse;
pub mod manifest;
pub mod routes;
pub mod structure;

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

/// Canonical project root, or an error naming the path.
pub(crate) fn resolve_root(path: &str) -> Result<PathBuf> {
    let root = Path::new(path);
    if !root.is_dir() {
        bail!("Project root does not exist: {}", path);
    }
    root.canonicalize()
        .with_context(|| format!("Failed to resolve {}", path))
}
