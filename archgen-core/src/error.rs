//! Error types for archgen-core.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for archgen-core operations.
pub type Result<T> = std::result::Result<T, ArchgenError>;

/// Errors that can occur while analysing a project or generating artifacts.
#[derive(Error, Debug)]
pub enum ArchgenError {
    /// A path that must exist was not found.
    #[error("Path does not exist: {}", path.display())]
    PathNotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// Tree-sitter could not be configured or produced no tree.
    #[error("Parse error in {path}: {message}")]
    Parse {
        /// File being parsed.
        path: String,
        /// Description of the failure.
        message: String,
    },

    /// A declaration could not be extracted from a syntax tree.
    #[error("Failed to extract {kind} {name}: {message}")]
    Extraction {
        /// Declaration kind (class, interface, import).
        kind: &'static str,
        /// Declaration name, `<anonymous>` when unnamed.
        name: String,
        /// Description of the failure.
        message: String,
    },

    /// The external dependency analysis tool failed.
    #[error("{tool} failed: {message}")]
    Tool {
        /// Tool command line, e.g. `npx madge --dot`.
        tool: String,
        /// Captured stderr or spawn error.
        message: String,
    },

    /// Input was readable but did not contain what the operation needs.
    #[error("{0}")]
    MissingInput(String),

    /// IO error reading or writing files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error for workflow files.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parsing error for deployment manifests.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}
