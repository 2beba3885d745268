//! Gitignore-aware file discovery using the `ignore` crate.
//!
//! Every stage that needs files from the source tree goes through
//! [`scan_directory`]: the component analyzer, the route enumerator and the
//! code-structure stage. Walk order is sorted by file name so repeated runs
//! over the same tree produce the same output.
//!
//! Besides `.gitignore`, a project may drop an `.archgenignore` file anywhere
//! in the tree to hide files from documentation.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};

use crate::error::{ArchgenError, Result};

/// Extensions that count as source files for the structure analyzer.
pub const SOURCE_EXTENSIONS: &[&str] = &[
    "ts", "tsx", "mts", "cts", "astro", "jsx", "js", "mjs", "cjs",
];

/// Extensions that produce routes under the pages directory.
pub const ROUTE_EXTENSIONS: &[&str] = &["astro", "md"];

/// Type tag from file extension.
pub fn detect_kind(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?;
    match ext.to_lowercase().as_str() {
        "ts" | "mts" | "cts" => Some("typescript"),
        "tsx" | "jsx" => Some("react"),
        "astro" => Some("astro"),
        "js" | "mjs" | "cjs" => Some("javascript"),
        "md" | "mdx" => Some("markdown"),
        _ => None,
    }
}

/// Render a path with `/` separators regardless of platform.
pub fn to_slash_path(path: &Path) -> String {
    let text = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        text.into_owned()
    } else {
        text.replace(std::path::MAIN_SEPARATOR, "/")
    }
}

/// Information about a scanned file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScannedFile {
    /// Relative path from scan root, `/`-separated.
    pub path: String,

    /// Full path on disk.
    #[serde(skip)]
    pub absolute: PathBuf,

    /// Type tag from [`detect_kind`].
    pub kind: String,
}

/// Result of scanning a directory.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScanResult {
    /// Discovered files in walk order.
    pub files: Vec<ScannedFile>,

    /// Number of files skipped by the extension filter.
    pub skipped_count: usize,

    /// Time taken for the scan in milliseconds.
    pub duration_ms: f64,
}

impl ScanResult {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Scan a directory for files.
///
/// # Arguments
///
/// * `root` - Root directory to scan
/// * `extensions` - Extensions to keep (without the dot); `None` keeps every
///   file with a known type tag
/// * `ignore_patterns` - Additional glob patterns to ignore
///
/// # Errors
///
/// Returns [`ArchgenError::PathNotFound`] when `root` does not exist.
pub fn scan_directory(
    root: &Path,
    extensions: Option<&[&str]>,
    ignore_patterns: &[String],
) -> Result<ScanResult> {
    let start = Instant::now();

    if !root.exists() {
        return Err(ArchgenError::PathNotFound {
            path: root.to_path_buf(),
        });
    }

    let ext_filter: Option<HashSet<String>> = extensions.map(|exts| {
        exts.iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect()
    });

    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(false)
        .git_ignore(true)
        .git_exclude(true)
        .require_git(false)
        .add_custom_ignore_filename(".archgenignore")
        .sort_by_file_name(|a, b| a.cmp(b));

    if !ignore_patterns.is_empty() {
        let mut override_builder = ignore::overrides::OverrideBuilder::new(root);
        for pattern in ignore_patterns {
            // Override globs whitelist by default; `!` turns them into ignores
            if let Err(e) = override_builder.add(&format!("!{}", pattern)) {
                tracing::warn!("Invalid ignore pattern '{}': {}", pattern, e);
            }
        }
        match override_builder.build() {
            Ok(overrides) => {
                builder.overrides(overrides);
            }
            Err(e) => tracing::warn!("Failed to build ignore overrides: {}", e),
        }
    }

    let mut files = Vec::new();
    let mut skipped = 0usize;

    for entry in builder.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
            continue;
        }

        let path = entry.into_path();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        if let Some(ref filter) = ext_filter {
            if !ext.as_ref().map(|e| filter.contains(e)).unwrap_or(false) {
                skipped += 1;
                continue;
            }
        }

        let kind = match detect_kind(&path) {
            Some(kind) => kind,
            None => {
                skipped += 1;
                continue;
            }
        };

        let rel_path = path
            .strip_prefix(root)
            .map(to_slash_path)
            .unwrap_or_else(|_| to_slash_path(&path));

        files.push(ScannedFile {
            path: rel_path,
            absolute: path,
            kind: kind.to_string(),
        });
    }

    Ok(ScanResult {
        files,
        skipped_count: skipped,
        duration_ms: start.elapsed().as_secs_f64() * 1000.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("components")).unwrap();
        fs::write(dir.path().join("index.astro"), "---\n---\n<h1>Hi</h1>\n").unwrap();
        fs::write(dir.path().join("components/Toggle.tsx"), "export {};\n").unwrap();
        fs::write(dir.path().join("components/util.ts"), "export {};\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "not source\n").unwrap();
        fs::write(dir.path().join("debug.log"), "log\n").unwrap();
        fs::write(dir.path().join(".gitignore"), "*.log\n").unwrap();
        dir
    }

    #[test]
    fn test_detect_kind() {
        assert_eq!(detect_kind(Path::new("a.ts")), Some("typescript"));
        assert_eq!(detect_kind(Path::new("a.tsx")), Some("react"));
        assert_eq!(detect_kind(Path::new("a.astro")), Some("astro"));
        assert_eq!(detect_kind(Path::new("a.mjs")), Some("javascript"));
        assert_eq!(detect_kind(Path::new("a.txt")), None);
    }

    #[test]
    fn test_scan_directory_basic() {
        let dir = create_test_dir();
        let result = scan_directory(dir.path(), None, &[]).unwrap();

        let paths: Vec<&str> = result.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["components/Toggle.tsx", "components/util.ts", "index.astro"]
        );
    }

    #[test]
    fn test_scan_directory_with_extension_filter() {
        let dir = create_test_dir();
        let result = scan_directory(dir.path(), Some(&["astro"]), &[]).unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result.files[0].kind, "astro");
        assert!(result.skipped_count >= 2);
    }

    #[test]
    fn test_scan_directory_archgenignore() {
        let dir = create_test_dir();
        fs::write(dir.path().join(".archgenignore"), "*.tsx\n").unwrap();

        let result = scan_directory(dir.path(), None, &[]).unwrap();
        assert!(!result.files.iter().any(|f| f.path.ends_with(".tsx")));
    }

    #[test]
    fn test_scan_directory_ignore_patterns() {
        let dir = create_test_dir();
        let result =
            scan_directory(dir.path(), None, &["components/".to_string()]).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.files[0].path, "index.astro");
    }

    #[test]
    fn test_scan_directory_nonexistent() {
        let result = scan_directory(Path::new("/nonexistent/archgen/path"), None, &[]);
        assert!(matches!(result, Err(ArchgenError::PathNotFound { .. })));
    }

    #[test]
    fn test_to_slash_path() {
        let path = Path::new("pages").join("about").join("index.astro");
        assert_eq!(to_slash_path(&path), "pages/about/index.astro");
    }
}
