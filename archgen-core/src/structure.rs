//! Component structure analysis and route enumeration.

use std::path::Path;

use crate::scanner::{self, ROUTE_EXTENSIONS, SOURCE_EXTENSIONS};
use crate::types::{Category, ComponentEntry, ComponentStructure, RouteEntry};

/// Bucket the source files under `src_root` into the six known categories.
///
/// Categories whose directory is missing stay empty. Entry paths are
/// relative to `src_root`.
pub fn analyze_components(src_root: &Path) -> ComponentStructure {
    let mut structure = ComponentStructure::default();

    for category in Category::ALL {
        let dir = src_root.join(category.dir_name());
        if !dir.is_dir() {
            tracing::debug!("No {} directory at {}", category, dir.display());
            continue;
        }

        let scan = match scanner::scan_directory(&dir, Some(SOURCE_EXTENSIONS), &[]) {
            Ok(scan) => scan,
            Err(e) => {
                tracing::warn!("Failed to scan {}: {}", dir.display(), e);
                continue;
            }
        };

        let entries = scan
            .files
            .into_iter()
            .map(|file| ComponentEntry {
                name: file_stem(&file.path),
                path: format!("{}/{}", category.dir_name(), file.path),
                kind: file.kind,
            })
            .collect();
        structure.set(category, entries);
    }

    structure
}

/// List page files under `project_root/pages_dir` with their route paths.
///
/// `pages_dir` is relative to the project root (normally `src/pages`); the
/// returned `file` fields keep that prefix.
pub fn enumerate_routes(project_root: &Path, pages_dir: &str) -> Vec<RouteEntry> {
    let pages_dir = pages_dir.trim_end_matches('/');
    let dir = project_root.join(pages_dir);

    let scan = match scanner::scan_directory(&dir, Some(ROUTE_EXTENSIONS), &[]) {
        Ok(scan) => scan,
        Err(e) => {
            tracing::warn!("Failed to enumerate routes: {}", e);
            return Vec::new();
        }
    };

    scan.files
        .into_iter()
        .map(|file| {
            let file = format!("{}/{}", pages_dir, file.path);
            let path = derive_route_path(&file, pages_dir);
            RouteEntry { file, path }
        })
        .collect()
}

/// Turn a page file path into the URL path it serves.
///
/// `src/pages/about/index.astro` becomes `/about/`, `src/pages/contact.astro`
/// becomes `/contact` and `src/pages/index.astro` becomes `/`.
pub fn derive_route_path(file: &str, pages_dir: &str) -> String {
    let pages_dir = pages_dir.trim_end_matches('/');
    let rest = file.strip_prefix(pages_dir).unwrap_or(file);

    let mut path = if rest.starts_with('/') {
        rest.to_string()
    } else {
        format!("/{}", rest)
    };

    for ext in ROUTE_EXTENSIONS {
        let suffix = format!(".{}", ext);
        if let Some(stripped) = path.strip_suffix(&suffix) {
            path = stripped.to_string();
            break;
        }
    }

    if let Some(dir) = path.strip_suffix("/index") {
        path = format!("{}/", dir);
    }

    path
}

fn file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_derive_route_path() {
        assert_eq!(derive_route_path("src/pages/about/index.astro", "src/pages"), "/about/");
        assert_eq!(derive_route_path("src/pages/contact.astro", "src/pages"), "/contact");
        assert_eq!(derive_route_path("src/pages/index.astro", "src/pages"), "/");
        assert_eq!(derive_route_path("src/pages/blog/first-post.md", "src/pages/"), "/blog/first-post");
    }

    #[test]
    fn test_analyze_components() {
        let dir = TempDir::new().unwrap();
        let src = dir.path();
        fs::create_dir_all(src.join("components/ui")).unwrap();
        fs::create_dir_all(src.join("services")).unwrap();
        fs::write(src.join("components/ThemeToggle.tsx"), "").unwrap();
        fs::write(src.join("components/ui/Card.astro"), "").unwrap();
        fs::write(src.join("components/readme.txt"), "").unwrap();
        fs::write(src.join("services/ThemeManager.ts"), "").unwrap();

        let structure = analyze_components(src);

        let components = structure.get(Category::Components);
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].name, "ThemeToggle");
        assert_eq!(components[0].kind, "react");
        assert_eq!(components[1].path, "components/ui/Card.astro");

        assert_eq!(structure.get(Category::Services)[0].kind, "typescript");
        assert!(structure.get(Category::Pages).is_empty());
        assert!(structure.get(Category::Data).is_empty());
    }

    #[test]
    fn test_analyze_components_missing_root() {
        let structure = analyze_components(Path::new("/nonexistent/archgen/src"));
        assert_eq!(structure.total(), 0);
    }

    #[test]
    fn test_enumerate_routes() {
        let dir = TempDir::new().unwrap();
        let pages = dir.path().join("src/pages");
        fs::create_dir_all(pages.join("about")).unwrap();
        fs::write(pages.join("index.astro"), "").unwrap();
        fs::write(pages.join("about/index.astro"), "").unwrap();
        fs::write(pages.join("contact.astro"), "").unwrap();
        fs::write(pages.join("styles.css"), "").unwrap();

        let routes = enumerate_routes(dir.path(), "src/pages");
        let paths: Vec<&str> = routes.iter().map(|r| r.path.as_str()).collect();

        assert_eq!(paths, vec!["/about/", "/contact", "/"]);
        assert_eq!(routes[1].file, "src/pages/contact.astro");
    }

    #[test]
    fn test_enumerate_routes_missing_pages() {
        let dir = TempDir::new().unwrap();
        assert!(enumerate_routes(dir.path(), "src/pages").is_empty());
    }
}
