//! Content-Security-Policy `_headers` generation for built output.
//!
//! Every inline `<script>` in the built HTML is hashed so the policy can
//! allow it by content instead of falling back to `'unsafe-inline'`.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ignore::WalkBuilder;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{ArchgenError, Result};

/// File written into the dist directory.
pub const HEADERS_FILE: &str = "_headers";

pub const DEFAULT_SCRIPT_SRC: &[&str] = &["'self'", "https://static.cloudflareinsights.com"];

/// Hashes of scripts injected by the host rather than present in the build.
pub const DEFAULT_MANUAL_HASHES: &[&str] = &["sha256-f+ciQ0o9AmBT/+Kq9n40UrnVTNGWwuRSvlqcFtx3UAA="];

pub const DEFAULT_DIRECTIVES: &[&str] = &[
    "style-src 'self' 'unsafe-inline'",
    "img-src 'self' data: https://www.plantuml.com",
    "font-src 'self'",
    "connect-src 'self'",
    "form-action 'self'",
    "base-uri 'self'",
    "frame-ancestors 'none'",
    "object-src 'none'",
    "upgrade-insecure-requests",
];

pub const STATIC_HEADERS: &[&str] = &[
    "Cross-Origin-Opener-Policy: same-origin",
    "Cross-Origin-Resource-Policy: same-origin",
    "X-Content-Type-Options: nosniff",
    "X-Frame-Options: DENY",
    "Referrer-Policy: strict-origin-when-cross-origin",
    "Permissions-Policy: accelerometer=(), autoplay=(), camera=(), display-capture=(), fullscreen=(self), geolocation=(), gyroscope=(), magnetometer=(), microphone=(), midi=(), payment=(), usb=()",
    "Strict-Transport-Security: max-age=31536000; includeSubDomains; preload",
    "X-Permitted-Cross-Domain-Policies: none",
];

// The regex crate has no lookahead, so `src=` is checked on the captured
// attributes instead.
static SCRIPT_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script([^>]*)>(.*?)</script>").unwrap());
static SRC_ATTR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bsrc=").unwrap());

/// The policy pieces that are not derived from the build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CspPolicy {
    /// Leading `script-src` sources.
    pub script_src: Vec<String>,
    /// `sha256-...` hashes always allowed, without quotes.
    pub manual_hashes: Vec<String>,
    /// Directives after `script-src`, without the trailing `;`.
    pub directives: Vec<String>,
}

impl Default for CspPolicy {
    fn default() -> Self {
        let owned =
            |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };
        Self {
            script_src: owned(DEFAULT_SCRIPT_SRC),
            manual_hashes: owned(DEFAULT_MANUAL_HASHES),
            directives: owned(DEFAULT_DIRECTIVES),
        }
    }
}

/// Outcome of [`generate_headers`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CspReport {
    pub output: PathBuf,
    pub html_files: usize,
    /// Distinct inline script hashes, sorted.
    pub hashes: Vec<String>,
}

/// Bodies of inline scripts: no `src` attribute, not blank.
pub fn extract_inline_scripts(html: &str) -> Vec<&str> {
    SCRIPT_TAG
        .captures_iter(html)
        .filter(|caps| !SRC_ATTR.is_match(&caps[1]))
        .filter_map(|caps| caps.get(2).map(|m| m.as_str()))
        .filter(|body| !body.trim().is_empty())
        .collect()
}

/// CSP source expression for a script body, e.g. `sha256-...`.
pub fn hash_script(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    format!("sha256-{}", STANDARD.encode(digest))
}

/// Every `.html` file under `dist`, sorted.
///
/// Build output is usually gitignored, so ignore files are not honoured.
pub fn find_html_files(dist: &Path) -> Result<Vec<PathBuf>> {
    if !dist.is_dir() {
        return Err(ArchgenError::PathNotFound {
            path: dist.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    for entry in WalkBuilder::new(dist)
        .standard_filters(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        let is_html = entry.file_type().is_some_and(|ft| ft.is_file())
            && entry.path().extension().and_then(|e| e.to_str()) == Some("html");
        if is_html {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Distinct hashes of all inline scripts in `files`, sorted.
pub fn collect_hashes(files: &[PathBuf]) -> Result<Vec<String>> {
    let mut hashes = BTreeSet::new();
    for file in files {
        let html = fs::read_to_string(file)?;
        for script in extract_inline_scripts(&html) {
            hashes.insert(hash_script(script));
        }
    }
    Ok(hashes.into_iter().collect())
}

/// The `_headers` file body.
pub fn render_headers(policy: &CspPolicy, hashes: &[String]) -> String {
    let script_src: Vec<String> = policy
        .script_src
        .iter()
        .cloned()
        .chain(policy.manual_hashes.iter().map(|h| format!("'{}'", h)))
        .chain(hashes.iter().map(|h| format!("'{}'", h)))
        .collect();

    let mut lines = vec!["/*".to_string()];
    lines.push(format!(
        "  Content-Security-Policy: default-src 'self'; script-src {};",
        script_src.join(" ")
    ));
    lines.extend(policy.directives.iter().map(|d| format!("  {};", d)));
    lines.extend(STATIC_HEADERS.iter().map(|h| format!("  {}", h)));
    lines.push("*/".to_string());
    lines.push(String::new());
    lines.join("\n")
}

/// Hash the inline scripts under `dist` and write `dist/_headers`.
///
/// # Errors
///
/// Fails when `dist` has no HTML files or the HTML has no inline scripts,
/// both of which mean the site was not built as expected.
pub fn generate_headers(dist: &Path, policy: &CspPolicy) -> Result<CspReport> {
    let files = find_html_files(dist)?;
    if files.is_empty() {
        return Err(ArchgenError::MissingInput(format!(
            "No HTML files found in {}. Build the site first.",
            dist.display()
        )));
    }

    let hashes = collect_hashes(&files)?;
    if hashes.is_empty() {
        return Err(ArchgenError::MissingInput(
            "No inline scripts detected. Did the build change?".to_string(),
        ));
    }

    let output = dist.join(HEADERS_FILE);
    fs::write(&output, render_headers(policy, &hashes))?;
    tracing::info!(
        "Generated CSP header with {} inline script hashes -> {}",
        hashes.len(),
        output.display()
    );

    Ok(CspReport {
        output,
        html_files: files.len(),
        hashes,
    })
}
