//! Lighthouse CI score averaging and performance-document upkeep.
//!
//! Reads the `lhr-*.json` reports that `lhci` leaves behind, averages each
//! category across runs, and rewrites the badge line and score table of the
//! performance document in place.

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ArchgenError, Result};

pub const DEFAULT_RESULTS_DIR: &str = ".lighthouseci";
pub const DEFAULT_DOCUMENT: &str = "docs/features/performance.md";
pub const DEFAULT_LINK_KEY: &str = "http://localhost:4321/";
pub const LINKS_FILE: &str = "links.json";

static BADGE_SECTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)(## Lighthouse Scores\n\n)(> \*\*Latest CI Results:\*\*.*?\n\n)?").unwrap()
});
static SCORES_TABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\| Metric\s+\| Score\s+\| Details\s+\|[\s\S]*?\| SEO\s+\|\s+\d+\s+\|.*?\|").unwrap()
});

/// Where to find results and which document to rewrite, relative to the
/// project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LighthouseSettings {
    pub dir: String,
    pub document: String,
    /// Key in `links.json` whose value is the public report URL.
    pub link_key: String,
}

impl Default for LighthouseSettings {
    fn default() -> Self {
        Self {
            dir: DEFAULT_RESULTS_DIR.to_string(),
            document: DEFAULT_DOCUMENT.to_string(),
            link_key: DEFAULT_LINK_KEY.to_string(),
        }
    }
}

/// Category scores on a 0-100 scale, averaged over all runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LighthouseScores {
    pub performance: u32,
    pub accessibility: u32,
    pub best_practices: u32,
    pub seo: u32,
}

/// Outcome of [`update_performance_doc`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LighthouseReport {
    pub scores: LighthouseScores,
    pub runs: usize,
    pub link: Option<String>,
    pub document: PathBuf,
}

/// `lhr-*.json` files in `dir`, sorted by name.
pub fn result_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("lhr-") && n.ends_with(".json"))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Average the four tracked categories over every report in `files`.
///
/// Each report score is a 0-1 fraction; averages are scaled to 0-100 and
/// rounded.
pub fn average_scores(files: &[PathBuf]) -> Result<LighthouseScores> {
    if files.is_empty() {
        return Err(ArchgenError::MissingInput(
            "No Lighthouse results found".to_string(),
        ));
    }

    const KEYS: [&str; 4] = ["performance", "accessibility", "best-practices", "seo"];
    let mut sums: [Vec<f64>; 4] = Default::default();

    for file in files {
        let report: Value = serde_json::from_str(&fs::read_to_string(file)?)?;
        let Some(categories) = report.get("categories") else {
            tracing::warn!("No categories in {}", file.display());
            continue;
        };
        for (i, key) in KEYS.iter().enumerate() {
            if let Some(score) = categories
                .get(*key)
                .and_then(|c| c.get("score"))
                .and_then(Value::as_f64)
            {
                sums[i].push(score * 100.0);
            }
        }
    }

    Ok(LighthouseScores {
        performance: average(&sums[0], KEYS[0]),
        accessibility: average(&sums[1], KEYS[1]),
        best_practices: average(&sums[2], KEYS[2]),
        seo: average(&sums[3], KEYS[3]),
    })
}

/// Rounded mean of one category, 0 when no run reported it.
fn average(values: &[f64], key: &str) -> u32 {
    if values.is_empty() {
        tracing::warn!("No {} scores in Lighthouse results", key);
        return 0;
    }
    (values.iter().sum::<f64>() / values.len() as f64).round() as u32
}

/// Public report URL from `links.json`, if the file and key exist.
pub fn read_public_link(dir: &Path, key: &str) -> Option<String> {
    let path = dir.join(LINKS_FILE);
    let text = fs::read_to_string(&path).ok()?;
    match serde_json::from_str::<Value>(&text) {
        Ok(links) => links.get(key).and_then(Value::as_str).map(str::to_string),
        Err(e) => {
            tracing::warn!("Could not parse {}: {}", path.display(), e);
            None
        }
    }
}

/// The quoted badge line, followed by a blank line.
pub fn render_badge(link: Option<&str>, date: &str) -> String {
    match link {
        Some(link) => format!(
            "> **Latest CI Results:** [View Lighthouse Report]({}) | Last Updated: {}\n\n",
            link, date
        ),
        None => format!("> **Latest CI Results:** Last Updated: {}\n\n", date),
    }
}

pub fn render_table(scores: &LighthouseScores) -> String {
    format!(
        "| Metric         | Score | Details                      |\n\
         | -------------- | ----- | ---------------------------- |\n\
         | Performance    | {}   | Optimized assets, minimal JS |\n\
         | Accessibility  | {}   | WCAG AA compliant            |\n\
         | Best Practices | {}   | Modern standards             |\n\
         | SEO            | {}   | Complete meta tags           |",
        scores.performance, scores.accessibility, scores.best_practices, scores.seo
    )
}

/// Rewrite the badge and table in a performance document.
///
/// The badge goes right after the `## Lighthouse Scores` heading, replacing
/// an earlier badge. Documents without the heading or table are returned
/// with only the parts that do exist updated.
pub fn update_document(
    content: &str,
    scores: &LighthouseScores,
    link: Option<&str>,
    date: &str,
) -> String {
    let badge = render_badge(link, date);
    let with_badge = BADGE_SECTION.replace(content, |caps: &regex::Captures| {
        format!("{}{}", &caps[1], badge)
    });
    SCORES_TABLE
        .replace(&with_badge, NoExpand(&render_table(scores)))
        .into_owned()
}

/// Average the results under `root` and rewrite the performance document.
pub fn update_performance_doc(
    root: &Path,
    settings: &LighthouseSettings,
) -> Result<LighthouseReport> {
    let results_dir = root.join(&settings.dir);
    if !results_dir.is_dir() {
        return Err(ArchgenError::PathNotFound { path: results_dir });
    }

    let files = result_files(&results_dir)?;
    let scores = average_scores(&files)?;
    let link = read_public_link(&results_dir, &settings.link_key);

    let document = root.join(&settings.document);
    let content = fs::read_to_string(&document).map_err(|e| {
        ArchgenError::MissingInput(format!("Cannot read {}: {}", document.display(), e))
    })?;

    let date = chrono::Utc::now().format("%Y-%m-%d").to_string();
    fs::write(&document, update_document(&content, &scores, link.as_deref(), &date))?;

    tracing::info!(
        "Performance: {}, Accessibility: {}, Best Practices: {}, SEO: {}",
        scores.performance,
        scores.accessibility,
        scores.best_practices,
        scores.seo
    );

    Ok(LighthouseReport {
        scores,
        runs: files.len(),
        link,
        document,
    })
}
