//! Structural file classification
//!
//! Every blob under the application root counts once towards `total_files` and lands in
//! at most one bucket. Rules are tried in order and the first match wins, so a
//! `page.tsx` is a page and never also a component.

use ratemynext_core::{FileCounts, TreeEntry};
use regex::Regex;
use std::sync::OnceLock;

use crate::resolver::AppRoot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileCategory {
    Page,
    ApiRoute,
    Component,
    Other,
}

struct Rule {
    category: FileCategory,
    pattern: Regex,
}

fn rules() -> &'static [Rule] {
    static RULES: OnceLock<Vec<Rule>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            (FileCategory::Page, r"(^|/)page\.(js|jsx|ts|tsx)$"),
            (FileCategory::ApiRoute, r"(^|/)route\.(js|jsx|ts|tsx)$"),
            (FileCategory::Component, r"\.(jsx|tsx)$"),
        ]
        .into_iter()
        .map(|(category, pattern)| Rule {
            category,
            pattern: Regex::new(pattern).expect("classification pattern is valid"),
        })
        .collect()
    })
}

/// Category of a single path
pub fn classify_path(path: &str) -> FileCategory {
    rules()
        .iter()
        .find(|rule| rule.pattern.is_match(path))
        .map(|rule| rule.category)
        .unwrap_or(FileCategory::Other)
}

fn record(mut counts: FileCounts, category: FileCategory) -> FileCounts {
    counts.total_files += 1;
    match category {
        FileCategory::Page => counts.pages += 1,
        FileCategory::ApiRoute => counts.api_routes += 1,
        FileCategory::Component => counts.components += 1,
        FileCategory::Other => {}
    }
    counts
}

/// Count the blobs under `root`; directories and submodules are ignored
pub fn classify_files(entries: &[TreeEntry], root: &AppRoot) -> FileCounts {
    entries
        .iter()
        .filter(|entry| entry.is_blob() && root.contains(&entry.path))
        .map(|entry| classify_path(&entry.path))
        .fold(FileCounts::default(), record)
}
