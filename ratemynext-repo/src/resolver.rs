//! Application root resolution
//!
//! A Next.js application is rooted at the directory holding its `next.config.*` file.
//! Monorepos can hold several; exactly one must remain after the optional sub-path
//! narrows the search, otherwise files would be attributed to the wrong app.

use ratemynext_core::{RateError, RateResult, TreeEntry};
use tracing::debug;

/// File names that mark an application root; all are equally valid
pub const ROOT_MARKERS: &[&str] = &[
    "next.config.js",
    "next.config.mjs",
    "next.config.cjs",
    "next.config.ts",
    "next.config.mts",
];

/// The resolved application root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppRoot {
    /// Full path of the config file that marked the root
    pub config_path: String,
    /// Prefix shared by every file of the app: empty for the repository root,
    /// otherwise the directory with a trailing `/`
    pub app_dir: String,
}

impl AppRoot {
    fn from_config_path(config_path: &str) -> Self {
        let app_dir = match config_path.rfind('/') {
            Some(idx) => config_path[..=idx].to_string(),
            None => String::new(),
        };
        Self {
            config_path: config_path.to_string(),
            app_dir,
        }
    }

    /// Path of a file relative to the application directory
    pub fn join(&self, file: &str) -> String {
        format!("{}{}", self.app_dir, file)
    }

    /// Whether `path` lies under the application directory
    pub fn contains(&self, path: &str) -> bool {
        path.starts_with(&self.app_dir)
    }
}

fn is_root_marker(path: &str) -> bool {
    ROOT_MARKERS.iter().any(|marker| {
        path == *marker
            || path
                .strip_suffix(marker)
                .is_some_and(|parent| parent.ends_with('/'))
    })
}

fn within_sub_path(path: &str, sub_path: Option<&str>) -> bool {
    match sub_path.map(|s| s.trim_matches('/')).filter(|s| !s.is_empty()) {
        Some(sub_path) => path
            .strip_prefix(sub_path)
            .is_some_and(|rest| rest.starts_with('/')),
        None => true,
    }
}

/// Find the single application root among `entries`
pub fn resolve_root(entries: &[TreeEntry], sub_path: Option<&str>) -> RateResult<AppRoot> {
    let mut candidates: Vec<&str> = entries
        .iter()
        .filter(|entry| entry.is_blob())
        .map(|entry| entry.path.as_str())
        .filter(|path| is_root_marker(path) && within_sub_path(path, sub_path))
        .collect();
    candidates.sort_unstable();

    debug!(
        candidates = candidates.len(),
        sub_path = ?sub_path,
        "Resolved root marker candidates"
    );

    match candidates.as_slice() {
        [] => Err(RateError::NotATargetApp {
            scope: sub_path.unwrap_or("repository root").to_string(),
        }),
        [single] => Ok(AppRoot::from_config_path(single)),
        many => Err(RateError::AmbiguousRoot {
            candidates: many.iter().map(|c| c.to_string()).collect(),
        }),
    }
}
