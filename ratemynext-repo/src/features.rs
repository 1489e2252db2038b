//! Feature detection from manifest and config content
//!
//! Plain substring checks: any textual match counts, wherever it appears.

use ratemynext_core::{FeatureFlags, RateResult, SourceHost};
use tracing::debug;

use crate::resolver::AppRoot;

/// Package manifest, relative to the application directory
pub const MANIFEST_FILE: &str = "package.json";

const TAILWIND_MARKER: &str = "tailwindcss";
const TURBO_MARKERS: &[&str] = &["--turbo", "--turbopack"];
const PPR_MARKER: &str = "ppr";

/// Flags for already-fetched content; absent content means the feature is absent
pub fn detect_features(manifest: Option<&str>, config: Option<&str>) -> FeatureFlags {
    let manifest = manifest.unwrap_or_default();
    let config = config.unwrap_or_default();

    FeatureFlags {
        is_tailwind: manifest.contains(TAILWIND_MARKER),
        is_turbo: TURBO_MARKERS.iter().any(|marker| manifest.contains(marker)),
        is_ppr: config.contains(PPR_MARKER),
    }
}

/// Fetch the manifest and root config concurrently and detect features
pub async fn fetch_features(
    host: &dyn SourceHost,
    owner: &str,
    repo: &str,
    git_ref: &str,
    root: &AppRoot,
) -> RateResult<FeatureFlags> {
    let manifest_path = root.join(MANIFEST_FILE);

    let (manifest, config) = tokio::try_join!(
        host.get_file_content(owner, repo, &manifest_path, git_ref),
        host.get_file_content(owner, repo, &root.config_path, git_ref),
    )?;

    debug!(
        manifest_found = manifest.is_some(),
        config_found = config.is_some(),
        "Fetched feature sources"
    );

    Ok(detect_features(manifest.as_deref(), config.as_deref()))
}
