//! Score computation

use ratemynext_core::{FeatureFlags, FileCounts, RepoStats};

pub const TURBO_WEIGHT: u64 = 100;
pub const TAILWIND_WEIGHT: u64 = 100;
pub const PPR_WEIGHT: u64 = 100;
pub const PAGE_WEIGHT: u64 = 100;
pub const COMPONENT_WEIGHT: u64 = 20;
pub const API_ROUTE_WEIGHT: u64 = 100;
pub const FILE_WEIGHT: u64 = 1;

/// Weighted integer score of counts and features
pub fn compute_score(counts: &FileCounts, features: &FeatureFlags) -> u64 {
    let flag = |enabled: bool, weight: u64| if enabled { weight } else { 0 };

    flag(features.is_turbo, TURBO_WEIGHT)
        + flag(features.is_tailwind, TAILWIND_WEIGHT)
        + flag(features.is_ppr, PPR_WEIGHT)
        + counts.pages * PAGE_WEIGHT
        + counts.components * COMPONENT_WEIGHT
        + counts.api_routes * API_ROUTE_WEIGHT
        + counts.total_files * FILE_WEIGHT
}

/// Assemble final stats with their score
pub fn build_stats(counts: FileCounts, features: FeatureFlags) -> RepoStats {
    RepoStats {
        pages: counts.pages,
        components: counts.components,
        api_routes: counts.api_routes,
        total_files: counts.total_files,
        is_turbo: features.is_turbo,
        is_tailwind: features.is_tailwind,
        is_ppr: features.is_ppr,
        score: compute_score(&counts, &features),
    }
}
