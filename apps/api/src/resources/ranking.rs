//! Candidate ranking for metrics-aware providers.
//!
//! Algorithm:
//! 1. Drop candidates below the view-count floor
//! 2. Sort by quality ratio (likes / views) descending, then views descending
//! 3. Keep the top `count`

use std::cmp::Ordering;

/// A search hit enriched with engagement metrics. Exists only for ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderCandidate {
    pub title: String,
    pub url: String,
    pub channel: String,
    /// Human-readable, e.g. "15m 33s".
    pub duration: String,
    pub views: u64,
    pub likes: u64,
    pub quality_ratio: f64,
}

impl ProviderCandidate {
    pub fn new(title: String, url: String, channel: String, duration: String, views: u64, likes: u64) -> Self {
        Self {
            title,
            url,
            channel,
            duration,
            views,
            likes,
            quality_ratio: quality_ratio(likes, views),
        }
    }
}

/// likes / views, or 0 when there are no views.
pub fn quality_ratio(likes: u64, views: u64) -> f64 {
    if views == 0 {
        0.0
    } else {
        likes as f64 / views as f64
    }
}

/// Filters by `min_views`, orders by (ratio desc, views desc), truncates to `count`.
pub fn rank_candidates(
    candidates: Vec<ProviderCandidate>,
    min_views: u64,
    count: usize,
) -> Vec<ProviderCandidate> {
    let mut ranked: Vec<ProviderCandidate> = candidates
        .into_iter()
        .filter(|c| c.views >= min_views)
        .collect();

    ranked.sort_by(|a, b| {
        b.quality_ratio
            .partial_cmp(&a.quality_ratio)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.views.cmp(&a.views))
    });
    ranked.truncate(count);
    ranked
}
