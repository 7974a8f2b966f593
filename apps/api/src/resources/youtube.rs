//! YouTube Data API v3 provider — the metrics-aware variant.
//!
//! Flow: search (over-fetch 2×) → videos.list for duration + statistics →
//! `rank_candidates` → format as `Resource`. An empty or failed focused search is retried
//! once with a broader "beginner tutorial" query.

use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use crate::curriculum::models::{Resource, ResourceType};
use crate::resources::provider::{focused_query, primary_skills, ProviderError, VideoProvider};
use crate::resources::ranking::{rank_candidates, ProviderCandidate};

const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const OVERFETCH_FACTOR: usize = 2;
/// videos.list accepts at most 50 ids per request.
const MAX_IDS_PER_LOOKUP: usize = 50;

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    #[serde(default)]
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: Option<String>,
    channel_title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    #[serde(default)]
    content_details: ContentDetails,
    #[serde(default)]
    statistics: Statistics,
}

#[derive(Debug, Default, Deserialize)]
struct ContentDetails {
    duration: Option<String>,
}

/// The API reports counts as decimal strings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    view_count: Option<String>,
    like_count: Option<String>,
}

struct VideoDetails {
    duration: String,
    views: u64,
    likes: u64,
}

// ────────────────────────────────────────────────────────────────────────────
// Provider
// ────────────────────────────────────────────────────────────────────────────

pub struct YouTubeProvider {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
    min_view_count: u64,
}

impl YouTubeProvider {
    pub fn new(api_key: String, timeout: Duration, min_view_count: u64) -> Self {
        Self::with_base_url(api_key, YOUTUBE_API_BASE.to_string(), timeout, min_view_count)
    }

    pub fn with_base_url(api_key: String, base_url: String, timeout: Duration, min_view_count: u64) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
            timeout,
            min_view_count,
        }
    }

    /// One search + details round trip, ranked. Restricted to medium-length (4–20 minute) videos.
    async fn search_videos(
        &self,
        query: &str,
        count: usize,
    ) -> Result<Vec<ProviderCandidate>, ProviderError> {
        let max_results = (count * OVERFETCH_FACTOR).to_string();
        let params: [(&str, &str); 11] = [
            ("part", "snippet"),
            ("q", query),
            ("type", "video"),
            ("maxResults", max_results.as_str()),
            ("order", "relevance"),
            ("relevanceLanguage", "en"),
            ("videoEmbeddable", "true"),
            ("videoSyndicated", "true"),
            ("safeSearch", "moderate"),
            ("videoDuration", "medium"),
            ("key", self.api_key.as_str()),
        ];

        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&params)
            .timeout(self.timeout)
            .send()
            .await?;
        let search: SearchResponse = check_status(response).await?.json().await?;

        let hits: Vec<(String, Snippet)> = search
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id.map(|id| (id, item.snippet)))
            .collect();
        if hits.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<&str> = hits.iter().map(|(id, _)| id.as_str()).collect();
        let details = self.video_details(&ids).await?;

        // Hits without details cannot be ranked and are dropped.
        let candidates = hits
            .into_iter()
            .filter_map(|(id, snippet)| {
                let detail = details.get(&id)?;
                Some(ProviderCandidate::new(
                    snippet.title.unwrap_or_else(|| "Untitled Video".to_string()),
                    watch_url(&id),
                    snippet
                        .channel_title
                        .unwrap_or_else(|| "Unknown Channel".to_string()),
                    detail.duration.clone(),
                    detail.views,
                    detail.likes,
                ))
            })
            .collect();

        Ok(rank_candidates(candidates, self.min_view_count, count))
    }

    async fn video_details(&self, ids: &[&str]) -> Result<HashMap<String, VideoDetails>, ProviderError> {
        let id_list = ids
            .iter()
            .take(MAX_IDS_PER_LOOKUP)
            .copied()
            .collect::<Vec<_>>()
            .join(",");

        let response = self
            .client
            .get(format!("{}/videos", self.base_url))
            .query(&[
                ("part", "contentDetails,statistics"),
                ("id", id_list.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .timeout(self.timeout)
            .send()
            .await?;
        let videos: VideosResponse = check_status(response).await?.json().await?;

        Ok(videos
            .items
            .into_iter()
            .map(|item| {
                let details = VideoDetails {
                    duration: format_iso_duration(item.content_details.duration.as_deref().unwrap_or("")),
                    views: parse_count(item.statistics.view_count.as_deref()),
                    likes: parse_count(item.statistics.like_count.as_deref()),
                };
                (item.id, details)
            })
            .collect())
    }
}

#[async_trait]
impl VideoProvider for YouTubeProvider {
    fn name(&self) -> &'static str {
        "youtube"
    }

    async fn search_for_module(
        &self,
        module_name: &str,
        skills: &[String],
        target_role: &str,
        count: usize,
    ) -> Result<Vec<Resource>, ProviderError> {
        let query = focused_query(module_name, skills, target_role);
        info!("Searching YouTube for: '{query}'");

        // A failed focused attempt still falls through to the broader query.
        let mut candidates = match self.search_videos(&query, count).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("Focused YouTube search for '{query}' failed: {e}");
                vec![]
            }
        };
        if candidates.is_empty() {
            let broader = format!("{module_name} beginner tutorial");
            warn!("No high-quality videos found for '{query}', trying '{broader}'");
            candidates = self.search_videos(&broader, count).await?;
        }

        let primary = primary_skills(skills);
        let subject = if primary.is_empty() {
            module_name.to_string()
        } else {
            primary.join(", ")
        };

        Ok(candidates
            .into_iter()
            .take(count)
            .map(|c| Resource {
                reason: format!(
                    "Top-rated tutorial for {subject} • {} views • {}",
                    c.views, c.channel
                ),
                title: c.title,
                url: c.url,
                resource_type: ResourceType::Video,
                duration: c.duration,
            })
            .collect())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(ProviderError::Api {
        status: status.as_u16(),
        message,
    })
}

fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

fn parse_count(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.parse().ok()).unwrap_or(0)
}

fn iso_duration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?$").expect("valid duration regex")
    })
}

/// ISO-8601 video duration to display form: PT1H5M → "1h 5m", PT15M33S → "15m 33s",
/// PT42S → "42s". Anything unparseable → "Unknown".
pub fn format_iso_duration(iso: &str) -> String {
    let Some(caps) = iso_duration_pattern().captures(iso.trim()) else {
        return "Unknown".to_string();
    };
    if iso.trim() == "PT" {
        return "Unknown".to_string();
    }
    let part = |i: usize| -> u64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };
    let (hours, minutes, seconds) = (part(1), part(2), part(3));

    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}
