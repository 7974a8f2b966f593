//! Serper.dev web search provider — the snippet-only fallback.
//!
//! One search restricted to youtube.com, no engagement metrics, no quality
//! filtering. Used only when no YouTube Data API key is configured.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::curriculum::models::{Resource, ResourceType};
use crate::resources::provider::{focused_query, ProviderError, VideoProvider};

const SERPER_API_BASE: &str = "https://google.serper.dev";
const VIDEO_LINK_MARKER: &str = "youtube.com/watch";
const REASON_MAX_CHARS: usize = 100;

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    q: &'a str,
    num: usize,
    gl: &'a str,
    hl: &'a str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    title: Option<String>,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

pub struct SerperProvider {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl SerperProvider {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        Self::with_base_url(api_key, SERPER_API_BASE.to_string(), timeout)
    }

    pub fn with_base_url(api_key: String, base_url: String, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
            timeout,
        }
    }
}

#[async_trait]
impl VideoProvider for SerperProvider {
    fn name(&self) -> &'static str {
        "serper"
    }

    async fn search_for_module(
        &self,
        module_name: &str,
        skills: &[String],
        target_role: &str,
        count: usize,
    ) -> Result<Vec<Resource>, ProviderError> {
        let query = format!(
            "{} site:youtube.com",
            focused_query(module_name, skills, target_role)
        );
        info!("Searching Serper for: '{query}'");

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .header("X-API-KEY", &self.api_key)
            .json(&SearchRequest {
                q: &query,
                num: count * 2,
                gl: "us",
                hl: "en",
            })
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        let results: SearchResponse = response.json().await?;

        Ok(results
            .organic
            .into_iter()
            .filter(|r| r.link.contains(VIDEO_LINK_MARKER))
            .take(count)
            .map(|r| Resource {
                title: r.title.unwrap_or_else(|| "Untitled Video".to_string()),
                url: r.link,
                resource_type: ResourceType::Video,
                duration: "Varies".to_string(),
                reason: r.snippet.chars().take(REASON_MAX_CHARS).collect(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_keeps_only_video_links_up_to_count() {
        let server = MockServer::start().await;
        let long_snippet = "x".repeat(250);
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(header("X-API-KEY", "serper-key"))
            .and(body_partial_json(json!({
                "q": "Flexbox Grid tutorial course site:youtube.com",
                "num": 4
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "organic": [
                    {"title": "Blog", "link": "https://css-tricks.com/flexbox", "snippet": "article"},
                    {"title": "Flexbox in 20 min", "link": "https://www.youtube.com/watch?v=a", "snippet": long_snippet},
                    {"title": "Channel page", "link": "https://www.youtube.com/@someone", "snippet": ""},
                    {"title": "Grid crash course", "link": "https://www.youtube.com/watch?v=b", "snippet": "grid"},
                    {"title": "Third", "link": "https://www.youtube.com/watch?v=c", "snippet": "more"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = SerperProvider::with_base_url(
            "serper-key".to_string(),
            server.uri(),
            Duration::from_secs(10),
        );
        let skills = vec!["Flexbox".to_string(), "Grid".to_string()];
        let resources = provider
            .search_for_module("Layout", &skills, "Frontend Developer", 2)
            .await
            .unwrap();

        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].url, "https://www.youtube.com/watch?v=a");
        assert_eq!(resources[0].reason.chars().count(), 100);
        assert_eq!(resources[1].title, "Grid crash course");
        assert!(resources.iter().all(|r| r.duration == "Varies"));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let provider = SerperProvider::with_base_url("bad".to_string(), server.uri(), Duration::from_secs(10));
        let result = provider.search_for_module("Layout", &[], "Dev", 2).await;
        assert!(matches!(result, Err(ProviderError::Api { status: 401, .. })));
    }
}
