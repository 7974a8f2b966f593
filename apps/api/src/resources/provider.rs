//! Video provider abstraction and the configuration-driven selection policy.
//!
//! `EnrichmentEngine` holds an `Option<Arc<dyn VideoProvider>>`, chosen once at
//! startup by `select_provider`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::curriculum::models::Resource;
use crate::resources::serper::SerperProvider;
use crate::resources::youtube::YouTubeProvider;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned status {status}: {message}")]
    Api { status: u16, message: String },
}

/// Searches for video resources for one module.
#[async_trait]
pub trait VideoProvider: Send + Sync {
    /// Short label for logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Returns up to `count` video resources, best first.
    async fn search_for_module(
        &self,
        module_name: &str,
        skills: &[String],
        target_role: &str,
        count: usize,
    ) -> Result<Vec<Resource>, ProviderError>;
}

/// Provider credentials and tuning, read once from configuration.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub youtube_api_key: Option<String>,
    pub serper_api_key: Option<String>,
    pub timeout: Duration,
    pub min_view_count: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            youtube_api_key: None,
            serper_api_key: None,
            timeout: Duration::from_secs(10),
            min_view_count: 1000,
        }
    }
}

/// Metrics-aware YouTube if its key is set, else Serper if its key is set, else none.
pub fn select_provider(settings: &ProviderSettings) -> Option<Arc<dyn VideoProvider>> {
    if let Some(key) = &settings.youtube_api_key {
        return Some(Arc::new(YouTubeProvider::new(
            key.clone(),
            settings.timeout,
            settings.min_view_count,
        )));
    }
    if let Some(key) = &settings.serper_api_key {
        return Some(Arc::new(SerperProvider::new(key.clone(), settings.timeout)));
    }
    None
}

/// The focused query shared by both providers: the first two skills, else the
/// module name and target role.
pub(crate) fn focused_query(module_name: &str, skills: &[String], target_role: &str) -> String {
    let primary = primary_skills(skills);
    if primary.is_empty() {
        format!("{module_name} {target_role} tutorial")
    } else {
        format!("{} tutorial course", primary.join(" "))
    }
}

pub(crate) fn primary_skills(skills: &[String]) -> Vec<&str> {
    skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .take(2)
        .collect()
}
