use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::resources::enrichment::QuotaPolicy;
use crate::resources::provider::ProviderSettings;

/// Application configuration loaded from environment variables.
/// Every credential is optional; missing ones disable the feature that needs them.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub youtube_api_key: Option<String>,
    pub serper_api_key: Option<String>,
    pub database_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    /// Allowed CORS origins. Empty means permissive.
    pub cors_origins: Vec<String>,
    pub min_view_count: u64,
    pub video_style_min_videos: usize,
    pub default_video_quota: usize,
    pub provider_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            gemini_api_key: None,
            youtube_api_key: None,
            serper_api_key: None,
            database_url: None,
            port: 8000,
            rust_log: "info".to_string(),
            cors_origins: vec![],
            min_view_count: 1000,
            video_style_min_videos: 3,
            default_video_quota: 2,
            provider_timeout_secs: 10,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();
        Ok(Config {
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            youtube_api_key: optional_env("YOUTUBE_API_KEY"),
            serper_api_key: optional_env("SERPER_API_KEY"),
            database_url: optional_env("DATABASE_URL"),
            port: parse_env("PORT", defaults.port)?,
            rust_log: optional_env("RUST_LOG").unwrap_or(defaults.rust_log),
            cors_origins: optional_env("CORS_ORIGINS")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
            min_view_count: parse_env("MIN_VIEW_COUNT", defaults.min_view_count)?,
            video_style_min_videos: parse_env(
                "VIDEO_STYLE_MIN_VIDEOS",
                defaults.video_style_min_videos,
            )?,
            default_video_quota: parse_env("DEFAULT_VIDEO_QUOTA", defaults.default_video_quota)?,
            provider_timeout_secs: parse_env(
                "PROVIDER_TIMEOUT_SECS",
                defaults.provider_timeout_secs,
            )?,
        })
    }

    pub fn provider_settings(&self) -> ProviderSettings {
        ProviderSettings {
            youtube_api_key: self.youtube_api_key.clone(),
            serper_api_key: self.serper_api_key.clone(),
            timeout: Duration::from_secs(self.provider_timeout_secs),
            min_view_count: self.min_view_count,
        }
    }

    pub fn quota_policy(&self) -> QuotaPolicy {
        QuotaPolicy {
            video_style_minimum: self.video_style_min_videos,
            default_quota: self.default_video_quota,
        }
    }
}

/// Unset and blank values are both `None`.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
