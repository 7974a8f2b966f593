//! Enrichment Engine — replaces curated video suggestions with real, ranked videos.
//!
//! Per module:
//! 1. Split resources into videos and non-videos
//! 2. Pick a video quota from the learner's style and the curated video count
//! 3. Ask the active provider for that many videos
//! 4. Candidates found → `candidates ++ non-videos`; otherwise resources stay as curated
//!
//! Provider failures never leave this module; they are logged and the module is
//! left untouched.

use std::sync::Arc;

use tracing::{info, warn};

use crate::curriculum::models::{LearningStyle, Module, Resource};
use crate::resources::provider::VideoProvider;

/// Video quota constants. Overridable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    /// Minimum videos per module for Video-style learners.
    pub video_style_minimum: usize,
    /// Quota when the curator suggested no videos at all.
    pub default_quota: usize,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            video_style_minimum: 3,
            default_quota: 2,
        }
    }
}

impl QuotaPolicy {
    /// Never zero: even Text/Interactive learners get a couple of videos.
    pub fn quota(&self, style: LearningStyle, curated_videos: usize) -> usize {
        if style == LearningStyle::Video {
            self.video_style_minimum.max(curated_videos)
        } else if curated_videos > 0 {
            curated_videos
        } else {
            self.default_quota
        }
    }
}

#[derive(Clone)]
pub struct EnrichmentEngine {
    provider: Option<Arc<dyn VideoProvider>>,
    policy: QuotaPolicy,
}

impl EnrichmentEngine {
    pub fn new(provider: Option<Arc<dyn VideoProvider>>, policy: QuotaPolicy) -> Self {
        Self { provider, policy }
    }

    /// An engine with no provider. Every module passes through unchanged.
    #[cfg(test)]
    pub fn disabled() -> Self {
        Self::new(None, QuotaPolicy::default())
    }

    pub fn provider_name(&self) -> Option<&'static str> {
        self.provider.as_ref().map(|p| p.name())
    }

    /// Enriches every module in order. Returns the modules and how many were enriched.
    pub async fn enrich(
        &self,
        modules: Vec<Module>,
        target_role: &str,
        style: LearningStyle,
    ) -> (Vec<Module>, usize) {
        let Some(provider) = &self.provider else {
            info!("No video provider configured; keeping curated resources");
            return (modules, 0);
        };

        let mut enriched_count = 0;
        let mut enriched = Vec::with_capacity(modules.len());
        for module in modules {
            let (module, replaced) = self
                .enrich_module(provider.as_ref(), module, target_role, style)
                .await;
            if replaced {
                enriched_count += 1;
            }
            enriched.push(module);
        }
        (enriched, enriched_count)
    }

    async fn enrich_module(
        &self,
        provider: &dyn VideoProvider,
        mut module: Module,
        target_role: &str,
        style: LearningStyle,
    ) -> (Module, bool) {
        let curated_videos = module.resources.iter().filter(|r| r.is_video()).count();
        let quota = self.policy.quota(style, curated_videos);

        let candidates = match provider
            .search_for_module(&module.module_name, &module.skills_covered, target_role, quota)
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(
                    "Video search via {} failed for module '{}': {e}",
                    provider.name(),
                    module.module_name
                );
                return (module, false);
            }
        };

        if candidates.is_empty() {
            warn!("No videos found for module '{}'; keeping curated resources", module.module_name);
            return (module, false);
        }

        info!(
            "Module '{}': {} videos via {} (quota {quota})",
            module.module_name,
            candidates.len(),
            provider.name()
        );
        let others: Vec<Resource> = module
            .resources
            .drain(..)
            .filter(|r| !r.is_video())
            .collect();
        module.resources = candidates.into_iter().chain(others).collect();
        (module, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::models::ResourceType;
    use crate::resources::provider::ProviderError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn resource(title: &str, resource_type: ResourceType) -> Resource {
        Resource {
            title: title.to_string(),
            url: "#".to_string(),
            resource_type,
            duration: "10m".to_string(),
            reason: "curated".to_string(),
        }
    }

    fn module(resources: Vec<Resource>) -> Module {
        Module {
            id: 1,
            module_name: "React Basics".to_string(),
            description: String::new(),
            skills_covered: vec!["JSX".to_string(), "Props".to_string()],
            resources,
            why_needed: String::new(),
            estimated_time: "1 week".to_string(),
        }
    }

    /// Returns `count` videos and records the requested quotas.
    #[derive(Default)]
    struct FakeProvider {
        requested: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl VideoProvider for FakeProvider {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn search_for_module(
            &self,
            _module_name: &str,
            _skills: &[String],
            _target_role: &str,
            count: usize,
        ) -> Result<Vec<Resource>, ProviderError> {
            self.requested.lock().unwrap().push(count);
            Ok((0..count)
                .map(|i| resource(&format!("found {i}"), ResourceType::Video))
                .collect())
        }
    }

    struct EmptyProvider;

    #[async_trait]
    impl VideoProvider for EmptyProvider {
        fn name(&self) -> &'static str {
            "empty"
        }

        async fn search_for_module(
            &self,
            _module_name: &str,
            _skills: &[String],
            _target_role: &str,
            _count: usize,
        ) -> Result<Vec<Resource>, ProviderError> {
            Ok(vec![])
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl VideoProvider for FailingProvider {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn search_for_module(
            &self,
            _module_name: &str,
            _skills: &[String],
            _target_role: &str,
            _count: usize,
        ) -> Result<Vec<Resource>, ProviderError> {
            Err(ProviderError::Api {
                status: 500,
                message: "boom".to_string(),
            })
        }
    }

    #[test]
    fn test_quota_policy() {
        let policy = QuotaPolicy::default();
        assert_eq!(policy.quota(LearningStyle::Video, 0), 3);
        assert_eq!(policy.quota(LearningStyle::Video, 5), 5);
        assert_eq!(policy.quota(LearningStyle::Text, 1), 1);
        assert_eq!(policy.quota(LearningStyle::Text, 0), 2);
        assert_eq!(policy.quota(LearningStyle::Interactive, 0), 2);
    }

    #[tokio::test]
    async fn test_videos_replaced_and_ordered_first() {
        let provider = Arc::new(FakeProvider::default());
        let engine = EnrichmentEngine::new(Some(provider.clone() as Arc<dyn VideoProvider>), QuotaPolicy::default());
        let input = vec![module(vec![
            resource("docs", ResourceType::Documentation),
            resource("suggested video", ResourceType::Video),
            resource("article", ResourceType::Article),
        ])];

        let (modules, enriched) = engine.enrich(input, "React Developer", LearningStyle::Video).await;

        assert_eq!(enriched, 1);
        let titles: Vec<&str> = modules[0].resources.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["found 0", "found 1", "found 2", "docs", "article"]);
        assert_eq!(*provider.requested.lock().unwrap(), vec![3]);
    }

    #[tokio::test]
    async fn test_text_learner_still_gets_default_quota() {
        let provider = Arc::new(FakeProvider::default());
        let engine = EnrichmentEngine::new(Some(provider.clone() as Arc<dyn VideoProvider>), QuotaPolicy::default());
        let input = vec![module(vec![resource("docs", ResourceType::Documentation)])];

        let (modules, _) = engine.enrich(input, "React Developer", LearningStyle::Text).await;

        assert_eq!(*provider.requested.lock().unwrap(), vec![2]);
        assert_eq!(modules[0].resources.len(), 3);
    }

    #[tokio::test]
    async fn test_failing_provider_leaves_modules_unchanged() {
        let engine = EnrichmentEngine::new(Some(Arc::new(FailingProvider)), QuotaPolicy::default());
        let input = vec![
            module(vec![
                resource("suggested video", ResourceType::Video),
                resource("docs", ResourceType::Documentation),
            ]),
            module(vec![]),
        ];

        let (modules, enriched) = engine
            .enrich(input.clone(), "React Developer", LearningStyle::Video)
            .await;

        assert_eq!(enriched, 0);
        assert_eq!(modules, input);
    }

    #[tokio::test]
    async fn test_empty_search_leaves_modules_unchanged() {
        let engine = EnrichmentEngine::new(Some(Arc::new(EmptyProvider)), QuotaPolicy::default());
        let input = vec![module(vec![resource("suggested video", ResourceType::Video)])];

        let (modules, _) = engine
            .enrich(input.clone(), "React Developer", LearningStyle::Video)
            .await;
        assert_eq!(modules, input);
    }

    #[tokio::test]
    async fn test_disabled_engine_passes_through() {
        let engine = EnrichmentEngine::disabled();
        let input = vec![module(vec![resource("article", ResourceType::Article)])];

        let (modules, enriched) = engine
            .enrich(input.clone(), "React Developer", LearningStyle::Video)
            .await;
        assert_eq!(enriched, 0);
        assert_eq!(modules, input);
        assert!(engine.provider_name().is_none());
    }
}
