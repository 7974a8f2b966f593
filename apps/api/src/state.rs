use std::sync::Arc;

use crate::curriculum::activity_log::TracingSink;
use crate::curriculum::pipeline::PipelineController;
use crate::curriculum::store::RoadmapStore;
use crate::errors::AppError;
use crate::llm_client::TextGenerator;
use crate::resources::enrichment::EnrichmentEngine;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// `None` when no Gemini key is configured.
    pub llm: Option<Arc<dyn TextGenerator>>,
    pub enrichment: EnrichmentEngine,
    /// `DisabledStore` when no database is configured.
    pub store: Arc<dyn RoadmapStore>,
}

impl AppState {
    /// A controller for one run. Fails before any stage runs if the
    /// generative credential is missing.
    pub fn pipeline(&self) -> Result<PipelineController, AppError> {
        let llm = self.llm.clone().ok_or_else(|| {
            AppError::Configuration("GEMINI_API_KEY is not configured".to_string())
        })?;
        Ok(PipelineController::new(
            llm,
            self.enrichment.clone(),
            vec![Arc::new(TracingSink)],
        ))
    }
}
