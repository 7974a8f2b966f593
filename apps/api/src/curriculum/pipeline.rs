//! Curriculum pipeline — orchestrates the four agent stages for one learner.
//!
//! Flow: market analysis → architecture → curation → enrichment → critique.
//!
//! Each stage: prompt → `TextGenerator::generate` → `extract` → normalize → next
//! stage. An empty stage result is carried forward, not treated as failure. The
//! only fatal error is the generate call itself failing; the run then stops with
//! a `PipelineFailure` carrying the log entries written so far.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::curriculum::activity_log::{ActivityLog, LogSink};
use crate::curriculum::extractor::extract;
use crate::curriculum::models::{AgentLogEntry, MarketSkill, Module, Profile, RoadmapResponse};
use crate::curriculum::normalizer::{normalize, normalize_market};
use crate::curriculum::prompts::{
    ARCHITECT_PROMPT, COMPLETED_MODULES_NOTE, CRITIC_PROMPT, CURATOR_PROMPT, MARKET_ANALYST_PROMPT,
};
use crate::llm_client::{LlmError, TextGenerator};
use crate::resources::enrichment::EnrichmentEngine;

pub const MARKET_ANALYST: &str = "Market Analyst";
pub const ARCHITECT: &str = "Architect";
pub const CURATOR: &str = "Curator";
pub const CRITIC: &str = "Critic";
pub const SYSTEM: &str = "System";

// ────────────────────────────────────────────────────────────────────────────
// Run state
// ────────────────────────────────────────────────────────────────────────────

/// Forward-only run states. `Failed` is reachable from any stage that calls the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineStage {
    Init,
    MarketAnalysis,
    Architecture,
    Curation,
    Enrichment,
    Critique,
    Done,
    Failed,
}

/// Per-run advisory context for regeneration requests.
#[derive(Debug, Clone, Default)]
pub struct PipelineContext {
    pub completed_module_ids: Vec<u32>,
}

impl PipelineContext {
    /// Note appended to every stage from architecture onward, if anything is completed.
    fn advisory_note(&self) -> Option<String> {
        if self.completed_module_ids.is_empty() {
            return None;
        }
        let ids = self
            .completed_module_ids
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Some(COMPLETED_MODULES_NOTE.replace("{completed_ids}", &ids))
    }

    fn with_note(&self, prompt: String) -> String {
        match self.advisory_note() {
            Some(note) => prompt + &note,
            None => prompt,
        }
    }
}

/// A run that ended in `Failed`. Logs written before the failure are preserved.
#[derive(Debug, Error)]
#[error("Pipeline failed during {stage:?}: {source}")]
pub struct PipelineFailure {
    pub stage: PipelineStage,
    #[source]
    pub source: LlmError,
    pub logs: Vec<AgentLogEntry>,
}

struct RunState {
    stage: PipelineStage,
    log: ActivityLog,
}

impl RunState {
    fn advance(&mut self, next: PipelineStage) {
        debug!("Pipeline stage {:?} → {:?}", self.stage, next);
        self.stage = next;
    }

    fn fail(&mut self, source: LlmError) -> PipelineFailure {
        let stage = self.stage;
        self.log.log(SYSTEM, format!("Stage {stage:?} failed: {source}"));
        self.advance(PipelineStage::Failed);
        PipelineFailure {
            stage,
            source,
            logs: self.log.entries().to_vec(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Controller
// ────────────────────────────────────────────────────────────────────────────

/// Runs the agent pipeline. Holds no per-run state, so one controller can serve
/// concurrent runs.
#[derive(Clone)]
pub struct PipelineController {
    llm: Arc<dyn TextGenerator>,
    enrichment: EnrichmentEngine,
    sinks: Vec<Arc<dyn LogSink>>,
}

impl PipelineController {
    /// `sinks` observe every activity-log entry as it is written.
    pub fn new(
        llm: Arc<dyn TextGenerator>,
        enrichment: EnrichmentEngine,
        sinks: Vec<Arc<dyn LogSink>>,
    ) -> Self {
        Self {
            llm,
            enrichment,
            sinks,
        }
    }

    /// Runs all stages once for `profile`. `completed_module_ids` marks a
    /// regeneration request.
    pub async fn run(
        &self,
        profile: &Profile,
        completed_module_ids: Option<&[u32]>,
    ) -> Result<RoadmapResponse, PipelineFailure> {
        let context = PipelineContext {
            completed_module_ids: completed_module_ids.map(<[u32]>::to_vec).unwrap_or_default(),
        };
        let mut run = RunState {
            stage: PipelineStage::Init,
            log: ActivityLog::new(self.sinks.clone()),
        };

        let market_analysis = self.market_analysis(&mut run, profile).await?;
        let structure = self
            .architecture(&mut run, profile, &context, &market_analysis)
            .await?;
        let curated = self.curation(&mut run, profile, &context, &structure).await?;
        let enriched = self.enrichment(&mut run, profile, curated).await;
        let roadmap = self.critique(&mut run, &context, enriched).await?;

        run.advance(PipelineStage::Done);
        run.log.log(SYSTEM, "Roadmap generation complete.");

        Ok(RoadmapResponse {
            market_analysis,
            roadmap,
            agent_logs: run.log.into_entries(),
        })
    }

    async fn market_analysis(
        &self,
        run: &mut RunState,
        profile: &Profile,
    ) -> Result<Vec<MarketSkill>, PipelineFailure> {
        run.advance(PipelineStage::MarketAnalysis);
        run.log.log(
            MARKET_ANALYST,
            format!("Scanning job boards for '{}'...", profile.target_role),
        );

        let prompt = MARKET_ANALYST_PROMPT.replace("{target_role}", &profile.target_role);
        let value = self.generate_structured(run, &prompt).await?;
        let skills = normalize_market(&value);

        run.log.log(
            MARKET_ANALYST,
            format!("Identified {} critical skills.", skills.len()),
        );
        Ok(skills)
    }

    async fn architecture(
        &self,
        run: &mut RunState,
        profile: &Profile,
        context: &PipelineContext,
        market_analysis: &[MarketSkill],
    ) -> Result<Vec<Module>, PipelineFailure> {
        run.advance(PipelineStage::Architecture);
        run.log.log(
            ARCHITECT,
            "Designing curriculum structure based on gap analysis...",
        );

        let prompt = ARCHITECT_PROMPT
            .replace("{current_role}", &profile.current_role)
            .replace("{experience_level}", &profile.experience_level)
            .replace("{current_skills}", &profile.current_skills.join(", "))
            .replace("{target_role}", &profile.target_role)
            .replace("{market_trends}", &to_json(&market_analysis));
        let value = self
            .generate_structured(run, &context.with_note(prompt))
            .await?;
        let modules = normalize(&value);

        run.log.log(ARCHITECT, format!("Created {} modules.", modules.len()));
        Ok(modules)
    }

    async fn curation(
        &self,
        run: &mut RunState,
        profile: &Profile,
        context: &PipelineContext,
        structure: &[Module],
    ) -> Result<Vec<Module>, PipelineFailure> {
        run.advance(PipelineStage::Curation);
        run.log.log(
            CURATOR,
            format!(
                "Sourcing {} resources for {} modules...",
                profile.preferred_style.as_str(),
                structure.len()
            ),
        );

        let prompt = CURATOR_PROMPT
            .replace("{preferred_style}", profile.preferred_style.as_str())
            .replace("{modules}", &to_json(&structure));
        let value = self
            .generate_structured(run, &context.with_note(prompt))
            .await?;
        let modules = normalize(&value);

        let resource_count: usize = modules.iter().map(|m| m.resources.len()).sum();
        run.log.log(
            CURATOR,
            format!(
                "Curated {resource_count} resources across {} modules.",
                modules.len()
            ),
        );
        Ok(modules)
    }

    /// Never fails; provider problems leave the curated resources in place.
    async fn enrichment(&self, run: &mut RunState, profile: &Profile, curated: Vec<Module>) -> Vec<Module> {
        run.advance(PipelineStage::Enrichment);
        let Some(provider) = self.enrichment.provider_name() else {
            run.log.log(
                CURATOR,
                "No video provider configured; keeping curated resources.",
            );
            return curated;
        };

        run.log.log(
            CURATOR,
            format!("Fetching top-rated videos via {provider}..."),
        );
        let total = curated.len();
        let (modules, enriched) = self
            .enrichment
            .enrich(curated, &profile.target_role, profile.preferred_style)
            .await;
        run.log.log(
            CURATOR,
            format!("Enriched {enriched} of {total} modules with ranked videos."),
        );
        modules
    }

    async fn critique(
        &self,
        run: &mut RunState,
        context: &PipelineContext,
        enriched: Vec<Module>,
    ) -> Result<Vec<Module>, PipelineFailure> {
        run.advance(PipelineStage::Critique);
        run.log.log(CRITIC, "Validating logical flow and prerequisites...");

        let prompt = CRITIC_PROMPT.replace("{curated_path}", &to_json(&enriched));
        let value = self
            .generate_structured(run, &context.with_note(prompt))
            .await?;
        let reviewed = normalize(&value);

        // The critique has no later stage to degrade into; an empty review keeps
        // the enriched roadmap rather than discarding it.
        if reviewed.is_empty() && !enriched.is_empty() {
            warn!("Critique returned no modules; keeping the enriched roadmap");
            run.log.log(
                CRITIC,
                format!(
                    "Review produced no usable structure; keeping {} curated modules.",
                    enriched.len()
                ),
            );
            return Ok(enriched);
        }

        run.log.log(CRITIC, format!("Validated {} modules.", reviewed.len()));
        Ok(reviewed)
    }

    /// Calls the model and extracts a structure. Missing structure becomes `Null`,
    /// which every normalizer maps to an empty result.
    async fn generate_structured(
        &self,
        run: &mut RunState,
        prompt: &str,
    ) -> Result<Value, PipelineFailure> {
        let text = self.llm.generate(prompt).await.map_err(|e| run.fail(e))?;
        Ok(extract(&text).unwrap_or(Value::Null))
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "[]".to_string())
}
