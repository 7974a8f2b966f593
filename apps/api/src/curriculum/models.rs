//! Canonical records shared by every pipeline stage and the HTTP layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Input
// ────────────────────────────────────────────────────────────────────────────

/// How the learner prefers to consume material. Drives the video quota.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LearningStyle {
    #[default]
    Video,
    Text,
    Interactive,
}

impl LearningStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            LearningStyle::Video => "Video",
            LearningStyle::Text => "Text",
            LearningStyle::Interactive => "Interactive",
        }
    }
}

fn default_experience_level() -> String {
    "Beginner".to_string()
}

/// Learner profile. Immutable input to a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub current_role: String,
    pub target_role: String,
    #[serde(default)]
    pub current_skills: Vec<String>,
    #[serde(default)]
    pub preferred_style: LearningStyle,
    #[serde(default = "default_experience_level")]
    pub experience_level: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Stage outputs
// ────────────────────────────────────────────────────────────────────────────

/// A market-demanded skill identified by the market analysis stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSkill {
    pub skill: String,
    pub demand_level: String, // High | Critical | Emerging
    pub growth_metric: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceType {
    Video,
    Article,
    Course,
    Documentation,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Video => "Video",
            ResourceType::Article => "Article",
            ResourceType::Course => "Course",
            ResourceType::Documentation => "Documentation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub title: String,
    /// Never empty. Normalization substitutes a placeholder when absent.
    pub url: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub duration: String,
    pub reason: String,
}

impl Resource {
    pub fn is_video(&self) -> bool {
        self.resource_type == ResourceType::Video
    }
}

/// One curriculum module. `id` is assigned at normalization time and is
/// always contiguous 1..N in the final ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: u32,
    pub module_name: String,
    pub description: String,
    pub skills_covered: Vec<String>,
    pub resources: Vec<Resource>,
    pub why_needed: String,
    pub estimated_time: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Activity log + output record
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentLogEntry {
    pub agent_name: String,
    pub action: String,
    pub timestamp: DateTime<Utc>,
}

/// Output record of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapResponse {
    pub market_analysis: Vec<MarketSkill>,
    pub roadmap: Vec<Module>,
    pub agent_logs: Vec<AgentLogEntry>,
}
