use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::curriculum::models::{AgentLogEntry, Module, Resource};
use crate::curriculum::normalizer::canonical_resource_type;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoadmapRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub target_role: String,
    /// The `Profile` the roadmap was generated from.
    pub profile: Value,
    pub market_analysis: Value,
    pub parent_roadmap_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ModuleRow {
    pub id: Uuid,
    pub roadmap_id: Uuid,
    pub module_index: i32,
    pub module_name: String,
    pub description: String,
    pub skills_covered: Value,
    pub why_needed: String,
    pub estimated_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResourceRow {
    pub id: Uuid,
    pub module_id: Uuid,
    pub position: i32,
    pub title: String,
    pub url: String,
    pub resource_type: String,
    pub duration: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AgentLogRow {
    pub id: Uuid,
    pub roadmap_id: Uuid,
    pub position: i32,
    pub agent_name: String,
    pub action: String,
    pub logged_at: DateTime<Utc>,
}

impl ModuleRow {
    pub fn into_module(self, resources: Vec<Resource>) -> Module {
        let skills_covered = match self.skills_covered {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => vec![],
        };
        Module {
            id: u32::try_from(self.module_index).unwrap_or_default(),
            module_name: self.module_name,
            description: self.description,
            skills_covered,
            resources,
            why_needed: self.why_needed,
            estimated_time: self.estimated_time,
        }
    }
}

impl From<ResourceRow> for Resource {
    fn from(row: ResourceRow) -> Self {
        Resource {
            title: row.title,
            url: row.url,
            resource_type: canonical_resource_type(Some(&row.resource_type)),
            duration: row.duration,
            reason: row.reason,
        }
    }
}

impl From<AgentLogRow> for AgentLogEntry {
    fn from(row: AgentLogRow) -> Self {
        AgentLogEntry {
            agent_name: row.agent_name,
            action: row.action,
            timestamp: row.logged_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::models::ResourceType;
    use serde_json::json;

    #[test]
    fn test_module_row_restores_canonical_module() {
        let row = ModuleRow {
            id: Uuid::new_v4(),
            roadmap_id: Uuid::new_v4(),
            module_index: 2,
            module_name: "React Fundamentals".to_string(),
            description: "Components and props".to_string(),
            skills_covered: json!(["JSX", 7, "Props"]),
            why_needed: "Core of the role".to_string(),
            estimated_time: "2 weeks".to_string(),
        };
        let module = row.into_module(vec![]);
        assert_eq!(module.id, 2);
        assert_eq!(module.skills_covered, vec!["JSX", "Props"]);
    }

    #[test]
    fn test_resource_row_type_round_trips_through_labels() {
        for resource_type in [
            ResourceType::Video,
            ResourceType::Article,
            ResourceType::Course,
            ResourceType::Documentation,
        ] {
            let row = ResourceRow {
                id: Uuid::new_v4(),
                module_id: Uuid::new_v4(),
                position: 0,
                title: "t".to_string(),
                url: "#".to_string(),
                resource_type: resource_type.as_str().to_string(),
                duration: "Varies".to_string(),
                reason: String::new(),
            };
            assert_eq!(Resource::from(row).resource_type, resource_type);
        }
    }
}
