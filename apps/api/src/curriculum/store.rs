//! Roadmap persistence.
//!
//! A run is saved in a single transaction: the learner, the roadmap header,
//! modules with their resources, and the activity log. A regeneration reuses
//! the parent roadmap's learner instead of inserting another one. Module
//! progress is the only thing mutated afterwards.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::curriculum::models::{Module, Profile, Resource, RoadmapResponse};
use crate::models::roadmap::{AgentLogRow, ModuleRow, ResourceRow, RoadmapRow};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Persistence is not configured")]
    Disabled,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Roadmap JSON column could not be converted: {0}")]
    Json(#[from] serde_json::Error),
}

/// A persisted roadmap as returned by the HTTP layer.
#[derive(Debug, Clone, Serialize)]
pub struct StoredRoadmap {
    pub roadmap_id: Uuid,
    pub target_role: String,
    pub parent_roadmap_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub completed_module_ids: Vec<u32>,
    #[serde(flatten)]
    pub output: RoadmapResponse,
}

/// Everything needed to re-run the pipeline for an existing roadmap.
#[derive(Debug, Clone)]
pub struct RegenerationInput {
    pub profile: Profile,
    pub completed_module_ids: Vec<u32>,
}

#[async_trait]
pub trait RoadmapStore: Send + Sync {
    /// Short label for diagnostics.
    fn name(&self) -> &'static str;

    /// Persists one run. `None` when persistence is disabled.
    async fn save_run(
        &self,
        profile: &Profile,
        output: &RoadmapResponse,
        parent_roadmap_id: Option<Uuid>,
    ) -> Result<Option<Uuid>, StoreError>;

    async fn load_roadmap(&self, roadmap_id: Uuid) -> Result<Option<StoredRoadmap>, StoreError>;

    async fn load_regeneration_input(
        &self,
        roadmap_id: Uuid,
    ) -> Result<Option<RegenerationInput>, StoreError>;

    /// Records a module as completed. Idempotent. `false` if the roadmap has no such module.
    async fn mark_module_complete(&self, roadmap_id: Uuid, module_id: u32) -> Result<bool, StoreError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Disabled store
// ────────────────────────────────────────────────────────────────────────────

/// Used when no database is configured. Runs are served but never saved.
pub struct DisabledStore;

#[async_trait]
impl RoadmapStore for DisabledStore {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn save_run(
        &self,
        _profile: &Profile,
        _output: &RoadmapResponse,
        _parent_roadmap_id: Option<Uuid>,
    ) -> Result<Option<Uuid>, StoreError> {
        Ok(None)
    }

    async fn load_roadmap(&self, _roadmap_id: Uuid) -> Result<Option<StoredRoadmap>, StoreError> {
        Err(StoreError::Disabled)
    }

    async fn load_regeneration_input(
        &self,
        _roadmap_id: Uuid,
    ) -> Result<Option<RegenerationInput>, StoreError> {
        Err(StoreError::Disabled)
    }

    async fn mark_module_complete(&self, _roadmap_id: Uuid, _module_id: u32) -> Result<bool, StoreError> {
        Err(StoreError::Disabled)
    }
}

/// The learner a saved run belongs to. Regenerations stay with the parent
/// roadmap's learner; a fresh run (or an orphaned parent) gets a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Learner {
    user_id: Uuid,
    is_new: bool,
}

impl Learner {
    fn for_run(parent_user: Option<Uuid>) -> Self {
        match parent_user {
            Some(user_id) => Self { user_id, is_new: false },
            None => Self { user_id: Uuid::new_v4(), is_new: true },
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// PostgreSQL store
// ────────────────────────────────────────────────────────────────────────────

pub struct PgRoadmapStore {
    pool: PgPool,
}

impl PgRoadmapStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_roadmap_row(&self, roadmap_id: Uuid) -> Result<Option<RoadmapRow>, StoreError> {
        Ok(
            sqlx::query_as::<_, RoadmapRow>("SELECT * FROM roadmaps WHERE id = $1")
                .bind(roadmap_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn completed_module_ids(&self, roadmap_id: Uuid) -> Result<Vec<u32>, StoreError> {
        let indexes: Vec<i32> = sqlx::query_scalar(
            "SELECT module_index FROM module_progress WHERE roadmap_id = $1 ORDER BY module_index",
        )
        .bind(roadmap_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(indexes
            .into_iter()
            .filter_map(|i| u32::try_from(i).ok())
            .collect())
    }

    async fn load_modules(&self, roadmap_id: Uuid) -> Result<Vec<Module>, StoreError> {
        let module_rows = sqlx::query_as::<_, ModuleRow>(
            "SELECT * FROM modules WHERE roadmap_id = $1 ORDER BY module_index ASC",
        )
        .bind(roadmap_id)
        .fetch_all(&self.pool)
        .await?;

        let resource_rows = sqlx::query_as::<_, ResourceRow>(
            r#"
            SELECT r.*
            FROM resources r
            JOIN modules m ON m.id = r.module_id
            WHERE m.roadmap_id = $1
            ORDER BY m.module_index ASC, r.position ASC
            "#,
        )
        .bind(roadmap_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_module: HashMap<Uuid, Vec<Resource>> = HashMap::new();
        for row in resource_rows {
            by_module.entry(row.module_id).or_default().push(row.into());
        }

        Ok(module_rows
            .into_iter()
            .map(|row| {
                let resources = by_module.remove(&row.id).unwrap_or_default();
                row.into_module(resources)
            })
            .collect())
    }
}

#[async_trait]
impl RoadmapStore for PgRoadmapStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn save_run(
        &self,
        profile: &Profile,
        output: &RoadmapResponse,
        parent_roadmap_id: Option<Uuid>,
    ) -> Result<Option<Uuid>, StoreError> {
        let roadmap_id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        let parent_user = match parent_roadmap_id {
            Some(parent_id) => {
                sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM roadmaps WHERE id = $1")
                    .bind(parent_id)
                    .fetch_optional(&mut *tx)
                    .await?
            }
            None => None,
        };
        let learner = Learner::for_run(parent_user);

        if learner.is_new {
            sqlx::query("INSERT INTO users (id, name, current_title) VALUES ($1, $2, $3)")
                .bind(learner.user_id)
                .bind(&profile.name)
                .bind(&profile.current_role)
                .execute(&mut *tx)
                .await?;
        }
        let user_id = learner.user_id;

        sqlx::query(
            r#"
            INSERT INTO roadmaps (id, user_id, target_role, profile, market_analysis, parent_roadmap_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(roadmap_id)
        .bind(user_id)
        .bind(&profile.target_role)
        .bind(serde_json::to_value(profile)?)
        .bind(serde_json::to_value(&output.market_analysis)?)
        .bind(parent_roadmap_id)
        .execute(&mut *tx)
        .await?;

        for module in &output.roadmap {
            let module_row_id = Uuid::new_v4();
            sqlx::query(
                r#"
                INSERT INTO modules
                    (id, roadmap_id, module_index, module_name, description,
                     skills_covered, why_needed, estimated_time)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(module_row_id)
            .bind(roadmap_id)
            .bind(module.id as i32)
            .bind(&module.module_name)
            .bind(&module.description)
            .bind(serde_json::to_value(&module.skills_covered)?)
            .bind(&module.why_needed)
            .bind(&module.estimated_time)
            .execute(&mut *tx)
            .await?;

            for (position, resource) in module.resources.iter().enumerate() {
                sqlx::query(
                    r#"
                    INSERT INTO resources
                        (id, module_id, position, title, url, resource_type, duration, reason)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(module_row_id)
                .bind(position as i32)
                .bind(&resource.title)
                .bind(&resource.url)
                .bind(resource.resource_type.as_str())
                .bind(&resource.duration)
                .bind(&resource.reason)
                .execute(&mut *tx)
                .await?;
            }
        }

        for (position, entry) in output.agent_logs.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO agent_logs (id, roadmap_id, position, agent_name, action, logged_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(roadmap_id)
            .bind(position as i32)
            .bind(&entry.agent_name)
            .bind(&entry.action)
            .bind(entry.timestamp)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!(
            "Saved roadmap {roadmap_id} ({} modules, {} log entries)",
            output.roadmap.len(),
            output.agent_logs.len()
        );
        Ok(Some(roadmap_id))
    }

    async fn load_roadmap(&self, roadmap_id: Uuid) -> Result<Option<StoredRoadmap>, StoreError> {
        let Some(row) = self.fetch_roadmap_row(roadmap_id).await? else {
            return Ok(None);
        };

        let roadmap = self.load_modules(roadmap_id).await?;
        let agent_logs = sqlx::query_as::<_, AgentLogRow>(
            "SELECT * FROM agent_logs WHERE roadmap_id = $1 ORDER BY position ASC",
        )
        .bind(roadmap_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

        Ok(Some(StoredRoadmap {
            roadmap_id: row.id,
            target_role: row.target_role,
            parent_roadmap_id: row.parent_roadmap_id,
            created_at: row.created_at,
            completed_module_ids: self.completed_module_ids(roadmap_id).await?,
            output: RoadmapResponse {
                market_analysis: serde_json::from_value(row.market_analysis)?,
                roadmap,
                agent_logs,
            },
        }))
    }

    async fn load_regeneration_input(
        &self,
        roadmap_id: Uuid,
    ) -> Result<Option<RegenerationInput>, StoreError> {
        let Some(row) = self.fetch_roadmap_row(roadmap_id).await? else {
            return Ok(None);
        };
        Ok(Some(RegenerationInput {
            profile: serde_json::from_value(row.profile)?,
            completed_module_ids: self.completed_module_ids(roadmap_id).await?,
        }))
    }

    async fn mark_module_complete(&self, roadmap_id: Uuid, module_id: u32) -> Result<bool, StoreError> {
        let Ok(module_index) = i32::try_from(module_id) else {
            return Ok(false);
        };

        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM modules WHERE roadmap_id = $1 AND module_index = $2)",
        )
        .bind(roadmap_id)
        .bind(module_index)
        .fetch_one(&self.pool)
        .await?;
        if !exists {
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO module_progress (roadmap_id, module_index)
            VALUES ($1, $2)
            ON CONFLICT (roadmap_id, module_index) DO NOTHING
            "#,
        )
        .bind(roadmap_id)
        .bind(module_index)
        .execute(&self.pool)
        .await?;
        Ok(true)
    }
}
