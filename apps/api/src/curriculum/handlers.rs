use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::curriculum::models::{Profile, RoadmapResponse};
use crate::curriculum::store::StoredRoadmap;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct GenerateRoadmapResponse {
    /// `None` when persistence is disabled or saving failed.
    pub roadmap_id: Option<Uuid>,
    #[serde(flatten)]
    pub output: RoadmapResponse,
}

fn validate_profile(profile: &Profile) -> Result<(), AppError> {
    if profile.name.trim().is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }
    if profile.target_role.trim().is_empty() {
        return Err(AppError::Validation(
            "target_role must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Saves a finished run. A storage failure is logged and the run is still returned.
async fn persist(
    state: &AppState,
    profile: &Profile,
    output: &RoadmapResponse,
    parent_roadmap_id: Option<Uuid>,
) -> Option<Uuid> {
    match state.store.save_run(profile, output, parent_roadmap_id).await {
        Ok(id) => id,
        Err(e) => {
            error!("Failed to save roadmap for '{}': {e}", profile.target_role);
            None
        }
    }
}

/// POST /api/v1/generate-roadmap
pub async fn handle_generate_roadmap(
    State(state): State<AppState>,
    Json(profile): Json<Profile>,
) -> Result<Json<GenerateRoadmapResponse>, AppError> {
    validate_profile(&profile)?;
    let pipeline = state.pipeline()?;

    info!(
        "Generating roadmap: '{}' → '{}' ({})",
        profile.current_role,
        profile.target_role,
        profile.preferred_style.as_str()
    );
    let output = pipeline.run(&profile, None).await?;
    let roadmap_id = persist(&state, &profile, &output, None).await;

    Ok(Json(GenerateRoadmapResponse { roadmap_id, output }))
}

/// GET /api/v1/roadmaps/:id
pub async fn handle_get_roadmap(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StoredRoadmap>, AppError> {
    let roadmap = state
        .store
        .load_roadmap(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Roadmap {id} not found")))?;
    Ok(Json(roadmap))
}

/// POST /api/v1/roadmaps/:id/modules/:module_id/complete
pub async fn handle_complete_module(
    State(state): State<AppState>,
    Path((id, module_id)): Path<(Uuid, u32)>,
) -> Result<StatusCode, AppError> {
    if !state.store.mark_module_complete(id, module_id).await? {
        return Err(AppError::NotFound(format!(
            "Module {module_id} not found in roadmap {id}"
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/roadmaps/:id/regenerate
pub async fn handle_regenerate_roadmap(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GenerateRoadmapResponse>, AppError> {
    let pipeline = state.pipeline()?;
    let input = state
        .store
        .load_regeneration_input(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Roadmap {id} not found")))?;

    info!(
        "Regenerating roadmap {id} with {} completed modules",
        input.completed_module_ids.len()
    );
    let output = pipeline
        .run(&input.profile, Some(input.completed_module_ids.as_slice()))
        .await?;
    let roadmap_id = persist(&state, &input.profile, &output, Some(id)).await;

    Ok(Json(GenerateRoadmapResponse { roadmap_id, output }))
}
