use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::llm_client::MODEL;
use crate::state::AppState;

const PROBE_PROMPT: &str = "Reply with the JSON object {\"status\": \"ok\"}.";

/// GET /
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "message": "Waypoint curriculum API is online",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /health
/// Returns a simple status object with service version.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "active",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "waypoint-api"
    }))
}

#[derive(Debug, Deserialize)]
pub struct DiagnosticsQuery {
    #[serde(default)]
    pub probe: bool,
}

/// GET /api/v1/diagnostics/llm
/// Reports configured collaborators. `?probe=true` makes one live generate call.
pub async fn llm_diagnostics_handler(
    State(state): State<AppState>,
    Query(params): Query<DiagnosticsQuery>,
) -> Json<Value> {
    let mut report = json!({
        "gemini_configured": state.llm.is_some(),
        "model": MODEL,
        "resource_provider": state.enrichment.provider_name(),
        "persistence": state.store.name(),
    });

    if params.probe {
        report["probe"] = match &state.llm {
            None => json!({ "ok": false, "error": "GEMINI_API_KEY is not configured" }),
            Some(llm) => match llm.generate(PROBE_PROMPT).await {
                Ok(text) => json!({ "ok": true, "response_chars": text.chars().count() }),
                Err(e) => {
                    warn!("LLM probe failed: {e}");
                    json!({ "ok": false, "error": e.to_string() })
                }
            },
        };
    }

    Json(report)
}
