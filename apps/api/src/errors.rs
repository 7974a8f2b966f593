use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::curriculum::models::AgentLogEntry;
use crate::curriculum::pipeline::PipelineFailure;
use crate::curriculum::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// A required credential is missing. Raised before any work starts.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A generative call failed mid-run. Carries the log entries written so far.
    #[error("Pipeline failed: {message}")]
    Pipeline {
        message: String,
        logs: Vec<AgentLogEntry>,
    },

    #[error("Persistence is not configured")]
    PersistenceDisabled,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<PipelineFailure> for AppError {
    fn from(failure: PipelineFailure) -> Self {
        AppError::Pipeline {
            message: failure.to_string(),
            logs: failure.logs,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Disabled => AppError::PersistenceDisabled,
            StoreError::Database(e) => AppError::Database(e),
            StoreError::Json(e) => AppError::Internal(e.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "CONFIGURATION_ERROR",
                    msg.clone(),
                )
            }
            AppError::Pipeline { message, .. } => {
                tracing::error!("{message}");
                (StatusCode::BAD_GATEWAY, "PIPELINE_FAILED", message.clone())
            }
            AppError::PersistenceDisabled => (
                StatusCode::SERVICE_UNAVAILABLE,
                "PERSISTENCE_DISABLED",
                "Roadmap storage is not configured".to_string(),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let mut body = json!({
            "error": {
                "code": code,
                "message": message
            }
        });
        if let AppError::Pipeline { logs, .. } = &self {
            body["agent_logs"] = json!(logs);
        }

        (status, Json(body)).into_response()
    }
}
