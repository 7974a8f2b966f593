pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::curriculum::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        .route("/api/v1/health", get(health::health_handler))
        .route(
            "/api/v1/diagnostics/llm",
            get(health::llm_diagnostics_handler),
        )
        // Roadmap API
        .route(
            "/api/v1/generate-roadmap",
            post(handlers::handle_generate_roadmap),
        )
        .route("/api/v1/roadmaps/:id", get(handlers::handle_get_roadmap))
        .route(
            "/api/v1/roadmaps/:id/modules/:module_id/complete",
            post(handlers::handle_complete_module),
        )
        .route(
            "/api/v1/roadmaps/:id/regenerate",
            post(handlers::handle_regenerate_roadmap),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::curriculum::store::DisabledStore;
    use crate::llm_client::{LlmError, TextGenerator};
    use crate::resources::enrichment::EnrichmentEngine;

    /// Gives every stage the same module list.
    struct StaticGenerator;

    #[async_trait]
    impl TextGenerator for StaticGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
            Ok(r#"```json
[{"module_name": "React Fundamentals", "skills_covered": ["JSX"],
  "resources": [{"title": "react.dev", "url": "https://react.dev/learn", "type": "docs"}]}]
```"#
                .to_string())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
            Err(LlmError::Api {
                status: 403,
                message: "API key not valid".to_string(),
            })
        }
    }

    fn app(llm: Option<Arc<dyn TextGenerator>>) -> Router {
        build_router(AppState {
            llm,
            enrichment: EnrichmentEngine::disabled(),
            store: Arc::new(DisabledStore),
        })
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn profile_body() -> Value {
        json!({
            "name": "Alex",
            "current_role": "Student",
            "target_role": "React Developer",
            "current_skills": ["HTML", "CSS"],
            "preferred_style": "Video"
        })
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        for uri in ["/health", "/api/v1/health"] {
            let (status, body) = send(app(None), get(uri)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["status"], "active");
        }
    }

    #[tokio::test]
    async fn test_diagnostics_without_credentials() {
        let (status, body) = send(app(None), get("/api/v1/diagnostics/llm?probe=true")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["gemini_configured"], false);
        assert_eq!(body["model"], "gemini-2.5-flash");
        assert!(body["resource_provider"].is_null());
        assert_eq!(body["persistence"], "disabled");
        assert_eq!(body["probe"]["ok"], false);
    }

    #[tokio::test]
    async fn test_diagnostics_probe_reports_upstream_error() {
        let (_, body) = send(
            app(Some(Arc::new(FailingGenerator))),
            get("/api/v1/diagnostics/llm?probe=true"),
        )
        .await;
        assert_eq!(body["probe"]["ok"], false);
        assert!(body["probe"]["error"]
            .as_str()
            .unwrap()
            .contains("API key not valid"));
    }

    #[tokio::test]
    async fn test_generate_without_key_is_service_unavailable() {
        let (status, body) = send(
            app(None),
            post_json("/api/v1/generate-roadmap", profile_body()),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "CONFIGURATION_ERROR");
    }

    #[tokio::test]
    async fn test_generate_rejects_blank_target_role() {
        let mut profile = profile_body();
        profile["target_role"] = json!(" ");
        let (status, body) = send(
            app(Some(Arc::new(StaticGenerator))),
            post_json("/api/v1/generate-roadmap", profile),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_generate_roadmap_without_persistence() {
        let (status, body) = send(
            app(Some(Arc::new(StaticGenerator))),
            post_json("/api/v1/generate-roadmap", profile_body()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["roadmap_id"].is_null());
        assert_eq!(body["roadmap"][0]["id"], 1);
        assert_eq!(body["roadmap"][0]["module_name"], "React Fundamentals");
        assert_eq!(body["roadmap"][0]["resources"][0]["type"], "Documentation");
        assert_eq!(body["agent_logs"][0]["agent_name"], "Market Analyst");
        assert!(body["market_analysis"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pipeline_failure_returns_partial_logs() {
        let (status, body) = send(
            app(Some(Arc::new(FailingGenerator))),
            post_json("/api/v1/generate-roadmap", profile_body()),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "PIPELINE_FAILED");
        assert_eq!(body["agent_logs"][0]["agent_name"], "Market Analyst");
    }

    #[tokio::test]
    async fn test_stored_roadmap_routes_need_persistence() {
        let id = uuid::Uuid::new_v4();
        let llm: Option<Arc<dyn TextGenerator>> = Some(Arc::new(StaticGenerator));

        let (status, _) = send(app(llm.clone()), get(&format!("/api/v1/roadmaps/{id}"))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, _) = send(
            app(llm.clone()),
            post_json(&format!("/api/v1/roadmaps/{id}/modules/1/complete"), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, body) = send(
            app(llm),
            post_json(&format!("/api/v1/roadmaps/{id}/regenerate"), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "PERSISTENCE_DISABLED");
    }
}
