//! # AI Assistant Handler
//!
//! Direct REST access to the inference bridge behind the in-chat assistant.
//!
//! ## Endpoints
//!
//! - `GET /api/ai?prompt=...` - One-shot prompt, structured JSON reply

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::{Extension, Json};
use lib_auth::Identity;
use lib_core::error::{AppError, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::collab::AiBridge;

#[derive(Debug, Deserialize)]
pub struct AiQuery {
    pub prompt: String,
}

/// Run one prompt through the inference bridge.
///
/// **Route**: `GET /api/ai?prompt=...`
///
/// Shares the bridge with the in-chat `@ai` path, so replies have the same
/// shape: a JSON object with at least a `text` field.
pub async fn get_ai_result(
    State(bridge): State<Arc<AiBridge>>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<AiQuery>,
) -> Result<Json<Value>> {
    debug!(
        "[AI] DIRECT_REQUEST caller={} prompt_chars={}",
        identity.id,
        query.prompt.chars().count()
    );

    let reply = bridge.infer(&query.prompt).await.map_err(|e| {
        warn!("[AI] DIRECT_FAILED caller={} error={}", identity.id, e);
        AppError::Inference(e.to_string())
    })?;

    Ok(Json(reply.into_value()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{AiBridgeError, AiReply, InferenceBackend};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use serde_json::json;
    use std::time::Duration;
    use tower::ServiceExt;

    struct CannedReply(&'static str);

    #[async_trait]
    impl InferenceBackend for CannedReply {
        async fn generate(&self, _prompt: &str) -> std::result::Result<AiReply, AiBridgeError> {
            Ok(AiReply::PlainText(self.0.to_string()))
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl InferenceBackend for FailingBackend {
        async fn generate(&self, _prompt: &str) -> std::result::Result<AiReply, AiBridgeError> {
            Err(AiBridgeError::Backend("provider unreachable".to_string()))
        }
    }

    fn test_app(backend: Arc<dyn InferenceBackend>) -> Router {
        let bridge = Arc::new(AiBridge::new(backend, Duration::from_secs(5)));
        Router::new()
            .route("/ai", get(get_ai_result))
            .layer(Extension(Identity {
                id: 1,
                email: "alice@example.com".to_string(),
            }))
            .with_state(bridge)
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .body(Body::empty())
                    .expect("request should build"),
            )
            .await
            .expect("request should not fail");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should read");
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_prompt_answers_structured_payload() {
        let app = test_app(Arc::new(CannedReply("use a trait object")));

        let (status, body) = get_json(&app, "/ai?prompt=how%20do%20I%20dispatch").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "text": "use a trait object" }));
    }

    #[tokio::test]
    async fn test_backend_failure_maps_to_bad_gateway() {
        let app = test_app(Arc::new(FailingBackend));

        let (status, body) = get_json(&app, "/ai?prompt=hello").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "AI service temporarily unavailable");
    }

    #[tokio::test]
    async fn test_missing_prompt_is_rejected() {
        let app = test_app(Arc::new(CannedReply("unused")));

        let (status, _) = get_json(&app, "/ai").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
