//! Thin HTTP layer over the engine.
//!
//! Plumbing only; all design content lives in the engine. A failed step
//! still returns the session body (with `status: "error"` and the error
//! message filled in) so the frontend can render partial state; the
//! non-2xx status code is the failure signal.

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::engine::DebugEngine;
use crate::error::EngineError;

pub struct ApiServer {
    engine: Arc<DebugEngine>,
    port: u16,
}

impl ApiServer {
    pub fn new(engine: Arc<DebugEngine>, port: u16) -> Self {
        Self { engine, port }
    }

    pub async fn start(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let app = router(self.engine);

        info!("Starting debug API server on {addr}");

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;
        Ok(())
    }
}

/// Build the API router; split out so tests can drive it in-process.
pub fn router(engine: Arc<DebugEngine>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/debug/start", post(start_session))
        .route("/api/debug/{id}/step", post(step_session))
        .route("/api/debug/{id}/reset", post(reset_session))
        .route("/api/debug/{id}", get(get_session))
        .layer(CorsLayer::permissive())
        .with_state(engine)
}

#[derive(Debug, Deserialize)]
struct StartRequest {
    code: String,
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

async fn start_session(
    State(engine): State<Arc<DebugEngine>>,
    Json(request): Json<StartRequest>,
) -> Result<Response, ApiError> {
    let session = engine.start(&request.code).await?;
    Ok(Json(session).into_response())
}

async fn step_session(
    State(engine): State<Arc<DebugEngine>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let outcome = engine.step(&id).await?;
    let status = if outcome.failure.is_some() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::OK
    };
    Ok((status, Json(outcome.session)).into_response())
}

async fn reset_session(
    State(engine): State<Arc<DebugEngine>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let session = engine.reset(&id).await?;
    Ok(Json(session).into_response())
}

async fn get_session(
    State(engine): State<Arc<DebugEngine>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let session = engine.get(&id).await?;
    Ok(Json(session).into_response())
}

struct ApiError(EngineError);

impl From<EngineError> for ApiError {
    fn from(error: EngineError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            EngineError::Validation(_) => StatusCode::BAD_REQUEST,
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::Session(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({"error": self.0.to_string()}))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::NoopAnalyzer;
    use crate::config::EngineConfig;
    use crate::protocol::{DEBUG_END, DEBUG_START};
    use crate::subprocess::MockProcessRunner;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_router(mock: MockProcessRunner) -> Router {
        let engine = DebugEngine::new(
            EngineConfig::default(),
            Arc::new(mock),
            Arc::new(NoopAnalyzer),
        );
        router(Arc::new(engine))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_start_and_step_roundtrip() {
        let mut mock = MockProcessRunner::new();
        mock.expect_command("python3")
            .returns_stdout(&format!(
                "{DEBUG_START}\n{}\n{DEBUG_END}\n",
                r#"{"variables": [{"name": "x", "value": "1", "type": "int", "line": 1}], "output": "", "line": 1}"#
            ))
            .finish();
        let app = test_router(mock);

        let response = app
            .clone()
            .oneshot(post_json("/api/debug/start", json!({"code": "x = 1"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let session = body_json(response).await;
        assert_eq!(session["status"], "initialized");
        let id = session["id"].as_str().unwrap().to_string();

        let response = app
            .oneshot(post_json(&format!("/api/debug/{id}/step"), json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let session = body_json(response).await;
        assert_eq!(session["status"], "completed");
        assert_eq!(session["variables"][0]["name"], "x");
    }

    #[tokio::test]
    async fn test_start_empty_code_is_bad_request() {
        let app = test_router(MockProcessRunner::new());
        let response = app
            .oneshot(post_json("/api/debug/start", json!({"code": "  "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("empty"));
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let app = test_router(MockProcessRunner::new());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/debug/no-such-id")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_failed_step_returns_session_with_error_status() {
        let mut mock = MockProcessRunner::new();
        mock.expect_command("python3")
            .returns_exit_code(1)
            .returns_stderr("NameError: name 'y' is not defined")
            .finish();
        let app = test_router(mock);

        let response = app
            .clone()
            .oneshot(post_json("/api/debug/start", json!({"code": "print(y)"})))
            .await
            .unwrap();
        let id = body_json(response).await["id"].as_str().unwrap().to_string();

        let response = app
            .oneshot(post_json(&format!("/api/debug/{id}/step"), json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let session = body_json(response).await;
        assert_eq!(session["status"], "error");
        assert!(session["error"].as_str().unwrap().contains("NameError"));
    }
}
