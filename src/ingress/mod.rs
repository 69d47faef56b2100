//! Purpose: HTTP ingress for the greeting route and the JSON webhook receiver.
//! Exports: `router`, `IngressConfig`, `IngressError`, `ValidatedJson`, `ValidationIssue`.
//! Role: Builds the explicit axum `Router` served by the binary and driven by tests.
//! Invariants: `/data` reads the raw body, then decodes; each step short-circuits to an envelope.
//! Invariants: No state is shared across requests beyond the immutable body limit.
//! Notes: Inbound payloads are not authenticated (no SNS signature verification).

mod envelope;
mod validated;

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use crate::json::parse;

pub use envelope::{
    BODY_READ_DETAIL, BODY_READ_ERROR, INVALID_JSON_DETAIL, INVALID_JSON_ERROR, IngressError,
    VALIDATION_DETAIL, VALIDATION_ERROR, ValidationIssue,
};
pub use validated::ValidatedJson;

pub const GREETING: &str = "Hello, World!";
pub const RECEIVED_SNS: &str = "Received SNS message";
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Clone, Debug)]
pub struct IngressConfig {
    pub max_body_bytes: usize,
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

struct IngressState {
    max_body_bytes: usize,
}

pub fn router(config: &IngressConfig) -> Router {
    let state = Arc::new(IngressState {
        max_body_bytes: config.max_body_bytes,
    });

    Router::new()
        .route("/", get(read_root))
        .route("/data", post(post_data))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn read_root() -> Json<Value> {
    Json(json!({ "message": GREETING }))
}

async fn post_data(
    State(state): State<Arc<IngressState>>,
    body: Body,
) -> Result<Json<Value>, IngressError> {
    let bytes = read_body(body, state.max_body_bytes).await?;

    let payload = parse::decode_payload(&bytes).map_err(|failure| {
        tracing::debug!(
            category = failure.category.as_str(),
            line = failure.line,
            column = failure.column,
            "rejected request body"
        );
        IngressError::invalid_json(&failure)
    })?;

    log_payload(&payload);
    Ok(Json(json!({ "sns": RECEIVED_SNS, "payload": payload })))
}

async fn read_body(body: Body, limit: usize) -> Result<Bytes, IngressError> {
    axum::body::to_bytes(body, limit).await.map_err(|err| {
        tracing::debug!(error = %err, "failed to read request body");
        IngressError::body_read(err.to_string())
    })
}

fn log_payload(payload: &Value) {
    tracing::info!("Received SNS message. Payload contains:");
    tracing::info!("{payload}");
}

async fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not Found" })))
}
