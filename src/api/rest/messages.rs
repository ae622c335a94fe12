use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Json;
use axum::Router;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::state::AppState;
use crate::transport::InboundMessage;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/messages", post(ingest_message))
}

/// Bridge webhook for inbound chat. Accepted messages are queued for the
/// engine, not processed inline, so the bridge never waits on a dialogue.
async fn ingest_message(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<InboundMessage>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if payload.sender.trim().is_empty() {
        return Err(AppError::Validation("sender must not be empty".to_string()));
    }

    state
        .inbound_tx
        .send(payload)
        .await
        .map_err(|err| AppError::Internal(format!("inbound queue send failed: {err}")))?;

    Ok((StatusCode::ACCEPTED, Json(json!({ "status": "queued" }))))
}
