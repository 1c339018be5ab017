//! Inbound LINE platform webhook.
//!
//! Only signature validation and acknowledgement live here; event routing
//! happens upstream.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use std::sync::Arc;

use crate::state::AppState;

pub async fn line_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let Some(secret) = state.line_channel_secret.as_deref() else {
        tracing::warn!("LINE_CHANNEL_SECRET not set; webhook ignored");
        return StatusCode::SERVICE_UNAVAILABLE;
    };

    let signature = headers
        .get("x-line-signature")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !line_notify::verify_signature(secret, &body, signature) {
        tracing::warn!("rejected LINE webhook with bad signature");
        return StatusCode::UNAUTHORIZED;
    }

    let events = serde_json::from_slice::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("events").and_then(|e| e.as_array()).map(|a| a.len()))
        .unwrap_or(0);
    tracing::info!(events, "LINE webhook received");

    StatusCode::OK
}
