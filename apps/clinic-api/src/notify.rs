//! Fire-and-forget customer notifications.

use line_notify::LineMessage;
use std::sync::Arc;

use crate::state::AppState;

/// Push a message without failing the calling mutation. Delivery errors
/// are logged, not retried; an unconfigured client or a customer without a
/// LINE account is a no-op.
pub fn push_later(state: &Arc<AppState>, user_id: Option<&str>, message: LineMessage) {
    let Some(client) = state.line.clone() else {
        return;
    };
    let Some(to) = user_id.map(str::to_string) else {
        return;
    };

    tokio::spawn(async move {
        if let Err(err) = client.push(&to, &[message]).await {
            tracing::warn!(%to, error = %err, "LINE push failed");
        }
    });
}
