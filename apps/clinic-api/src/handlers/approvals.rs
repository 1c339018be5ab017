//! Appointment approval queue.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::*;
use crate::notify;
use crate::state::AppState;
use crate::store::{self, ReviewDecision};

/// Pending requests in FIFO review order, oldest first.
pub async fn list_pending(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TenantQuery>,
) -> Result<Json<Vec<ApprovalResponse>>, ApiError> {
    let rows = store::pending_approvals(&state.db, query.tenant_id).await?;
    Ok(Json(rows.into_iter().map(ApprovalResponse::from).collect()))
}

pub async fn approve(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<ApprovalResponse>, ApiError> {
    let row = store::decide_approval(
        &state.db,
        req.tenant_id,
        id,
        req.reviewed_by,
        &ReviewDecision::Approve,
    )
    .await?;
    tracing::info!(
        tenant = req.tenant_id,
        request = id,
        reviewer = req.reviewed_by,
        "approval granted"
    );

    notify_decision(&state, &row, true, None).await;
    Ok(Json(row.into()))
}

pub async fn reject(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<RejectRequest>,
) -> Result<Json<ApprovalResponse>, ApiError> {
    let row = store::decide_approval(
        &state.db,
        req.tenant_id,
        id,
        req.reviewed_by,
        &ReviewDecision::Reject {
            reason: req.reason.clone(),
        },
    )
    .await?;
    tracing::info!(
        tenant = req.tenant_id,
        request = id,
        reviewer = req.reviewed_by,
        "approval rejected"
    );

    notify_decision(&state, &row, false, Some(req.reason.as_str())).await;
    Ok(Json(row.into()))
}

async fn notify_decision(
    state: &Arc<AppState>,
    row: &DbApproval,
    approved: bool,
    reason: Option<&str>,
) {
    let appointment = match store::appointment_by_id(&state.db, row.tenant_id, row.appointment_id)
        .await
    {
        Ok(Some(appointment)) => appointment,
        Ok(None) => return,
        Err(err) => {
            tracing::warn!(error = %err, "could not load appointment for notification");
            return;
        }
    };

    notify::push_later(
        state,
        appointment.line_user_id.as_deref(),
        line_notify::messages::approval_decision(
            approved,
            &appointment.date,
            &appointment.time_slot,
            reason,
        ),
    );
}
