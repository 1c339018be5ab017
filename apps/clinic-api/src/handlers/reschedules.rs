//! Reschedule request intake and review.

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

/// Customer-initiated reschedule request. Snapshots the slot the
/// appointment holds today so reviewers see both sides.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRescheduleRequest>,
) -> Result<Json<RescheduleResponse>, ApiError> {
    booking_core::validate_slot_key(&req.new_date, &req.new_time)?;

    let row = store::create_reschedule(&state.db, &req).await?;
    tracing::info!(
        tenant = req.tenant_id,
        appointment_id = req.appointment_id,
        new_date = %req.new_date,
        new_time = %req.new_time,
        "reschedule requested"
    );
    Ok(Json(row.into()))
}

pub async fn list_pending(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TenantQuery>,
) -> Result<Json<Vec<RescheduleResponse>>, ApiError> {
    let rows = store::pending_reschedules(&state.db, query.tenant_id).await?;
    Ok(Json(rows.into_iter().map(RescheduleResponse::from).collect()))
}

/// Approve: the new date/time lands on the appointment in the same
/// transaction as the status flip.
pub async fn approve(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<RescheduleResponse>, ApiError> {
    let row = store::decide_reschedule(
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
        "reschedule approved"
    );

    notify_decision(&state, &row, true, None).await;
    Ok(Json(row.into()))
}

/// Reject: requires a reason; the appointment keeps its original slot.
pub async fn reject(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<RejectRequest>,
) -> Result<Json<RescheduleResponse>, ApiError> {
    let row = store::decide_reschedule(
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
        "reschedule rejected"
    );

    notify_decision(&state, &row, false, Some(req.reason.as_str())).await;
    Ok(Json(row.into()))
}

async fn notify_decision(
    state: &Arc<AppState>,
    row: &DbReschedule,
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
        line_notify::messages::reschedule_decision(approved, &row.new_date, &row.new_time, reason),
    );
}
