//! Customer booking intake and cancellation.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::*;
use crate::notify;
use crate::state::AppState;
use crate::store;

/// Remaining capacity per slot on the default grid for one date.
pub async fn available(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<booking_core::SlotAvailability>>, ApiError> {
    booking_core::validate_date(&query.date)?;

    let limits: Vec<shared_types::SlotLimit> =
        store::slots_by_date(&state.db, query.tenant_id, &query.date)
            .await?
            .iter()
            .map(DbSlotLimit::to_domain)
            .collect();
    let booked = store::booked_counts(&state.db, query.tenant_id, &query.date).await?;

    Ok(Json(booking_core::availability(
        &limits,
        &booked,
        state.slot_policy,
    )))
}

/// Capacity check for one slot key, without reserving anything.
pub async fn can_book(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CanBookQuery>,
) -> Result<Json<booking_core::BookingDecision>, ApiError> {
    booking_core::validate_slot_key(&query.date, &query.time)?;

    let limit = store::slot_by_key(&state.db, query.tenant_id, &query.date, &query.time).await?;
    let limit = limit.as_ref().map(DbSlotLimit::to_domain);
    Ok(Json(booking_core::can_book(
        limit.as_ref(),
        state.slot_policy,
    )))
}

/// Take a booking: reserve the seat, create the appointment as pending and
/// open its approval request. The capacity check runs before any persistent
/// write, so a full slot rejects with nothing left behind.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitBookingRequest>,
) -> Result<Json<SubmitBookingResponse>, ApiError> {
    booking_core::validate_slot_key(&req.date, &req.time)?;
    if req.name.trim().is_empty() {
        return Err(ApiError::Validation("姓名不能為空".to_string()));
    }
    if req.phone.trim().is_empty() {
        return Err(ApiError::Validation("電話不能為空".to_string()));
    }

    let (appointment_id, approval_id) =
        store::submit_booking(&state.db, state.slot_policy, &req).await?;

    tracing::info!(
        tenant = req.tenant_id,
        appointment_id,
        date = %req.date,
        time = %req.time,
        "booking received"
    );

    notify::push_later(
        &state,
        req.line_user_id.as_deref(),
        line_notify::messages::booking_confirmation(&req.name, &req.date, &req.time),
    );

    Ok(Json(SubmitBookingResponse {
        success: true,
        appointment_id,
        approval_id,
    }))
}

pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<CancelBookingRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let appointment = store::cancel_appointment(&state.db, req.tenant_id, id).await?;
    tracing::info!(tenant = req.tenant_id, appointment_id = id, "booking cancelled");

    notify::push_later(
        &state,
        appointment.line_user_id.as_deref(),
        line_notify::LineMessage::text(format!(
            "您的預約（{} {}）已取消。",
            appointment.date, appointment.time_slot
        )),
    );

    Ok(Json(SuccessResponse::ok()))
}
