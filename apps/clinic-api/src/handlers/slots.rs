//! Slot capacity management.

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::*;
use crate::state::AppState;
use crate::store;

pub async fn get_by_date(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SlotsByDateQuery>,
) -> Result<Json<Vec<SlotLimitResponse>>, ApiError> {
    booking_core::validate_date(&query.date)?;
    let rows = store::slots_by_date(&state.db, query.tenant_id, &query.date).await?;
    Ok(Json(rows.into_iter().map(SlotLimitResponse::from).collect()))
}

pub async fn get_by_range(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SlotsByRangeQuery>,
) -> Result<Json<Vec<SlotLimitResponse>>, ApiError> {
    booking_core::validate_date(&query.start_date)?;
    booking_core::validate_date(&query.end_date)?;
    let rows = store::slots_by_range(
        &state.db,
        query.tenant_id,
        &query.start_date,
        &query.end_date,
    )
    .await?;
    Ok(Json(rows.into_iter().map(SlotLimitResponse::from).collect()))
}

pub async fn set_limit(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SetSlotLimitRequest>,
) -> Result<Json<SlotLimitResponse>, ApiError> {
    booking_core::validate_slot_key(&req.date, &req.time)?;
    let max_capacity = booking_core::validate_capacity(req.max_capacity)?;

    let row =
        store::upsert_slot_limit(&state.db, req.tenant_id, &req.date, &req.time, max_capacity)
            .await?;
    tracing::info!(
        tenant = req.tenant_id,
        date = %req.date,
        time = %req.time,
        max_capacity,
        "set slot limit"
    );
    Ok(Json(row.into()))
}

pub async fn delete_limit(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DeleteSlotLimitQuery>,
) -> Result<Json<SuccessResponse>, ApiError> {
    booking_core::validate_slot_key(&query.date, &query.time)?;
    store::delete_slot_limit(&state.db, query.tenant_id, &query.date, &query.time).await?;
    Ok(Json(SuccessResponse::ok()))
}
