//! Compliance keyword management and content scanning.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use shared_types::CheckResult;
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::*;
use crate::state::AppState;
use crate::store;

pub async fn list_keywords(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListKeywordsQuery>,
) -> Result<Json<Vec<KeywordResponse>>, ApiError> {
    let rows = store::list_keywords(&state.db, query.tenant_id, query.severity).await?;
    Ok(Json(rows.into_iter().map(KeywordResponse::from).collect()))
}

pub async fn create_keyword(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateKeywordRequest>,
) -> Result<Json<KeywordResponse>, ApiError> {
    if !compliance_engine::is_valid_keyword(&req.keyword) {
        return Err(ApiError::Validation("警示詞不能為空".to_string()));
    }

    let row = store::create_keyword(&state.db, &req).await?;
    tracing::info!(tenant = req.tenant_id, keyword = %req.keyword, "created compliance keyword");
    Ok(Json(row.into()))
}

pub async fn update_keyword(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateKeywordRequest>,
) -> Result<Json<KeywordResponse>, ApiError> {
    if let Some(keyword) = &req.keyword {
        if !compliance_engine::is_valid_keyword(keyword) {
            return Err(ApiError::Validation("警示詞不能為空".to_string()));
        }
    }

    let row = store::update_keyword(&state.db, id, &req).await?;
    Ok(Json(row.into()))
}

pub async fn delete_keyword(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<TenantQuery>,
) -> Result<Json<SuccessResponse>, ApiError> {
    store::delete_keyword(&state.db, query.tenant_id, id).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// Scan content against the tenant's rule set. Stateless: the result is
/// recomputed on every request, so the caller-side debounce needs no
/// support here.
pub async fn check_content(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CheckContentRequest>,
) -> Result<Json<CheckResult>, ApiError> {
    let rules = store::rules_for_tenant(&state.db, req.tenant_id).await?;
    Ok(Json(state.engine.check_content(&req.content, &rules)))
}
