//! Data models for the clinic API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{ApprovalStatus, Severity};
use sqlx::FromRow;

// ============================================================
// Compliance keywords
// ============================================================

#[derive(Debug, Clone, FromRow)]
pub struct DbKeyword {
    pub id: i64,
    pub tenant_id: i64,
    pub keyword: String,
    pub severity: String,
    pub regulation_reference: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordResponse {
    pub id: i64,
    pub keyword: String,
    pub severity: Severity,
    pub regulation_reference: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<DbKeyword> for KeywordResponse {
    fn from(row: DbKeyword) -> Self {
        KeywordResponse {
            id: row.id,
            keyword: row.keyword,
            severity: row.severity.parse().unwrap_or(Severity::Warning),
            regulation_reference: row.regulation_reference,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListKeywordsQuery {
    pub tenant_id: i64,
    pub severity: Option<Severity>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateKeywordRequest {
    pub tenant_id: i64,
    pub keyword: String,
    pub severity: Severity,
    #[serde(default)]
    pub regulation_reference: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateKeywordRequest {
    pub tenant_id: i64,
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub regulation_reference: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantQuery {
    pub tenant_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckContentRequest {
    pub tenant_id: i64,
    pub content: String,
}

// ============================================================
// Slot limits
// ============================================================

#[derive(Debug, Clone, FromRow)]
pub struct DbSlotLimit {
    pub id: i64,
    pub tenant_id: i64,
    pub date: String,
    pub time_slot: String,
    pub max_capacity: i64,
    pub current_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotLimitResponse {
    pub id: i64,
    pub tenant_id: i64,
    pub date: String,
    pub time: String,
    pub max_capacity: u32,
    pub current_count: u32,
    pub is_full: bool,
}

impl DbSlotLimit {
    /// Domain view for the capacity math in `booking-core`.
    pub fn to_domain(&self) -> shared_types::SlotLimit {
        shared_types::SlotLimit {
            tenant_id: shared_types::TenantId(self.tenant_id),
            date: self.date.clone(),
            time: self.time_slot.clone(),
            max_capacity: self.max_capacity.max(0) as u32,
            current_count: self.current_count.max(0) as u32,
        }
    }
}

impl From<DbSlotLimit> for SlotLimitResponse {
    fn from(row: DbSlotLimit) -> Self {
        let max_capacity = row.max_capacity.max(0) as u32;
        let current_count = row.current_count.max(0) as u32;
        SlotLimitResponse {
            id: row.id,
            tenant_id: row.tenant_id,
            date: row.date,
            time: row.time_slot,
            max_capacity,
            current_count,
            is_full: current_count >= max_capacity,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotsByDateQuery {
    pub tenant_id: i64,
    pub date: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotsByRangeQuery {
    pub tenant_id: i64,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSlotLimitRequest {
    pub tenant_id: i64,
    pub date: String,
    pub time: String,
    pub max_capacity: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSlotLimitQuery {
    pub tenant_id: i64,
    pub date: String,
    pub time: String,
}

// ============================================================
// Bookings
// ============================================================

#[derive(Debug, Clone, FromRow)]
pub struct DbAppointment {
    pub id: i64,
    pub tenant_id: i64,
    pub customer_name: String,
    pub customer_phone: String,
    pub line_user_id: Option<String>,
    pub date: String,
    pub time_slot: String,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub tenant_id: i64,
    pub date: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanBookQuery {
    pub tenant_id: i64,
    pub date: String,
    pub time: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitBookingRequest {
    pub tenant_id: i64,
    pub date: String,
    pub time: String,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub line_user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitBookingResponse {
    pub success: bool,
    pub appointment_id: i64,
    pub approval_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelBookingRequest {
    pub tenant_id: i64,
}

// ============================================================
// Approvals
// ============================================================

#[derive(Debug, Clone, FromRow)]
pub struct DbApproval {
    pub id: i64,
    pub tenant_id: i64,
    pub appointment_id: i64,
    pub status: String,
    pub reviewed_by: Option<i64>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalResponse {
    pub id: i64,
    pub tenant_id: i64,
    pub appointment_id: i64,
    pub status: ApprovalStatus,
    pub reviewed_by: Option<i64>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<DbApproval> for ApprovalResponse {
    fn from(row: DbApproval) -> Self {
        ApprovalResponse {
            id: row.id,
            tenant_id: row.tenant_id,
            appointment_id: row.appointment_id,
            status: row.status.parse().unwrap_or(ApprovalStatus::Pending),
            reviewed_by: row.reviewed_by,
            reviewed_at: row.reviewed_at,
            reason: row.reason,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub tenant_id: i64,
    pub reviewed_by: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectRequest {
    pub tenant_id: i64,
    pub reviewed_by: i64,
    pub reason: String,
}

// ============================================================
// Reschedules
// ============================================================

#[derive(Debug, Clone, FromRow)]
pub struct DbReschedule {
    pub id: i64,
    pub tenant_id: i64,
    pub appointment_id: i64,
    pub new_date: String,
    pub new_time: String,
    pub original_date: String,
    pub original_time: String,
    pub status: String,
    pub reviewed_by: Option<i64>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleResponse {
    pub id: i64,
    pub tenant_id: i64,
    pub appointment_id: i64,
    pub new_date: String,
    pub new_time: String,
    pub original_date: String,
    pub original_time: String,
    pub status: ApprovalStatus,
    pub reviewed_by: Option<i64>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<DbReschedule> for RescheduleResponse {
    fn from(row: DbReschedule) -> Self {
        RescheduleResponse {
            id: row.id,
            tenant_id: row.tenant_id,
            appointment_id: row.appointment_id,
            new_date: row.new_date,
            new_time: row.new_time,
            original_date: row.original_date,
            original_time: row.original_time,
            status: row.status.parse().unwrap_or(ApprovalStatus::Pending),
            reviewed_by: row.reviewed_by,
            reviewed_at: row.reviewed_at,
            reason: row.reason,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRescheduleRequest {
    pub tenant_id: i64,
    pub appointment_id: i64,
    pub new_date: String,
    pub new_time: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        SuccessResponse { success: true }
    }
}
