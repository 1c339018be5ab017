//! Tenant-scoped storage operations.
//!
//! Every function takes the tenant id first and scopes its SQL by it.
//! Concurrent mutations serialize at the store: status transitions and
//! capacity increments are conditional updates, and a conditional update
//! that matches no row surfaces as `InvalidState`/`CapacityExceeded`
//! instead of being retried.

use booking_core::SlotPolicy;
use chrono::Utc;
use shared_types::{ComplianceRule, Severity};
use sqlx::sqlite::SqlitePool;

use crate::error::ApiError;
use crate::models::*;

// ============================================================
// Compliance keywords
// ============================================================

pub async fn list_keywords(
    pool: &SqlitePool,
    tenant_id: i64,
    severity: Option<Severity>,
) -> Result<Vec<DbKeyword>, ApiError> {
    let rows = match severity {
        Some(severity) => {
            sqlx::query_as(
                r#"
                SELECT id, tenant_id, keyword, severity, regulation_reference, description, created_at
                FROM compliance_keywords
                WHERE tenant_id = ? AND severity = ?
                ORDER BY severity, keyword
                "#,
            )
            .bind(tenant_id)
            .bind(severity.as_str())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as(
                r#"
                SELECT id, tenant_id, keyword, severity, regulation_reference, description, created_at
                FROM compliance_keywords
                WHERE tenant_id = ?
                ORDER BY severity, keyword
                "#,
            )
            .bind(tenant_id)
            .fetch_all(pool)
            .await?
        }
    };
    Ok(rows)
}

/// The tenant's full rule set, ready for a scan.
pub async fn rules_for_tenant(
    pool: &SqlitePool,
    tenant_id: i64,
) -> Result<Vec<ComplianceRule>, ApiError> {
    let rows = list_keywords(pool, tenant_id, None).await?;
    Ok(rows
        .into_iter()
        .map(|row| ComplianceRule {
            keyword: row.keyword,
            severity: row.severity.parse().unwrap_or(Severity::Warning),
            regulation_reference: row.regulation_reference,
            description: row.description,
        })
        .collect())
}

pub async fn create_keyword(
    pool: &SqlitePool,
    req: &CreateKeywordRequest,
) -> Result<DbKeyword, ApiError> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO compliance_keywords (tenant_id, keyword, severity, regulation_reference, description, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(req.tenant_id)
    .bind(&req.keyword)
    .bind(req.severity.as_str())
    .bind(&req.regulation_reference)
    .bind(&req.description)
    .bind(now.to_rfc3339())
    .execute(pool)
    .await;

    let result = match result {
        Ok(result) => result,
        Err(e) => {
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                return Err(ApiError::Conflict(format!(
                    "警示詞「{}」已存在",
                    req.keyword
                )));
            }
            return Err(e.into());
        }
    };

    let id = result.last_insert_rowid();
    keyword_by_id(pool, req.tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("keyword {id} not found")))
}

pub async fn keyword_by_id(
    pool: &SqlitePool,
    tenant_id: i64,
    id: i64,
) -> Result<Option<DbKeyword>, ApiError> {
    let row = sqlx::query_as(
        r#"
        SELECT id, tenant_id, keyword, severity, regulation_reference, description, created_at
        FROM compliance_keywords
        WHERE id = ? AND tenant_id = ?
        "#,
    )
    .bind(id)
    .bind(tenant_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn update_keyword(
    pool: &SqlitePool,
    id: i64,
    req: &UpdateKeywordRequest,
) -> Result<DbKeyword, ApiError> {
    let updated = sqlx::query(
        r#"
        UPDATE compliance_keywords
        SET keyword = COALESCE(?, keyword),
            severity = COALESCE(?, severity),
            regulation_reference = COALESCE(?, regulation_reference),
            description = COALESCE(?, description)
        WHERE id = ? AND tenant_id = ?
        "#,
    )
    .bind(&req.keyword)
    .bind(req.severity.map(|s| s.as_str()))
    .bind(&req.regulation_reference)
    .bind(&req.description)
    .bind(id)
    .bind(req.tenant_id)
    .execute(pool)
    .await?
    .rows_affected();

    if updated == 0 {
        return Err(ApiError::NotFound(format!("keyword {id} not found")));
    }
    keyword_by_id(pool, req.tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("keyword {id} not found")))
}

pub async fn delete_keyword(pool: &SqlitePool, tenant_id: i64, id: i64) -> Result<(), ApiError> {
    let deleted = sqlx::query("DELETE FROM compliance_keywords WHERE id = ? AND tenant_id = ?")
        .bind(id)
        .bind(tenant_id)
        .execute(pool)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(ApiError::NotFound(format!("keyword {id} not found")));
    }
    Ok(())
}

// ============================================================
// Slot limits
// ============================================================

pub async fn slots_by_date(
    pool: &SqlitePool,
    tenant_id: i64,
    date: &str,
) -> Result<Vec<DbSlotLimit>, ApiError> {
    let rows = sqlx::query_as(
        r#"
        SELECT id, tenant_id, date, time_slot, max_capacity, current_count
        FROM slot_limits
        WHERE tenant_id = ? AND date = ?
        ORDER BY time_slot
        "#,
    )
    .bind(tenant_id)
    .bind(date)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn slots_by_range(
    pool: &SqlitePool,
    tenant_id: i64,
    start_date: &str,
    end_date: &str,
) -> Result<Vec<DbSlotLimit>, ApiError> {
    let rows = sqlx::query_as(
        r#"
        SELECT id, tenant_id, date, time_slot, max_capacity, current_count
        FROM slot_limits
        WHERE tenant_id = ? AND date >= ? AND date <= ?
        ORDER BY date, time_slot
        "#,
    )
    .bind(tenant_id)
    .bind(start_date)
    .bind(end_date)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn slot_by_key(
    pool: &SqlitePool,
    tenant_id: i64,
    date: &str,
    time: &str,
) -> Result<Option<DbSlotLimit>, ApiError> {
    let row = sqlx::query_as(
        r#"
        SELECT id, tenant_id, date, time_slot, max_capacity, current_count
        FROM slot_limits
        WHERE tenant_id = ? AND date = ? AND time_slot = ?
        "#,
    )
    .bind(tenant_id)
    .bind(date)
    .bind(time)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Upsert a capacity row. An update keeps `current_count`; lowering the cap
/// below it only blocks new bookings.
pub async fn upsert_slot_limit(
    pool: &SqlitePool,
    tenant_id: i64,
    date: &str,
    time: &str,
    max_capacity: u32,
) -> Result<DbSlotLimit, ApiError> {
    sqlx::query(
        r#"
        INSERT INTO slot_limits (tenant_id, date, time_slot, max_capacity, current_count)
        VALUES (?, ?, ?, ?, 0)
        ON CONFLICT(tenant_id, date, time_slot)
        DO UPDATE SET max_capacity = excluded.max_capacity
        "#,
    )
    .bind(tenant_id)
    .bind(date)
    .bind(time)
    .bind(max_capacity as i64)
    .execute(pool)
    .await?;

    let row: Option<DbSlotLimit> = sqlx::query_as(
        r#"
        SELECT id, tenant_id, date, time_slot, max_capacity, current_count
        FROM slot_limits
        WHERE tenant_id = ? AND date = ? AND time_slot = ?
        "#,
    )
    .bind(tenant_id)
    .bind(date)
    .bind(time)
    .fetch_optional(pool)
    .await?;

    row.ok_or_else(|| ApiError::NotFound(format!("slot limit {date} {time} not found")))
}

/// Remove the cap; existing bookings are unaffected. Idempotent.
pub async fn delete_slot_limit(
    pool: &SqlitePool,
    tenant_id: i64,
    date: &str,
    time: &str,
) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM slot_limits WHERE tenant_id = ? AND date = ? AND time_slot = ?")
        .bind(tenant_id)
        .bind(date)
        .bind(time)
        .execute(pool)
        .await?;
    Ok(())
}

/// Occupy one seat in a slot, inside the caller's transaction. The
/// increment only lands while `current_count < max_capacity`, so the
/// ceiling holds under concurrent bookings.
async fn reserve_slot(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    tenant_id: i64,
    date: &str,
    time: &str,
    policy: SlotPolicy,
) -> Result<(), ApiError> {
    let updated = sqlx::query(
        r#"
        UPDATE slot_limits
        SET current_count = current_count + 1
        WHERE tenant_id = ? AND date = ? AND time_slot = ? AND current_count < max_capacity
        "#,
    )
    .bind(tenant_id)
    .bind(date)
    .bind(time)
    .execute(&mut **tx)
    .await?
    .rows_affected();

    if updated == 1 {
        return Ok(());
    }

    // No increment landed: the row is either full or absent.
    let existing: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM slot_limits WHERE tenant_id = ? AND date = ? AND time_slot = ?",
    )
    .bind(tenant_id)
    .bind(date)
    .bind(time)
    .fetch_optional(&mut **tx)
    .await?;

    if existing.is_some() {
        return Err(ApiError::CapacityExceeded(format!("時段已滿：{date} {time}")));
    }

    match policy {
        SlotPolicy::Unlimited => Ok(()),
        SlotPolicy::DefaultCap(cap) => {
            // Create the row lazily, already holding this reservation.
            sqlx::query(
                r#"
                INSERT INTO slot_limits (tenant_id, date, time_slot, max_capacity, current_count)
                VALUES (?, ?, ?, ?, 1)
                "#,
            )
            .bind(tenant_id)
            .bind(date)
            .bind(time)
            .bind(cap as i64)
            .execute(&mut **tx)
            .await?;
            Ok(())
        }
    }
}

/// Release one seat, e.g. on cancellation. Floors at zero.
async fn release_slot(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    tenant_id: i64,
    date: &str,
    time: &str,
) -> Result<(), ApiError> {
    sqlx::query(
        r#"
        UPDATE slot_limits
        SET current_count = MAX(current_count - 1, 0)
        WHERE tenant_id = ? AND date = ? AND time_slot = ?
        "#,
    )
    .bind(tenant_id)
    .bind(date)
    .bind(time)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

// ============================================================
// Bookings
// ============================================================

pub async fn appointment_by_id(
    pool: &SqlitePool,
    tenant_id: i64,
    id: i64,
) -> Result<Option<DbAppointment>, ApiError> {
    let row = sqlx::query_as(
        r#"
        SELECT id, tenant_id, customer_name, customer_phone, line_user_id, date, time_slot, status, notes, created_at
        FROM appointments
        WHERE id = ? AND tenant_id = ?
        "#,
    )
    .bind(id)
    .bind(tenant_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Non-cancelled appointments per time slot for one date.
pub async fn booked_counts(
    pool: &SqlitePool,
    tenant_id: i64,
    date: &str,
) -> Result<std::collections::HashMap<String, u32>, ApiError> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        r#"
        SELECT time_slot, COUNT(*)
        FROM appointments
        WHERE tenant_id = ? AND date = ? AND status != 'cancelled'
        GROUP BY time_slot
        "#,
    )
    .bind(tenant_id)
    .bind(date)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(slot, count)| (slot, count.max(0) as u32))
        .collect())
}

/// Reserve capacity, create the appointment, and open its approval request
/// as one transaction. Nothing persists when the slot is full.
pub async fn submit_booking(
    pool: &SqlitePool,
    policy: SlotPolicy,
    req: &SubmitBookingRequest,
) -> Result<(i64, i64), ApiError> {
    let now = Utc::now().to_rfc3339();
    let mut tx = pool.begin().await?;

    reserve_slot(&mut tx, req.tenant_id, &req.date, &req.time, policy).await?;

    let appointment_id = sqlx::query(
        r#"
        INSERT INTO appointments (tenant_id, customer_name, customer_phone, line_user_id, date, time_slot, status, notes, created_at)
        VALUES (?, ?, ?, ?, ?, ?, 'pending', ?, ?)
        "#,
    )
    .bind(req.tenant_id)
    .bind(&req.name)
    .bind(&req.phone)
    .bind(&req.line_user_id)
    .bind(&req.date)
    .bind(&req.time)
    .bind(&req.notes)
    .bind(&now)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    let approval_id = sqlx::query(
        r#"
        INSERT INTO approvals (tenant_id, appointment_id, status, created_at)
        VALUES (?, ?, 'pending', ?)
        "#,
    )
    .bind(req.tenant_id)
    .bind(appointment_id)
    .bind(&now)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    tx.commit().await?;
    Ok((appointment_id, approval_id))
}

/// Cancel an appointment and release its seat.
pub async fn cancel_appointment(
    pool: &SqlitePool,
    tenant_id: i64,
    id: i64,
) -> Result<DbAppointment, ApiError> {
    let mut tx = pool.begin().await?;

    let row: Option<DbAppointment> = sqlx::query_as(
        r#"
        SELECT id, tenant_id, customer_name, customer_phone, line_user_id, date, time_slot, status, notes, created_at
        FROM appointments
        WHERE id = ? AND tenant_id = ?
        "#,
    )
    .bind(id)
    .bind(tenant_id)
    .fetch_optional(&mut *tx)
    .await?;
    let row = row.ok_or_else(|| ApiError::NotFound(format!("appointment {id} not found")))?;

    let updated = sqlx::query(
        "UPDATE appointments SET status = 'cancelled' WHERE id = ? AND tenant_id = ? AND status != 'cancelled'",
    )
    .bind(id)
    .bind(tenant_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if updated == 0 {
        return Err(ApiError::InvalidState(format!(
            "appointment {id} already cancelled"
        )));
    }

    release_slot(&mut tx, tenant_id, &row.date, &row.time_slot).await?;
    tx.commit().await?;
    Ok(row)
}

// ============================================================
// Approval workflow
// ============================================================

/// A reviewer decision. Rejection always carries its reason.
#[derive(Debug, Clone)]
pub enum ReviewDecision {
    Approve,
    Reject { reason: String },
}

impl ReviewDecision {
    fn status(&self) -> &'static str {
        match self {
            ReviewDecision::Approve => "approved",
            ReviewDecision::Reject { .. } => "rejected",
        }
    }

    fn reason(&self) -> Option<&str> {
        match self {
            ReviewDecision::Approve => None,
            ReviewDecision::Reject { reason } => Some(reason),
        }
    }

    fn validate(&self) -> Result<(), ApiError> {
        if let ReviewDecision::Reject { reason } = self {
            if reason.trim().is_empty() {
                return Err(ApiError::Validation("a rejection reason is required".into()));
            }
        }
        Ok(())
    }
}

pub async fn pending_approvals(
    pool: &SqlitePool,
    tenant_id: i64,
) -> Result<Vec<DbApproval>, ApiError> {
    let rows = sqlx::query_as(
        r#"
        SELECT id, tenant_id, appointment_id, status, reviewed_by, reviewed_at, reason, created_at
        FROM approvals
        WHERE tenant_id = ? AND status = 'pending'
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Decide an appointment-approval request. The status flip is a
/// compare-and-swap on `status = 'pending'`; approval also confirms the
/// appointment in the same transaction.
pub async fn decide_approval(
    pool: &SqlitePool,
    tenant_id: i64,
    id: i64,
    reviewer_id: i64,
    decision: &ReviewDecision,
) -> Result<DbApproval, ApiError> {
    decision.validate()?;
    let mut tx = pool.begin().await?;

    let row: Option<DbApproval> = sqlx::query_as(
        r#"
        SELECT id, tenant_id, appointment_id, status, reviewed_by, reviewed_at, reason, created_at
        FROM approvals
        WHERE id = ? AND tenant_id = ?
        "#,
    )
    .bind(id)
    .bind(tenant_id)
    .fetch_optional(&mut *tx)
    .await?;
    let row = row.ok_or_else(|| ApiError::NotFound(format!("approval request {id} not found")))?;

    let updated = sqlx::query(
        r#"
        UPDATE approvals
        SET status = ?, reviewed_by = ?, reviewed_at = ?, reason = ?
        WHERE id = ? AND tenant_id = ? AND status = 'pending'
        "#,
    )
    .bind(decision.status())
    .bind(reviewer_id)
    .bind(Utc::now().to_rfc3339())
    .bind(decision.reason())
    .bind(id)
    .bind(tenant_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if updated == 0 {
        return Err(ApiError::InvalidState(format!(
            "request already {}",
            row.status
        )));
    }

    if matches!(decision, ReviewDecision::Approve) {
        sqlx::query("UPDATE appointments SET status = 'confirmed' WHERE id = ? AND tenant_id = ?")
            .bind(row.appointment_id)
            .bind(tenant_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    approval_by_id(pool, tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("approval request {id} not found")))
}

pub async fn approval_by_id(
    pool: &SqlitePool,
    tenant_id: i64,
    id: i64,
) -> Result<Option<DbApproval>, ApiError> {
    let row = sqlx::query_as(
        r#"
        SELECT id, tenant_id, appointment_id, status, reviewed_by, reviewed_at, reason, created_at
        FROM approvals
        WHERE id = ? AND tenant_id = ?
        "#,
    )
    .bind(id)
    .bind(tenant_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

// ============================================================
// Reschedule workflow
// ============================================================

pub async fn create_reschedule(
    pool: &SqlitePool,
    req: &CreateRescheduleRequest,
) -> Result<DbReschedule, ApiError> {
    let appointment = appointment_by_id(pool, req.tenant_id, req.appointment_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("appointment {} not found", req.appointment_id))
        })?;

    let id = sqlx::query(
        r#"
        INSERT INTO reschedule_approvals
            (tenant_id, appointment_id, new_date, new_time, original_date, original_time, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?, 'pending', ?)
        "#,
    )
    .bind(req.tenant_id)
    .bind(req.appointment_id)
    .bind(&req.new_date)
    .bind(&req.new_time)
    .bind(&appointment.date)
    .bind(&appointment.time_slot)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?
    .last_insert_rowid();

    reschedule_by_id(pool, req.tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("reschedule request {id} not found")))
}

pub async fn pending_reschedules(
    pool: &SqlitePool,
    tenant_id: i64,
) -> Result<Vec<DbReschedule>, ApiError> {
    let rows = sqlx::query_as(
        r#"
        SELECT id, tenant_id, appointment_id, new_date, new_time, original_date, original_time,
               status, reviewed_by, reviewed_at, reason, created_at
        FROM reschedule_approvals
        WHERE tenant_id = ? AND status = 'pending'
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn reschedule_by_id(
    pool: &SqlitePool,
    tenant_id: i64,
    id: i64,
) -> Result<Option<DbReschedule>, ApiError> {
    let row = sqlx::query_as(
        r#"
        SELECT id, tenant_id, appointment_id, new_date, new_time, original_date, original_time,
               status, reviewed_by, reviewed_at, reason, created_at
        FROM reschedule_approvals
        WHERE id = ? AND tenant_id = ?
        "#,
    )
    .bind(id)
    .bind(tenant_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Decide a reschedule request. Approval commits the new date/time onto the
/// appointment in the same transaction as the status flip: if the
/// appointment update matches no row, the whole decision rolls back and the
/// request stays pending.
pub async fn decide_reschedule(
    pool: &SqlitePool,
    tenant_id: i64,
    id: i64,
    reviewer_id: i64,
    decision: &ReviewDecision,
) -> Result<DbReschedule, ApiError> {
    decision.validate()?;
    let mut tx = pool.begin().await?;

    let row: Option<DbReschedule> = sqlx::query_as(
        r#"
        SELECT id, tenant_id, appointment_id, new_date, new_time, original_date, original_time,
               status, reviewed_by, reviewed_at, reason, created_at
        FROM reschedule_approvals
        WHERE id = ? AND tenant_id = ?
        "#,
    )
    .bind(id)
    .bind(tenant_id)
    .fetch_optional(&mut *tx)
    .await?;
    let row =
        row.ok_or_else(|| ApiError::NotFound(format!("reschedule request {id} not found")))?;

    let updated = sqlx::query(
        r#"
        UPDATE reschedule_approvals
        SET status = ?, reviewed_by = ?, reviewed_at = ?, reason = ?
        WHERE id = ? AND tenant_id = ? AND status = 'pending'
        "#,
    )
    .bind(decision.status())
    .bind(reviewer_id)
    .bind(Utc::now().to_rfc3339())
    .bind(decision.reason())
    .bind(id)
    .bind(tenant_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if updated == 0 {
        return Err(ApiError::InvalidState(format!(
            "request already {}",
            row.status
        )));
    }

    if matches!(decision, ReviewDecision::Approve) {
        let moved = sqlx::query(
            "UPDATE appointments SET date = ?, time_slot = ? WHERE id = ? AND tenant_id = ?",
        )
        .bind(&row.new_date)
        .bind(&row.new_time)
        .bind(row.appointment_id)
        .bind(tenant_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if moved == 0 {
            // Dropping the transaction rolls the status flip back.
            return Err(ApiError::NotFound(format!(
                "appointment {} not found",
                row.appointment_id
            )));
        }
    }

    tx.commit().await?;

    reschedule_by_id(pool, tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("reschedule request {id} not found")))
}
