//! Per-slot booking capacity.
//!
//! A slot is a `(date, time)` unit with an optional ceiling. The arithmetic
//! here is pure; the persistence layer mirrors it with conditional updates
//! so concurrent bookings against one slot serialize at the store.

use std::collections::HashMap;

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use shared_types::SlotLimit;

use crate::error::CoreError;

lazy_static! {
    /// 24-hour `HH:MM` slot keys.
    static ref TIME_SLOT_RE: Regex = Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").unwrap();
}

/// Default bookable grid, hourly from 09:00 through 17:00.
pub const DEFAULT_TIME_SLOTS: &[&str] = &[
    "09:00", "10:00", "11:00", "12:00", "13:00", "14:00", "15:00", "16:00", "17:00",
];

/// Behavior when no capacity row exists for a slot key. An explicit
/// configuration choice, never inferred from absence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SlotPolicy {
    /// No cap configured: booking is allowed.
    #[default]
    Unlimited,
    /// Tenant-wide default ceiling, applied lazily on first booking.
    DefaultCap(u32),
}

/// Outcome of a capacity check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDecision {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl BookingDecision {
    fn allowed() -> Self {
        BookingDecision {
            allowed: true,
            reason: None,
        }
    }

    fn denied(reason: String) -> Self {
        BookingDecision {
            allowed: false,
            reason: Some(reason),
        }
    }
}

/// Validate a `YYYY-MM-DD` date string.
pub fn validate_date(date: &str) -> Result<(), CoreError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| CoreError::Validation(format!("invalid date: {date}")))
}

/// Validate a slot key before any storage access.
pub fn validate_slot_key(date: &str, time: &str) -> Result<(), CoreError> {
    validate_date(date)?;
    if !TIME_SLOT_RE.is_match(time) {
        return Err(CoreError::Validation(format!("invalid time slot: {time}")));
    }
    Ok(())
}

/// A cap must be a positive integer.
pub fn validate_capacity(max_capacity: i64) -> Result<u32, CoreError> {
    if max_capacity < 1 {
        return Err(CoreError::Validation(
            "maxCapacity must be a positive integer".to_string(),
        ));
    }
    u32::try_from(max_capacity)
        .map_err(|_| CoreError::Validation(format!("maxCapacity out of range: {max_capacity}")))
}

/// Capacity check for one slot key. `limit` is the stored row, if any.
pub fn can_book(limit: Option<&SlotLimit>, policy: SlotPolicy) -> BookingDecision {
    match limit {
        Some(l) if l.is_full() => BookingDecision::denied(format!(
            "時段已滿（{}/{}）",
            l.current_count, l.max_capacity
        )),
        Some(_) => BookingDecision::allowed(),
        // No row: the policy decides. Under DefaultCap the row is created
        // lazily on first booking, so the first attempt is always allowed.
        None => match policy {
            SlotPolicy::Unlimited | SlotPolicy::DefaultCap(_) => BookingDecision::allowed(),
        },
    }
}

/// Increment the confirmed-booking counter, refusing once the ceiling is
/// hit. `current_count` never exceeds `max_capacity` through this path.
pub fn try_reserve(limit: &mut SlotLimit) -> Result<(), CoreError> {
    if limit.is_full() {
        return Err(CoreError::CapacityExceeded(format!(
            "slot {} {} is full ({}/{})",
            limit.date, limit.time, limit.current_count, limit.max_capacity
        )));
    }
    limit.current_count += 1;
    Ok(())
}

/// Release one occupied seat, e.g. on cancellation. Floors at zero.
pub fn release(limit: &mut SlotLimit) {
    limit.current_count = limit.current_count.saturating_sub(1);
}

/// Remaining capacity for one grid slot. `None` means uncapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAvailability {
    pub time: String,
    pub available: Option<u32>,
    pub is_available: bool,
}

/// Per-slot remaining capacity over the default grid, given the stored
/// limits for the date and the count of non-cancelled appointments per slot.
pub fn availability(
    limits: &[SlotLimit],
    booked: &HashMap<String, u32>,
    policy: SlotPolicy,
) -> Vec<SlotAvailability> {
    DEFAULT_TIME_SLOTS
        .iter()
        .map(|slot| {
            let cap = limits
                .iter()
                .find(|l| l.time == *slot)
                .map(|l| l.max_capacity)
                .or(match policy {
                    SlotPolicy::DefaultCap(n) => Some(n),
                    SlotPolicy::Unlimited => None,
                });
            let taken = booked.get(*slot).copied().unwrap_or(0);

            match cap {
                Some(cap) => {
                    let available = cap.saturating_sub(taken);
                    SlotAvailability {
                        time: slot.to_string(),
                        available: Some(available),
                        is_available: available > 0,
                    }
                }
                None => SlotAvailability {
                    time: slot.to_string(),
                    available: None,
                    is_available: true,
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shared_types::TenantId;

    fn limit(max_capacity: u32, current_count: u32) -> SlotLimit {
        SlotLimit {
            tenant_id: TenantId(1),
            date: "2026-03-01".to_string(),
            time: "09:00".to_string(),
            max_capacity,
            current_count,
        }
    }

    #[test]
    fn slot_key_validation() {
        assert!(validate_slot_key("2026-03-01", "09:00").is_ok());
        assert!(validate_slot_key("2026-03-01", "23:30").is_ok());
        assert!(validate_slot_key("2026-13-01", "09:00").is_err());
        assert!(validate_slot_key("not-a-date", "09:00").is_err());
        assert!(validate_slot_key("2026-03-01", "9:00").is_err());
        assert!(validate_slot_key("2026-03-01", "24:00").is_err());
    }

    #[test]
    fn capacity_validation_rejects_non_positive() {
        assert!(validate_capacity(0).is_err());
        assert!(validate_capacity(-3).is_err());
        assert_eq!(validate_capacity(5).unwrap(), 5);
    }

    #[test]
    fn ceiling_is_enforced_at_the_boundary() {
        let mut l = limit(2, 0);
        assert!(try_reserve(&mut l).is_ok());
        assert!(try_reserve(&mut l).is_ok());

        // Third attempt hits the ceiling and leaves the count unchanged.
        let err = try_reserve(&mut l).unwrap_err();
        assert!(matches!(err, CoreError::CapacityExceeded(_)));
        assert_eq!(l.current_count, 2);

        let decision = can_book(Some(&l), SlotPolicy::Unlimited);
        assert!(!decision.allowed);
        assert!(decision.reason.is_some());
    }

    #[test]
    fn missing_row_follows_policy() {
        assert!(can_book(None, SlotPolicy::Unlimited).allowed);
        assert!(can_book(None, SlotPolicy::DefaultCap(3)).allowed);
    }

    #[test]
    fn lowering_cap_below_count_only_blocks_new_bookings() {
        // Existing bookings survive; the slot just reads as full.
        let mut l = limit(5, 4);
        l.max_capacity = 2;
        assert!(l.is_full());
        assert_eq!(l.current_count, 4);
        assert!(try_reserve(&mut l).is_err());
    }

    #[test]
    fn release_floors_at_zero() {
        let mut l = limit(2, 1);
        release(&mut l);
        release(&mut l);
        assert_eq!(l.current_count, 0);
    }

    #[test]
    fn availability_over_default_grid() {
        let limits = vec![limit(2, 0)];
        let mut booked = HashMap::new();
        booked.insert("09:00".to_string(), 2u32);
        booked.insert("10:00".to_string(), 1u32);

        let grid = availability(&limits, &booked, SlotPolicy::DefaultCap(5));
        assert_eq!(grid.len(), DEFAULT_TIME_SLOTS.len());

        let nine = &grid[0];
        assert_eq!(nine.available, Some(0));
        assert!(!nine.is_available);

        let ten = &grid[1];
        assert_eq!(ten.available, Some(4));
        assert!(ten.is_available);
    }

    #[test]
    fn availability_unlimited_when_no_row_and_no_default() {
        let grid = availability(&[], &HashMap::new(), SlotPolicy::Unlimited);
        assert!(grid.iter().all(|s| s.is_available && s.available.is_none()));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use shared_types::TenantId;

    proptest! {
        /// For any cap N and any number of attempts, the committed count
        /// never exceeds N and the (N+1)-th attempt fails.
        #[test]
        fn committed_count_never_exceeds_capacity(
            cap in 1u32..20,
            attempts in 1usize..60,
        ) {
            let mut l = SlotLimit {
                tenant_id: TenantId(1),
                date: "2026-03-01".to_string(),
                time: "09:00".to_string(),
                max_capacity: cap,
                current_count: 0,
            };

            let mut committed = 0u32;
            for _ in 0..attempts {
                if try_reserve(&mut l).is_ok() {
                    committed += 1;
                }
            }

            prop_assert!(l.current_count <= cap);
            prop_assert_eq!(committed, (attempts as u32).min(cap));
            if attempts as u32 > cap {
                prop_assert!(try_reserve(&mut l).is_err());
            }
        }

        /// Interleaved reserve/release keeps the count within [0, cap].
        #[test]
        fn reserve_release_stays_in_bounds(
            cap in 1u32..10,
            ops in proptest::collection::vec(any::<bool>(), 0..80),
        ) {
            let mut l = SlotLimit {
                tenant_id: TenantId(1),
                date: "2026-03-01".to_string(),
                time: "09:00".to_string(),
                max_capacity: cap,
                current_count: 0,
            };

            for reserve in ops {
                if reserve {
                    let _ = try_reserve(&mut l);
                } else {
                    release(&mut l);
                }
                prop_assert!(l.current_count <= cap);
            }
        }
    }
}
