//! Slot-capacity and approval-workflow coordination.
//!
//! The logic here is pure and store-agnostic: capacity arithmetic, key
//! validation, and the two-state review machine. The HTTP layer mirrors the
//! same guards as conditional SQL updates so concurrent mutations serialize
//! at the store.

pub mod approval;
pub mod error;
pub mod slots;

pub use approval::{approve, approve_with, reject};
pub use error::CoreError;
pub use slots::{
    availability, can_book, release, try_reserve, validate_capacity, validate_date,
    validate_slot_key, BookingDecision, SlotAvailability, SlotPolicy, DEFAULT_TIME_SLOTS,
};
