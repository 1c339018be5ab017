//! HTTP handlers for the clinic API

pub mod approvals;
pub mod bookings;
pub mod compliance;
pub mod reschedules;
pub mod slots;
pub mod webhook;

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}
