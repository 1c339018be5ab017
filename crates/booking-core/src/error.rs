//! Typed error set shared by the coordinator and its HTTP surface.

use thiserror::Error;

/// Every failure path is a variant the caller can map to a status code and
/// localized text. A failed conditional update at the store surfaces as
/// `InvalidState` or `CapacityExceeded`, never a blind retry.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("upstream service error: {0}")]
    Upstream(String),
}
