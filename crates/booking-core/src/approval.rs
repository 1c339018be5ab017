//! Two-state approval workflow.
//!
//! One state machine serves both appointment approval and reschedule
//! approval; the variants differ only in their payload and in the commit
//! action run when a reschedule is approved. Transitions are
//! `pending -> approved` and `pending -> rejected`; nothing leaves a
//! terminal state.

use chrono::Utc;
use shared_types::{ApprovalRequest, ApprovalStatus};

use crate::error::CoreError;

fn ensure_pending(status: ApprovalStatus) -> Result<(), CoreError> {
    if status.is_terminal() {
        return Err(CoreError::InvalidState(format!(
            "request already {status}"
        )));
    }
    Ok(())
}

/// Approve a pending request, stamping reviewer attribution.
pub fn approve<P>(request: &mut ApprovalRequest<P>, reviewer_id: i64) -> Result<(), CoreError> {
    approve_with(request, reviewer_id, |_| Ok(()))
}

/// Approve with an attached commit action. The commit runs first and the
/// status flip is only applied when it succeeds, so a failed commit leaves
/// the request pending (all-or-nothing). Reschedule approval passes the
/// appointment update here.
pub fn approve_with<P, F>(
    request: &mut ApprovalRequest<P>,
    reviewer_id: i64,
    commit: F,
) -> Result<(), CoreError>
where
    F: FnOnce(&P) -> Result<(), CoreError>,
{
    ensure_pending(request.status)?;
    commit(&request.payload)?;
    request.status = ApprovalStatus::Approved;
    request.reviewed_by = Some(reviewer_id);
    request.reviewed_at = Some(Utc::now());
    Ok(())
}

/// Reject a pending request. A non-empty reason is required; the underlying
/// appointment is left unchanged.
pub fn reject<P>(
    request: &mut ApprovalRequest<P>,
    reviewer_id: i64,
    reason: &str,
) -> Result<(), CoreError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(CoreError::Validation(
            "a rejection reason is required".to_string(),
        ));
    }
    ensure_pending(request.status)?;
    request.status = ApprovalStatus::Rejected;
    request.reviewed_by = Some(reviewer_id);
    request.reviewed_at = Some(Utc::now());
    request.reason = Some(reason.to_string());
    Ok(())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use shared_types::TenantId;

    #[derive(Debug, Clone)]
    enum Op {
        Approve(i64),
        Reject(i64, String),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (1i64..100).prop_map(Op::Approve),
            ((1i64..100), "[a-z]{1,10}").prop_map(|(id, reason)| Op::Reject(id, reason)),
        ]
    }

    proptest! {
        /// Whatever decision lands first is final: every later operation
        /// fails with InvalidState and observable state never changes.
        #[test]
        fn first_decision_is_terminal(ops in proptest::collection::vec(op_strategy(), 1..20)) {
            let mut request = ApprovalRequest {
                id: 1,
                tenant_id: TenantId(1),
                appointment_id: 1,
                status: ApprovalStatus::Pending,
                reviewed_by: None,
                reviewed_at: None,
                reason: None,
                created_at: Utc::now(),
                payload: (),
            };

            let mut settled: Option<(ApprovalStatus, Option<i64>)> = None;
            for op in ops {
                let outcome = match &op {
                    Op::Approve(reviewer) => approve(&mut request, *reviewer),
                    Op::Reject(reviewer, reason) => reject(&mut request, *reviewer, reason),
                };

                match &settled {
                    None => {
                        prop_assert!(outcome.is_ok());
                        settled = Some((request.status, request.reviewed_by));
                    }
                    Some((status, reviewer)) => {
                        prop_assert!(matches!(outcome, Err(CoreError::InvalidState(_))));
                        prop_assert_eq!(request.status, *status);
                        prop_assert_eq!(request.reviewed_by, *reviewer);
                    }
                }
            }
        }
    }
}
