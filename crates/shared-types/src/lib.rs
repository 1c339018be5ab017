pub mod types;

pub use types::{
    Appointment, AppointmentStatus, ApprovalRequest, ApprovalStatus, CheckResult, ComplianceRule,
    ReschedulePayload, Severity, SlotLimit, TenantId, TextSpan, Violation,
};
