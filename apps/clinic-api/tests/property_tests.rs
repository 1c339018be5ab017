//! Property-based tests for the clinic API
//!
//! Tests the wire-level formats and validation rules using proptest.

use proptest::prelude::*;

// ============================================================
// Slot Key Formats
// ============================================================

/// Valid slot times are HH:MM, 24-hour
fn valid_slot_time() -> impl Strategy<Value = String> {
    (0u32..24, 0u32..60).prop_map(|(h, m)| format!("{:02}:{:02}", h, m))
}

fn invalid_slot_time() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9]{1}:[0-9]{2}",      // Missing leading zero
        "2[4-9]:[0-5][0-9]",      // Hour out of range
        "[0-1][0-9]:[6-9][0-9]",  // Minute out of range
        "[a-z]{4,6}",             // Not a time at all
        Just("".to_string()),     // Empty
    ]
}

/// Valid dates are YYYY-MM-DD
fn valid_date() -> impl Strategy<Value = String> {
    (2024i32..2030, 1u32..13, 1u32..29).prop_map(|(y, m, d)| format!("{:04}-{:02}-{:02}", y, m, d))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn valid_slot_times_match_the_format(time in valid_slot_time()) {
        let re = regex::Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").unwrap();
        prop_assert!(re.is_match(&time));
    }

    #[test]
    fn invalid_slot_times_do_not_match(time in invalid_slot_time()) {
        let re = regex::Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").unwrap();
        prop_assert!(!re.is_match(&time));
    }

    #[test]
    fn valid_dates_are_ten_chars_with_hyphens(date in valid_date()) {
        prop_assert_eq!(date.len(), 10);
        prop_assert_eq!(date.matches('-').count(), 2);
    }

    // ============================================================
    // Capacity Bounds
    // ============================================================

    #[test]
    fn positive_capacities_are_accepted(cap in 1i64..10_000) {
        prop_assert!(cap >= 1);
        prop_assert!(u32::try_from(cap).is_ok());
    }

    #[test]
    fn non_positive_capacities_are_rejected(cap in -10_000i64..1) {
        prop_assert!(cap < 1);
    }

    // ============================================================
    // Status Vocabularies
    // ============================================================

    #[test]
    fn approval_status_values_are_valid(
        status in prop_oneof![
            Just("pending"),
            Just("approved"),
            Just("rejected"),
        ]
    ) {
        let valid = ["pending", "approved", "rejected"];
        prop_assert!(valid.contains(&status));
        prop_assert!(status.chars().all(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn terminal_states_are_final(
        terminal in prop_oneof![
            Just("approved"),
            Just("rejected"),
        ]
    ) {
        let is_terminal = matches!(terminal, "approved" | "rejected");
        prop_assert!(is_terminal);
    }

    #[test]
    fn severity_values_are_valid(
        severity in prop_oneof![
            Just("warning"),
            Just("blocked"),
        ]
    ) {
        let valid = ["warning", "blocked"];
        prop_assert!(valid.contains(&severity));
    }

    // ============================================================
    // Rejection Reasons
    // ============================================================

    #[test]
    fn non_blank_reasons_survive_trimming(reason in "[^\\s]{1,40}") {
        prop_assert!(!reason.trim().is_empty());
    }

    #[test]
    fn whitespace_reasons_trim_to_empty(reason in "[ \\t]{0,10}") {
        prop_assert!(reason.trim().is_empty());
    }

    // ============================================================
    // Error Responses
    // ============================================================

    #[test]
    fn http_status_codes_are_valid(
        status in prop_oneof![
            Just(200u16), // OK
            Just(400u16), // Bad Request (validation)
            Just(404u16), // Not Found
            Just(409u16), // Conflict (invalid state, capacity, duplicates)
            Just(502u16), // Bad Gateway (upstream)
            Just(500u16), // Internal Server Error
        ]
    ) {
        prop_assert!(status >= 100 && status < 600);
    }

    // ============================================================
    // Tenant Scoping
    // ============================================================

    #[test]
    fn tenant_ids_are_positive(tenant_id in 1i64..i64::MAX) {
        prop_assert!(tenant_id >= 1);
    }
}

// ============================================================
// Unit Tests (non-property)
// ============================================================

#[cfg(test)]
mod unit_tests {
    #[test]
    fn test_default_grid_is_hourly() {
        let slots = [
            "09:00", "10:00", "11:00", "12:00", "13:00", "14:00", "15:00", "16:00", "17:00",
        ];
        assert_eq!(slots.len(), 9);
        assert!(slots.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_line_signature_header_name() {
        let header = "x-line-signature";
        assert!(header.chars().all(|c| c.is_ascii_lowercase() || c == '-'));
    }
}
