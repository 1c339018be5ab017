pub mod highlight;
pub mod scanner;

use serde::{Deserialize, Serialize};
use shared_types::{CheckResult, ComplianceRule, Severity, Violation};

/// Keyword matching mode. `Sensitive` is the default; case folding is a
/// no-op for the CJK keyword sets this runs against in practice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchCase {
    #[default]
    Sensitive,
    Insensitive,
}

/// Scans free text against a set of regulated-keyword rules.
pub struct ComplianceEngine {
    match_case: MatchCase,
}

impl ComplianceEngine {
    pub fn new() -> Self {
        Self {
            match_case: MatchCase::Sensitive,
        }
    }

    pub fn with_match_case(match_case: MatchCase) -> Self {
        Self { match_case }
    }

    /// Pure function over `(text, rules)`: finds every occurrence of every
    /// keyword, classifies the overall result, and produces an
    /// operator-facing summary. Empty text or an empty rule set yields a
    /// trivially compliant result.
    pub fn check_content(&self, text: &str, rules: &[ComplianceRule]) -> CheckResult {
        let mut violations = Vec::new();
        let mut has_blocked = false;
        let mut has_warnings = false;

        if !text.is_empty() {
            for rule in rules {
                let positions = scanner::find_occurrences(text, &rule.keyword, self.match_case);
                if positions.is_empty() {
                    continue;
                }
                match rule.severity {
                    Severity::Blocked => has_blocked = true,
                    Severity::Warning => has_warnings = true,
                }
                violations.push(Violation {
                    keyword: rule.keyword.clone(),
                    severity: rule.severity,
                    positions,
                    regulation_reference: rule.regulation_reference.clone(),
                    description: rule.description.clone(),
                });
            }
        }

        let summary = summarize(&violations);
        CheckResult {
            is_compliant: violations.is_empty(),
            has_warnings,
            has_blocked,
            violations,
            summary,
        }
    }
}

impl Default for ComplianceEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// A keyword must survive trimming to be usable as a rule.
pub fn is_valid_keyword(keyword: &str) -> bool {
    !keyword.trim().is_empty()
}

/// Worst severity wins: blocked over warning over compliant.
fn summarize(violations: &[Violation]) -> String {
    let blocked = violations
        .iter()
        .filter(|v| v.severity == Severity::Blocked)
        .count();
    let warnings = violations
        .iter()
        .filter(|v| v.severity == Severity::Warning)
        .count();

    if blocked > 0 {
        format!("內容包含 {blocked} 個禁止用語，無法發送")
    } else if warnings > 0 {
        format!("內容包含 {warnings} 個警告用語，建議修改後再發送")
    } else {
        "內容合規，可以發送".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shared_types::TextSpan;

    fn rule(keyword: &str, severity: Severity) -> ComplianceRule {
        ComplianceRule {
            keyword: keyword.to_string(),
            severity,
            regulation_reference: None,
            description: None,
        }
    }

    #[test]
    fn detects_blocked_keyword_with_position() {
        let engine = ComplianceEngine::new();
        let result = engine.check_content(
            "本產品可治療新冠肺炎",
            &[rule("治療", Severity::Blocked)],
        );

        assert!(!result.is_compliant);
        assert!(result.has_blocked);
        assert!(!result.has_warnings);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(
            result.violations[0].positions,
            vec![TextSpan { start: 4, end: 6 }]
        );
        assert_eq!(result.summary, "內容包含 1 個禁止用語，無法發送");
    }

    #[test]
    fn warning_only_text_is_not_compliant() {
        let engine = ComplianceEngine::new();
        let result = engine.check_content("全館特價中", &[rule("特價", Severity::Warning)]);

        assert!(!result.is_compliant);
        assert!(result.has_warnings);
        assert!(!result.has_blocked);
        assert_eq!(result.summary, "內容包含 1 個警告用語，建議修改後再發送");
    }

    #[test]
    fn mixed_severities_set_both_flags_and_blocked_leads_summary() {
        let engine = ComplianceEngine::new();
        let result = engine.check_content(
            "特價療程可根治痘痘",
            &[rule("特價", Severity::Warning), rule("根治", Severity::Blocked)],
        );

        assert!(result.has_blocked);
        assert!(result.has_warnings);
        assert!(result.summary.contains("禁止用語"));
    }

    #[test]
    fn unmatched_rules_contribute_no_violation() {
        let engine = ComplianceEngine::new();
        let result = engine.check_content(
            "歡迎預約諮詢",
            &[rule("治療", Severity::Blocked), rule("特價", Severity::Warning)],
        );

        assert!(result.is_compliant);
        assert!(result.violations.is_empty());
        assert_eq!(result.summary, "內容合規，可以發送");
    }

    #[test]
    fn empty_text_and_empty_rules_are_compliant() {
        let engine = ComplianceEngine::new();
        assert!(engine
            .check_content("", &[rule("治療", Severity::Blocked)])
            .is_compliant);
        assert!(engine.check_content("任意內容", &[]).is_compliant);
    }

    #[test]
    fn insensitive_mode_folds_case() {
        let engine = ComplianceEngine::with_match_case(MatchCase::Insensitive);
        let result = engine.check_content("BOTOX 特惠", &[rule("botox", Severity::Warning)]);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(
            result.violations[0].positions,
            vec![TextSpan { start: 0, end: 5 }]
        );
    }

    #[test]
    fn keyword_validation_rejects_blank() {
        assert!(is_valid_keyword("治療"));
        assert!(!is_valid_keyword(""));
        assert!(!is_valid_keyword("   "));
    }
}
