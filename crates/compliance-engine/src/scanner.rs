//! Keyword occurrence search over scanned text.
//!
//! All offsets are character offsets (Unicode scalar values), end exclusive,
//! so positions line up for CJK input regardless of byte width.

use shared_types::TextSpan;

use crate::MatchCase;

fn fold(ch: char, case: MatchCase) -> char {
    match case {
        MatchCase::Sensitive => ch,
        // Simple one-to-one folding keeps offsets aligned with the input.
        MatchCase::Insensitive => ch.to_lowercase().next().unwrap_or(ch),
    }
}

/// Every non-overlapping occurrence of `keyword` in `text`, in order of
/// appearance. After a match at `[start, end)` the search resumes at `end`.
pub(crate) fn find_occurrences(text: &str, keyword: &str, case: MatchCase) -> Vec<TextSpan> {
    let needle: Vec<char> = keyword.chars().map(|c| fold(c, case)).collect();
    if needle.is_empty() {
        return Vec::new();
    }

    let haystack: Vec<char> = text.chars().map(|c| fold(c, case)).collect();
    let mut spans = Vec::new();
    let mut i = 0;

    while i + needle.len() <= haystack.len() {
        if haystack[i..i + needle.len()] == needle[..] {
            spans.push(TextSpan {
                start: i,
                end: i + needle.len(),
            });
            i += needle.len();
        } else {
            i += 1;
        }
    }

    spans
}
