//! Highlight composition for rendering scanned text.
//!
//! Flattens every violation span into a single left-to-right segment list a
//! renderer can style directly. Concatenating the segment texts reproduces
//! the input exactly, so every character is accounted for once.

use shared_types::{CheckResult, Severity, TextSpan};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    Plain,
    Marked { severity: Severity, keyword: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub kind: SegmentKind,
}

impl Segment {
    fn plain(chars: &[char]) -> Self {
        Segment {
            text: chars.iter().collect(),
            kind: SegmentKind::Plain,
        }
    }
}

/// Compose render-ready segments from a scan result. Marks are consumed in
/// ascending `start` order; a mark starting inside already-consumed text is
/// dropped (first match wins).
pub fn highlight_segments(text: &str, result: &CheckResult) -> Vec<Segment> {
    let chars: Vec<char> = text.chars().collect();

    let mut marks: Vec<(TextSpan, Severity, &str)> = result
        .violations
        .iter()
        .flat_map(|v| {
            v.positions
                .iter()
                .map(move |p| (*p, v.severity, v.keyword.as_str()))
        })
        .collect();
    marks.sort_by_key(|(span, _, _)| span.start);

    let mut segments = Vec::new();
    let mut cursor = 0usize;

    for (span, severity, keyword) in marks {
        let start = span.start.min(chars.len());
        let end = span.end.min(chars.len());
        if start < cursor || end <= start {
            continue;
        }
        if start > cursor {
            segments.push(Segment::plain(&chars[cursor..start]));
        }
        segments.push(Segment {
            text: chars[start..end].iter().collect(),
            kind: SegmentKind::Marked {
                severity,
                keyword: keyword.to_string(),
            },
        });
        cursor = end;
    }

    if cursor < chars.len() {
        segments.push(Segment::plain(&chars[cursor..]));
    }

    segments
}
