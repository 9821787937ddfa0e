//! Annotation rendering
//!
//! Turns an annotation list, possibly overlapping, into annotated text:
//! 1. Annotations without a reading are dropped.
//! 2. The rest are sorted by start, longer spans first on equal starts.
//! 3. Each is accepted unless it overlaps one already accepted.
//! 4. Accepted annotations are spliced in right to left using the original
//!    offsets.

use crate::ranges::ProcessedRange;
use crate::text::{byte_offset, char_len};
use crate::types::Annotation;
use serde::{Deserialize, Serialize};

/// Inline wrapper for one annotation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RenderStyle {
    /// `<ruby>漢字<rt>かんじ</rt></ruby>`
    #[default]
    Ruby,
    /// `漢字[かんじ]`
    Bracket,
}

impl RenderStyle {
    fn wrap(self, target: &str, reading: &str) -> String {
        match self {
            RenderStyle::Ruby => format!("<ruby>{target}<rt>{reading}</rt></ruby>"),
            RenderStyle::Bracket => format!("{target}[{reading}]"),
        }
    }
}

/// Non-overlapping subset of `annotations`, in start order
///
/// Annotations with an empty reading, an empty span, or an end past
/// `text_len` are dropped first.
pub fn select_annotations(text_len: usize, annotations: &[Annotation]) -> Vec<Annotation> {
    let mut candidates: Vec<&Annotation> = annotations
        .iter()
        .filter(|a| !a.reading.is_empty() && a.start < a.end && a.end <= text_len)
        .collect();
    candidates.sort_by(|a, b| a.start.cmp(&b.start).then(b.len().cmp(&a.len())));

    let mut accepted: Vec<ProcessedRange> = Vec::new();
    let mut selected = Vec::new();
    for annotation in candidates {
        if accepted.iter().any(|r| r.overlaps(annotation.start, annotation.end)) {
            continue;
        }
        accepted.push(ProcessedRange::new(annotation.start, annotation.end));
        selected.push(annotation.clone());
    }
    selected
}

/// Render `text` with `annotations` wrapped in `style`
pub fn render(text: &str, annotations: &[Annotation], style: RenderStyle) -> String {
    let mut selected = select_annotations(char_len(text), annotations);
    if selected.is_empty() {
        return text.to_string();
    }

    selected.sort_by(|a, b| b.end.cmp(&a.end));

    let mut result = text.to_string();
    for annotation in &selected {
        let start = byte_offset(text, annotation.start);
        let end = byte_offset(text, annotation.end);
        let wrapped = style.wrap(&text[start..end], &annotation.reading);
        result.replace_range(start..end, &wrapped);
    }
    result
}
