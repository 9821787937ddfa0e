//! Range tracker
//!
//! Records the `[start, end)` character spans already annotated during one
//! resolution run. The set is append-only: ranges are never merged, so adjacent
//! or overlapping ranges may coexist and every query is a linear scan.

use furi_common::kana::contains_kanji;

/// Closed-open character interval already annotated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessedRange {
    pub start: usize,
    pub end: usize,
}

impl ProcessedRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Overlap test against one existing range
    ///
    /// True when the candidate's start lies inside the range, its end lies inside
    /// the range, or it contains the range. A candidate is rejected on any such
    /// overlap; it is never trimmed or split.
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        (start >= self.start && start < self.end)
            || (end > self.start && end <= self.end)
            || (start <= self.start && end >= self.end)
    }
}

/// True if `[start, end)` overlaps any of `ranges`
pub fn is_covered(start: usize, end: usize, ranges: &[ProcessedRange]) -> bool {
    ranges.iter().any(|r| r.overlaps(start, end))
}

/// Concatenation of the parts of `text` no range covers, in order
///
/// The result is non-contiguous text collapsed into one string, so offsets into
/// it do not map back to `text`.
pub fn uncovered_text(text: &str, ranges: &[ProcessedRange]) -> String {
    if ranges.is_empty() {
        return text.to_string();
    }

    let mut sorted = ranges.to_vec();
    sorted.sort_by_key(|r| r.start);

    let chars: Vec<char> = text.chars().collect();
    let mut result = String::new();
    let mut pos = 0usize;

    for range in &sorted {
        let start = range.start.min(chars.len());
        if start > pos {
            result.extend(&chars[pos..start]);
        }
        pos = pos.max(range.end);
    }

    if pos < chars.len() {
        result.extend(&chars[pos..]);
    }

    result
}

/// True if any kanji remains in the uncovered text
pub fn has_uncovered_kanji(text: &str, ranges: &[ProcessedRange]) -> bool {
    contains_kanji(&uncovered_text(text, ranges))
}

/// True unless `ranges` tile `[0, text_len)` without gaps
pub fn has_gaps(text_len: usize, ranges: &[ProcessedRange]) -> bool {
    if ranges.is_empty() {
        return text_len > 0;
    }

    let mut sorted = ranges.to_vec();
    sorted.sort_by_key(|r| r.start);

    let mut reach = 0usize;
    for range in &sorted {
        if range.start > reach {
            return true;
        }
        reach = reach.max(range.end);
    }

    reach < text_len
}

/// Append-only set of processed ranges for one resolution run
#[derive(Debug, Default, Clone)]
pub struct RangeTracker {
    ranges: Vec<ProcessedRange>,
}

impl RangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, start: usize, end: usize) {
        self.ranges.push(ProcessedRange::new(start, end));
    }

    pub fn is_covered(&self, start: usize, end: usize) -> bool {
        is_covered(start, end, &self.ranges)
    }

    pub fn uncovered_text(&self, text: &str) -> String {
        uncovered_text(text, &self.ranges)
    }

    pub fn has_uncovered_kanji(&self, text: &str) -> bool {
        has_uncovered_kanji(text, &self.ranges)
    }

    pub fn has_gaps(&self, text_len: usize) -> bool {
        has_gaps(text_len, &self.ranges)
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn ranges(&self) -> &[ProcessedRange] {
        &self.ranges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges(spans: &[(usize, usize)]) -> Vec<ProcessedRange> {
        spans.iter().map(|&(s, e)| ProcessedRange::new(s, e)).collect()
    }

    #[test]
    fn test_overlap_partial_and_containment() {
        let existing = ranges(&[(2, 5)]);

        // Start inside
        assert!(is_covered(3, 7, &existing));
        // End inside
        assert!(is_covered(0, 3, &existing));
        // Contains existing
        assert!(is_covered(1, 6, &existing));
        // Contained by existing
        assert!(is_covered(3, 4, &existing));
        // Identical
        assert!(is_covered(2, 5, &existing));
    }

    #[test]
    fn test_touching_is_not_overlap() {
        let existing = ranges(&[(2, 5)]);
        assert!(!is_covered(0, 2, &existing));
        assert!(!is_covered(5, 8, &existing));
        assert!(!is_covered(6, 8, &existing));
    }

    #[test]
    fn test_overlap_against_any_range() {
        let existing = ranges(&[(0, 1), (10, 12)]);
        assert!(is_covered(11, 13, &existing));
        assert!(!is_covered(4, 6, &existing));
        assert!(!is_covered(4, 6, &[]));
    }

    #[test]
    fn test_uncovered_text_collapses_gaps() {
        let text = "日本語を勉強しています";
        let tracked = ranges(&[(4, 6), (0, 3)]);
        assert_eq!(uncovered_text(text, &tracked), "をしています");
    }

    #[test]
    fn test_uncovered_text_without_ranges_is_full_text() {
        assert_eq!(uncovered_text("漢字", &[]), "漢字");
    }

    #[test]
    fn test_uncovered_text_with_nested_ranges() {
        // Inner range must not pull covered text back in
        let text = "abcdefgh";
        let tracked = ranges(&[(0, 5), (1, 2), (6, 7)]);
        assert_eq!(uncovered_text(text, &tracked), "fh");
    }

    #[test]
    fn test_has_uncovered_kanji() {
        let text = "東京に行きました";
        assert!(has_uncovered_kanji(text, &ranges(&[(0, 2)])));
        assert!(!has_uncovered_kanji(text, &ranges(&[(0, 2), (3, 5)])));
        assert!(!has_uncovered_kanji("ひらがな", &[]));
    }

    #[test]
    fn test_has_gaps() {
        assert!(has_gaps(5, &[]));
        assert!(!has_gaps(0, &[]));
        assert!(!has_gaps(5, &ranges(&[(0, 3), (3, 5)])));
        assert!(has_gaps(5, &ranges(&[(1, 5)])));
        assert!(has_gaps(5, &ranges(&[(0, 2), (3, 5)])));
        assert!(has_gaps(5, &ranges(&[(0, 4)])));
        // A contained range does not open a false gap
        assert!(!has_gaps(6, &ranges(&[(0, 5), (1, 2), (3, 6)])));
    }

    #[test]
    fn test_tracker_is_append_only() {
        let mut tracker = RangeTracker::new();
        assert!(tracker.is_empty());

        tracker.record(0, 3);
        tracker.record(1, 2);
        tracker.record(0, 3);

        assert_eq!(tracker.len(), 3);
        assert!(tracker.is_covered(2, 4));
        assert!(!tracker.is_covered(3, 4));
        assert_eq!(tracker.uncovered_text("日本語を"), "を");
    }
}
