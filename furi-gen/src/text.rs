//! Character-offset string helpers
//!
//! Annotation offsets count characters, not bytes. These helpers translate
//! between the two and provide `indexOf`-style search.

/// Number of characters in `s`
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte offset of character index `char_idx`, or `s.len()` when past the end
pub fn byte_offset(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(b, _)| b)
        .unwrap_or(s.len())
}

/// First occurrence of `needle` at or after character index `from`
///
/// Returns the character index of the match. An empty needle never matches.
pub fn find_from(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    let start_byte = byte_offset(haystack, from);
    let rest = &haystack[start_byte..];
    rest.find(needle)
        .map(|b| from + rest[..b].chars().count())
}

/// Substring between character offsets `start..end`
///
/// `None` when the range is inverted or runs past the end.
pub fn char_slice(s: &str, start: usize, end: usize) -> Option<&str> {
    if start > end {
        return None;
    }
    let mut indices = s.char_indices().map(|(b, _)| b).chain(std::iter::once(s.len()));
    let start_byte = indices.nth(start)?;
    let end_byte = if end == start {
        start_byte
    } else {
        indices.nth(end - start - 1)?
    };
    Some(&s[start_byte..end_byte])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_len_counts_characters() {
        assert_eq!(char_len("日本語を勉強しています"), 11);
        assert_eq!(char_len(""), 0);
    }

    #[test]
    fn test_find_from_cursor() {
        let text = "日本と日本";
        assert_eq!(find_from(text, "日本", 0), Some(0));
        assert_eq!(find_from(text, "日本", 1), Some(3));
        assert_eq!(find_from(text, "日本", 4), None);
        assert_eq!(find_from(text, "語", 0), None);
        assert_eq!(find_from(text, "", 0), None);
        // Cursor past the end
        assert_eq!(find_from(text, "日本", 99), None);
    }

    #[test]
    fn test_char_slice() {
        let text = "日本語を勉強";
        assert_eq!(char_slice(text, 0, 3), Some("日本語"));
        assert_eq!(char_slice(text, 4, 6), Some("勉強"));
        assert_eq!(char_slice(text, 6, 6), Some(""));
        assert_eq!(char_slice(text, 2, 2), Some(""));
        assert_eq!(char_slice(text, 5, 7), None);
        assert_eq!(char_slice(text, 3, 2), None);
    }

    #[test]
    fn test_byte_offset() {
        let text = "aあb";
        assert_eq!(byte_offset(text, 0), 0);
        assert_eq!(byte_offset(text, 1), 1);
        assert_eq!(byte_offset(text, 2), 4);
        assert_eq!(byte_offset(text, 3), 5);
        assert_eq!(byte_offset(text, 10), 5);
    }
}
