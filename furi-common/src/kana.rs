//! Kana and kanji character utilities
//!
//! Character classes used across the workspace. The kanji block is the CJK
//! Unified Ideographs range `U+4E00..=U+9FAF`; characters outside it (including
//! the iteration mark `々`) are not treated as kanji.

/// First code point of the kanji range
pub const KANJI_START: char = '\u{4E00}';
/// Last code point of the kanji range (inclusive)
pub const KANJI_END: char = '\u{9FAF}';

/// Offset between a katakana code point and its hiragana counterpart
const KATA_HIRA_OFFSET: u32 = 0x60;

/// True if `c` falls in the kanji range
pub fn is_kanji(c: char) -> bool {
    (KANJI_START..=KANJI_END).contains(&c)
}

/// True if any character of `s` is kanji
pub fn contains_kanji(s: &str) -> bool {
    s.chars().any(is_kanji)
}

/// Convert katakana to hiragana
///
/// Shifts every character in `U+30A1..=U+30F6` down by `0x60`. Everything else,
/// including the long vowel mark `ー`, passes through unchanged.
pub fn kata_to_hira(s: &str) -> String {
    s.chars()
        .map(|c| {
            if ('\u{30A1}'..='\u{30F6}').contains(&c) {
                char::from_u32(c as u32 - KATA_HIRA_OFFSET).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kanji_range_boundaries() {
        assert!(is_kanji('\u{4E00}'));
        assert!(is_kanji('\u{9FAF}'));
        assert!(!is_kanji('\u{9FB0}'));
        assert!(!is_kanji('\u{4DFF}'));
        assert!(is_kanji('語'));
        assert!(!is_kanji('を'));
        assert!(!is_kanji('々'));
    }

    #[test]
    fn test_contains_kanji() {
        assert!(contains_kanji("新しい"));
        assert!(!contains_kanji("しています"));
        assert!(!contains_kanji("テレビ"));
        assert!(!contains_kanji(""));
    }

    #[test]
    fn test_kata_to_hira() {
        assert_eq!(kata_to_hira("ニホンゴ"), "にほんご");
        assert_eq!(kata_to_hira("ベンキョウ"), "べんきょう");
        assert_eq!(kata_to_hira("ヴ"), "ゔ");
        // Long vowel mark and non-katakana pass through
        assert_eq!(kata_to_hira("ラーメン"), "らーめん");
        assert_eq!(kata_to_hira("漢字とカナ"), "漢字とかな");
    }
}
