//! Fixed reading table for mock mode
//!
//! Lookup is an exact match on the whole input first, then the first key (in
//! table order) contained in the input. No match means "no readings".

use crate::types::ReadingPair;

type MockEntry = (&'static str, &'static [(&'static str, &'static str)]);

/// Known phrases and their segment readings, in lookup order
const MOCK_TABLE: &[MockEntry] = &[
    ("日本語", &[("日本語", "にほんご")]),
    ("漢字", &[("漢字", "かんじ")]),
    ("勉強", &[("勉強", "べんきょう")]),
    ("新しい", &[("新しい", "あたら")]),
    (
        "日本語を勉強しています",
        &[
            ("日本語", "にほんご"),
            ("を", ""),
            ("勉強", "べんきょう"),
            ("して", ""),
            ("います", ""),
        ],
    ),
    ("難しい言葉", &[("難しい", "むずか"), ("言葉", "ことば")]),
    (
        "東京に行きました",
        &[("東京", "とうきょう"), ("に", ""), ("行き", "い"), ("ました", "")],
    ),
    ("引っ越せる", &[("引", "ひ"), ("っ", ""), ("越せる", "こ")]),
    ("引っ越す", &[("引", "ひ"), ("っ", ""), ("越す", "こ")]),
    (
        "今月14日に自分の部屋に引っ越せるんだ",
        &[
            ("今月", "こんげつ"),
            ("14", ""),
            ("日", "にち"),
            ("に", ""),
            ("自分", "じぶん"),
            ("の", ""),
            ("部屋", "へや"),
            ("に", ""),
            ("引", "ひ"),
            ("っ", ""),
            ("越せる", "こ"),
            ("んだ", ""),
        ],
    ),
];

/// Mock match for `text`
///
/// Returns the table key that matched together with its pairs.
pub fn lookup(text: &str) -> Option<(&'static str, Vec<ReadingPair>)> {
    let entry = MOCK_TABLE
        .iter()
        .find(|(key, _)| *key == text)
        .or_else(|| MOCK_TABLE.iter().find(|(key, _)| text.contains(key)))?;

    let &(key, pairs) = entry;
    Some((
        key,
        pairs
            .iter()
            .map(|(t, f)| ReadingPair::new(*t, *f))
            .collect(),
    ))
}
