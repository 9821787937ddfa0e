//! Test Helper Utilities
//!
//! Shared fixtures for furi-gen integration tests

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use furi_common::config::{DictionaryFormat, FuriConfig, LlmSettings};
use furi_common::kana::is_kanji;
use furi_gen::db::{SqliteReadingCache, SqliteWordStore};
use furi_gen::memory::{InMemoryReadingCache, InMemoryWordStore};
use furi_gen::services::{DictionaryTokenizer, LlmReadingGenerator};
use furi_gen::types::{ReadingCache, SourceError, Token, Tokenizer};
use furi_gen::{AppState, FuriganaGenerator};
use sqlx::SqlitePool;

/// Vocabulary used by the end-to-end scenarios
pub const STUDY_VOCAB: &[(&str, &str)] = &[("日本語", "にほんご"), ("勉強", "べんきょう")];

/// MeCab-format test dictionary (IPADIC feature layout)
pub fn fixture_dictionary_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/mecab-mini")
}

pub fn fixture_tokenizer() -> DictionaryTokenizer {
    DictionaryTokenizer::from_path(fixture_dictionary_dir(), DictionaryFormat::Ipadic).unwrap()
}

/// Splits text into kanji and non-kanji runs and knows no readings
pub struct KanjiRunTokenizer;

#[async_trait::async_trait]
impl Tokenizer for KanjiRunTokenizer {
    async fn tokenize(&self, text: &str) -> Result<Vec<Token>, SourceError> {
        let mut tokens: Vec<Token> = Vec::new();
        let mut last = None;
        for c in text.chars() {
            let kanji = is_kanji(c);
            match tokens.last_mut() {
                Some(token) if last == Some(kanji) => token.surface_form.push(c),
                _ => tokens.push(Token::new(c.to_string(), "未知語", "")),
            }
            last = Some(kanji);
        }
        Ok(tokens)
    }
}

/// Mock-capable reading generator with default settings
pub fn mock_generator() -> Arc<LlmReadingGenerator> {
    Arc::new(LlmReadingGenerator::new(&LlmSettings::default()).unwrap())
}

/// Generator over in-memory stores, returning the shared cache
pub fn memory_generator(
    vocab: &[(&str, &str)],
    tokenizer: impl Tokenizer + 'static,
) -> (FuriganaGenerator, Arc<InMemoryReadingCache>) {
    let cache = Arc::new(InMemoryReadingCache::new());
    let generator = FuriganaGenerator::new(
        Arc::new(InMemoryWordStore::from_pairs(vocab.iter().copied())),
        cache.clone(),
        Arc::new(tokenizer),
        mock_generator(),
    );
    (generator, cache)
}

/// In-memory SQLite database with all tables created
pub async fn test_db() -> SqlitePool {
    furi_common::db::init_memory_database().await.unwrap()
}

/// Generator over SQLite stores seeded with `vocab`
pub async fn sqlite_generator(
    db: &SqlitePool,
    vocab: &[(&str, &str)],
) -> (FuriganaGenerator, Arc<SqliteReadingCache>) {
    let store = SqliteWordStore::new(db.clone());
    for (word, reading) in vocab {
        store.add_word(word, reading, None).await.unwrap();
    }
    let cache = Arc::new(SqliteReadingCache::new(db.clone()));
    let generator = FuriganaGenerator::new(
        Arc::new(store),
        cache.clone(),
        Arc::new(fixture_tokenizer()),
        mock_generator(),
    );
    (generator, cache)
}

/// Application state over a fresh in-memory database seeded with `vocab`
pub async fn test_state(vocab: &[(&str, &str)]) -> AppState {
    let db = test_db().await;
    let (generator, cache) = sqlite_generator(&db, vocab).await;
    let cache: Arc<dyn ReadingCache> = cache;
    AppState::with_generator(db, generator, cache, FuriConfig::default())
}
