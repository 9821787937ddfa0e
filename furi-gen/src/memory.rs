//! In-memory word store and reading cache
//!
//! Same contracts as the SQLite stores, kept behind `tokio::sync::RwLock`. Used
//! by tests and by callers without a database.

use crate::types::{
    CachedReading, Confidence, ReadingCache, ReadingCacheEntry, ReadingSource, SourceError,
    WordStore, confidence,
};
use async_trait::async_trait;
use furi_common::time;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Vocabulary held in a map; the first reading added for a word wins
#[derive(Debug, Default)]
pub struct InMemoryWordStore {
    words: RwLock<HashMap<String, Vec<String>>>,
}

impl InMemoryWordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<W, R>(pairs: impl IntoIterator<Item = (W, R)>) -> Self
    where
        W: Into<String>,
        R: Into<String>,
    {
        let mut words: HashMap<String, Vec<String>> = HashMap::new();
        for (word, reading) in pairs {
            let reading = reading.into();
            let readings = words.entry(word.into()).or_default();
            if !readings.contains(&reading) {
                readings.push(reading);
            }
        }
        Self {
            words: RwLock::new(words),
        }
    }

    /// Add a (word, reading) pair; returns false if it was already present
    pub async fn add_word(&self, word: &str, reading: &str) -> bool {
        let mut words = self.words.write().await;
        let readings = words.entry(word.to_string()).or_default();
        if readings.iter().any(|r| r == reading) {
            return false;
        }
        readings.push(reading.to_string());
        true
    }
}

#[async_trait]
impl WordStore for InMemoryWordStore {
    async fn lookup_word(&self, word: &str) -> Result<Option<String>, SourceError> {
        Ok(self
            .words
            .read()
            .await
            .get(word)
            .and_then(|readings| readings.first().cloned()))
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entries: Vec<ReadingCacheEntry>,
    next_id: i64,
}

/// Reading cache held in a vector of entries
#[derive(Debug, Default)]
pub struct InMemoryReadingCache {
    state: RwLock<CacheState>,
}

impl InMemoryReadingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries for `word`, highest confidence first
    pub async fn entries_for(&self, word: &str) -> Vec<ReadingCacheEntry> {
        let state = self.state.read().await;
        let mut entries: Vec<ReadingCacheEntry> = state
            .entries
            .iter()
            .filter(|e| e.word == word)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.confidence.cmp(&a.confidence).then(a.cache_id.cmp(&b.cache_id)));
        entries
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }

    /// Remove an entry; returns whether it existed
    pub async fn delete(&self, cache_id: i64) -> bool {
        let mut state = self.state.write().await;
        let before = state.entries.len();
        state.entries.retain(|e| e.cache_id != cache_id);
        state.entries.len() != before
    }

    async fn upsert(
        &self,
        word: &str,
        reading: &str,
        confidence: Confidence,
        source: ReadingSource,
        overwrite: bool,
    ) -> ReadingCacheEntry {
        let mut state = self.state.write().await;
        let now = time::now();

        if let Some(entry) = state
            .entries
            .iter_mut()
            .find(|e| e.word == word && e.reading == reading)
        {
            if overwrite {
                entry.confidence = confidence;
                entry.source = source;
            } else {
                entry.confidence = entry.confidence.max(confidence);
            }
            entry.usage_count += 1;
            entry.last_used_at = now;
            return entry.clone();
        }

        state.next_id += 1;
        let entry = ReadingCacheEntry {
            cache_id: state.next_id,
            word: word.to_string(),
            reading: reading.to_string(),
            confidence,
            source,
            usage_count: 1,
            created_at: now,
            last_used_at: now,
        };
        state.entries.push(entry.clone());
        entry
    }
}

#[async_trait]
impl ReadingCache for InMemoryReadingCache {
    async fn lookup(&self, word: &str) -> Result<Option<CachedReading>, SourceError> {
        let mut state = self.state.write().await;

        // First entry wins among equal confidences
        let best = state
            .entries
            .iter_mut()
            .filter(|e| e.word == word)
            .fold(None::<&mut ReadingCacheEntry>, |best, e| match best {
                Some(b) if b.confidence >= e.confidence => Some(b),
                _ => Some(e),
            });

        Ok(best.map(|entry| {
            entry.usage_count += 1;
            entry.last_used_at = time::now();
            CachedReading {
                reading: entry.reading.clone(),
                confidence: entry.confidence,
            }
        }))
    }

    async fn store(
        &self,
        word: &str,
        reading: &str,
        confidence: Confidence,
        source: ReadingSource,
    ) -> Result<ReadingCacheEntry, SourceError> {
        Ok(self.upsert(word, reading, confidence, source, false).await)
    }

    async fn record_correction(
        &self,
        word: &str,
        reading: &str,
    ) -> Result<ReadingCacheEntry, SourceError> {
        Ok(self
            .upsert(word, reading, confidence::USER, ReadingSource::User, true)
            .await)
    }
}
