//! Reading cache database operations
//!
//! `furigana_cache` rows are unique per (word, reading). Every read of a word
//! bumps the usage count of the row it returns. The read and the bump are two
//! statements, so concurrent lookups may lose increments.

use crate::types::{
    confidence, CachedReading, Confidence, ReadingCache, ReadingCacheEntry, ReadingSource,
    SourceError,
};
use async_trait::async_trait;
use furi_common::{time, Result};
use sqlx::SqlitePool;
use tracing::debug;

const ENTRY_COLUMNS: &str =
    "cache_id, word, reading, confidence, source, usage_count, created_at, last_used_at";

#[derive(Clone)]
pub struct SqliteReadingCache {
    pool: SqlitePool,
}

impl SqliteReadingCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All entries for `word`, highest confidence first
    pub async fn entries_for(&self, word: &str) -> Result<Vec<ReadingCacheEntry>> {
        let entries = sqlx::query_as::<_, ReadingCacheEntry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM furigana_cache WHERE word = ? \
             ORDER BY confidence DESC, cache_id ASC"
        ))
        .bind(word)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Set confidence and source of an existing pair
    ///
    /// Returns `None` when the pair is not cached. Usage count is unchanged.
    pub async fn set_confidence(
        &self,
        word: &str,
        reading: &str,
        confidence: Confidence,
        source: ReadingSource,
    ) -> Result<Option<ReadingCacheEntry>> {
        let entry = sqlx::query_as::<_, ReadingCacheEntry>(&format!(
            "UPDATE furigana_cache SET confidence = ?, source = ?, last_used_at = ? \
             WHERE word = ? AND reading = ? RETURNING {ENTRY_COLUMNS}"
        ))
        .bind(confidence)
        .bind(source.as_str())
        .bind(time::now())
        .bind(word)
        .bind(reading)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Remove an entry; returns whether it existed
    pub async fn delete(&self, cache_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM furigana_cache WHERE cache_id = ?")
            .bind(cache_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn upsert_max(
        &self,
        word: &str,
        reading: &str,
        confidence: Confidence,
        source: ReadingSource,
    ) -> std::result::Result<ReadingCacheEntry, sqlx::Error> {
        let now = time::now();
        sqlx::query_as::<_, ReadingCacheEntry>(&format!(
            r#"
            INSERT INTO furigana_cache
                (word, reading, confidence, source, created_at, last_used_at, usage_count)
            VALUES (?, ?, ?, ?, ?, ?, 1)
            ON CONFLICT(word, reading) DO UPDATE SET
                confidence = MAX(furigana_cache.confidence, excluded.confidence),
                last_used_at = excluded.last_used_at,
                usage_count = furigana_cache.usage_count + 1
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(word)
        .bind(reading)
        .bind(confidence)
        .bind(source.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
    }

    async fn upsert_overwrite(
        &self,
        word: &str,
        reading: &str,
        confidence: Confidence,
        source: ReadingSource,
    ) -> std::result::Result<ReadingCacheEntry, sqlx::Error> {
        let now = time::now();
        sqlx::query_as::<_, ReadingCacheEntry>(&format!(
            r#"
            INSERT INTO furigana_cache
                (word, reading, confidence, source, created_at, last_used_at, usage_count)
            VALUES (?, ?, ?, ?, ?, ?, 1)
            ON CONFLICT(word, reading) DO UPDATE SET
                confidence = excluded.confidence,
                source = excluded.source,
                last_used_at = excluded.last_used_at,
                usage_count = furigana_cache.usage_count + 1
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(word)
        .bind(reading)
        .bind(confidence)
        .bind(source.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
    }
}

#[async_trait]
impl ReadingCache for SqliteReadingCache {
    async fn lookup(&self, word: &str) -> std::result::Result<Option<CachedReading>, SourceError> {
        let row: Option<(i64, String, Confidence)> = sqlx::query_as(
            "SELECT cache_id, reading, confidence FROM furigana_cache WHERE word = ? \
             ORDER BY confidence DESC, cache_id ASC LIMIT 1",
        )
        .bind(word)
        .fetch_optional(&self.pool)
        .await?;

        let Some((cache_id, reading, confidence)) = row else {
            return Ok(None);
        };

        sqlx::query(
            "UPDATE furigana_cache SET usage_count = usage_count + 1, last_used_at = ? \
             WHERE cache_id = ?",
        )
        .bind(time::now())
        .bind(cache_id)
        .execute(&self.pool)
        .await?;

        debug!(word, cache_id, confidence, "Reading cache hit");
        Ok(Some(CachedReading {
            reading,
            confidence,
        }))
    }

    async fn store(
        &self,
        word: &str,
        reading: &str,
        confidence: Confidence,
        source: ReadingSource,
    ) -> std::result::Result<ReadingCacheEntry, SourceError> {
        Ok(self.upsert_max(word, reading, confidence, source).await?)
    }

    async fn record_correction(
        &self,
        word: &str,
        reading: &str,
    ) -> std::result::Result<ReadingCacheEntry, SourceError> {
        Ok(self
            .upsert_overwrite(word, reading, confidence::USER, ReadingSource::User)
            .await?)
    }
}
