//! Sentence store database operations
//!
//! Study sentences with their saved furigana. `furigana_data` holds the
//! annotation array as JSON; `llm_processed` marks rows whose furigana came
//! from the resolution pipeline.

use crate::types::Annotation;
use chrono::{DateTime, Utc};
use furi_common::{time, Error, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, warn};

const SENTENCE_COLUMNS: &str = "sentence_id, sentence, translation, furigana_data, \
     difficulty_level, tags, source, created_at, llm_processed";

/// Difficulty assigned when the caller gives none
pub const DEFAULT_DIFFICULTY: i64 = 1;

/// Source recorded when the caller gives none
pub const DEFAULT_SOURCE: &str = "api";

/// One stored sentence
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Sentence {
    pub sentence_id: i64,
    pub sentence: String,
    pub translation: Option<String>,
    /// Annotation array as JSON
    pub furigana_data: Option<String>,
    pub difficulty_level: Option<i64>,
    pub tags: Option<String>,
    pub source: Option<String>,
    pub created_at: DateTime<Utc>,
    pub llm_processed: bool,
}

impl Sentence {
    /// Saved annotations; empty when none are stored or the JSON is unreadable
    pub fn annotations(&self) -> Vec<Annotation> {
        self.furigana_data
            .as_deref()
            .map(|data| parse_furigana_data(self.sentence_id, data))
            .unwrap_or_default()
    }
}

/// Fields for a new sentence
#[derive(Debug, Clone, Default)]
pub struct NewSentence {
    pub sentence: String,
    pub translation: Option<String>,
    pub difficulty_level: Option<i64>,
    pub tags: Option<String>,
    pub source: Option<String>,
}

impl NewSentence {
    pub fn new(sentence: impl Into<String>) -> Self {
        Self {
            sentence: sentence.into(),
            ..Default::default()
        }
    }
}

#[derive(Clone)]
pub struct SqliteSentenceStore {
    pool: SqlitePool,
}

impl SqliteSentenceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a sentence; blank text is rejected
    pub async fn create(&self, new: &NewSentence) -> Result<Sentence> {
        if new.sentence.trim().is_empty() {
            return Err(Error::InvalidInput("Sentence is required".to_string()));
        }

        let sentence = sqlx::query_as::<_, Sentence>(&format!(
            "INSERT INTO sentences \
             (sentence, translation, difficulty_level, tags, source, created_at, llm_processed) \
             VALUES (?, ?, ?, ?, ?, ?, 0) RETURNING {SENTENCE_COLUMNS}"
        ))
        .bind(&new.sentence)
        .bind(&new.translation)
        .bind(new.difficulty_level.unwrap_or(DEFAULT_DIFFICULTY))
        .bind(&new.tags)
        .bind(new.source.as_deref().unwrap_or(DEFAULT_SOURCE))
        .bind(time::now())
        .fetch_one(&self.pool)
        .await?;

        debug!(sentence_id = sentence.sentence_id, "Created sentence");
        Ok(sentence)
    }

    pub async fn get(&self, sentence_id: i64) -> Result<Option<Sentence>> {
        let sentence = sqlx::query_as::<_, Sentence>(&format!(
            "SELECT {SENTENCE_COLUMNS} FROM sentences WHERE sentence_id = ?"
        ))
        .bind(sentence_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sentence)
    }

    /// Most recent sentences first
    pub async fn list(&self, limit: i64) -> Result<Vec<Sentence>> {
        let sentences = sqlx::query_as::<_, Sentence>(&format!(
            "SELECT {SENTENCE_COLUMNS} FROM sentences \
             ORDER BY created_at DESC, sentence_id DESC LIMIT ?"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sentences)
    }

    /// Store pipeline output and mark the row processed
    ///
    /// Returns false when the sentence does not exist.
    pub async fn save_furigana(&self, sentence_id: i64, annotations: &[Annotation]) -> Result<bool> {
        let data = serde_json::to_string(annotations)
            .map_err(|e| Error::Internal(format!("Serialize furigana failed: {}", e)))?;

        let result = sqlx::query(
            "UPDATE sentences SET furigana_data = ?, llm_processed = 1 WHERE sentence_id = ?",
        )
        .bind(data)
        .bind(sentence_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replace saved furigana with edited annotations; processing flag is unchanged
    pub async fn update_furigana(
        &self,
        sentence_id: i64,
        annotations: &[Annotation],
    ) -> Result<bool> {
        let data = serde_json::to_string(annotations)
            .map_err(|e| Error::Internal(format!("Serialize furigana failed: {}", e)))?;

        let result = sqlx::query("UPDATE sentences SET furigana_data = ? WHERE sentence_id = ?")
            .bind(data)
            .bind(sentence_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, sentence_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sentences WHERE sentence_id = ?")
            .bind(sentence_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn parse_furigana_data(sentence_id: i64, data: &str) -> Vec<Annotation> {
    match serde_json::from_str(data) {
        Ok(annotations) => annotations,
        Err(e) => {
            warn!(sentence_id, error = %e, "Unreadable furigana data");
            Vec::new()
        }
    }
}
