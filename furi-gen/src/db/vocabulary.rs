//! Vocabulary database operations
//!
//! Trusted word readings. Rows are unique per (word, reading); lookups return
//! the earliest row for a word.

use crate::types::{SourceError, WordStore};
use async_trait::async_trait;
use furi_common::{Error, Result};
use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;

/// Outcome of a vocabulary import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub added: usize,
    /// Pairs already present
    pub skipped: usize,
}

#[derive(Clone)]
pub struct SqliteWordStore {
    pool: SqlitePool,
}

impl SqliteWordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a (word, reading) pair; returns false if it already exists
    pub async fn add_word(&self, word: &str, reading: &str, meaning: Option<&str>) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO vocabulary (word, reading, meaning, source)
            VALUES (?, ?, ?, 'user')
            "#,
        )
        .bind(word)
        .bind(reading)
        .bind(meaning)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Import `word<TAB>reading[<TAB>meaning]` lines from a file
    pub async fn import_tsv(&self, path: &Path) -> Result<ImportSummary> {
        let content = std::fs::read_to_string(path)?;
        let summary = self.import_tsv_str(&content).await?;
        info!(
            path = %path.display(),
            added = summary.added,
            skipped = summary.skipped,
            "Imported vocabulary"
        );
        Ok(summary)
    }

    /// Import vocabulary lines; `#` comments and blank lines are ignored
    pub async fn import_tsv_str(&self, content: &str) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();

        for (idx, line) in content.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split('\t').map(str::trim);
            let word = fields.next().unwrap_or("");
            let reading = fields.next().unwrap_or("");
            let meaning = fields.next().filter(|m| !m.is_empty());
            if word.is_empty() || reading.is_empty() {
                return Err(Error::InvalidInput(format!(
                    "Vocabulary line {} needs a word and a reading",
                    idx + 1
                )));
            }

            if self.add_word(word, reading, meaning).await? {
                summary.added += 1;
            } else {
                summary.skipped += 1;
            }
        }

        Ok(summary)
    }
}

#[async_trait]
impl WordStore for SqliteWordStore {
    async fn lookup_word(&self, word: &str) -> std::result::Result<Option<String>, SourceError> {
        let reading = sqlx::query_scalar::<_, String>(
            "SELECT reading FROM vocabulary WHERE word = ? ORDER BY vocab_id LIMIT 1",
        )
        .bind(word)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use furi_common::db::init_memory_database;

    async fn setup_store() -> SqliteWordStore {
        SqliteWordStore::new(init_memory_database().await.unwrap())
    }

    #[tokio::test]
    async fn test_add_and_lookup() {
        let store = setup_store().await;

        assert!(store.add_word("日本語", "にほんご", Some("Japanese")).await.unwrap());
        assert!(!store.add_word("日本語", "にほんご", None).await.unwrap());

        let reading = store.lookup_word("日本語").await.unwrap();
        assert_eq!(reading.as_deref(), Some("にほんご"));
        assert_eq!(store.lookup_word("英語").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_earliest_reading_wins() {
        let store = setup_store().await;
        store.add_word("今日", "きょう", None).await.unwrap();
        store.add_word("今日", "こんにち", None).await.unwrap();

        assert_eq!(store.lookup_word("今日").await.unwrap().as_deref(), Some("きょう"));
    }

    #[tokio::test]
    async fn test_import_tsv_str() {
        let store = setup_store().await;
        let summary = store
            .import_tsv_str("# seed\n勉強\tべんきょう\tstudy\n\n漢字\tかんじ\n勉強\tべんきょう\n")
            .await
            .unwrap();

        assert_eq!(summary, ImportSummary { added: 2, skipped: 1 });
        assert_eq!(store.lookup_word("漢字").await.unwrap().as_deref(), Some("かんじ"));
    }

    #[tokio::test]
    async fn test_import_rejects_missing_reading() {
        let store = setup_store().await;
        let err = store.import_tsv_str("漢字\n").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_import_tsv_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("vocab.tsv");
        std::fs::write(&path, "部屋\tへや\n").unwrap();

        let store = setup_store().await;
        let summary = store.import_tsv(&path).await.unwrap();
        assert_eq!(summary.added, 1);
    }
}
