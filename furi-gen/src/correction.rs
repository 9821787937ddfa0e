//! User corrections
//!
//! A correction is written to the reading cache at confidence 100 with source
//! `user`, every time, even when it repeats the stored reading. Later lookups of
//! the word then prefer it over every non-user reading.

use crate::text::char_len;
use crate::types::{confidence, AnnotationCandidate, ReadingCache, ReadingSource};
use furi_common::{Error, Result};
use tracing::info;

/// Store `corrected_reading` for `text` and return it as a candidate
///
/// The candidate spans the whole of `text` (`0..len`); this function does not
/// know where `text` sits in any larger sentence. `previous_reading` is only
/// logged.
pub async fn apply_correction(
    cache: &dyn ReadingCache,
    text: &str,
    previous_reading: &str,
    corrected_reading: &str,
) -> Result<AnnotationCandidate> {
    if text.is_empty() {
        return Err(Error::InvalidInput("Text is required".to_string()));
    }
    if corrected_reading.is_empty() {
        return Err(Error::InvalidInput("Corrected reading is required".to_string()));
    }

    let entry = cache
        .record_correction(text, corrected_reading)
        .await
        .map_err(|e| Error::Internal(format!("Failed to store correction: {}", e)))?;

    info!(
        word = text,
        previous = previous_reading,
        corrected = corrected_reading,
        usage_count = entry.usage_count,
        "Applied furigana correction"
    );

    Ok(AnnotationCandidate {
        text: text.to_string(),
        reading: corrected_reading.to_string(),
        start: 0,
        end: char_len(text),
        confidence: confidence::USER,
        source: ReadingSource::User,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryReadingCache;

    #[tokio::test]
    async fn test_correction_spans_whole_text() {
        let cache = InMemoryReadingCache::new();
        let applied = apply_correction(&cache, "日本語", "にっぽんご", "にほんご")
            .await
            .unwrap();

        assert_eq!(applied.start, 0);
        assert_eq!(applied.end, 3);
        assert_eq!(applied.reading, "にほんご");
        assert_eq!(applied.confidence, 100);
        assert_eq!(applied.source, ReadingSource::User);
    }

    #[tokio::test]
    async fn test_identical_correction_still_written() {
        let cache = InMemoryReadingCache::new();
        apply_correction(&cache, "漢字", "かんじ", "かんじ").await.unwrap();
        apply_correction(&cache, "漢字", "かんじ", "かんじ").await.unwrap();

        let entries = cache.entries_for("漢字").await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].confidence, 100);
        assert_eq!(entries[0].source, ReadingSource::User);
        assert_eq!(entries[0].usage_count, 2);
    }

    #[tokio::test]
    async fn test_missing_input_rejected() {
        let cache = InMemoryReadingCache::new();

        let err = apply_correction(&cache, "", "", "かんじ").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = apply_correction(&cache, "漢字", "かんじ", "").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(cache.is_empty().await);
    }
}
