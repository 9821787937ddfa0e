//! Source adapters
//!
//! Thin wrappers that call one collaborator each and normalize its answer.
//! Collaborator errors stop here: they are logged and reported as "no result".
//!
//! Exact-match sources (vocabulary, cache) share the [`ExactSource`] shape so
//! the pipeline can try them as an ordered list. Morphology and the language
//! model work on whole texts and have their own adapters.

pub mod llm;
pub mod morphology;

pub use llm::LlmSource;
pub use morphology::{MorphologyReading, MorphologySource};

use crate::types::{confidence, Confidence, ReadingCache, ReadingSource, WordStore};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// Reading found by an exact-match source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactHit {
    pub reading: String,
    pub confidence: Confidence,
    pub source: ReadingSource,
}

/// Exact match of one segment's surface form
#[async_trait]
pub trait ExactSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Reading for `segment`, or `None` on a miss or a collaborator failure
    async fn lookup(&self, segment: &str) -> Option<ExactHit>;
}

/// Trusted vocabulary, fixed confidence 100
pub struct VocabularySource {
    store: Arc<dyn WordStore>,
}

impl VocabularySource {
    pub fn new(store: Arc<dyn WordStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ExactSource for VocabularySource {
    fn name(&self) -> &'static str {
        "vocabulary"
    }

    async fn lookup(&self, segment: &str) -> Option<ExactHit> {
        match self.store.lookup_word(segment).await {
            Ok(Some(reading)) if !reading.is_empty() => Some(ExactHit {
                reading,
                confidence: confidence::VOCABULARY,
                source: ReadingSource::Vocabulary,
            }),
            Ok(_) => None,
            Err(e) => {
                warn!(segment, error = %e, "Vocabulary lookup failed");
                None
            }
        }
    }
}

/// Reading cache, carries the stored confidence
pub struct CacheSource {
    cache: Arc<dyn ReadingCache>,
}

impl CacheSource {
    pub fn new(cache: Arc<dyn ReadingCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl ExactSource for CacheSource {
    fn name(&self) -> &'static str {
        "cache"
    }

    async fn lookup(&self, segment: &str) -> Option<ExactHit> {
        match self.cache.lookup(segment).await {
            Ok(Some(hit)) => Some(ExactHit {
                reading: hit.reading,
                confidence: hit.confidence,
                source: ReadingSource::Cache,
            }),
            Ok(None) => None,
            Err(e) => {
                warn!(segment, error = %e, "Reading cache lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryReadingCache, InMemoryWordStore};
    use crate::types::{CachedReading, ReadingCacheEntry, SourceError};

    struct FailingStore;

    #[async_trait]
    impl WordStore for FailingStore {
        async fn lookup_word(&self, _word: &str) -> Result<Option<String>, SourceError> {
            Err(SourceError::Unavailable("offline".to_string()))
        }
    }

    struct FailingCache;

    #[async_trait]
    impl ReadingCache for FailingCache {
        async fn lookup(&self, _word: &str) -> Result<Option<CachedReading>, SourceError> {
            Err(SourceError::Unavailable("offline".to_string()))
        }

        async fn store(
            &self,
            _word: &str,
            _reading: &str,
            _confidence: Confidence,
            _source: ReadingSource,
        ) -> Result<ReadingCacheEntry, SourceError> {
            Err(SourceError::Unavailable("offline".to_string()))
        }

        async fn record_correction(
            &self,
            _word: &str,
            _reading: &str,
        ) -> Result<ReadingCacheEntry, SourceError> {
            Err(SourceError::Unavailable("offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_vocabulary_hit_has_full_confidence() {
        let store = InMemoryWordStore::from_pairs([("漢字", "かんじ")]);
        let source = VocabularySource::new(Arc::new(store));

        let hit = source.lookup("漢字").await.unwrap();
        assert_eq!(hit.reading, "かんじ");
        assert_eq!(hit.confidence, 100);
        assert_eq!(hit.source, ReadingSource::Vocabulary);
        assert!(source.lookup("感じ").await.is_none());
    }

    #[tokio::test]
    async fn test_cache_hit_keeps_stored_confidence() {
        let cache = Arc::new(InMemoryReadingCache::new());
        cache.store("東京", "とうきょう", 70, ReadingSource::Morphology).await.unwrap();
        let source = CacheSource::new(cache.clone());

        let hit = source.lookup("東京").await.unwrap();
        assert_eq!(hit.confidence, 70);
        assert_eq!(hit.source, ReadingSource::Cache);
    }

    #[tokio::test]
    async fn test_failures_read_as_misses() {
        assert!(VocabularySource::new(Arc::new(FailingStore)).lookup("漢字").await.is_none());
        assert!(CacheSource::new(Arc::new(FailingCache)).lookup("漢字").await.is_none());
    }
}
