//! Language-model adapter
//!
//! Wraps a [`ReadingGenerator`]. Generator failures become an empty list. Every
//! pair with a reading that is non-empty and differs from its text is stored in
//! the reading cache at confidence 85, mock answers included.

use crate::types::{confidence, ReadingCache, ReadingGenerator, ReadingPair, ReadingSource};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct LlmSource {
    generator: Arc<dyn ReadingGenerator>,
    cache: Arc<dyn ReadingCache>,
}

impl LlmSource {
    pub fn new(generator: Arc<dyn ReadingGenerator>, cache: Arc<dyn ReadingCache>) -> Self {
        Self { generator, cache }
    }

    /// Reading pairs for `text`, possibly empty
    pub async fn generate(&self, text: &str, api_key: &str, mock_mode: bool) -> Vec<ReadingPair> {
        let pairs = match self.generator.generate(text, api_key, mock_mode).await {
            Ok(pairs) => pairs,
            Err(e) => {
                warn!(error = %e, "Reading generation failed");
                return Vec::new();
            }
        };

        for pair in &pairs {
            if pair.text.is_empty() || pair.furigana.is_empty() || pair.text == pair.furigana {
                continue;
            }
            if let Err(e) = self
                .cache
                .store(&pair.text, &pair.furigana, confidence::LLM, ReadingSource::Llm)
                .await
            {
                warn!(word = %pair.text, error = %e, "Failed to cache generated reading");
            }
        }

        debug!(pairs = pairs.len(), mock = mock_mode, "Generated readings");
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryReadingCache;
    use crate::types::SourceError;
    use async_trait::async_trait;

    struct FixedGenerator(Result<Vec<ReadingPair>, u16>);

    #[async_trait]
    impl ReadingGenerator for FixedGenerator {
        async fn generate(
            &self,
            _text: &str,
            _api_key: &str,
            _mock_mode: bool,
        ) -> Result<Vec<ReadingPair>, SourceError> {
            match &self.0 {
                Ok(pairs) => Ok(pairs.clone()),
                Err(status) => Err(SourceError::Api(*status, "rate limited".to_string())),
            }
        }
    }

    #[tokio::test]
    async fn test_pairs_are_cached_at_llm_confidence() {
        let cache = Arc::new(InMemoryReadingCache::new());
        let generator = FixedGenerator(Ok(vec![
            ReadingPair::new("東京", "とうきょう"),
            ReadingPair::new("に", ""),
            ReadingPair::new("ました", "ました"),
        ]));
        let source = LlmSource::new(Arc::new(generator), cache.clone());

        let pairs = source.generate("東京に行きました", "key", false).await;
        assert_eq!(pairs.len(), 3);

        let entries = cache.entries_for("東京").await;
        assert_eq!(entries[0].confidence, 85);
        assert_eq!(entries[0].source, ReadingSource::Llm);
        assert!(cache.entries_for("に").await.is_empty());
        assert!(cache.entries_for("ました").await.is_empty());
    }

    #[tokio::test]
    async fn test_generator_error_is_empty() {
        let cache = Arc::new(InMemoryReadingCache::new());
        let source = LlmSource::new(Arc::new(FixedGenerator(Err(429))), cache.clone());

        assert!(source.generate("漢字", "key", false).await.is_empty());
        assert!(cache.is_empty().await);
    }
}
