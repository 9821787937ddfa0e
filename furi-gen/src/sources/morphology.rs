//! Morphology adapter
//!
//! Runs the tokenizer over a whole text and turns token readings into
//! hiragana word readings. Every run also teaches the reading cache: each word
//! whose reading differs from its surface form is stored at confidence 70.

use crate::types::{confidence, Confidence, ReadingCache, ReadingSource, Token, Tokenizer};
use furi_common::kana::kata_to_hira;
use std::sync::Arc;
use tracing::{debug, warn};

/// Parts of speech that never carry a reading: punctuation, particles, auxiliary verbs
pub const FILTERED_POS: &[&str] = &["記号", "助詞", "助動詞"];

/// Word reading derived from one token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MorphologyReading {
    pub word: String,
    pub reading: String,
    pub confidence: Confidence,
}

pub struct MorphologySource {
    tokenizer: Arc<dyn Tokenizer>,
    cache: Arc<dyn ReadingCache>,
}

impl MorphologySource {
    pub fn new(tokenizer: Arc<dyn Tokenizer>, cache: Arc<dyn ReadingCache>) -> Self {
        Self { tokenizer, cache }
    }

    async fn tokens(&self, text: &str) -> Vec<Token> {
        match self.tokenizer.tokenize(text).await {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(error = %e, "Tokenizer failed");
                Vec::new()
            }
        }
    }

    /// Surface forms of `text`, in order
    pub async fn segment(&self, text: &str) -> Vec<String> {
        self.tokens(text)
            .await
            .into_iter()
            .map(|t| t.surface_form)
            .collect()
    }

    /// Word readings for `text`, storing each one in the reading cache
    ///
    /// Only words whose reading differs from the surface form are returned.
    pub async fn analyze(&self, text: &str) -> Vec<MorphologyReading> {
        let tokens = self.tokens(text).await;
        let mut results = Vec::new();

        for (word, reading) in extract_readings(&tokens) {
            if word == reading {
                continue;
            }
            if let Err(e) = self
                .cache
                .store(&word, &reading, confidence::MORPHOLOGY, ReadingSource::Morphology)
                .await
            {
                warn!(word = %word, error = %e, "Failed to cache morphology reading");
            }
            results.push(MorphologyReading {
                word,
                reading,
                confidence: confidence::MORPHOLOGY,
            });
        }

        debug!(tokens = tokens.len(), readings = results.len(), "Morphology analysis");
        results
    }
}

/// `(surface, hiragana reading)` for every token that can carry a reading
pub fn extract_readings(tokens: &[Token]) -> Vec<(String, String)> {
    tokens
        .iter()
        .filter(|t| {
            !t.reading.is_empty()
                && !t.surface_form.is_empty()
                && !FILTERED_POS.contains(&t.part_of_speech.as_str())
        })
        .map(|t| (t.surface_form.clone(), kata_to_hira(&t.reading)))
        .collect()
}
