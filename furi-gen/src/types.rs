//! Core types and collaborator traits
//!
//! Defines the candidate shape every reading source produces, the annotation
//! returned to callers, and the four collaborator seams the resolution pipeline
//! orchestrates:
//! - [`WordStore`]: trusted vocabulary, exact match
//! - [`ReadingCache`]: previously seen word/reading pairs with confidence
//! - [`Tokenizer`]: morphological segmentation with katakana readings
//! - [`ReadingGenerator`]: language-model reading extraction
//!
//! Every collaborator call returns `Result<_, SourceError>`. The pipeline treats
//! an error exactly like "no candidate" and moves on to the next layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Confidence
// ============================================================================

/// Confidence score, 0-100
pub type Confidence = i64;

/// Static confidence ranking. Highest wins when sources disagree.
pub mod confidence {
    use super::Confidence;

    pub const VOCABULARY: Confidence = 100;
    pub const USER: Confidence = 100;
    pub const LLM: Confidence = 85;
    pub const MORPHOLOGY: Confidence = 70;
}

/// Where a reading came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingSource {
    Vocabulary,
    Cache,
    Morphology,
    Llm,
    User,
}

impl ReadingSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vocabulary => "vocabulary",
            Self::Cache => "cache",
            Self::Morphology => "morphology",
            Self::Llm => "llm",
            Self::User => "user",
        }
    }
}

impl fmt::Display for ReadingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized source name
#[derive(Debug, Error)]
#[error("Unknown reading source: {0}")]
pub struct UnknownSource(pub String);

impl FromStr for ReadingSource {
    type Err = UnknownSource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vocabulary" => Ok(Self::Vocabulary),
            "cache" => Ok(Self::Cache),
            "morphology" => Ok(Self::Morphology),
            "llm" => Ok(Self::Llm),
            "user" => Ok(Self::User),
            other => Err(UnknownSource(other.to_string())),
        }
    }
}

impl TryFrom<String> for ReadingSource {
    type Error = UnknownSource;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ============================================================================
// Candidates and annotations
// ============================================================================

/// A reading proposed by one source for one span of the original text
///
/// Offsets are character offsets. Invariant:
/// `0 <= start < end <= len(text)` and `text == original[start..end]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationCandidate {
    pub text: String,
    pub reading: String,
    pub start: usize,
    pub end: usize,
    pub confidence: Confidence,
    pub source: ReadingSource,
}

impl AnnotationCandidate {
    /// Strip confidence and source
    pub fn into_annotation(self) -> Annotation {
        Annotation {
            text: self.text,
            reading: self.reading,
            start: self.start,
            end: self.end,
        }
    }
}

/// Final annotation returned by `resolve`
///
/// `reading` may be empty in annotation lists supplied by callers; the renderer
/// drops such entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub text: String,
    #[serde(default)]
    pub reading: String,
    pub start: usize,
    pub end: usize,
}

impl Annotation {
    pub fn new(text: impl Into<String>, reading: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            text: text.into(),
            reading: reading.into(),
            start,
            end,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Collaborator payloads
// ============================================================================

/// One morpheme from the tokenizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub surface_form: String,
    pub part_of_speech: String,
    /// Katakana reading; empty when unknown
    pub reading: String,
}

impl Token {
    pub fn new(
        surface_form: impl Into<String>,
        part_of_speech: impl Into<String>,
        reading: impl Into<String>,
    ) -> Self {
        Self {
            surface_form: surface_form.into(),
            part_of_speech: part_of_speech.into(),
            reading: reading.into(),
        }
    }
}

/// A text/reading pair from the reading generator
///
/// An empty `furigana` means "no reading needed".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingPair {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub furigana: String,
}

impl ReadingPair {
    pub fn new(text: impl Into<String>, furigana: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            furigana: furigana.into(),
        }
    }
}

/// Best cached reading for a word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedReading {
    pub reading: String,
    pub confidence: Confidence,
}

/// Stored reading cache row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ReadingCacheEntry {
    pub cache_id: i64,
    pub word: String,
    pub reading: String,
    pub confidence: Confidence,
    #[sqlx(try_from = "String")]
    pub source: ReadingSource,
    pub usage_count: i64,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
}

// ============================================================================
// Collaborator traits
// ============================================================================

/// Collaborator failure
#[derive(Debug, Error)]
pub enum SourceError {
    /// Collaborator could not be reached or refused the call
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status from a remote API
    #[error("API error {0}: {1}")]
    Api(u16, String),

    /// Reply could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Trusted vocabulary dictionary
#[async_trait::async_trait]
pub trait WordStore: Send + Sync {
    /// Exact match of `word` to its reading
    async fn lookup_word(&self, word: &str) -> Result<Option<String>, SourceError>;
}

/// Cache of previously seen word/reading pairs
///
/// Entries are keyed by the (word, reading) pair; one word may have several
/// entries under different readings.
#[async_trait::async_trait]
pub trait ReadingCache: Send + Sync {
    /// Highest-confidence reading for `word`
    ///
    /// Every hit increments that entry's usage count and refreshes its last-used
    /// timestamp.
    async fn lookup(&self, word: &str) -> Result<Option<CachedReading>, SourceError>;

    /// Create or update the (word, reading) entry
    ///
    /// An existing entry keeps `max(existing, confidence)`, gains one usage and a
    /// fresh last-used timestamp. Its source is not changed.
    async fn store(
        &self,
        word: &str,
        reading: &str,
        confidence: Confidence,
        source: ReadingSource,
    ) -> Result<ReadingCacheEntry, SourceError>;

    /// Write a user correction: confidence 100, source `user`, always
    async fn record_correction(
        &self,
        word: &str,
        reading: &str,
    ) -> Result<ReadingCacheEntry, SourceError>;
}

/// Morphological analyzer
#[async_trait::async_trait]
pub trait Tokenizer: Send + Sync {
    /// Ordered tokens covering `text`
    async fn tokenize(&self, text: &str) -> Result<Vec<Token>, SourceError>;
}

/// Language-model reading extraction
#[async_trait::async_trait]
pub trait ReadingGenerator: Send + Sync {
    /// Kanji-segment/reading pairs for `text`
    ///
    /// In mock mode no network call is made.
    async fn generate(
        &self,
        text: &str,
        api_key: &str,
        mock_mode: bool,
    ) -> Result<Vec<ReadingPair>, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_string_forms() {
        for source in [
            ReadingSource::Vocabulary,
            ReadingSource::Cache,
            ReadingSource::Morphology,
            ReadingSource::Llm,
            ReadingSource::User,
        ] {
            assert_eq!(source.as_str().parse::<ReadingSource>().unwrap(), source);
            assert_eq!(
                serde_json::to_string(&source).unwrap(),
                format!("\"{}\"", source.as_str())
            );
        }
        assert!("system".parse::<ReadingSource>().is_err());
    }

    #[test]
    fn test_candidate_into_annotation() {
        let candidate = AnnotationCandidate {
            text: "漢字".to_string(),
            reading: "かんじ".to_string(),
            start: 2,
            end: 4,
            confidence: 85,
            source: ReadingSource::Llm,
        };
        assert_eq!(candidate.into_annotation(), Annotation::new("漢字", "かんじ", 2, 4));
    }

    #[test]
    fn test_annotation_missing_reading_deserializes_empty() {
        let a: Annotation =
            serde_json::from_str(r#"{"text":"天気","start":5,"end":7}"#).unwrap();
        assert_eq!(a.reading, "");
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_reading_pair_defaults() {
        let pairs: Vec<ReadingPair> =
            serde_json::from_str(r#"[{"text":"を"},{"text":"今月","furigana":"こんげつ"}]"#).unwrap();
        assert_eq!(pairs[0].furigana, "");
        assert_eq!(pairs[1], ReadingPair::new("今月", "こんげつ"));
    }
}
