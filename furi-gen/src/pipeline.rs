//! Resolution pipeline
//!
//! Resolves readings for one text in a single pass over three layers:
//!
//! 1. **Exact sources**: each tokenizer segment containing kanji is located at
//!    or after a scan cursor and tried against vocabulary, then the reading
//!    cache. First hit wins.
//! 2. **Morphology**: readings for the whole text from the tokenizer, placed at
//!    the first occurrence of each word. Runs according to [`MorphologyTrigger`].
//! 3. **Language model**: with an API key, and only while kanji remains
//!    uncovered, the uncovered text is sent to the reading generator. Results
//!    are placed at their first occurrence in the original text.
//!
//! A candidate is recorded only if it contains kanji and does not overlap an
//! already recorded range. Candidates are never trimmed or split. The final
//! list is stably sorted by start offset.
//!
//! Collaborator failures read as "nothing found" and resolution always
//! completes. No state survives between calls apart from what the
//! collaborators persist.

use crate::ranges::RangeTracker;
use crate::sources::{CacheSource, ExactSource, LlmSource, MorphologySource, VocabularySource};
use crate::text::{char_len, find_from};
use crate::types::{
    confidence, Annotation, AnnotationCandidate, Confidence, ReadingCache, ReadingGenerator,
    ReadingSource, Tokenizer, WordStore,
};
use furi_common::config::MorphologyTrigger;
use furi_common::kana::contains_kanji;
use std::sync::Arc;
use tracing::{debug, info};

/// Per-call options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Enables the language-model layer
    pub api_key: Option<String>,
    /// Answer the language-model layer from the mock table
    pub mock_llm: bool,
}

impl ResolveOptions {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            mock_llm: false,
        }
    }

    pub fn mock_llm(mut self, mock: bool) -> Self {
        self.mock_llm = mock;
        self
    }

    fn usable_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

/// Candidates and ranges accumulated during one `resolve` call
#[derive(Default)]
struct Resolution {
    candidates: Vec<AnnotationCandidate>,
    ranges: RangeTracker,
}

impl Resolution {
    fn record(&mut self, candidate: AnnotationCandidate) {
        self.ranges.record(candidate.start, candidate.end);
        self.candidates.push(candidate);
    }

    /// Place `word` at its first occurrence and record it unless it overlaps
    fn record_first_occurrence(
        &mut self,
        text: &str,
        word: &str,
        reading: &str,
        confidence: Confidence,
        source: ReadingSource,
    ) -> bool {
        if !contains_kanji(word) {
            return false;
        }
        let Some(start) = find_from(text, word, 0) else {
            return false;
        };
        let end = start + char_len(word);
        if self.ranges.is_covered(start, end) {
            return false;
        }
        self.record(AnnotationCandidate {
            text: word.to_string(),
            reading: reading.to_string(),
            start,
            end,
            confidence,
            source,
        });
        true
    }
}

/// Multi-layer furigana resolver
pub struct FuriganaGenerator {
    exact_sources: Vec<Box<dyn ExactSource>>,
    morphology: MorphologySource,
    llm: LlmSource,
    morphology_trigger: MorphologyTrigger,
}

impl FuriganaGenerator {
    /// Generator with vocabulary then cache as exact sources
    pub fn new(
        word_store: Arc<dyn WordStore>,
        cache: Arc<dyn ReadingCache>,
        tokenizer: Arc<dyn Tokenizer>,
        reading_generator: Arc<dyn ReadingGenerator>,
    ) -> Self {
        let exact_sources: Vec<Box<dyn ExactSource>> = vec![
            Box::new(VocabularySource::new(word_store)) as Box<dyn ExactSource>,
            Box::new(CacheSource::new(cache.clone())),
        ];
        Self {
            exact_sources,
            morphology: MorphologySource::new(tokenizer, cache.clone()),
            llm: LlmSource::new(reading_generator, cache),
            morphology_trigger: MorphologyTrigger::default(),
        }
    }

    pub fn with_morphology_trigger(mut self, trigger: MorphologyTrigger) -> Self {
        self.morphology_trigger = trigger;
        self
    }

    pub fn morphology_trigger(&self) -> MorphologyTrigger {
        self.morphology_trigger
    }

    /// Ordered annotations for `text`
    pub async fn resolve(&self, text: &str, options: &ResolveOptions) -> Vec<Annotation> {
        self.resolve_candidates(text, options)
            .await
            .into_iter()
            .map(AnnotationCandidate::into_annotation)
            .collect()
    }

    /// Ordered candidates for `text`, keeping confidence and source
    pub async fn resolve_candidates(
        &self,
        text: &str,
        options: &ResolveOptions,
    ) -> Vec<AnnotationCandidate> {
        let segments = self.morphology.segment(text).await;
        if text.is_empty() {
            return Vec::new();
        }

        let mut run = Resolution::default();

        self.exact_layer(text, &segments, &mut run).await;
        let exact_hits = run.candidates.len();

        if self.should_run_morphology(text, &run) {
            self.morphology_layer(text, &mut run).await;
        }
        let morphology_hits = run.candidates.len() - exact_hits;

        if let Some(api_key) = options.usable_key() {
            if run.ranges.is_empty() || run.ranges.has_uncovered_kanji(text) {
                self.llm_layer(text, api_key, options.mock_llm, &mut run).await;
            }
        }
        let llm_hits = run.candidates.len() - exact_hits - morphology_hits;

        let mut candidates = run.candidates;
        candidates.sort_by_key(|c| c.start);

        info!(
            chars = char_len(text),
            segments = segments.len(),
            exact = exact_hits,
            morphology = morphology_hits,
            llm = llm_hits,
            "Resolved furigana"
        );
        candidates
    }

    async fn exact_layer(&self, text: &str, segments: &[String], run: &mut Resolution) {
        let mut cursor = 0usize;

        for segment in segments {
            let Some(start) = find_from(text, segment, cursor) else {
                debug!(segment = %segment, cursor, "Segment not found in text");
                continue;
            };
            let end = start + char_len(segment);
            cursor = end;

            if !contains_kanji(segment) {
                continue;
            }

            for source in &self.exact_sources {
                if let Some(hit) = source.lookup(segment).await {
                    debug!(segment = %segment, source = source.name(), "Exact match");
                    run.record(AnnotationCandidate {
                        text: segment.clone(),
                        reading: hit.reading,
                        start,
                        end,
                        confidence: hit.confidence,
                        source: hit.source,
                    });
                    break;
                }
            }
        }
    }

    fn should_run_morphology(&self, text: &str, run: &Resolution) -> bool {
        match self.morphology_trigger {
            MorphologyTrigger::NoCandidates => run.candidates.is_empty(),
            MorphologyTrigger::CoverageGap => {
                run.ranges.is_empty() || run.ranges.has_gaps(char_len(text))
            }
        }
    }

    async fn morphology_layer(&self, text: &str, run: &mut Resolution) {
        for result in self.morphology.analyze(text).await {
            run.record_first_occurrence(
                text,
                &result.word,
                &result.reading,
                result.confidence,
                ReadingSource::Morphology,
            );
        }
    }

    async fn llm_layer(&self, text: &str, api_key: &str, mock: bool, run: &mut Resolution) {
        let remaining = run.ranges.uncovered_text(text);
        debug!(remaining = %remaining, "Requesting readings for uncovered text");

        for pair in self.llm.generate(&remaining, api_key, mock).await {
            if pair.furigana.is_empty() {
                continue;
            }
            run.record_first_occurrence(
                text,
                &pair.text,
                &pair.furigana,
                confidence::LLM,
                ReadingSource::Llm,
            );
        }
    }
}
