//! Dictionary tokenizer
//!
//! Viterbi segmentation with vibrato over a standard Japanese dictionary
//! (IPADIC or UniDic). The dictionary is either a compiled, uncompressed
//! `system.dic` or a directory holding the MeCab sources `lex.csv`,
//! `matrix.def`, `char.def` and `unk.def`.
//!
//! Each token keeps the first feature column as its part of speech and the
//! katakana reading column for the configured format. Unknown words and
//! entries whose reading is `*` get an empty reading.

use crate::types::{SourceError, Token, Tokenizer};
use furi_common::config::DictionaryFormat;
use furi_common::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

/// Longest input handed to one vibrato worker, in characters
const MAX_CHUNK_CHARS: usize = 0x7FFF;

/// MeCab source files inside a dictionary directory
const LEX_FILE: &str = "lex.csv";
const MATRIX_FILE: &str = "matrix.def";
const CHAR_FILE: &str = "char.def";
const UNK_FILE: &str = "unk.def";

/// Morphological tokenizer backed by a vibrato dictionary
pub struct DictionaryTokenizer {
    inner: vibrato::Tokenizer,
    format: DictionaryFormat,
}

impl DictionaryTokenizer {
    pub fn new(dict: vibrato::Dictionary, format: DictionaryFormat) -> Self {
        Self {
            inner: vibrato::Tokenizer::new(dict),
            format,
        }
    }

    /// Load a compiled dictionary file or a MeCab source directory
    pub fn from_path(path: impl AsRef<Path>, format: DictionaryFormat) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::Config(format!(
                "Dictionary not found at {}; set pipeline.dictionary_path",
                path.display()
            )));
        }

        let tokenizer = if path.is_dir() {
            let open = |name: &str| -> Result<BufReader<File>> {
                let file = path.join(name);
                File::open(&file).map(BufReader::new).map_err(|e| {
                    Error::Config(format!("Open {} failed: {}", file.display(), e))
                })
            };
            Self::from_mecab_readers(
                open(LEX_FILE)?,
                open(MATRIX_FILE)?,
                open(CHAR_FILE)?,
                open(UNK_FILE)?,
                format,
            )?
        } else {
            let reader = BufReader::new(File::open(path)?);
            let dict = vibrato::Dictionary::read(reader)
                .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
            Self::new(dict, format)
        };

        info!(path = %path.display(), format = ?format, "Loaded dictionary");
        Ok(tokenizer)
    }

    /// Compile a dictionary from MeCab sources
    pub fn from_mecab_readers<L, M, C, U>(
        lex: L,
        matrix: M,
        char_def: C,
        unk_def: U,
        format: DictionaryFormat,
    ) -> Result<Self>
    where
        L: Read,
        M: Read,
        C: Read,
        U: Read,
    {
        let dict = vibrato::SystemDictionaryBuilder::from_readers(lex, matrix, char_def, unk_def)
            .map_err(|e| Error::Config(format!("Build dictionary failed: {}", e)))?;
        Ok(Self::new(dict, format))
    }

    pub fn format(&self) -> DictionaryFormat {
        self.format
    }

    /// Segment `text` into tokens
    pub fn segment(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        if text.is_empty() {
            return tokens;
        }

        let mut worker = self.inner.new_worker();
        for chunk in chunks(text) {
            worker.reset_sentence(chunk);
            worker.tokenize();
            tokens.extend(
                worker
                    .token_iter()
                    .map(|t| parse_feature(t.surface(), t.feature(), self.format)),
            );
        }

        debug!(tokens = tokens.len(), "Segmented text");
        tokens
    }
}

/// Build a token from a surface form and its comma-separated feature string
pub fn parse_feature(surface: &str, feature: &str, format: DictionaryFormat) -> Token {
    let fields: Vec<&str> = feature.split(',').collect();
    let reading_column = match format {
        DictionaryFormat::Ipadic => 7,
        DictionaryFormat::Unidic => 6,
    };

    let pos = fields.first().copied().unwrap_or("");
    let reading = fields
        .get(reading_column)
        .copied()
        .filter(|r| *r != "*")
        .unwrap_or("");
    Token::new(surface, pos, reading)
}

/// Split long input after sentence ends so each piece fits one worker
fn chunks(text: &str) -> Vec<&str> {
    if text.chars().count() <= MAX_CHUNK_CHARS {
        return vec![text];
    }

    let mut pieces = Vec::new();
    for sentence in text.split_inclusive(|c: char| c == '。' || c == '\n') {
        let mut rest = sentence;
        while rest.chars().count() > MAX_CHUNK_CHARS {
            let cut = rest
                .char_indices()
                .nth(MAX_CHUNK_CHARS)
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
            let (head, tail) = rest.split_at(cut);
            pieces.push(head);
            rest = tail;
        }
        if !rest.is_empty() {
            pieces.push(rest);
        }
    }
    pieces
}

#[async_trait::async_trait]
impl Tokenizer for DictionaryTokenizer {
    async fn tokenize(&self, text: &str) -> std::result::Result<Vec<Token>, SourceError> {
        Ok(self.segment(text))
    }
}

/// MeCab source directory used by tests
#[cfg(test)]
pub(crate) fn fixture_dir() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/mecab-mini")
}

/// Tokenizer over the test dictionary
#[cfg(test)]
pub(crate) fn fixture_tokenizer() -> DictionaryTokenizer {
    DictionaryTokenizer::from_path(fixture_dir(), DictionaryFormat::Ipadic)
        .expect("fixture dictionary")
}
