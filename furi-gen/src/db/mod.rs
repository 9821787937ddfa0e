//! SQLite-backed collaborators
//!
//! Tables are created by `furi_common::db::init_database`.

pub mod reading_cache;
pub mod sentences;
pub mod settings;
pub mod vocabulary;

pub use reading_cache::SqliteReadingCache;
pub use sentences::{NewSentence, Sentence, SqliteSentenceStore};
pub use vocabulary::{ImportSummary, SqliteWordStore};
