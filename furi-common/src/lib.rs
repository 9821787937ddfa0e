//! # Furi Common Library
//!
//! Shared code for the furigana workspace:
//! - Error and result types
//! - TOML configuration loading and root folder resolution
//! - SQLite pool initialization and table creation
//! - Kana and kanji character utilities
//! - Timestamp helpers

pub mod config;
pub mod db;
pub mod error;
pub mod kana;
pub mod time;

pub use error::{Error, Result};
