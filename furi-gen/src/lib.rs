//! furi-gen library interface
//!
//! Multi-source furigana resolution: exact vocabulary and cache matches,
//! morphological analysis, and a language-model fallback, merged by position
//! with user corrections fed back through the reading cache.

pub mod api;
pub mod config;
pub mod correction;
pub mod db;
pub mod error;
pub mod memory;
pub mod pipeline;
pub mod ranges;
pub mod render;
pub mod services;
pub mod sources;
pub mod text;
pub mod types;

pub use crate::correction::apply_correction;
pub use crate::error::{ApiError, ApiResult};
pub use crate::pipeline::{FuriganaGenerator, ResolveOptions};
pub use crate::render::{render, RenderStyle};
pub use crate::types::{Annotation, AnnotationCandidate, ReadingSource};

use axum::Router;
use chrono::{DateTime, Utc};
use furi_common::config::FuriConfig;
use furi_common::{Error, Result};
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::db::{SqliteReadingCache, SqliteWordStore};
use crate::services::{DictionaryTokenizer, LlmReadingGenerator};
use crate::types::{ReadingCache, Tokenizer};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    pub generator: Arc<FuriganaGenerator>,
    /// Reading cache receiving corrections
    pub cache: Arc<dyn ReadingCache>,
    pub config: Arc<FuriConfig>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// State backed by the SQLite stores in `db`
    pub fn new(db: SqlitePool, tokenizer: Arc<dyn Tokenizer>, config: FuriConfig) -> Result<Self> {
        let cache: Arc<dyn ReadingCache> = Arc::new(SqliteReadingCache::new(db.clone()));
        let generator = build_generator(&db, cache.clone(), tokenizer, &config)?;
        Ok(Self::with_generator(db, generator, cache, config))
    }

    pub fn with_generator(
        db: SqlitePool,
        generator: FuriganaGenerator,
        cache: Arc<dyn ReadingCache>,
        config: FuriConfig,
    ) -> Self {
        Self {
            db,
            generator: Arc::new(generator),
            cache,
            config: Arc::new(config),
            startup_time: Utc::now(),
        }
    }
}

/// Load the morphological dictionary for `root_folder`
///
/// Uses `pipeline.dictionary_path` when set, else `<root>/dictionary`.
pub fn load_tokenizer(root_folder: &Path, config: &FuriConfig) -> Result<DictionaryTokenizer> {
    let path = furi_common::config::dictionary_path(root_folder, config);
    DictionaryTokenizer::from_path(&path, config.pipeline.dictionary_format)
}

/// Assemble a generator from SQLite stores and the configured collaborators
pub fn build_generator(
    db: &SqlitePool,
    cache: Arc<dyn ReadingCache>,
    tokenizer: Arc<dyn Tokenizer>,
    config: &FuriConfig,
) -> Result<FuriganaGenerator> {
    let reading_generator = LlmReadingGenerator::new(&config.llm)
        .map_err(|e| Error::Internal(e.to_string()))?;

    info!(
        provider = ?config.llm.provider,
        model = reading_generator.model(),
        trigger = ?config.pipeline.morphology_trigger,
        "Furigana generator ready"
    );

    Ok(FuriganaGenerator::new(
        Arc::new(SqliteWordStore::new(db.clone())),
        cache,
        tokenizer,
        Arc::new(reading_generator),
    )
    .with_morphology_trigger(config.pipeline.morphology_trigger))
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::furigana_routes())
        .merge(api::sentences_routes())
        .merge(api::settings_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
