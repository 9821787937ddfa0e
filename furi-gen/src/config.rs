//! LLM API key resolution
//!
//! Three tiers, highest priority first: database `settings` table,
//! `FURI_LLM_API_KEY` environment variable, `llm.api_key` in the TOML config.

use furi_common::config::FuriConfig;
use furi_common::Result;
use sqlx::{Pool, Sqlite};
use tracing::{info, warn};

/// Environment variable holding the LLM API key
pub const API_KEY_ENV: &str = "FURI_LLM_API_KEY";

/// Where a resolved key came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Database,
    Environment,
    Toml,
}

impl KeySource {
    pub fn as_str(self) -> &'static str {
        match self {
            KeySource::Database => "database",
            KeySource::Environment => "environment",
            KeySource::Toml => "TOML",
        }
    }
}

/// Resolve the LLM API key from database, environment and TOML
///
/// Returns `None` when no tier holds a valid key. The language-model layer is
/// then disabled unless a request supplies its own key.
pub async fn resolve_llm_api_key(
    db: &Pool<Sqlite>,
    config: &FuriConfig,
) -> Result<Option<(String, KeySource)>> {
    let db_key = crate::db::settings::get_llm_api_key(db).await?;
    let env_key = std::env::var(API_KEY_ENV).ok();
    Ok(select_api_key(db_key, env_key, config.llm.api_key.clone()))
}

/// Pick the highest-priority valid key, warning when several tiers are set
pub fn select_api_key(
    db_key: Option<String>,
    env_key: Option<String>,
    toml_key: Option<String>,
) -> Option<(String, KeySource)> {
    let tiers = [
        (db_key, KeySource::Database),
        (env_key, KeySource::Environment),
        (toml_key, KeySource::Toml),
    ];

    let valid: Vec<(String, KeySource)> = tiers
        .into_iter()
        .filter_map(|(key, source)| key.filter(|k| is_valid_key(k)).map(|k| (k, source)))
        .collect();

    if valid.len() > 1 {
        let names: Vec<&str> = valid.iter().map(|(_, s)| s.as_str()).collect();
        warn!(
            "LLM API key found in multiple sources: {}. Using {} (highest priority).",
            names.join(", "),
            valid[0].1.as_str()
        );
    }

    let selected = valid.into_iter().next();
    if let Some((_, source)) = &selected {
        info!("LLM API key loaded from {}", source.as_str());
    }
    selected
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn test_database_wins() {
        let selected = select_api_key(key("db"), key("env"), key("toml"));
        assert_eq!(selected, Some(("db".to_string(), KeySource::Database)));
    }

    #[test]
    fn test_invalid_tiers_skipped() {
        let selected = select_api_key(key("  "), None, key("toml"));
        assert_eq!(selected, Some(("toml".to_string(), KeySource::Toml)));

        let selected = select_api_key(None, key("env"), key(""));
        assert_eq!(selected, Some(("env".to_string(), KeySource::Environment)));
    }

    #[test]
    fn test_no_key() {
        assert_eq!(select_api_key(None, key(" \t"), None), None);
    }

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("sk-123"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   "));
    }

    #[tokio::test]
    async fn test_resolve_reads_database_tier() {
        let pool = furi_common::db::init_memory_database().await.unwrap();
        crate::db::settings::set_llm_api_key(&pool, "sk-db".to_string())
            .await
            .unwrap();

        let resolved = resolve_llm_api_key(&pool, &FuriConfig::default()).await.unwrap();
        assert_eq!(resolved, Some(("sk-db".to_string(), KeySource::Database)));
    }
}
