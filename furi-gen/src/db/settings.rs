//! Settings database operations
//!
//! Key-value accessors over the `settings` table. The stored LLM API key is
//! the authoritative tier of key resolution (see [`crate::config`]).

use furi_common::{Error, Result};
use sqlx::{Pool, Sqlite};

const LLM_API_KEY: &str = "llm_api_key";

/// Get the LLM API key; `None` if not set
pub async fn get_llm_api_key(db: &Pool<Sqlite>) -> Result<Option<String>> {
    get_setting::<String>(db, LLM_API_KEY).await
}

/// Set the LLM API key
pub async fn set_llm_api_key(db: &Pool<Sqlite>, key: String) -> Result<()> {
    set_setting(db, LLM_API_KEY, key).await
}

/// Generic setting getter (internal)
async fn get_setting<T>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let row: Option<(Option<String>,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await
        .map_err(Error::Database)?;

    match row.and_then(|(value,)| value) {
        Some(value) => {
            let parsed = value
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Parse setting {} failed: {}", key, e)))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Generic setting setter (internal)
async fn set_setting<T>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()>
where
    T: std::fmt::Display,
{
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await
    .map_err(Error::Database)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use furi_common::db::init_memory_database;

    #[tokio::test]
    async fn test_get_llm_api_key_not_set() {
        let pool = init_memory_database().await.unwrap();
        assert_eq!(get_llm_api_key(&pool).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_llm_api_key_null_value() {
        let pool = init_memory_database().await.unwrap();
        sqlx::query("INSERT INTO settings (key, value) VALUES ('llm_api_key', NULL)")
            .execute(&pool)
            .await
            .unwrap();

        assert_eq!(get_llm_api_key(&pool).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_llm_api_key_upserts() {
        let pool = init_memory_database().await.unwrap();

        set_llm_api_key(&pool, "sk-old".to_string()).await.unwrap();
        set_llm_api_key(&pool, "sk-new".to_string()).await.unwrap();

        assert_eq!(get_llm_api_key(&pool).await.unwrap(), Some("sk-new".to_string()));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM settings WHERE key = 'llm_api_key'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1, "Should have exactly one entry after update");
    }
}
