//! Settings API endpoint
//!
//! `POST /api/settings/llm_api_key` stores the LLM API key in the database,
//! the highest-priority tier of key resolution.

use crate::{ApiError, ApiResult, AppState};
use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct SetApiKeyRequest {
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct SetApiKeyResponse {
    pub success: bool,
    pub message: String,
}

/// POST /api/settings/llm_api_key
///
/// **Request:** `{"api_key": "sk-..."}`
/// **Response:** `{"success": true, "message": "..."}`
///
/// **Errors:**
/// - 400 Bad Request: empty or whitespace-only key
/// - 500 Internal Server Error: database write failure
pub async fn set_llm_api_key(
    State(state): State<AppState>,
    Json(payload): Json<SetApiKeyRequest>,
) -> ApiResult<Json<SetApiKeyResponse>> {
    if !crate::config::is_valid_key(&payload.api_key) {
        return Err(ApiError::BadRequest(
            "API key cannot be empty or whitespace-only".to_string(),
        ));
    }

    crate::db::settings::set_llm_api_key(&state.db, payload.api_key)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to save API key to database: {}", e)))?;

    info!("LLM API key configured via settings API");

    Ok(Json(SetApiKeyResponse {
        success: true,
        message: "LLM API key configured successfully".to_string(),
    }))
}

/// Build settings routes
pub fn settings_routes() -> Router<AppState> {
    Router::new().route("/api/settings/llm_api_key", post(set_llm_api_key))
}
