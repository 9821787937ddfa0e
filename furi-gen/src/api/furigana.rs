//! Furigana endpoints
//!
//! - `POST /api/furigana/generate`: resolve readings for a text
//! - `POST /api/furigana/update`: store a user correction
//! - `POST /api/furigana/render`: render text with annotations

use crate::correction::apply_correction;
use crate::pipeline::ResolveOptions;
use crate::render::{render, RenderStyle};
use crate::types::Annotation;
use crate::{ApiError, ApiResult, AppState};
use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default, rename = "useMockLLM")]
    pub use_mock_llm: bool,
    /// Overrides the configured key for this request
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub furigana: Vec<Annotation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub reading: Option<String>,
    #[serde(default)]
    pub corrected_reading: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub text: String,
    #[serde(default)]
    pub furigana: Vec<Annotation>,
    #[serde(default)]
    pub style: RenderStyle,
}

#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub rendered: String,
}

/// POST /api/furigana/generate
///
/// **Request:** `{"text": "...", "useMockLLM": false, "apiKey": "..."}`
/// **Response:** `{"furigana": [{"text", "reading", "start", "end"}]}`
///
/// **Errors:**
/// - 400 Bad Request: empty text, or no API key in the request or configuration
pub async fn generate(
    State(state): State<AppState>,
    Json(payload): Json<GenerateRequest>,
) -> ApiResult<Json<GenerateResponse>> {
    if payload.text.is_empty() {
        return Err(ApiError::BadRequest("Text is required".to_string()));
    }

    let api_key = request_api_key(&state, payload.api_key).await?;
    let options = ResolveOptions::with_api_key(api_key).mock_llm(payload.use_mock_llm);
    let furigana = state.generator.resolve(&payload.text, &options).await;

    Ok(Json(GenerateResponse { furigana }))
}

/// Key from the request, else the settings table, environment or TOML
///
/// 400 when none of them holds a usable key.
pub(crate) async fn request_api_key(
    state: &AppState,
    requested: Option<String>,
) -> ApiResult<String> {
    let api_key = match requested.filter(|k| crate::config::is_valid_key(k)) {
        Some(key) => Some(key),
        None => crate::config::resolve_llm_api_key(&state.db, &state.config)
            .await?
            .map(|(key, _)| key),
    };
    api_key.ok_or_else(|| {
        ApiError::BadRequest(
            "No API key provided. Set one in the request, the settings API or the configuration."
                .to_string(),
        )
    })
}

/// POST /api/furigana/update
///
/// **Request:** `{"text": "漢字", "reading": "かんじ", "correctedReading": "かんじ"}`
/// **Response:** `{"success": true}`
///
/// **Errors:**
/// - 400 Bad Request: missing text or corrected reading
pub async fn update(
    State(state): State<AppState>,
    Json(payload): Json<UpdateRequest>,
) -> ApiResult<Json<UpdateResponse>> {
    if payload.text.is_empty() || payload.corrected_reading.is_empty() {
        return Err(ApiError::BadRequest(
            "Text and correctedReading are required".to_string(),
        ));
    }

    let previous = payload.reading.unwrap_or_default();
    let applied = apply_correction(
        state.cache.as_ref(),
        &payload.text,
        &previous,
        &payload.corrected_reading,
    )
    .await?;

    info!(word = %applied.text, reading = %applied.reading, "Correction stored via API");
    Ok(Json(UpdateResponse { success: true }))
}

/// POST /api/furigana/render
///
/// **Request:** `{"text": "...", "furigana": [...], "style": "ruby" | "bracket"}`
/// **Response:** `{"rendered": "..."}`
pub async fn render_text(Json(payload): Json<RenderRequest>) -> Json<RenderResponse> {
    Json(RenderResponse {
        rendered: render(&payload.text, &payload.furigana, payload.style),
    })
}

/// Build furigana routes
pub fn furigana_routes() -> Router<AppState> {
    Router::new()
        .route("/api/furigana/generate", post(generate))
        .route("/api/furigana/update", post(update))
        .route("/api/furigana/render", post(render_text))
}
