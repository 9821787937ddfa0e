//! Sentence endpoints
//!
//! - `GET /api/sentences`: most recent sentences
//! - `POST /api/sentences`: store a sentence
//! - `GET /api/sentences/:id`: one sentence with its furigana
//! - `DELETE /api/sentences/:id`: remove a sentence
//! - `POST /api/sentences/:id/generate-furigana`: resolve and save furigana
//! - `POST /api/sentences/:id/furigana`: save edited furigana

use crate::api::furigana::request_api_key;
use crate::db::{NewSentence, Sentence, SqliteSentenceStore};
use crate::pipeline::ResolveOptions;
use crate::types::Annotation;
use crate::{ApiError, ApiResult, AppState};
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

/// Page size when the caller gives no limit
const DEFAULT_LIST_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceResponse {
    pub sentence_id: i64,
    pub sentence: String,
    pub translation: Option<String>,
    pub furigana_data: Vec<Annotation>,
    pub difficulty_level: Option<i64>,
    pub tags: Option<String>,
    pub source: Option<String>,
    pub created_at: DateTime<Utc>,
    pub llm_processed: bool,
}

impl From<Sentence> for SentenceResponse {
    fn from(sentence: Sentence) -> Self {
        let furigana_data = sentence.annotations();
        Self {
            sentence_id: sentence.sentence_id,
            sentence: sentence.sentence,
            translation: sentence.translation,
            furigana_data,
            difficulty_level: sentence.difficulty_level,
            tags: sentence.tags,
            source: sentence.source,
            created_at: sentence.created_at,
            llm_processed: sentence.llm_processed,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub sentences: Vec<SentenceResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    #[serde(default)]
    pub sentence: String,
    pub translation: Option<String>,
    pub difficulty_level: Option<i64>,
    pub tags: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResponse {
    pub success: bool,
    pub sentence_id: i64,
    pub sentence: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateForSentenceRequest {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default, rename = "useMockLLM")]
    pub use_mock_llm: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateForSentenceResponse {
    pub success: bool,
    pub sentence: String,
    pub furigana_items: Vec<Annotation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveFuriganaRequest {
    /// Annotation array, or a string holding one as JSON
    #[serde(default)]
    pub furigana_data: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// GET /api/sentences?limit=N
pub async fn list_sentences(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ListResponse>> {
    let limit = query.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIST_LIMIT);
    let sentences = SqliteSentenceStore::new(state.db.clone()).list(limit).await?;

    Ok(Json(ListResponse {
        sentences: sentences.into_iter().map(SentenceResponse::from).collect(),
    }))
}

/// POST /api/sentences
///
/// **Request:** `{"sentence", "translation", "difficultyLevel", "tags", "source"}`
/// **Response:** `{"success": true, "sentenceId": 1, "sentence": "..."}`
///
/// **Errors:**
/// - 400 Bad Request: blank sentence
pub async fn create_sentence(
    State(state): State<AppState>,
    Json(payload): Json<CreateRequest>,
) -> ApiResult<Json<CreateResponse>> {
    let new = NewSentence {
        sentence: payload.sentence,
        translation: payload.translation,
        difficulty_level: payload.difficulty_level,
        tags: payload.tags,
        source: payload.source,
    };
    let sentence = SqliteSentenceStore::new(state.db.clone()).create(&new).await?;

    Ok(Json(CreateResponse {
        success: true,
        sentence_id: sentence.sentence_id,
        sentence: sentence.sentence,
    }))
}

/// GET /api/sentences/:id
pub async fn get_sentence(
    State(state): State<AppState>,
    Path(sentence_id): Path<i64>,
) -> ApiResult<Json<SentenceResponse>> {
    let sentence = find_sentence(&state, sentence_id).await?;
    Ok(Json(sentence.into()))
}

/// DELETE /api/sentences/:id
pub async fn delete_sentence(
    State(state): State<AppState>,
    Path(sentence_id): Path<i64>,
) -> ApiResult<Json<SuccessResponse>> {
    if !SqliteSentenceStore::new(state.db.clone()).delete(sentence_id).await? {
        return Err(not_found(sentence_id));
    }
    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/sentences/:id/generate-furigana
///
/// Resolves the stored sentence and saves the result as processed furigana.
///
/// **Request:** `{"apiKey": "...", "useMockLLM": false}` (body optional)
/// **Response:** `{"success": true, "sentence": "...", "furiganaItems": [...]}`
///
/// **Errors:**
/// - 404 Not Found: no such sentence
/// - 400 Bad Request: no API key in the request or configuration
pub async fn generate_for_sentence(
    State(state): State<AppState>,
    Path(sentence_id): Path<i64>,
    payload: Option<Json<GenerateForSentenceRequest>>,
) -> ApiResult<Json<GenerateForSentenceResponse>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let sentence = find_sentence(&state, sentence_id).await?;

    let api_key = request_api_key(&state, payload.api_key).await?;
    let options = ResolveOptions::with_api_key(api_key).mock_llm(payload.use_mock_llm);
    let furigana_items = state.generator.resolve(&sentence.sentence, &options).await;

    SqliteSentenceStore::new(state.db.clone())
        .save_furigana(sentence_id, &furigana_items)
        .await?;
    info!(sentence_id, annotations = furigana_items.len(), "Saved generated furigana");

    Ok(Json(GenerateForSentenceResponse {
        success: true,
        sentence: sentence.sentence,
        furigana_items,
    }))
}

/// POST /api/sentences/:id/furigana
///
/// **Request:** `{"furiganaData": [...]}` or `{"furiganaData": "[...]"}`
/// **Response:** `{"success": true}`
///
/// **Errors:**
/// - 400 Bad Request: missing or malformed furiganaData
/// - 404 Not Found: no such sentence
pub async fn save_furigana(
    State(state): State<AppState>,
    Path(sentence_id): Path<i64>,
    Json(payload): Json<SaveFuriganaRequest>,
) -> ApiResult<Json<SuccessResponse>> {
    let Some(data) = payload.furigana_data else {
        return Err(ApiError::BadRequest("furiganaData is required".to_string()));
    };
    let annotations = parse_annotations(data)?;

    if !SqliteSentenceStore::new(state.db.clone())
        .update_furigana(sentence_id, &annotations)
        .await?
    {
        return Err(not_found(sentence_id));
    }

    info!(sentence_id, annotations = annotations.len(), "Saved edited furigana");
    Ok(Json(SuccessResponse { success: true }))
}

fn parse_annotations(data: Value) -> ApiResult<Vec<Annotation>> {
    let parsed = match data {
        Value::String(s) => serde_json::from_str(&s),
        other => serde_json::from_value(other),
    };
    parsed.map_err(|e| ApiError::BadRequest(format!("Invalid furiganaData format: {}", e)))
}

async fn find_sentence(state: &AppState, sentence_id: i64) -> ApiResult<Sentence> {
    SqliteSentenceStore::new(state.db.clone())
        .get(sentence_id)
        .await?
        .ok_or_else(|| not_found(sentence_id))
}

fn not_found(sentence_id: i64) -> ApiError {
    ApiError::NotFound(format!("Sentence {}", sentence_id))
}

/// Build sentence routes
pub fn sentences_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sentences", get(list_sentences).post(create_sentence))
        .route(
            "/api/sentences/:id",
            get(get_sentence).delete(delete_sentence),
        )
        .route(
            "/api/sentences/:id/generate-furigana",
            post(generate_for_sentence),
        )
        .route("/api/sentences/:id/furigana", post(save_furigana))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_annotations_accepts_array_or_string() {
        let expected = vec![Annotation::new("漢字", "かんじ", 0, 2)];
        let array = json!([{"text": "漢字", "reading": "かんじ", "start": 0, "end": 2}]);

        assert_eq!(parse_annotations(array.clone()).unwrap(), expected);
        assert_eq!(parse_annotations(Value::String(array.to_string())).unwrap(), expected);
    }

    #[test]
    fn test_parse_annotations_rejects_malformed() {
        assert!(parse_annotations(json!("not json")).is_err());
        assert!(parse_annotations(json!({"text": "漢字"})).is_err());
        assert!(parse_annotations(json!(42)).is_err());
    }
}
