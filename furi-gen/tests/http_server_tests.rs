//! HTTP API integration tests
//!
//! Drives the router with `tower::ServiceExt::oneshot`; no socket is bound
//! except for the stand-in chat-completions server.

mod helpers;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    routing::post,
    Json, Router,
};
use furi_common::config::{FuriConfig, LlmProvider, LlmSettings};
use furi_gen::memory::{InMemoryReadingCache, InMemoryWordStore};
use furi_gen::services::LlmReadingGenerator;
use furi_gen::types::ReadingCache;
use furi_gen::{build_router, AppState, FuriganaGenerator, ResolveOptions};
use serde_json::{json, Value};
use tower::ServiceExt;

use helpers::{test_state, STUDY_VOCAB};

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_health() {
    let app = build_router(test_state(&[]).await);

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let health: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["module"], "furi-gen");
    assert!(health["uptime_seconds"].is_u64());
}

#[tokio::test]
async fn test_generate_rejects_empty_text() {
    let app = build_router(test_state(&[]).await);

    let (status, body) = post_json(
        app,
        "/api/furigana/generate",
        json!({ "text": "", "apiKey": "sk-test" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_generate_requires_api_key() {
    let app = build_router(test_state(STUDY_VOCAB).await);

    let (status, body) = post_json(
        app,
        "/api/furigana/generate",
        json!({ "text": "日本語", "apiKey": "  " }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("No API key"));
}

#[tokio::test]
async fn test_generate_with_mock_llm() {
    let app = build_router(test_state(STUDY_VOCAB).await);

    let (status, body) = post_json(
        app,
        "/api/furigana/generate",
        json!({ "text": "日本語を勉強しています", "useMockLLM": true, "apiKey": "sk-test" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "furigana": [
                { "text": "日本語", "reading": "にほんご", "start": 0, "end": 3 },
                { "text": "勉強", "reading": "べんきょう", "start": 4, "end": 6 }
            ]
        })
    );
}

#[tokio::test]
async fn test_stored_api_key_enables_generate() {
    let state = test_state(&[]).await;

    let (status, body) = post_json(
        build_router(state.clone()),
        "/api/settings/llm_api_key",
        json!({ "api_key": "sk-stored" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(
        furi_gen::db::settings::get_llm_api_key(&state.db).await.unwrap(),
        Some("sk-stored".to_string())
    );

    let (status, body) = post_json(
        build_router(state),
        "/api/furigana/generate",
        json!({ "text": "漢字", "useMockLLM": true }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["furigana"][0]["reading"], "かんじ");
}

#[tokio::test]
async fn test_settings_rejects_blank_key() {
    let state = test_state(&[]).await;

    let (status, _) = post_json(
        build_router(state.clone()),
        "/api/settings/llm_api_key",
        json!({ "api_key": "   " }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        furi_gen::db::settings::get_llm_api_key(&state.db).await.unwrap(),
        None
    );
}

#[tokio::test]
async fn test_update_stores_correction() {
    let state = test_state(&[]).await;

    let (status, body) = post_json(
        build_router(state.clone()),
        "/api/furigana/update",
        json!({ "text": "今日", "reading": "きょう", "correctedReading": "こんにち" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let hit = state.cache.lookup("今日").await.unwrap().unwrap();
    assert_eq!(hit.reading, "こんにち");
    assert_eq!(hit.confidence, 100);
}

#[tokio::test]
async fn test_update_rejects_missing_fields() {
    let app = build_router(test_state(&[]).await);

    let (status, _) = post_json(
        app.clone(),
        "/api/furigana/update",
        json!({ "text": "今日" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(
        app,
        "/api/furigana/update",
        json!({ "correctedReading": "きょう" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_render_endpoint() {
    let app = build_router(test_state(&[]).await);

    let (status, body) = post_json(
        app,
        "/api/furigana/render",
        json!({
            "text": "日本語を話す",
            "furigana": [
                { "text": "日本", "reading": "にほん", "start": 0, "end": 2 },
                { "text": "日本語", "reading": "にほんご", "start": 0, "end": 3 }
            ],
            "style": "bracket"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rendered"], "日本語[にほんご]を話す");
}

/// Chat-completions stand-in that checks bearer auth and answers with a
/// fenced JSON array
async fn chat_completions(headers: HeaderMap, Json(request): Json<Value>) -> (StatusCode, Json<Value>) {
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer sk-live") {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "bad key" })));
    }
    assert_eq!(request["model"], "test-model");

    let content = "```json\n[{\"text\":\"東京\",\"furigana\":\"とうきょう\"},{\"text\":\"に\",\"furigana\":\"\"}]\n```";
    (
        StatusCode::OK,
        Json(json!({ "choices": [{ "message": { "content": content } }] })),
    )
}

#[tokio::test]
async fn test_live_provider_round_trip() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = Router::new().route("/v1/chat/completions", post(chat_completions));
    tokio::spawn(async move {
        axum::serve(listener, server).await.unwrap();
    });

    let settings = LlmSettings {
        provider: LlmProvider::OpenAi,
        model: Some("test-model".to_string()),
        base_url: Some(format!("http://{}/v1", addr)),
        request_timeout_secs: Some(5),
        ..Default::default()
    };
    let cache = Arc::new(InMemoryReadingCache::new());
    let generator = FuriganaGenerator::new(
        Arc::new(InMemoryWordStore::new()),
        cache.clone(),
        Arc::new(helpers::KanjiRunTokenizer),
        Arc::new(LlmReadingGenerator::new(&settings).unwrap()),
    );

    let furigana = generator
        .resolve("東京に", &ResolveOptions::with_api_key("sk-live"))
        .await;
    assert_eq!(furigana.len(), 1);
    assert_eq!(furigana[0].text, "東京");
    assert_eq!(furigana[0].reading, "とうきょう");
    assert_eq!(cache.entries_for("東京").await[0].confidence, 85);

    // Rejected key reads as "nothing found"
    let furigana = generator
        .resolve("大阪に", &ResolveOptions::with_api_key("sk-wrong"))
        .await;
    assert!(furigana.is_empty());
    assert!(cache.entries_for("大阪").await.is_empty());

    let cache: Arc<dyn ReadingCache> = cache;
    let state = AppState::with_generator(
        helpers::test_db().await,
        generator,
        cache,
        FuriConfig::default(),
    );
    let (status, body) = post_json(
        build_router(state),
        "/api/furigana/generate",
        json!({ "text": "東京", "apiKey": "sk-live" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["furigana"][0]["reading"], "とうきょう");
}
