//! Language-model reading generator
//!
//! Asks a chat-completion API for kanji readings and parses the first JSON
//! array out of the free-text reply. Two providers are supported:
//! - OpenAI chat completions: `POST {base}/chat/completions`, bearer auth
//! - Anthropic messages: `POST {base}/messages`, `x-api-key` header
//!
//! In mock mode the fixed table in [`super::mock_readings`] answers instead and
//! no request is made.

use crate::services::mock_readings;
use crate::types::{ReadingGenerator, ReadingPair, SourceError};
use async_trait::async_trait;
use furi_common::config::{LlmProvider, LlmSettings};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
const OPENAI_DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const ANTHROPIC_DEFAULT_MODEL: &str = "claude-3-haiku-20240307";
const ANTHROPIC_VERSION: &str = "2023-06-01";

const TEMPERATURE: f32 = 0.1;
const MAX_TOKENS: u32 = 1000;

/// First `[` through last `]`, across lines
static JSON_ARRAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[.*\]").expect("valid JSON array pattern"));

const SYSTEM_PROMPT: &str = "\
You produce hiragana readings (furigana) for Japanese text.
- Give readings only for kanji characters and kanji compounds.
- Never give readings for hiragana or katakana already present in the text.
- For words mixing kanji and kana, such as 新しい, read only the kanji part.
- Treat a run of consecutive kanji as one group with a single reading.
- Reply with a JSON array of objects with a \"text\" field (the original segment) and a \"furigana\" field (its hiragana reading).
- Leave out kana-only segments or give them an empty \"furigana\".
Use the grammatical context to pick between alternative readings. The reply must be valid JSON.";

fn user_prompt(text: &str) -> String {
    format!(
        r#"Text: "{text}"

Expected shape:
[
  {{"text": "日本語", "furigana": "にほんご"}},
  {{"text": "を", "furigana": ""}},
  {{"text": "勉強", "furigana": "べんきょう"}},
  {{"text": "して", "furigana": ""}},
  {{"text": "います", "furigana": ""}}
]

Mixed kanji and kana reads the kanji only: {{"text": "新しい", "furigana": "あたら"}}
A kanji compound gets one reading: {{"text": "今月", "furigana": "こんげつ"}}"#
    )
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    system: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: String,
}

// ============================================================================
// Client
// ============================================================================

/// Reading generator backed by a chat-completion API
pub struct LlmReadingGenerator {
    http_client: Client,
    provider: LlmProvider,
    model: String,
    base_url: String,
}

impl LlmReadingGenerator {
    /// Build from the `[llm]` configuration section
    pub fn new(settings: &LlmSettings) -> Result<Self, SourceError> {
        let mut builder = Client::builder();
        if let Some(secs) = settings.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http_client = builder
            .build()
            .map_err(|e| SourceError::Unavailable(format!("Failed to create HTTP client: {}", e)))?;

        let (default_base, default_model) = match settings.provider {
            LlmProvider::OpenAi => (OPENAI_BASE_URL, OPENAI_DEFAULT_MODEL),
            LlmProvider::Anthropic => (ANTHROPIC_BASE_URL, ANTHROPIC_DEFAULT_MODEL),
        };

        Ok(Self {
            http_client,
            provider: settings.provider,
            model: settings
                .model
                .clone()
                .unwrap_or_else(|| default_model.to_string()),
            base_url: settings
                .base_url
                .clone()
                .unwrap_or_else(|| default_base.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }

    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn call_openai(&self, text: &str, api_key: &str) -> Result<String, SourceError> {
        let prompt = user_prompt(text);
        let request = OpenAiRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api(status.as_u16(), body));
        }

        let body: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse response: {}", e)))?;

        Ok(body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }

    async fn call_anthropic(&self, text: &str, api_key: &str) -> Result<String, SourceError> {
        let prompt = user_prompt(text);
        let request = AnthropicRequest {
            model: &self.model,
            system: SYSTEM_PROMPT,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .http_client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api(status.as_u16(), body));
        }

        let body: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse response: {}", e)))?;

        Ok(body
            .content
            .into_iter()
            .next()
            .map(|c| c.text)
            .unwrap_or_default())
    }
}

#[async_trait]
impl ReadingGenerator for LlmReadingGenerator {
    async fn generate(
        &self,
        text: &str,
        api_key: &str,
        mock_mode: bool,
    ) -> Result<Vec<ReadingPair>, SourceError> {
        if mock_mode {
            return match mock_readings::lookup(text) {
                Some((key, pairs)) => {
                    debug!(key, pairs = pairs.len(), "Using mock readings");
                    Ok(pairs)
                }
                None => {
                    warn!(text, "No mock readings found");
                    Ok(Vec::new())
                }
            };
        }

        if api_key.trim().is_empty() {
            warn!("No API key supplied for reading generation");
            return Ok(Vec::new());
        }

        debug!(provider = ?self.provider, model = %self.model, "Requesting readings");
        let content = match self.provider {
            LlmProvider::OpenAi => self.call_openai(text, api_key).await?,
            LlmProvider::Anthropic => self.call_anthropic(text, api_key).await?,
        };

        parse_reading_pairs(&content)
    }
}

/// Parse the first JSON array in a model reply
pub fn parse_reading_pairs(content: &str) -> Result<Vec<ReadingPair>, SourceError> {
    let json = JSON_ARRAY
        .find(content)
        .ok_or_else(|| SourceError::Parse(format!("No JSON array in reply: {}", content)))?;

    serde_json::from_str(json.as_str())
        .map_err(|e| SourceError::Parse(format!("Invalid reading array: {}", e)))
}
