//! LLM (`OpenAI`) API client module
//!
//! Sends chat completions in JSON-object mode and hands back the raw message
//! content for the caller to decode.

use async_trait::async_trait;
use openai_api_rs::v1::chat_completion::{ChatCompletionMessage, Content, MessageRole};
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
#[cfg(not(feature = "debug-logs"))]
use tracing::debug;
use tracing::info;

use crate::core::config::ParserConfig;
use crate::errors::LedgerError;

const PROVIDER: &str = "OpenAI";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// A single completion call.
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatCompletionMessage>,
    pub temperature: Option<f32>,
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Returns the first choice's message content, or `None` when the
    /// provider answered without one.
    async fn complete(&self, request: &CompletionRequest) -> Result<Option<String>, LedgerError>;
}

/// LLM API client for structured log extraction
pub struct LlmClient {
    http: Client,
    api_key: String,
    org_id: Option<String>,
    base_url: String,
}

impl LlmClient {
    pub fn new(
        api_key: String,
        org_id: Option<String>,
        base_url: String,
    ) -> Result<Self, LedgerError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LedgerError::Http(format!("Failed to build OpenAI HTTP client: {e}")))?;
        Ok(Self {
            http,
            api_key,
            org_id,
            base_url,
        })
    }

    pub fn from_config(config: &ParserConfig) -> Result<Self, LedgerError> {
        Self::new(
            config.openai_api_key.clone(),
            config.openai_org_id.clone(),
            config.openai_base_url.clone(),
        )
    }

    fn headers(&self) -> Result<reqwest::header::HeaderMap, LedgerError> {
        let mut headers = reqwest::header::HeaderMap::new();
        let auth_value = format!("Bearer {}", self.api_key)
            .parse()
            .map_err(|e| LedgerError::Http(format!("Invalid Authorization header: {e}")))?;
        headers.insert("Authorization", auth_value);

        if let Some(org) = &self.org_id {
            let org_value = org.parse().map_err(|e| {
                LedgerError::Http(format!("Invalid OpenAI-Organization header: {e}"))
            })?;
            headers.insert("OpenAI-Organization", org_value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl CompletionClient for LlmClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Option<String>, LedgerError> {
        #[cfg(feature = "debug-logs")]
        info!("Using completion prompt:\n{:?}", request.messages);

        #[cfg(not(feature = "debug-logs"))]
        debug!(
            "Requesting completion with {} messages",
            request.messages.len()
        );

        let body = build_request_body(request);
        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                LedgerError::Http(format!("OpenAI API request failed: {}", e.without_url()))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|e| {
                format!(
                    "Failed to read error response body (status {status}): {}",
                    e.without_url()
                )
            });
            return Err(LedgerError::upstream(
                PROVIDER,
                format!("status {status}: {error_text}"),
            ));
        }

        let response_json: Value = response.json().await.map_err(|e| {
            LedgerError::upstream(
                PROVIDER,
                format!("Failed to parse OpenAI response: {}", e.without_url()),
            )
        })?;

        info!(model = %request.model, "Completion received");
        Ok(first_choice_content(&response_json))
    }
}

fn role_str(role: &MessageRole) -> &'static str {
    match role {
        MessageRole::system => "system",
        MessageRole::assistant => "assistant",
        _ => "user",
    }
}

/// Serializes a request into the Chat Completions wire format.
#[must_use]
pub fn build_request_body(request: &CompletionRequest) -> Value {
    let messages: Vec<Value> = request
        .messages
        .iter()
        .filter_map(|msg| match &msg.content {
            Content::Text(text) => Some(json!({
                "role": role_str(&msg.role),
                "content": text,
            })),
            _ => None,
        })
        .collect();

    let mut body = json!({
        "model": request.model,
        "messages": messages,
        "response_format": { "type": "json_object" },
    });

    if let Some(temperature) = request.temperature {
        body["temperature"] = json!(temperature);
    }

    body
}

/// Extracts `choices[0].message.content`, treating blank content as absent.
#[must_use]
pub fn first_choice_content(response: &Value) -> Option<String> {
    response
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(ToString::to_string)
}
