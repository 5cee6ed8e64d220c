//! Minimal Anthropic Claude API client.
//!
//! This crate provides a focused client for Claude's Messages API:
//! - Single-shot, non-streaming text completions
//! - Per-request token limits and sampling temperature
//! - A configurable base URL for proxies and local gateways

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_API_BASE: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

/// Errors that can occur when using the Claude client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("API key not configured")]
    NoApiKey,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Response contained no text")]
    EmptyResponse,
}

/// Claude API client.
#[derive(Clone)]
pub struct Claude {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for Claude {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Claude")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl Claude {
    /// Create a new Claude client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_API_BASE.to_string(),
        })
    }

    /// Create a Claude client from the ANTHROPIC_API_KEY environment variable.
    ///
    /// An empty value is treated the same as a missing one.
    pub fn from_env() -> Result<Self, Error> {
        match std::env::var(API_KEY_VAR) {
            Ok(key) if !key.trim().is_empty() => Self::new(key),
            _ => Err(Error::NoApiKey),
        }
    }

    /// Set the default model for this client.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point the client at a different API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// The model used when a request does not name one.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Whether a non-empty API key is configured.
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Send a completion request and return the full response.
    pub async fn complete(&self, request: Request) -> Result<Response, Error> {
        // Checked again here so a misconfigured client never touches the network.
        if !self.has_api_key() {
            return Err(Error::NoApiKey);
        }

        let api_request = self.build_api_request(&request);
        let headers = self.build_headers()?;

        tracing::debug!(
            model = %api_request.model,
            max_tokens = api_request.max_tokens,
            temperature = ?api_request.temperature,
            "sending completion request"
        );

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .headers(headers)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: body,
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        Ok(parse_response(api_response))
    }

    /// Send a single user prompt and return the concatenated text of the reply.
    pub async fn complete_text(
        &self,
        prompt: &str,
        max_tokens: usize,
        temperature: f32,
    ) -> Result<String, Error> {
        let request = Request::new(vec![Message::user(prompt)])
            .with_max_tokens(max_tokens)
            .with_temperature(temperature);

        let text = self.complete(request).await?.text();
        if text.is_empty() {
            return Err(Error::EmptyResponse);
        }
        Ok(text)
    }

    fn build_headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| Error::Config(format!("Invalid API key: {e}")))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        Ok(headers)
    }

    fn build_api_request(&self, request: &Request) -> ApiRequest {
        ApiRequest {
            model: self.model.clone(),
            max_tokens: request.max_tokens,
            messages: request
                .messages
                .iter()
                .map(|m| ApiMessage {
                    role: "user",
                    content: m.content.clone(),
                })
                .collect(),
            temperature: request.temperature,
        }
    }
}

fn parse_response(api_response: ApiResponse) -> Response {
    let text = api_response
        .content
        .into_iter()
        .filter_map(|c| match c {
            ApiContent::Text { text } => Some(text),
            ApiContent::Other => None,
        })
        .collect::<Vec<_>>()
        .join("");

    let stop_reason = match api_response.stop_reason.as_deref() {
        Some("max_tokens") => StopReason::MaxTokens,
        Some("stop_sequence") => StopReason::StopSequence,
        _ => StopReason::EndTurn,
    };

    Response {
        id: api_response.id,
        model: api_response.model,
        text,
        stop_reason,
        usage: Usage {
            input_tokens: api_response.usage.input_tokens,
            output_tokens: api_response.usage.output_tokens,
        },
    }
}

// ============================================================================
// Public types
// ============================================================================

/// A completion request to send to Claude.
#[derive(Debug, Clone)]
pub struct Request {
    pub max_tokens: usize,
    pub messages: Vec<Message>,
    pub temperature: Option<f32>,
}

impl Request {
    /// Create a new request with the given messages.
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            max_tokens: 4096,
            messages,
            temperature: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the sampling temperature (clamped to the API's 0.0..=1.0 range).
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature.clamp(0.0, 1.0));
        self
    }
}

/// A user turn in the conversation.
#[derive(Debug, Clone)]
pub struct Message {
    pub content: String,
}

impl Message {
    /// Create a user message with text content.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            content: text.into(),
        }
    }
}

/// A completion response from Claude.
#[derive(Debug, Clone)]
pub struct Response {
    pub id: String,
    pub model: String,
    /// All text blocks of the reply, concatenated.
    pub text: String,
    pub stop_reason: StopReason,
    pub usage: Usage,
}

impl Response {
    /// Get all text content concatenated.
    pub fn text(&self) -> String {
        self.text.clone()
    }
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
}

/// Token usage information.
#[derive(Debug, Clone)]
pub struct Usage {
    pub input_tokens: usize,
    pub output_tokens: usize,
}

// ============================================================================
// Internal API types
// ============================================================================

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    max_tokens: usize,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    id: String,
    model: String,
    content: Vec<ApiContent>,
    #[serde(default)]
    stop_reason: Option<String>,
    usage: ApiUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiContent {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    input_tokens: usize,
    output_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = Claude::new("test-key").unwrap();
        assert_eq!(client.model(), DEFAULT_MODEL);
        assert!(client.has_api_key());
    }

    #[test]
    fn test_client_with_model_and_base_url() {
        let client = Claude::new("test-key")
            .unwrap()
            .with_model("claude-3-haiku")
            .with_base_url("http://localhost:8080/v1/");
        assert_eq!(client.model(), "claude-3-haiku");
        assert_eq!(client.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn test_request_builder() {
        let request = Request::new(vec![Message::user("Hello")])
            .with_max_tokens(1000)
            .with_temperature(0.1);

        assert_eq!(request.max_tokens, 1000);
        assert_eq!(request.messages[0].content, "Hello");
        assert_eq!(request.temperature, Some(0.1));
    }

    #[test]
    fn test_temperature_is_clamped() {
        let request = Request::new(Vec::new()).with_temperature(3.0);
        assert_eq!(request.temperature, Some(1.0));
    }

    #[test]
    fn test_api_request_uses_client_model() {
        let client = Claude::new("test-key").unwrap().with_model("claude-3-haiku");
        let request = Request::new(vec![Message::user("Once upon a time")]).with_max_tokens(500);
        let api = client.build_api_request(&request);

        let json = serde_json::to_value(&api).unwrap();
        assert_eq!(json["model"], "claude-3-haiku");
        assert_eq!(json["max_tokens"], 500);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Once upon a time");
        assert!(json.get("system").is_none());
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_parse_response_joins_text_blocks() {
        let raw = r#"{
            "id": "msg_01",
            "model": "claude-sonnet-4-20250514",
            "content": [
                {"type": "text", "text": "Once upon a time, "},
                {"type": "thinking", "thinking": "ignored"},
                {"type": "text", "text": "there was a mouse."}
            ],
            "stop_reason": "max_tokens",
            "usage": {"input_tokens": 12, "output_tokens": 8}
        }"#;
        let api: ApiResponse = serde_json::from_str(raw).unwrap();
        let response = parse_response(api);

        assert_eq!(response.text(), "Once upon a time, there was a mouse.");
        assert_eq!(response.stop_reason, StopReason::MaxTokens);
        assert_eq!(response.usage.output_tokens, 8);
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let client = Claude::new("").unwrap().with_base_url("http://127.0.0.1:1");
        let result = client.complete_text("Tell me a story", 100, 0.1).await;
        assert!(matches!(result, Err(Error::NoApiKey)));
    }
}
