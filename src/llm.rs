//! Generative-text collaborator client.
//!
//! The pipeline talks to a chat-completions API through the `LlmClient`
//! trait so extractors can be tested against mock responses without a
//! live model. All transport failure modes (connect, timeout, non-success
//! status, malformed body) surface as `LlmError` and are unified into one
//! pipeline error kind at the call site.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AppConfig;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API key not configured")]
    MissingApiKey,

    #[error("Cannot reach generative API at {0}")]
    Connection(String),

    #[error("Generative API returned error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),
}

/// One role-tagged message in a completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// Generative collaborator abstraction (allows mocking).
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send an ordered message list, return the completion text.
    async fn chat(&self, messages: &[ChatMessage], temperature: f32) -> Result<String, LlmError>;
}

/// Request body for the chat-completions endpoint.
#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: String,
}

/// HTTP client for an OpenRouter-compatible chat-completions API.
pub struct OpenRouterClient {
    api_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl OpenRouterClient {
    pub fn new(config: &AppConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| LlmError::HttpClient(e.to_string()))?;

        if config.api_key.is_empty() {
            tracing::error!("OpenRouter API key is missing or empty");
        } else {
            tracing::debug!(api_key = %mask_key(&config.api_key), "API key loaded");
        }

        Ok(Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            client,
            timeout_secs: config.request_timeout_secs,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmClient for OpenRouterClient {
    async fn chat(&self, messages: &[ChatMessage], temperature: f32) -> Result<String, LlmError> {
        if self.api_key.is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let body = CompletionRequest {
            model: &self.model,
            messages,
            temperature,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", "http://localhost:8000")
            .header("X-Title", "Document Triage Pipeline")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    LlmError::Connection(self.api_url.clone())
                } else if e.is_timeout() {
                    LlmError::HttpClient(format!("Request timed out after {}s", self.timeout_secs))
                } else {
                    LlmError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ResponseParsing(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::ResponseParsing("Empty choices array".into()))
    }
}

fn mask_key(key: &str) -> String {
    if key.len() > 12 {
        format!("{}...{}", &key[..8], &key[key.len() - 4..])
    } else {
        "[invalid format]".to_string()
    }
}

/// Mock LLM client for testing — replays configured responses in order,
/// then repeats the last one. Counts calls so tests can assert how many
/// model round-trips a path performed.
pub struct MockLlmClient {
    responses: Mutex<VecDeque<String>>,
    fallback: String,
    calls: AtomicUsize,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback: response.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Queue distinct responses for consecutive calls.
    pub fn with_responses<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let queue: VecDeque<String> = responses.into_iter().collect();
        let fallback = queue.back().cloned().unwrap_or_default();
        Self {
            responses: Mutex::new(queue),
            fallback,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn chat(&self, _messages: &[ChatMessage], _temperature: f32) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut queue = self.responses.lock().expect("mock lock");
        Ok(queue.pop_front().unwrap_or_else(|| self.fallback.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_client_returns_configured_response() {
        let client = MockLlmClient::new("test response");
        let result = client.chat(&[ChatMessage::user("hi")], 0.7).await.unwrap();
        assert_eq!(result, "test response");
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn mock_client_replays_queue_then_repeats_last() {
        let client = MockLlmClient::with_responses(vec!["one".into(), "two".into()]);
        assert_eq!(client.chat(&[], 0.0).await.unwrap(), "one");
        assert_eq!(client.chat(&[], 0.0).await.unwrap(), "two");
        assert_eq!(client.chat(&[], 0.0).await.unwrap(), "two");
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn missing_api_key_refused_before_network() {
        let config = AppConfig {
            api_url: "http://localhost:9".into(),
            api_key: String::new(),
            model: "test-model".into(),
            request_timeout_secs: 1,
            db_path: std::path::PathBuf::from(":memory:"),
        };
        let client = OpenRouterClient::new(&config).unwrap();
        let result = client.chat(&[ChatMessage::user("hi")], 0.7).await;
        assert!(matches!(result, Err(LlmError::MissingApiKey)));
    }

    #[test]
    fn client_trims_trailing_slash() {
        let config = AppConfig {
            api_url: "https://openrouter.ai/api/v1/chat/completions/".into(),
            api_key: "k".into(),
            model: "m".into(),
            request_timeout_secs: 1,
            db_path: std::path::PathBuf::from(":memory:"),
        };
        let client = OpenRouterClient::new(&config).unwrap();
        assert_eq!(client.api_url, "https://openrouter.ai/api/v1/chat/completions");
    }

    #[test]
    fn mask_key_hides_middle() {
        let masked = mask_key("sk-or-v1-abcdefghijklmnop");
        assert!(masked.starts_with("sk-or-v1"));
        assert!(masked.ends_with("mnop"));
        assert!(!masked.contains("ijkl"));
    }

    #[test]
    fn short_key_not_echoed() {
        assert_eq!(mask_key("short"), "[invalid format]");
    }

    #[test]
    fn chat_message_roles() {
        assert_eq!(ChatMessage::system("s").role, "system");
        assert_eq!(ChatMessage::user("u").role, "user");
    }
}
