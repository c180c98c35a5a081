use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;

/// Errors reaching the inference API at all. HTTP error statuses are not
/// errors at this layer; they come back in `RawReply`.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("Request timeout - the inference API took too long to respond")]
    Timeout,

    #[error("{0}")]
    Transport(String),
}

/// Chat-completion request with one user message carrying text and an image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

impl ChatRequest {
    /// Build the single-message vision request used by both relay routes.
    pub fn vision(
        model: impl Into<String>,
        prompt: impl Into<String>,
        image_url: impl Into<String>,
        max_tokens: u32,
    ) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: vec![
                    ContentPart::Text {
                        text: prompt.into(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: image_url.into(),
                        },
                    },
                ],
            }],
            max_tokens,
        }
    }
}

/// Status and raw body of an upstream reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReply {
    pub status: u16,
    pub body: String,
}

impl RawReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport to an image-capable chat-completion API.
#[async_trait]
pub trait VisionUpstream: Send + Sync {
    /// Send one request. Any HTTP status is a successful send.
    async fn send(&self, api_key: &str, request: &ChatRequest) -> Result<RawReply, UpstreamError>;
}

/// OpenAI-compatible chat-completions endpoint over reqwest.
pub struct OpenAiUpstream {
    client: Client,
    api_url: String,
}

impl OpenAiUpstream {
    pub fn new(api_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, UpstreamError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| UpstreamError::Client(e.to_string()))?;
        Ok(Self {
            client,
            api_url: api_url.into(),
        })
    }
}

#[async_trait]
impl VisionUpstream for OpenAiUpstream {
    async fn send(&self, api_key: &str, request: &ChatRequest) -> Result<RawReply, UpstreamError> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    UpstreamError::Timeout
                } else {
                    UpstreamError::Transport(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;
        Ok(RawReply { status, body })
    }
}
