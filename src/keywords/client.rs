use std::sync::Arc;
use std::time::Duration;

use aboutme_wire::{Endpoint, KeywordRequest, KeywordResponse};
use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use crate::relay::service::RelayService;

/// Why a keyword request did not yield a list.
#[derive(Debug, Error)]
pub enum KeywordError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("keyword request timed out")]
    Timeout,

    #[error("keyword request failed: {0}")]
    Transport(String),

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("invalid keyword response: {0}")]
    Decode(String),
}

/// Anything that can answer a keyword request.
#[async_trait]
pub trait KeywordSource: Send + Sync {
    /// One call to a relay route with an image and optional prior keywords.
    async fn request(
        &self,
        endpoint: Endpoint,
        image: &str,
        existing: Option<&[String]>,
    ) -> Result<Vec<String>, KeywordError>;
}

/// Map a relay status and body onto the client contract.
fn interpret(status: u16, body: KeywordResponse, reason: Option<&str>) -> Result<Vec<String>, KeywordError> {
    if (200..300).contains(&status) {
        return Ok(body.keywords.unwrap_or_default());
    }
    let message = body
        .error
        .filter(|m| !m.is_empty())
        .or_else(|| reason.map(str::to_string))
        .unwrap_or_else(|| format!("API request failed with status {status}"));
    Err(KeywordError::Server { status, message })
}

/// Talks to a relay over HTTP.
pub struct HttpKeywordClient {
    client: Client,
    base_url: String,
}

impl HttpKeywordClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, KeywordError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| KeywordError::Client(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }
}

#[async_trait]
impl KeywordSource for HttpKeywordClient {
    async fn request(
        &self,
        endpoint: Endpoint,
        image: &str,
        existing: Option<&[String]>,
    ) -> Result<Vec<String>, KeywordError> {
        let body = KeywordRequest::new(image, existing.map(<[String]>::to_vec));
        let response = self
            .client
            .post(self.url(endpoint))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    KeywordError::Timeout
                } else {
                    KeywordError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                KeywordError::Timeout
            } else {
                KeywordError::Transport(e.to_string())
            }
        })?;

        let parsed = serde_json::from_str::<KeywordResponse>(&text);
        match parsed {
            Ok(reply) => interpret(status.as_u16(), reply, status.canonical_reason()),
            Err(_) if !status.is_success() => interpret(
                status.as_u16(),
                KeywordResponse::default(),
                status.canonical_reason(),
            ),
            Err(e) => Err(KeywordError::Decode(e.to_string())),
        }
    }
}

/// Calls the relay service in-process, with the same reply mapping as the
/// HTTP client.
pub struct LocalKeywordSource {
    relay: Arc<RelayService>,
}

impl LocalKeywordSource {
    pub fn new(relay: Arc<RelayService>) -> Self {
        Self { relay }
    }
}

#[async_trait]
impl KeywordSource for LocalKeywordSource {
    async fn request(
        &self,
        endpoint: Endpoint,
        image: &str,
        existing: Option<&[String]>,
    ) -> Result<Vec<String>, KeywordError> {
        let request = KeywordRequest::new(image, existing.map(<[String]>::to_vec));
        let (status, body) = self.relay.handle(endpoint, &request).await;
        interpret(status, body, None)
    }
}
