use std::sync::Arc;
use std::time::Duration;

use aboutme_wire::{parse_keyword_list, Endpoint, KeywordRequest, KeywordResponse};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::relay::error::RelayError;
use crate::relay::prompt::Prompt;
use crate::relay::upstream::{ChatRequest, OpenAiUpstream, UpstreamError, VisionUpstream};
use crate::settings::types::UpstreamSettings;

const DEFAULT_UPSTREAM_FAILURE: &str = "OpenAI API request failed.";

/// Backend for the two keyword routes.
///
/// Validates the request, picks the prompt, forwards the image upstream and
/// turns the free-text answer into a keyword list. No retries, no caching.
pub struct RelayService {
    upstream: Arc<dyn VisionUpstream>,
    api_key: Option<String>,
    model: String,
}

impl RelayService {
    pub fn new(
        upstream: Arc<dyn VisionUpstream>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            upstream,
            api_key: api_key.filter(|key| !key.is_empty()),
            model: model.into(),
        }
    }

    /// Build a relay backed by the OpenAI-compatible HTTP upstream.
    pub fn from_settings(
        settings: &UpstreamSettings,
        timeout: Option<Duration>,
    ) -> Result<Self, UpstreamError> {
        let upstream = OpenAiUpstream::new(settings.api_url.clone(), timeout)?;
        Ok(Self::new(
            Arc::new(upstream),
            settings.api_key.clone(),
            settings.model.clone(),
        ))
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// Handle a raw request body. Always produces a status and a body.
    pub async fn handle_body(&self, endpoint: Endpoint, body: &[u8]) -> (u16, KeywordResponse) {
        let request = match serde_json::from_slice::<KeywordRequest>(body) {
            Ok(request) => request,
            Err(e) => return RelayError::InvalidBody(e.to_string()).to_response(),
        };
        self.handle(endpoint, &request).await
    }

    /// Handle a decoded request. Always produces a status and a body.
    pub async fn handle(&self, endpoint: Endpoint, request: &KeywordRequest) -> (u16, KeywordResponse) {
        match self.generate(endpoint, request).await {
            Ok(keywords) => {
                info!("{endpoint}: sending {} keywords", keywords.len());
                (200, KeywordResponse::keywords(keywords))
            }
            Err(e) => {
                warn!("{endpoint}: {e}");
                e.to_response()
            }
        }
    }

    /// Produce keywords for one request.
    pub async fn generate(
        &self,
        endpoint: Endpoint,
        request: &KeywordRequest,
    ) -> Result<Vec<String>, RelayError> {
        let image = request.image().ok_or(RelayError::MissingImage)?;
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            error!("OpenAI API key not configured");
            RelayError::MissingCredential
        })?;

        let existing = match endpoint {
            Endpoint::Flat => None,
            Endpoint::Layered => request.existing_keywords(),
        };
        info!(
            "{endpoint}: received image with {} existing keywords",
            existing.map_or(0, <[String]>::len)
        );

        let prompt = Prompt::select(endpoint, existing);
        let chat = ChatRequest::vision(&self.model, prompt.text(), image, prompt.max_tokens());
        let reply = self.upstream.send(api_key, &chat).await.map_err(|e| {
            error!("{endpoint}: upstream unreachable: {e}");
            RelayError::Transport(e.to_string())
        })?;

        if !reply.is_success() {
            error!("{endpoint}: upstream status {}: {}", reply.status, reply.body);
            return Err(RelayError::Upstream {
                status: reply.status,
                message: upstream_error_message(&reply.body),
            });
        }

        let data: Value = serde_json::from_str(&reply.body).map_err(|_| {
            error!("{endpoint}: failed to parse upstream JSON: {}", reply.body);
            RelayError::InvalidUpstreamJson
        })?;
        debug!("{endpoint}: upstream response {data}");

        let content = data
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
            .ok_or(RelayError::MissingContent)?;

        Ok(parse_keyword_list(content))
    }
}

/// Best-effort message from an upstream error body: `error.message` when the
/// body is JSON, else the raw body, else a fixed fallback.
fn upstream_error_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(json) => json
            .pointer("/error/message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_UPSTREAM_FAILURE)
            .to_string(),
        Err(_) if !body.is_empty() => body.to_string(),
        Err(_) => DEFAULT_UPSTREAM_FAILURE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::upstream::RawReply;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Upstream that returns a canned reply and records what it was sent.
    struct StubUpstream {
        reply: Result<RawReply, String>,
        sent: Mutex<Vec<(String, ChatRequest)>>,
    }

    impl StubUpstream {
        fn replying(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(RawReply {
                    status,
                    body: body.to_string(),
                }),
                sent: Mutex::new(Vec::new()),
            })
        }

        fn unreachable() -> Arc<Self> {
            Arc::new(Self {
                reply: Err("connection refused".to_string()),
                sent: Mutex::new(Vec::new()),
            })
        }

        fn content(text: &str) -> Arc<Self> {
            let body = serde_json::json!({
                "choices": [{ "message": { "content": text } }]
            });
            Self::replying(200, &body.to_string())
        }
    }

    #[async_trait]
    impl VisionUpstream for StubUpstream {
        async fn send(
            &self,
            api_key: &str,
            request: &ChatRequest,
        ) -> Result<RawReply, UpstreamError> {
            self.sent
                .lock()
                .push((api_key.to_string(), request.clone()));
            self.reply.clone().map_err(UpstreamError::Transport)
        }
    }

    fn relay(upstream: &Arc<StubUpstream>) -> RelayService {
        RelayService::new(
            Arc::clone(upstream) as Arc<dyn VisionUpstream>,
            Some("sk-test".to_string()),
            "gpt-4o",
        )
    }

    fn image_request(keywords: Option<Vec<&str>>) -> KeywordRequest {
        KeywordRequest::new(
            "data:image/jpeg;base64,AA==",
            keywords.map(|k| k.into_iter().map(String::from).collect()),
        )
    }

    fn prompt_of(request: &ChatRequest) -> String {
        let json = serde_json::to_value(request).unwrap();
        json["messages"][0]["content"][0]["text"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn parses_comma_separated_answer() {
        let upstream = StubUpstream::content("red, blue , green,,");
        let keywords = relay(&upstream)
            .generate(Endpoint::Flat, &image_request(None))
            .await
            .unwrap();
        assert_eq!(keywords, vec!["red", "blue", "green"]);
    }

    #[tokio::test]
    async fn missing_credential_returns_500_for_valid_image() {
        let upstream = StubUpstream::content("red");
        let service = RelayService::new(upstream.clone(), None, "gpt-4o");
        for endpoint in [Endpoint::Flat, Endpoint::Layered] {
            let (status, body) = service.handle(endpoint, &image_request(None)).await;
            assert_eq!(status, 500);
            assert_eq!(
                body.error.as_deref(),
                Some("OpenAI API Key not configured on the server.")
            );
        }
        assert!(upstream.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn empty_credential_counts_as_missing() {
        let upstream = StubUpstream::content("red");
        let service = RelayService::new(upstream, Some(String::new()), "gpt-4o");
        assert!(!service.has_credential());
    }

    #[tokio::test]
    async fn missing_image_returns_400_regardless_of_other_fields() {
        let upstream = StubUpstream::content("red");
        let service = RelayService::new(upstream.clone(), None, "gpt-4o");

        let bodies: [&[u8]; 4] = [
            br#"{}"#,
            br#"{"keywords":["red","blue"]}"#,
            br#"{"image":""}"#,
            br#"{"image":null,"keywords":[]}"#,
        ];
        for body in bodies {
            let (status, reply) = service.handle_body(Endpoint::Layered, body).await;
            assert_eq!(status, 400, "body {}", String::from_utf8_lossy(body));
            assert_eq!(reply.error.as_deref(), Some("No image data provided."));
        }
        assert!(upstream.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn unparseable_body_is_a_server_error() {
        let upstream = StubUpstream::content("red");
        let service = relay(&upstream);
        for body in [&b"not json"[..], &br#"{"image":123}"#[..]] {
            let (status, reply) = service.handle_body(Endpoint::Flat, body).await;
            assert_eq!(status, 500, "body {}", String::from_utf8_lossy(body));
            let message = reply.error.unwrap();
            assert!(!message.is_empty());
            assert!(!message.starts_with("No image"), "{message}");
        }
        assert!(upstream.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn flat_route_uses_subject_prompt_and_ignores_keywords() {
        let upstream = StubUpstream::content("smile");
        relay(&upstream)
            .generate(Endpoint::Flat, &image_request(Some(vec!["red"])))
            .await
            .unwrap();

        let sent = upstream.sent.lock();
        let (key, request) = &sent[0];
        assert_eq!(key, "sk-test");
        assert_eq!(request.max_tokens, 60);
        assert_eq!(request.model, "gpt-4o");
        assert!(prompt_of(request).starts_with("Generate 5-7 concise keywords"));
    }

    #[tokio::test]
    async fn layered_route_refines_existing_keywords() {
        let upstream = StubUpstream::content("crimson scarf");
        relay(&upstream)
            .generate(Endpoint::Layered, &image_request(Some(vec!["red", "warm"])))
            .await
            .unwrap();

        let sent = upstream.sent.lock();
        let request = &sent[0].1;
        assert_eq!(request.max_tokens, 80);
        assert!(prompt_of(request).contains("existing keywords [red, warm]"));
    }

    #[tokio::test]
    async fn layered_route_without_keywords_asks_for_colors() {
        let upstream = StubUpstream::content("blue");
        relay(&upstream)
            .generate(Endpoint::Layered, &image_request(None))
            .await
            .unwrap();
        let sent = upstream.sent.lock();
        assert!(prompt_of(&sent[0].1).contains("focusing primarily on colors"));
    }

    #[tokio::test]
    async fn image_is_forwarded_as_image_url() {
        let upstream = StubUpstream::content("blue");
        relay(&upstream)
            .generate(Endpoint::Flat, &image_request(None))
            .await
            .unwrap();
        let json = serde_json::to_value(&upstream.sent.lock()[0].1).unwrap();
        assert_eq!(
            json["messages"][0]["content"][1]["image_url"]["url"],
            "data:image/jpeg;base64,AA=="
        );
    }

    #[tokio::test]
    async fn upstream_error_status_and_message_are_surfaced() {
        let upstream =
            StubUpstream::replying(429, r#"{"error":{"message":"Rate limit reached"}}"#);
        let (status, body) = relay(&upstream)
            .handle(Endpoint::Flat, &image_request(None))
            .await;
        assert_eq!(status, 429);
        assert_eq!(
            body.error.as_deref(),
            Some("OpenAI API request failed: Rate limit reached")
        );
    }

    #[tokio::test]
    async fn upstream_error_with_plain_body_uses_body_text() {
        let upstream = StubUpstream::replying(502, "Bad Gateway");
        let (status, body) = relay(&upstream)
            .handle(Endpoint::Layered, &image_request(None))
            .await;
        assert_eq!(status, 502);
        assert_eq!(
            body.error.as_deref(),
            Some("OpenAI API request failed: Bad Gateway")
        );
    }

    #[tokio::test]
    async fn upstream_error_without_details_uses_fallback() {
        let upstream = StubUpstream::replying(503, "");
        let (_, body) = relay(&upstream)
            .handle(Endpoint::Flat, &image_request(None))
            .await;
        assert_eq!(
            body.error.as_deref(),
            Some("OpenAI API request failed: OpenAI API request failed.")
        );
    }

    #[tokio::test]
    async fn unparseable_success_body_is_invalid_response() {
        let upstream = StubUpstream::replying(200, "<html>oops</html>");
        let (status, body) = relay(&upstream)
            .handle(Endpoint::Flat, &image_request(None))
            .await;
        assert_eq!(status, 500);
        assert_eq!(body.error.as_deref(), Some("Invalid JSON response from OpenAI."));
    }

    #[tokio::test]
    async fn success_body_without_content_fails_extraction() {
        for body in [r#"{"choices":[]}"#, r#"{"choices":[{"message":{"content":""}}]}"#, "{}"] {
            let upstream = StubUpstream::replying(200, body);
            let (status, reply) = relay(&upstream)
                .handle(Endpoint::Layered, &image_request(None))
                .await;
            assert_eq!(status, 500, "body {body}");
            assert_eq!(
                reply.error.as_deref(),
                Some("Failed to extract keywords from OpenAI response content.")
            );
        }
    }

    #[tokio::test]
    async fn transport_failure_is_500_with_message() {
        let upstream = StubUpstream::unreachable();
        let (status, body) = relay(&upstream)
            .handle(Endpoint::Flat, &image_request(None))
            .await;
        assert_eq!(status, 500);
        assert_eq!(body.error.as_deref(), Some("connection refused"));
    }

    #[tokio::test]
    async fn successful_reply_carries_only_keywords() {
        let upstream = StubUpstream::content("a, b");
        let (status, body) = relay(&upstream)
            .handle(Endpoint::Flat, &image_request(None))
            .await;
        assert_eq!(status, 200);
        assert_eq!(body, KeywordResponse::keywords(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn error_message_prefers_json_error_field() {
        assert_eq!(
            upstream_error_message(r#"{"error":{"message":"bad key"}}"#),
            "bad key"
        );
        assert_eq!(
            upstream_error_message(r#"{"detail":"x"}"#),
            DEFAULT_UPSTREAM_FAILURE
        );
    }
}
