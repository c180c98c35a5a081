use aboutme_wire::KeywordResponse;
use thiserror::Error;

/// Why a relay request produced no keywords.
///
/// The display strings are the `error` messages returned to clients.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The body is not a JSON keyword request. Reported as a server error
    /// carrying the parser's message.
    #[error("{0}")]
    InvalidBody(String),

    #[error("No image data provided.")]
    MissingImage,

    #[error("OpenAI API Key not configured on the server.")]
    MissingCredential,

    #[error("OpenAI API request failed: {message}")]
    Upstream { status: u16, message: String },

    #[error("Invalid JSON response from OpenAI.")]
    InvalidUpstreamJson,

    #[error("Failed to extract keywords from OpenAI response content.")]
    MissingContent,

    #[error("{0}")]
    Transport(String),
}

impl RelayError {
    /// HTTP status reported to the client.
    pub fn status(&self) -> u16 {
        match self {
            RelayError::MissingImage => 400,
            RelayError::Upstream { status, .. } => *status,
            RelayError::InvalidBody(_)
            | RelayError::MissingCredential
            | RelayError::InvalidUpstreamJson
            | RelayError::MissingContent
            | RelayError::Transport(_) => 500,
        }
    }

    /// Status plus `{ "error": ... }` body.
    pub fn to_response(&self) -> (u16, KeywordResponse) {
        (self.status(), KeywordResponse::error(self.to_string()))
    }
}
