use thiserror::Error;

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {message}")]
    Bind { addr: String, message: String },

    #[error("failed to spawn http thread: {0}")]
    Spawn(String),
}

pub type Result<T> = std::result::Result<T, ServerError>;
