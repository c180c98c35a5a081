use thiserror::Error;

/// Capture subsystem errors.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("invalid frame buffer: {0}")]
    InvalidFrame(String),

    #[error("resize failed: {0}")]
    Resize(String),

    #[error("JPEG encoding failed: {0}")]
    Encode(String),

    #[error("failed to spawn capture thread: {0}")]
    Spawn(String),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, CaptureError>;
