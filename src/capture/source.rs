use crate::capture::buffer::Frame;
use crate::capture::error::Result;

/// Platform-agnostic frame source.
///
/// Implementations produce RGB24 frames on demand. `CaptureSession` calls
/// `next_frame` from its own thread at the configured rate.
pub trait FrameSource: Send {
    /// Human-readable name for logs.
    fn name(&self) -> &str;

    /// Produce the next frame.
    fn next_frame(&mut self) -> Result<Frame>;
}
