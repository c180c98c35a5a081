use std::path::Path;

use crate::capture::buffer::Frame;
use crate::capture::error::{CaptureError, Result};
use crate::capture::source::FrameSource;

/// Frame source that replays one decoded image forever.
///
/// Useful for exhibitions without a camera and for reproducible runs against
/// the upstream model.
pub struct StillSource {
    name: String,
    frame: Frame,
}

impl StillSource {
    /// Decode any format the `image` crate understands into an RGB24 frame.
    pub fn open(path: &Path) -> Result<Self> {
        let decoded = image::open(path)
            .map_err(|e| CaptureError::Decode(format!("{}: {e}", path.display())))?
            .to_rgb8();
        let (width, height) = decoded.dimensions();
        Ok(Self {
            name: path.display().to_string(),
            frame: Frame {
                data: decoded.into_raw(),
                width,
                height,
                timestamp_us: 0,
            },
        })
    }
}

impl FrameSource for StillSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_frame(&mut self) -> Result<Frame> {
        Ok(self.frame.clone())
    }
}
