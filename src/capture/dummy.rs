use crate::capture::buffer::Frame;
use crate::capture::error::Result;
use crate::capture::source::FrameSource;

const DUMMY_SOURCE_NAME: &str = "Dummy Test Camera";

/// Horizontal drift of the gradient per frame, in pixels.
const DRIFT_PER_FRAME: u32 = 4;

/// A fake camera for running the studio without hardware.
///
/// Renders a gradient that drifts a few pixels per frame so the sampled
/// colors change over time: red follows x, green follows y, blue pulses
/// with the frame counter.
///
/// Enable via `DUMMY_CAMERA=1` environment variable; it is also the default
/// source.
pub struct DummySource {
    width: u32,
    height: u32,
    tick: u32,
}

impl DummySource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tick: 0,
        }
    }

    /// Whether the dummy camera is enabled via environment variable.
    pub fn is_enabled() -> bool {
        std::env::var("DUMMY_CAMERA").is_ok_and(|v| v == "1" || v == "true")
    }

    fn render(&self) -> Vec<u8> {
        let w = self.width.max(1);
        let h = self.height.max(1);
        let offset = self.tick.wrapping_mul(DRIFT_PER_FRAME);
        let blue = (self.tick % 256) as u8;

        let mut data = Vec::with_capacity((self.width * self.height * 3) as usize);
        for y in 0..self.height {
            let green = (y * 255 / h) as u8;
            for x in 0..self.width {
                let red = ((x.wrapping_add(offset) % w) * 255 / w) as u8;
                data.extend_from_slice(&[red, green, blue]);
            }
        }
        data
    }
}

impl FrameSource for DummySource {
    fn name(&self) -> &str {
        DUMMY_SOURCE_NAME
    }

    fn next_frame(&mut self) -> Result<Frame> {
        let data = self.render();
        self.tick = self.tick.wrapping_add(1);
        Ok(Frame {
            data,
            width: self.width,
            height: self.height,
            timestamp_us: 0,
        })
    }
}
