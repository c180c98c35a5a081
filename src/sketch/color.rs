use serde::Serialize;

use crate::capture::buffer::Frame;

/// 8-bit RGB color, serialized as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const BLACK: Rgb = Rgb([0, 0, 0]);
    pub const WHITE: Rgb = Rgb([255, 255, 255]);
}

/// Mean color over every pixel of the frame. Empty or malformed frames are
/// black.
pub fn average_color(frame: &Frame) -> Rgb {
    if !frame.is_well_formed() || frame.width == 0 || frame.height == 0 {
        return Rgb::BLACK;
    }
    let mut sums = [0u64; 3];
    for px in frame.data.chunks_exact(3) {
        sums[0] += u64::from(px[0]);
        sums[1] += u64::from(px[1]);
        sums[2] += u64::from(px[2]);
    }
    let count = u64::from(frame.width) * u64::from(frame.height);
    Rgb(sums.map(|s| (s / count) as u8))
}

/// Maps canvas coordinates onto a frame of possibly different size.
pub struct Sampler<'a> {
    frame: &'a Frame,
    scale_x: f32,
    scale_y: f32,
}

impl<'a> Sampler<'a> {
    pub fn new(frame: &'a Frame, canvas_width: u32, canvas_height: u32) -> Self {
        Self {
            frame,
            scale_x: frame.width as f32 / canvas_width.max(1) as f32,
            scale_y: frame.height as f32 / canvas_height.max(1) as f32,
        }
    }

    /// Pixel under canvas position (`x`, `y`); white outside the frame.
    pub fn sample(&self, x: f32, y: f32) -> Rgb {
        if x < 0.0 || y < 0.0 {
            return Rgb::WHITE;
        }
        let fx = (x * self.scale_x) as u32;
        let fy = (y * self.scale_y) as u32;
        self.frame.pixel(fx, fy).map_or(Rgb::WHITE, Rgb)
    }
}
