use parking_lot::Mutex;
use std::sync::Arc;

/// A single captured video frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Raw pixel data (RGB24, row-major, no padding).
    pub data: Vec<u8>,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Capture timestamp in microseconds.
    pub timestamp_us: u64,
}

impl Frame {
    /// Build a frame filled with one color.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = (width as usize) * (height as usize);
        let mut data = Vec::with_capacity(pixels * 3);
        for _ in 0..pixels {
            data.extend_from_slice(&rgb);
        }
        Self {
            data,
            width,
            height,
            timestamp_us: 0,
        }
    }

    /// Whether `data` holds exactly `width * height` RGB pixels.
    pub fn is_well_formed(&self) -> bool {
        self.data.len() == (self.width as usize) * (self.height as usize) * 3
    }

    /// RGB value at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + x as usize) * 3;
        self.data
            .get(idx..idx + 3)
            .map(|px| [px[0], px[1], px[2]])
    }
}

struct Ring {
    slots: Vec<Option<Arc<Frame>>>,
    write_idx: usize,
}

/// Thread-safe ring buffer for captured frames.
///
/// Stores up to `capacity` frames, overwriting the oldest when full. Readers
/// get an `Arc<Frame>` so the paint loop and the refresh task can share the
/// latest frame without copying pixels.
pub struct FrameBuffer {
    ring: Mutex<Ring>,
    capacity: usize,
}

impl FrameBuffer {
    /// Create a new ring buffer with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: Mutex::new(Ring {
                slots: (0..capacity).map(|_| None).collect(),
                write_idx: 0,
            }),
            capacity,
        }
    }

    /// Push a new frame, overwriting the oldest if full.
    pub fn push(&self, frame: Frame) {
        if self.capacity == 0 {
            return;
        }
        let mut ring = self.ring.lock();
        let idx = ring.write_idx;
        ring.slots[idx] = Some(Arc::new(frame));
        ring.write_idx = (idx + 1) % self.capacity;
    }

    /// The most recently pushed frame, if any.
    pub fn latest(&self) -> Option<Arc<Frame>> {
        if self.capacity == 0 {
            return None;
        }
        let ring = self.ring.lock();
        let latest_idx = (ring.write_idx + self.capacity - 1) % self.capacity;
        ring.slots[latest_idx].clone()
    }
}
