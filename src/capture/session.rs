use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::capture::buffer::FrameBuffer;
use crate::capture::error::{CaptureError, Result};
use crate::capture::source::FrameSource;
use crate::diagnostics::stats::StudioStats;

/// Frames kept in the ring buffer.
const BUFFER_CAPACITY: usize = 3;

/// Active capture session pulling frames from one source.
///
/// A named thread calls `FrameSource::next_frame` at the configured rate and
/// pushes into a shared `FrameBuffer`. Source errors are logged and counted,
/// never fatal.
pub struct CaptureSession {
    source_name: String,
    buffer: Arc<FrameBuffer>,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl CaptureSession {
    /// Spawn the capture thread.
    pub fn start(
        mut source: Box<dyn FrameSource>,
        fps: u32,
        stats: Arc<Mutex<StudioStats>>,
    ) -> Result<Self> {
        let source_name = source.name().to_string();
        let buffer = Arc::new(FrameBuffer::new(BUFFER_CAPACITY));
        let running = Arc::new(AtomicBool::new(true));
        let period = Duration::from_secs_f64(1.0 / f64::from(fps.max(1)));

        let thread = {
            let buffer = Arc::clone(&buffer);
            let running = Arc::clone(&running);
            let name = source_name.clone();
            std::thread::Builder::new()
                .name("capture".to_string())
                .spawn(move || {
                    info!("capture thread starting for {name}");
                    let epoch = Instant::now();
                    while running.load(Ordering::Relaxed) {
                        let started = Instant::now();
                        match source.next_frame() {
                            Ok(mut frame) => {
                                frame.timestamp_us = epoch.elapsed().as_micros() as u64;
                                stats.lock().record_frame();
                                buffer.push(frame);
                            }
                            Err(e) => {
                                warn!("capture from {name} failed: {e}");
                                stats.lock().record_capture_error();
                            }
                        }
                        if let Some(rest) = period.checked_sub(started.elapsed()) {
                            std::thread::sleep(rest);
                        }
                    }
                    info!("capture thread exiting for {name}");
                })
                .map_err(|e| CaptureError::Spawn(e.to_string()))?
        };

        Ok(Self {
            source_name,
            buffer,
            running,
            thread: Some(thread),
        })
    }

    /// Shared handle to the frame buffer.
    pub fn buffer(&self) -> &Arc<FrameBuffer> {
        &self.buffer
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Stop the capture thread. Idempotent.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop();
    }
}
