use serde::Serialize;
use std::time::{Duration, Instant};

/// Collects runtime counters for the capture, paint and refresh loops.
pub struct StudioStats {
    frames_captured: u64,
    capture_errors: u64,
    scenes_composed: u64,
    cycles_started: u64,
    cycles_failed: u64,
    ticks_skipped: u64,
    last_cycle: Option<Duration>,
    start_time: Instant,
}

/// Snapshot of the counters for the `/diagnostics` route.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticSnapshot {
    pub uptime_secs: f64,
    pub frames_captured: u64,
    pub capture_errors: u64,
    pub capture_fps: f64,
    pub scenes_composed: u64,
    pub scene_fps: f64,
    pub cycles_started: u64,
    pub cycles_failed: u64,
    pub failure_rate: f64,
    pub ticks_skipped: u64,
    pub last_cycle_ms: Option<f64>,
}

impl StudioStats {
    /// Create new stats with zeroed counters.
    pub fn new() -> Self {
        Self {
            frames_captured: 0,
            capture_errors: 0,
            scenes_composed: 0,
            cycles_started: 0,
            cycles_failed: 0,
            ticks_skipped: 0,
            last_cycle: None,
            start_time: Instant::now(),
        }
    }

    pub fn record_frame(&mut self) {
        self.frames_captured += 1;
    }

    pub fn record_capture_error(&mut self) {
        self.capture_errors += 1;
    }

    pub fn record_scene(&mut self) {
        self.scenes_composed += 1;
    }

    pub fn record_cycle_started(&mut self) {
        self.cycles_started += 1;
    }

    /// Record the end of a refresh cycle and how long it took.
    pub fn record_cycle_finished(&mut self, succeeded: bool, elapsed: Duration) {
        if !succeeded {
            self.cycles_failed += 1;
        }
        self.last_cycle = Some(elapsed);
    }

    /// Record a timer tick that found a cycle still in flight.
    pub fn record_skipped_tick(&mut self) {
        self.ticks_skipped += 1;
    }

    fn rate(&self, count: u64) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed < 0.001 {
            return 0.0;
        }
        count as f64 / elapsed
    }

    /// Failed cycles as a percentage (0.0 - 100.0) of started cycles.
    pub fn failure_rate(&self) -> f64 {
        if self.cycles_started == 0 {
            return 0.0;
        }
        (self.cycles_failed as f64 / self.cycles_started as f64) * 100.0
    }

    /// Take a serialisable snapshot.
    pub fn snapshot(&self) -> DiagnosticSnapshot {
        DiagnosticSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs_f64(),
            frames_captured: self.frames_captured,
            capture_errors: self.capture_errors,
            capture_fps: self.rate(self.frames_captured),
            scenes_composed: self.scenes_composed,
            scene_fps: self.rate(self.scenes_composed),
            cycles_started: self.cycles_started,
            cycles_failed: self.cycles_failed,
            failure_rate: self.failure_rate(),
            ticks_skipped: self.ticks_skipped,
            last_cycle_ms: self.last_cycle.map(|d| d.as_secs_f64() * 1000.0),
        }
    }
}

impl Default for StudioStats {
    fn default() -> Self {
        Self::new()
    }
}
