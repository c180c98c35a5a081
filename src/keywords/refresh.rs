use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::board::KeywordBoard;
use super::client::KeywordSource;
use super::fetch::{fetch_layers, flat_or_sentinel, try_fetch_keywords};
use crate::capture::buffer::FrameBuffer;
use crate::capture::encode::encode_data_url;
use crate::diagnostics::stats::StudioStats;
use crate::settings::types::KeywordMode;

/// Held for the duration of one refresh cycle. Dropping it releases the
/// slot, on success, failure or panic alike.
pub struct FetchGuard {
    flag: Arc<AtomicBool>,
}

impl FetchGuard {
    /// Claim the slot, or `None` if a cycle is already in flight.
    pub fn try_acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                flag: Arc::clone(flag),
            })
    }
}

impl Drop for FetchGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Shortest timer period; a zero interval would spin or panic the ticker.
const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// How frames are turned into request images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    pub width: u32,
    pub height: u32,
    pub quality: u8,
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// A cycle was spawned.
    Started,
    /// Previous cycle still running.
    InFlight,
    /// No frame captured yet.
    NoFrame,
    /// The latest frame could not be encoded.
    EncodeFailed,
}

/// Everything a refresh cycle touches.
pub struct RefreshContext {
    pub mode: KeywordMode,
    pub source: Arc<dyn KeywordSource>,
    pub board: Arc<KeywordBoard>,
    pub frames: Arc<FrameBuffer>,
    pub stats: Arc<Mutex<StudioStats>>,
    pub image: EncodeOptions,
}

/// Periodic keyword refresh with at most one cycle in flight.
///
/// `start` runs a cycle straight away and then one per interval. A tick that
/// lands while a cycle is running is dropped, not queued. `stop` halts the
/// timer only; a cycle already running finishes and publishes.
pub struct RefreshScheduler {
    ctx: Arc<RefreshContext>,
    fetching: Arc<AtomicBool>,
    interval: Duration,
    runtime: Handle,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshScheduler {
    /// `interval` is raised to at least one second.
    pub fn new(ctx: RefreshContext, interval: Duration, runtime: Handle) -> Self {
        Self {
            ctx: Arc::new(ctx),
            fetching: Arc::new(AtomicBool::new(false)),
            interval: interval.max(MIN_INTERVAL),
            runtime,
            timer: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_fetching(&self) -> bool {
        self.fetching.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.timer.lock().is_some()
    }

    /// Begin refreshing. Returns false if already started.
    pub fn start(&self) -> bool {
        let mut timer = self.timer.lock();
        if timer.is_some() {
            return false;
        }

        self.ctx.board.mark_started();
        info!(mode = %self.ctx.mode, interval_ms = self.interval().as_millis() as u64, "keyword refresh started");
        Self::tick(&self.ctx, &self.fetching, &self.runtime);

        let ctx = Arc::clone(&self.ctx);
        let fetching = Arc::clone(&self.fetching);
        let runtime = self.runtime.clone();
        let period = self.interval;
        *timer = Some(self.runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                Self::tick(&ctx, &fetching, &runtime);
            }
        }));
        true
    }

    /// Halt the timer. In-flight cycles are left to finish.
    pub fn stop(&self) {
        if let Some(timer) = self.timer.lock().take() {
            timer.abort();
            info!("keyword refresh stopped");
        }
    }

    /// Run one tick by hand, outside the timer.
    pub fn trigger(&self) -> Trigger {
        Self::tick(&self.ctx, &self.fetching, &self.runtime)
    }

    fn tick(ctx: &Arc<RefreshContext>, fetching: &Arc<AtomicBool>, runtime: &Handle) -> Trigger {
        let Some(guard) = FetchGuard::try_acquire(fetching) else {
            debug!("refresh tick skipped, cycle in flight");
            ctx.stats.lock().record_skipped_tick();
            return Trigger::InFlight;
        };

        let Some(frame) = ctx.frames.latest() else {
            debug!("refresh tick skipped, no frame yet");
            return Trigger::NoFrame;
        };

        let image = match encode_data_url(&frame, ctx.image.width, ctx.image.height, ctx.image.quality) {
            Ok(image) => image,
            Err(e) => {
                warn!("failed to encode frame for keywords: {e}");
                return Trigger::EncodeFailed;
            }
        };

        ctx.stats.lock().record_cycle_started();
        let ctx = Arc::clone(ctx);
        runtime.spawn(async move {
            let _guard = guard;
            let started = Instant::now();
            let succeeded = run_cycle(&ctx, &image).await;
            let elapsed = started.elapsed();
            ctx.stats.lock().record_cycle_finished(succeeded, elapsed);
            debug!(succeeded, elapsed_ms = elapsed.as_millis() as u64, "refresh cycle finished");
        });
        Trigger::Started
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One cycle: fetch and publish. Returns whether it succeeded.
async fn run_cycle(ctx: &RefreshContext, image: &str) -> bool {
    match ctx.mode {
        KeywordMode::Flat => {
            let result = try_fetch_keywords(ctx.source.as_ref(), image).await;
            let succeeded = result.is_ok();
            ctx.board.set_flat(flat_or_sentinel(result));
            succeeded
        }
        KeywordMode::Layered => {
            let board = &ctx.board;
            let outcome = fetch_layers(ctx.source.as_ref(), image, |index, keywords| {
                board.set_layer(index, keywords.to_vec());
            })
            .await;
            if !outcome.is_complete() {
                board.set_layers(outcome.layers());
            }
            outcome.is_complete()
        }
    }
}
