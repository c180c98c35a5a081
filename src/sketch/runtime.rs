use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;

use super::compose::Compositor;
use super::metrics::TextMetrics;
use super::scene::{Pointer, Scene};
use crate::capture::buffer::FrameBuffer;
use crate::diagnostics::stats::StudioStats;
use crate::keywords::board::KeywordBoard;

/// Latest scene and pointer, shared with the HTTP surface.
pub struct SketchState {
    scene: Mutex<Arc<Scene>>,
    pointer: Mutex<Option<Pointer>>,
}

impl SketchState {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            scene: Mutex::new(Arc::new(Scene::blank(width, height))),
            pointer: Mutex::new(None),
        }
    }

    pub fn latest_scene(&self) -> Arc<Scene> {
        Arc::clone(&self.scene.lock())
    }

    pub fn publish(&self, scene: Scene) {
        *self.scene.lock() = Arc::new(scene);
    }

    pub fn pointer(&self) -> Option<Pointer> {
        *self.pointer.lock()
    }

    pub fn set_pointer(&self, pointer: Option<Pointer>) {
        *self.pointer.lock() = pointer;
    }
}

/// Inputs the paint loop reads every frame.
pub struct SketchInputs {
    pub board: Arc<KeywordBoard>,
    pub frames: Arc<FrameBuffer>,
    pub state: Arc<SketchState>,
    pub stats: Arc<Mutex<StudioStats>>,
}

/// Fixed-rate paint loop. Never waits on the network: each tick reads the
/// current keyword snapshot and latest frame, whatever they are.
pub struct SketchLoop {
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SketchLoop {
    pub fn start<M>(runtime: &Handle, compositor: Compositor<M>, inputs: SketchInputs) -> Self
    where
        M: TextMetrics + 'static,
    {
        let fps = compositor.settings().frame_rate.max(1);
        let period = Duration::from_secs_f64(1.0 / f64::from(fps));
        info!(fps, width = compositor.settings().width, height = compositor.settings().height, "sketch loop starting");

        let task = runtime.spawn(async move {
            let mut rng = StdRng::from_os_rng();
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut sequence = 0u64;
            loop {
                ticker.tick().await;
                sequence += 1;
                let frame = inputs.frames.latest();
                let board = inputs.board.snapshot();
                let pointer = inputs.state.pointer();
                let scene = compositor.compose(frame.as_deref(), &board, pointer, sequence, &mut rng);
                inputs.state.publish(scene);
                inputs.stats.lock().record_scene();
            }
        });

        Self {
            task: Mutex::new(Some(task)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.lock().is_some()
    }

    pub fn stop(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
            info!("sketch loop stopped");
        }
    }
}

impl Drop for SketchLoop {
    fn drop(&mut self) {
        self.stop();
    }
}
