use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::runtime::Handle;
use tracing::{info, warn};

use crate::capture::dummy::DummySource;
use crate::capture::error::CaptureError;
use crate::capture::session::CaptureSession;
use crate::capture::source::FrameSource;
use crate::capture::still::StillSource;
use crate::diagnostics::stats::StudioStats;
use crate::keywords::board::KeywordBoard;
use crate::keywords::client::{HttpKeywordClient, KeywordError, KeywordSource, LocalKeywordSource};
use crate::keywords::refresh::{EncodeOptions, RefreshContext, RefreshScheduler};
use crate::relay::service::RelayService;
use crate::relay::upstream::UpstreamError;
use crate::server::error::ServerError;
use crate::server::http::HttpServer;
use crate::server::routes::StudioRoutes;
use crate::settings::store::SettingsError;
use crate::settings::types::{SourceSettings, StudioSettings};
use crate::sketch::compose::Compositor;
use crate::sketch::metrics::MonospaceMetrics;
use crate::sketch::runtime::{SketchInputs, SketchLoop, SketchState};

/// Startup failures. Anything after startup is logged, never fatal.
#[derive(Debug, Error)]
pub enum StudioError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Keywords(#[from] KeywordError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("failed to build async runtime: {0}")]
    Runtime(std::io::Error),

    #[error("failed to wait for shutdown signal: {0}")]
    Signal(std::io::Error),
}

fn open_source(settings: &StudioSettings) -> Result<Box<dyn FrameSource>, CaptureError> {
    let (width, height) = (settings.sketch.width, settings.sketch.height);
    if DummySource::is_enabled() {
        return Ok(Box::new(DummySource::new(width, height)));
    }
    match &settings.source {
        SourceSettings::Dummy => Ok(Box::new(DummySource::new(width, height))),
        SourceSettings::Still { path } => Ok(Box::new(StillSource::open(Path::new(path))?)),
    }
}

fn keyword_source(
    settings: &StudioSettings,
    relay: &Arc<RelayService>,
) -> Result<Arc<dyn KeywordSource>, KeywordError> {
    match &settings.keyword_endpoint {
        Some(base) => {
            info!("keyword client using relay at {base}");
            Ok(Arc::new(HttpKeywordClient::new(base.clone(), settings.fetch_timeout())?))
        }
        None => Ok(Arc::new(LocalKeywordSource::new(Arc::clone(relay)))),
    }
}

/// A running studio: capture, paint loop, keyword refresh and HTTP surface.
pub struct Studio {
    capture: CaptureSession,
    sketch: SketchLoop,
    scheduler: Arc<RefreshScheduler>,
    server: HttpServer,
}

impl Studio {
    /// Bring every subsystem up on `runtime`. Refresh waits for `/start`.
    pub fn launch(settings: &StudioSettings, runtime: Handle) -> Result<Self, StudioError> {
        let stats = Arc::new(Mutex::new(StudioStats::new()));
        let sketch_settings = settings.sketch.clone();

        let capture = CaptureSession::start(
            open_source(settings)?,
            sketch_settings.frame_rate,
            Arc::clone(&stats),
        )?;
        info!("capturing from {}", capture.source_name());

        let relay = Arc::new(RelayService::from_settings(
            &settings.upstream,
            Some(settings.fetch_timeout()),
        )?);
        if !relay.has_credential() {
            warn!("OPENAI_API_KEY is not set; keyword requests will fail");
        }

        let board = Arc::new(KeywordBoard::new(settings.mode));
        let sketch_state = Arc::new(SketchState::new(sketch_settings.width, sketch_settings.height));

        let scheduler = Arc::new(RefreshScheduler::new(
            RefreshContext {
                mode: settings.mode,
                source: keyword_source(settings, &relay)?,
                board: Arc::clone(&board),
                frames: Arc::clone(capture.buffer()),
                stats: Arc::clone(&stats),
                image: EncodeOptions {
                    width: sketch_settings.width,
                    height: sketch_settings.height,
                    quality: settings.jpeg_quality,
                },
            },
            settings.refresh_interval(),
            runtime.clone(),
        ));

        let sketch = SketchLoop::start(
            &runtime,
            Compositor::new(sketch_settings, MonospaceMetrics::default()),
            SketchInputs {
                board,
                frames: Arc::clone(capture.buffer()),
                state: Arc::clone(&sketch_state),
                stats: Arc::clone(&stats),
            },
        );

        let routes = Arc::new(StudioRoutes::new(
            relay,
            Arc::clone(&scheduler),
            sketch_state,
            stats,
        ));
        let server = HttpServer::bind(&settings.bind_addr, routes, runtime, settings.max_body_bytes)?;
        info!(mode = %settings.mode, addr = %server.local_addr(), "studio ready");

        Ok(Self {
            capture,
            sketch,
            scheduler,
            server,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.server.local_addr()
    }

    /// Stop the timer, paint loop, capture and server, in that order.
    /// Outstanding keyword calls are not cancelled.
    pub fn shutdown(mut self) {
        self.scheduler.stop();
        self.sketch.stop();
        self.capture.stop();
        self.server.stop();
        info!("studio stopped");
    }
}
