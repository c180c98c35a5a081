use std::sync::Arc;

use aboutme_wire::{Endpoint, FLAT_PATH, LAYERED_PATH};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

use crate::diagnostics::stats::StudioStats;
use crate::keywords::refresh::RefreshScheduler;
use crate::relay::service::RelayService;
use crate::sketch::runtime::SketchState;
use crate::sketch::scene::Pointer;

const FLAT_ALIAS: &str = "/api/generate-keywords";
const LAYERED_ALIAS: &str = "/api/generate-keywords-layered";

/// A JSON reply ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self { status, body },
            Err(e) => Self::error(500, &format!("failed to serialize reply: {e}")),
        }
    }

    pub fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: serde_json::json!({ "error": message }).to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StartReply {
    started: bool,
    already_running: bool,
}

#[derive(Debug, Serialize)]
struct PointerReply {
    pointer: Option<Pointer>,
}

enum Route {
    Relay(Endpoint),
    Start,
    Pointer,
    Scene,
    Diagnostics,
}

impl Route {
    fn resolve(path: &str) -> Option<Self> {
        match path {
            FLAT_PATH | FLAT_ALIAS => Some(Route::Relay(Endpoint::Flat)),
            LAYERED_PATH | LAYERED_ALIAS => Some(Route::Relay(Endpoint::Layered)),
            "/start" => Some(Route::Start),
            "/pointer" => Some(Route::Pointer),
            "/scene" => Some(Route::Scene),
            "/diagnostics" => Some(Route::Diagnostics),
            _ => None,
        }
    }

    fn method(&self) -> &'static str {
        match self {
            Route::Relay(_) | Route::Start | Route::Pointer => "POST",
            Route::Scene | Route::Diagnostics => "GET",
        }
    }
}

/// Handlers for every studio route.
pub struct StudioRoutes {
    relay: Arc<RelayService>,
    scheduler: Arc<RefreshScheduler>,
    sketch: Arc<SketchState>,
    stats: Arc<Mutex<StudioStats>>,
}

impl StudioRoutes {
    pub fn new(
        relay: Arc<RelayService>,
        scheduler: Arc<RefreshScheduler>,
        sketch: Arc<SketchState>,
        stats: Arc<Mutex<StudioStats>>,
    ) -> Self {
        Self {
            relay,
            scheduler,
            sketch,
            stats,
        }
    }

    /// Route one request. The query string, if any, is ignored.
    pub async fn dispatch(&self, method: &str, url: &str, body: &[u8]) -> Reply {
        let path = url.split('?').next().unwrap_or(url);
        debug!("{method} {path} ({} bytes)", body.len());

        let Some(route) = Route::resolve(path) else {
            return Reply::error(404, &format!("no route for {path}"));
        };
        if !method.eq_ignore_ascii_case(route.method()) {
            return Reply::error(405, &format!("{method} not allowed on {path}"));
        }

        match route {
            Route::Relay(endpoint) => {
                let (status, reply) = self.relay.handle_body(endpoint, body).await;
                Reply::json(status, &reply)
            }
            Route::Start => self.start(),
            Route::Pointer => self.pointer(body),
            Route::Scene => Reply::json(200, &*self.sketch.latest_scene()),
            Route::Diagnostics => Reply::json(200, &self.stats.lock().snapshot()),
        }
    }

    fn start(&self) -> Reply {
        let newly = self.scheduler.start();
        if newly {
            info!("studio started");
        }
        Reply::json(
            200,
            &StartReply {
                started: true,
                already_running: !newly,
            },
        )
    }

    fn pointer(&self, body: &[u8]) -> Reply {
        let pointer = if body.iter().all(u8::is_ascii_whitespace) {
            None
        } else {
            match serde_json::from_slice::<Option<Pointer>>(body) {
                Ok(pointer) => pointer,
                Err(e) => return Reply::error(400, &format!("invalid pointer: {e}")),
            }
        };
        self.sketch.set_pointer(pointer);
        Reply::json(200, &PointerReply { pointer })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::buffer::FrameBuffer;
    use crate::keywords::board::KeywordBoard;
    use crate::keywords::client::LocalKeywordSource;
    use crate::keywords::refresh::{EncodeOptions, RefreshContext};
    use crate::relay::upstream::{ChatRequest, RawReply, UpstreamError, VisionUpstream};
    use crate::settings::types::KeywordMode;
    use async_trait::async_trait;
    use std::time::Duration;

    struct EchoUpstream;

    #[async_trait]
    impl VisionUpstream for EchoUpstream {
        async fn send(&self, _key: &str, _req: &ChatRequest) -> Result<RawReply, UpstreamError> {
            Ok(RawReply {
                status: 200,
                body: r#"{"choices":[{"message":{"content":"red, blue , green,,"}}]}"#.to_string(),
            })
        }
    }

    fn routes(api_key: Option<&str>) -> StudioRoutes {
        let relay = Arc::new(RelayService::new(
            Arc::new(EchoUpstream),
            api_key.map(str::to_string),
            "gpt-4o",
        ));
        let stats = Arc::new(Mutex::new(StudioStats::new()));
        let ctx = RefreshContext {
            mode: KeywordMode::Flat,
            source: Arc::new(LocalKeywordSource::new(Arc::clone(&relay))),
            board: Arc::new(KeywordBoard::new(KeywordMode::Flat)),
            frames: Arc::new(FrameBuffer::new(2)),
            stats: Arc::clone(&stats),
            image: EncodeOptions {
                width: 8,
                height: 8,
                quality: 80,
            },
        };
        let scheduler = Arc::new(RefreshScheduler::new(
            ctx,
            Duration::from_secs(3600),
            tokio::runtime::Handle::current(),
        ));
        StudioRoutes::new(relay, scheduler, Arc::new(SketchState::new(640, 480)), stats)
    }

    fn json(reply: &Reply) -> serde_json::Value {
        serde_json::from_str(&reply.body).unwrap()
    }

    #[tokio::test]
    async fn relay_routes_and_aliases_answer() {
        let routes = routes(Some("sk-test"));
        for path in ["/keywords", "/api/generate-keywords", "/keywords-layered", "/api/generate-keywords-layered"] {
            let reply = routes.dispatch("POST", path, br#"{"image":"data:,"}"#).await;
            assert_eq!(reply.status, 200, "{path}");
            assert_eq!(json(&reply)["keywords"], serde_json::json!(["red", "blue", "green"]));
        }
    }

    #[tokio::test]
    async fn relay_without_image_is_bad_request() {
        let routes = routes(Some("sk-test"));
        let reply = routes.dispatch("POST", "/keywords", br#"{"keywords":["a"]}"#).await;
        assert_eq!(reply.status, 400);
        assert_eq!(json(&reply)["error"], "No image data provided.");
    }

    #[tokio::test]
    async fn relay_without_credential_is_server_error() {
        let routes = routes(None);
        let reply = routes.dispatch("POST", "/keywords-layered", br#"{"image":"data:,"}"#).await;
        assert_eq!(reply.status, 500);
        assert_eq!(json(&reply)["error"], "OpenAI API Key not configured on the server.");
    }

    #[tokio::test]
    async fn unknown_path_and_wrong_method() {
        let routes = routes(Some("sk-test"));
        assert_eq!(routes.dispatch("GET", "/nope", b"").await.status, 404);
        assert_eq!(routes.dispatch("GET", "/keywords", b"").await.status, 405);
        assert_eq!(routes.dispatch("POST", "/scene", b"").await.status, 405);
        assert!(json(&routes.dispatch("GET", "/nope", b"").await)["error"].is_string());
    }

    #[tokio::test]
    async fn query_string_is_ignored() {
        let routes = routes(Some("sk-test"));
        assert_eq!(routes.dispatch("GET", "/scene?t=1", b"").await.status, 200);
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let routes = routes(Some("sk-test"));
        let first = json(&routes.dispatch("POST", "/start", b"").await);
        assert_eq!(first["started"], true);
        assert_eq!(first["alreadyRunning"], false);

        let second = json(&routes.dispatch("POST", "/start", b"").await);
        assert_eq!(second["alreadyRunning"], true);
        routes.scheduler.stop();
    }

    #[tokio::test]
    async fn pointer_sets_and_clears() {
        let routes = routes(Some("sk-test"));
        let reply = routes.dispatch("POST", "/pointer", br#"{"x":12,"y":34}"#).await;
        assert_eq!(reply.status, 200);
        assert_eq!(routes.sketch.pointer(), Some(Pointer { x: 12.0, y: 34.0 }));

        routes.dispatch("POST", "/pointer", b"null").await;
        assert_eq!(routes.sketch.pointer(), None);

        routes.dispatch("POST", "/pointer", br#"{"x":1,"y":1}"#).await;
        routes.dispatch("POST", "/pointer", b"").await;
        assert_eq!(routes.sketch.pointer(), None);

        let bad = routes.dispatch("POST", "/pointer", br#"{"x":"left"}"#).await;
        assert_eq!(bad.status, 400);
    }

    #[tokio::test]
    async fn scene_and_diagnostics_serve_json() {
        let routes = routes(Some("sk-test"));
        let scene = json(&routes.dispatch("GET", "/scene", b"").await);
        assert_eq!(scene["width"], 640);
        assert_eq!(scene["started"], false);

        let diag = json(&routes.dispatch("GET", "/diagnostics", b"").await);
        assert_eq!(diag["cyclesStarted"], 0);
        assert!(diag.get("uptimeSecs").is_some());
    }
}
