use std::io::{Cursor, Read};
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::JoinHandle;

use tiny_http::{Header, Request, Response, Server, StatusCode};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use super::error::{Result, ServerError};
use super::routes::{Reply, StudioRoutes};

/// Why a request body was not read.
#[derive(Debug, PartialEq, Eq)]
pub enum BodyError {
    TooLarge,
    Io(String),
}

/// Read at most `limit` bytes of body.
pub fn read_body(reader: impl Read, limit: usize) -> std::result::Result<Vec<u8>, BodyError> {
    let mut body = Vec::new();
    reader
        .take(limit as u64 + 1)
        .read_to_end(&mut body)
        .map_err(|e| BodyError::Io(e.to_string()))?;
    if body.len() > limit {
        return Err(BodyError::TooLarge);
    }
    Ok(body)
}

/// HTTP front for the studio routes.
///
/// One accept thread hands each request to the runtime's blocking pool,
/// where the body is read and the async handler is driven to completion.
pub struct HttpServer {
    server: Arc<Server>,
    addr: SocketAddr,
    thread: Option<JoinHandle<()>>,
}

impl HttpServer {
    pub fn bind(
        bind_addr: &str,
        routes: Arc<StudioRoutes>,
        runtime: Handle,
        max_body_bytes: usize,
    ) -> Result<Self> {
        let server = Server::http(bind_addr).map_err(|e| ServerError::Bind {
            addr: bind_addr.to_string(),
            message: e.to_string(),
        })?;
        let addr = server
            .server_addr()
            .to_ip()
            .ok_or_else(|| ServerError::Bind {
                addr: bind_addr.to_string(),
                message: "not an IP listener".to_string(),
            })?;
        let server = Arc::new(server);

        let thread = {
            let server = Arc::clone(&server);
            std::thread::Builder::new()
                .name("http".to_string())
                .spawn(move || {
                    info!("listening on http://{addr}");
                    for request in server.incoming_requests() {
                        let routes = Arc::clone(&routes);
                        let handle = runtime.clone();
                        runtime.spawn_blocking(move || {
                            serve(request, &routes, &handle, max_body_bytes);
                        });
                    }
                    debug!("http accept loop exited");
                })
                .map_err(|e| ServerError::Spawn(e.to_string()))?
        };

        Ok(Self {
            server,
            addr,
            thread: Some(thread),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting. Idempotent.
    pub fn stop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.server.unblock();
            if thread.join().is_err() {
                warn!("http accept thread panicked");
            }
            info!("http server stopped");
        }
    }
}

impl Drop for HttpServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn serve(mut request: Request, routes: &StudioRoutes, runtime: &Handle, max_body_bytes: usize) {
    let method = request.method().to_string();
    let url = request.url().to_string();

    let reply = if request.body_length().is_some_and(|len| len > max_body_bytes) {
        Reply::error(413, "request body too large")
    } else {
        match read_body(request.as_reader(), max_body_bytes) {
            Ok(body) => runtime.block_on(routes.dispatch(&method, &url, &body)),
            Err(BodyError::TooLarge) => Reply::error(413, "request body too large"),
            Err(BodyError::Io(e)) => Reply::error(400, &format!("failed to read body: {e}")),
        }
    };

    debug!("{method} {url} -> {}", reply.status);
    let headers = [
        ("Content-Type", "application/json"),
        ("Access-Control-Allow-Origin", "*"),
    ]
    .into_iter()
    .filter_map(|(field, value)| Header::from_bytes(field.as_bytes(), value.as_bytes()).ok())
    .collect();
    let length = reply.body.len();
    let response = Response::new(
        StatusCode(reply.status),
        headers,
        Cursor::new(reply.body.into_bytes()),
        Some(length),
        None,
    );
    if let Err(e) = request.respond(response) {
        warn!("failed to write response for {url}: {e}");
    }
}
