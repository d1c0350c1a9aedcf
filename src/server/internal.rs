//! Request handling for the /metrics and /health endpoints.

use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::Error as HttpError;
use http_body_util::Full;
use hyper::body::Incoming as IncomingBody;
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, error};

use crate::metrics::PrometheusSink;

/// Prometheus text exposition content type.
const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Shared state read by every request.
pub struct ExporterState {
    sink: PrometheusSink,
    checks_total: usize,
    checks_active: usize,
    running: Arc<AtomicUsize>,
    start_time: Instant,
}

impl ExporterState {
    /// `checks_active` is how many of `checks_total` should have a running loop.
    pub fn new(
        sink: PrometheusSink,
        checks_total: usize,
        checks_active: usize,
        running: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            sink,
            checks_total,
            checks_active,
            running,
            start_time: Instant::now(),
        }
    }

    pub fn sink(&self) -> &PrometheusSink {
        &self.sink
    }

    /// Snapshot for the /health endpoint.
    ///
    /// Status is `degraded` while fewer loops run than checks are active.
    pub fn health(&self) -> HealthReport {
        let checks_running = self.running.load(Ordering::Relaxed);
        HealthReport {
            status: if checks_running < self.checks_active {
                "degraded"
            } else {
                "ok"
            },
            checks_total: self.checks_total,
            checks_active: self.checks_active,
            checks_running,
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}

/// Body of the /health response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub checks_total: usize,
    pub checks_active: usize,
    pub checks_running: usize,
    pub uptime_seconds: u64,
}

/// Route a request to /metrics, /health or 404.
pub async fn handle_request(
    req: Request<IncomingBody>,
    state: Arc<ExporterState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    debug!(method = %req.method(), path = req.uri().path(), "request");
    Ok(route(req.method(), req.uri().path(), &state))
}

/// Build the response for a method and path.
pub fn route(method: &Method, path: &str, state: &ExporterState) -> Response<Full<Bytes>> {
    let built = match (method, path) {
        (&Method::GET, "/metrics") => metrics_response(state),
        (&Method::GET, "/health") => health_response(state),
        (_, "/metrics") | (_, "/health") => {
            text_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
        }
        _ => text_response(StatusCode::NOT_FOUND, "Not Found"),
    };

    built.unwrap_or_else(|e| {
        error!(error = %e, "failed to build response");
        let mut fallback = Response::new(Full::new(Bytes::from_static(b"Internal Server Error")));
        *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        fallback
    })
}

fn metrics_response(state: &ExporterState) -> Result<Response<Full<Bytes>>, HttpError> {
    match state.sink.export() {
        Ok(body) => Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", METRICS_CONTENT_TYPE)
            .body(Full::new(Bytes::from(body))),
        Err(e) => {
            error!(error = %e, "failed to encode metrics");
            text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}

fn health_response(state: &ExporterState) -> Result<Response<Full<Bytes>>, HttpError> {
    let body = serde_json::to_string(&state.health()).unwrap_or_else(|_| "{}".to_string());
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body)))
}

fn text_response(
    status: StatusCode,
    body: &'static str,
) -> Result<Response<Full<Bytes>>, HttpError> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from_static(body.as_bytes())))
}
