//! HTTP exposition server.
//!
//! Serves the sink's registry on `/metrics` and a JSON liveness summary on
//! `/health`. Everything else is 404.
//!
//! # Graceful Shutdown
//!
//! ```rust,ignore
//! let server = ExporterServer::bind(addr, state).await?;
//! let handle = server.shutdown_handle();
//! tokio::spawn(server.run());
//!
//! // Stop accepting; in-flight connections finish on their own.
//! handle.trigger();
//! ```

mod internal;

use std::net::SocketAddr;
use std::sync::Arc;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info};

pub use internal::{route, ExporterState, HealthReport};

/// Handle used to stop a running [`ExporterServer`].
#[derive(Clone)]
pub struct ShutdownHandle(Arc<watch::Sender<bool>>);

impl ShutdownHandle {
    /// Signal the accept loop to stop.
    pub fn trigger(&self) {
        let _ = self.0.send(true);
    }
}

/// HTTP/1 server bound to one listener.
pub struct ExporterServer {
    listener: TcpListener,
    state: Arc<ExporterState>,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl ExporterServer {
    /// Wrap an already bound listener.
    pub fn new(listener: TcpListener, state: Arc<ExporterState>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            listener,
            state,
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
        }
    }

    /// Bind `addr` and wrap the listener.
    pub async fn bind(addr: SocketAddr, state: Arc<ExporterState>) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self::new(listener, state))
    }

    /// Address actually bound (resolves port 0).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle(Arc::clone(&self.shutdown_tx))
    }

    /// Accept connections until the shutdown handle fires.
    pub async fn run(self) {
        let Self {
            listener,
            state,
            shutdown_tx: _shutdown_tx,
            mut shutdown_rx,
        } = self;

        if let Ok(addr) = listener.local_addr() {
            info!("Exporter listening on http://{}", addr);
        }

        loop {
            tokio::select! {
                result = listener.accept() => {
                    let (stream, remote_addr) = match result {
                        Ok(conn) => conn,
                        Err(e) => {
                            error!("Accept error: {}", e);
                            continue;
                        }
                    };
                    let _ = stream.set_nodelay(true);
                    let state = Arc::clone(&state);

                    tokio::spawn(async move {
                        let service = service_fn(move |req| {
                            let state = Arc::clone(&state);
                            async move { internal::handle_request(req, state).await }
                        });

                        let io = TokioIo::new(stream);
                        if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                            debug!(remote = %remote_addr, error = %e, "connection closed with error");
                        }
                    });
                }
                _ = shutdown_rx.changed() => {
                    debug!("Exporter received shutdown signal, stopping accept loop");
                    break;
                }
            }
        }
    }
}
