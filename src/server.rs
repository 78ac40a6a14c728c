//! HTTP server and graceful shutdown.
//!
//! The middleware stack is plain synchronous code; this module is the host
//! that puts it on the network. Each request:
//!
//! 1. has its body collected into memory,
//! 2. is handed to the stack on tokio's blocking pool with a fresh
//!    [`BufferedResponse`], so a slow handler never stalls the I/O workers,
//! 3. is answered with whatever the chain wrote.
//!
//! A panic anywhere in the chain stops at this boundary: it is logged and the
//! client gets `500 Internal Server Error`. The [`logger`](crate::middleware::logger)
//! and [`timer`](crate::middleware::timer) lines have already been written by then.
//!
//! # Graceful shutdown
//!
//! On SIGTERM or Ctrl-C the server stops accepting and tells every open
//! connection to close. Idle keep-alive connections go at once; a connection
//! in the middle of a request finishes it first. Whatever is still open after
//! 30 seconds is aborted, then [`Server::serve`] returns.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::error::Error;
use crate::middleware::MiddlewareStack;
use crate::request::Request;
use crate::response::BufferedResponse;

/// How long shutdown waits for in-flight requests before dropping them.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// The HTTP server.
#[derive(Debug)]
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Example
    ///
    /// ```rust
    /// use quake::Server;
    /// let server = Server::bind("0.0.0.0:3000").unwrap();
    /// assert!(Server::bind("not an address").is_err());
    /// ```
    pub fn bind(addr: &str) -> Result<Self, Error> {
        let addr = addr.parse().map_err(|_| Error::InvalidAddress(addr.to_owned()))?;
        Ok(Self { addr })
    }

    /// Serves `stack` until SIGTERM or Ctrl-C, then drains.
    pub async fn serve(self, stack: MiddlewareStack) -> Result<(), Error> {
        self.serve_with_shutdown(stack, shutdown_signal()).await
    }

    /// Like [`serve`](Server::serve), but stops when `signal` resolves.
    pub async fn serve_with_shutdown<F>(self, stack: MiddlewareStack, signal: F) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        // Refuse before taking the port.
        if !stack.is_finalized() {
            return Err(Error::NotFinalized);
        }
        let listener = TcpListener::bind(self.addr).await?;
        serve_listener(listener, stack, signal).await
    }
}

/// Serves `stack` on an already-bound listener until `signal` resolves.
///
/// Useful when the port is chosen by the OS (`127.0.0.1:0`) and the caller
/// needs [`TcpListener::local_addr`] before serving.
pub async fn serve_listener<F>(
    listener: TcpListener,
    stack: MiddlewareStack,
    signal: F,
) -> Result<(), Error>
where
    F: Future<Output = ()>,
{
    if !stack.is_finalized() {
        return Err(Error::NotFinalized);
    }

    // Shared read-only by every connection task.
    let stack = Arc::new(stack);

    info!(addr = %listener.local_addr()?, "quake listening");

    let builder = ConnBuilder::new(TokioExecutor::new());
    let graceful = GracefulShutdown::new();
    let mut tasks = tokio::task::JoinSet::new();

    tokio::pin!(signal);

    loop {
        tokio::select! {
            // Check shutdown first so a SIGTERM stops accepting immediately.
            biased;

            () = &mut signal => {
                info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                break;
            }

            res = listener.accept() => {
                let (stream, remote_addr) = match res {
                    Ok(v) => v,
                    Err(e) => {
                        error!("accept error: {e}");
                        continue;
                    }
                };

                let stack = Arc::clone(&stack);
                let io = TokioIo::new(stream);

                // Called once per request on the connection.
                let svc = service_fn(move |req| {
                    let stack = Arc::clone(&stack);
                    async move { dispatch(stack, req, remote_addr).await }
                });

                // Watched so shutdown can close idle keep-alive connections.
                let conn = graceful.watch(builder.serve_connection(io, svc).into_owned());

                tasks.spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer = %remote_addr, "connection error: {e}");
                    }
                });
            }

            // Reap finished connection tasks so the JoinSet does not grow
            // without bound on long-running servers.
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    drop(listener);

    // Idle connections close at once; busy ones finish their current request.
    if tokio::time::timeout(DRAIN_TIMEOUT, graceful.shutdown()).await.is_err() {
        warn!(remaining = tasks.len(), "connections still open after {DRAIN_TIMEOUT:?}, aborting them");
        tasks.abort_all();
    }
    while tasks.join_next().await.is_some() {}

    info!("quake stopped");
    Ok(())
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Runs one request through the stack and produces one response.
///
/// The error type is [`Infallible`](std::convert::Infallible): body read
/// failures and handler panics are answered here, hyper never sees an error.
async fn dispatch(
    stack: Arc<MiddlewareStack>,
    req: hyper::Request<hyper::body::Incoming>,
    remote_addr: SocketAddr,
) -> Result<http::Response<Full<Bytes>>, std::convert::Infallible> {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            error!(peer = %remote_addr, "failed to read request body: {e}");
            return Ok(status_only(http::StatusCode::BAD_REQUEST));
        }
    };

    let request = Request::new(parts.method, parts.uri, parts.headers, body, remote_addr.to_string());

    let served = tokio::task::spawn_blocking(move || {
        let mut res = BufferedResponse::new();
        stack.serve(&request, &mut res).map(|()| res)
    })
    .await;

    let response = match served {
        Ok(Ok(res)) => res.into_http(),
        Ok(Err(e)) => {
            error!("cannot serve request: {e}");
            status_only(http::StatusCode::INTERNAL_SERVER_ERROR)
        }
        Err(e) => {
            error!(peer = %remote_addr, "handler panicked: {e}");
            status_only(http::StatusCode::INTERNAL_SERVER_ERROR)
        }
    };

    Ok(response)
}

fn status_only(status: http::StatusCode) -> http::Response<Full<Bytes>> {
    let mut res = http::Response::new(Full::new(Bytes::new()));
    *res.status_mut() = status;
    res
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** and **SIGINT** (Ctrl-C).
/// On Windows only Ctrl-C is available. A handler that cannot be installed
/// is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
