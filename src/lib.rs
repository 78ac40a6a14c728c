//! # quake
//!
//! A tiny HTTP middleware stack. Four decorators and a way to stack them.
//!
//! ## The contract
//!
//! A [`Handler`] reads a [`Request`] and writes into a [`ResponseWriter`].
//! A decorator turns one handler into another. A [`MiddlewareStack`] holds
//! decorators in order and wraps them around a terminal handler:
//!
//! ```text
//! request → logger → timer → dont_cache → gzip → your handler
//! response ←───────────────────────────────────────────┘
//! ```
//!
//! The first decorator added is the outermost. Nothing in here routes,
//! terminates TLS, keeps sessions, or buffers on behalf of slow clients.
//!
//! What ships:
//!
//! - [`middleware::dont_cache`]: default `Cache-Control: max-age=0, no-cache, must-revalidate`
//! - [`middleware::timer`]: per-request wall-clock time in microseconds
//! - [`middleware::logger`]: `[addr] METHOD /target -status` access lines
//! - [`middleware::gzip`]: transparent gzip when the client accepts it
//! - [`Server`]: a hyper host for a finalized stack, with graceful shutdown
//!
//! All logging goes through [`tracing`]; install a subscriber to see it.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use quake::middleware::{dont_cache, gzip, logger, timer};
//! use quake::{MiddlewareStack, Request, ResponseWriter, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut stack = MiddlewareStack::new();
//!     stack.add_all([logger, timer, dont_cache, gzip]);
//!     stack.finalize(hello);
//!
//!     Server::bind("0.0.0.0:3000").unwrap().serve(stack).await.unwrap();
//! }
//!
//! fn hello(req: &Request, res: &mut dyn ResponseWriter) {
//!     let body = format!("hello from {}", req.path());
//!     // The status is already committed once the body starts; nothing to
//!     // recover from here.
//!     let _ = res.write_all(body.as_bytes());
//! }
//! ```

mod error;
mod handler;
mod request;
mod response;
mod server;

pub mod middleware;

pub use error::Error;
pub use handler::{BoxedHandler, Handler, handler_fn};
pub use middleware::{Decorator, MiddlewareStack};
pub use request::Request;
pub use response::{BufferedResponse, GzipResponseWriter, ResponseObserver, ResponseWriter};
pub use server::{Server, serve_listener};
