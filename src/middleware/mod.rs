//! Middleware layer.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns. A middleware here is a [`Decorator`]: a function
//! from one [`BoxedHandler`] to another. Four ship with the crate:
//!
//! | Decorator | Effect |
//! |---|---|
//! | [`dont_cache`] | default `Cache-Control: max-age=0, no-cache, must-revalidate` |
//! | [`timer`] | logs `<micros> <path>` after the handler returns |
//! | [`logger`] | logs `[<addr>] <METHOD> /<target> -<status>` per request |
//! | [`gzip`] | gzip-encodes the body when the client accepts it |
//!
//! Writing your own is one function:
//!
//! ```rust
//! use std::sync::Arc;
//! use quake::{BoxedHandler, handler_fn};
//!
//! fn powered_by(next: BoxedHandler) -> BoxedHandler {
//!     Arc::new(handler_fn(move |req, res| {
//!         res.headers_mut().insert("x-powered-by", "quake".parse().unwrap());
//!         next.serve(req, res);
//!     }))
//! }
//! ```
//!
//! Decorators are composed by [`MiddlewareStack`].

use crate::handler::BoxedHandler;

mod cache;
mod gzip;
mod logger;
mod stack;
mod timer;

pub use flate2::Compression;

pub use cache::dont_cache;
pub use gzip::{gzip, gzip_with_level};
pub use logger::logger;
pub use stack::{MiddlewareStack, StackState};
pub use timer::timer;

/// Wraps a handler to produce an augmented handler.
///
/// Implemented for every `Fn(BoxedHandler) -> BoxedHandler`, so plain
/// functions such as [`logger`] are decorators as they are.
pub trait Decorator: Send + Sync + 'static {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler;
}

impl<F> Decorator for F
where
    F: Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static,
{
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        self(next)
    }
}
