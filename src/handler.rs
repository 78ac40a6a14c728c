//! Handler trait and type erasure.
//!
//! # How handlers are stored
//!
//! A decorator takes "some handler" and returns "some other handler", and a
//! [`MiddlewareStack`](crate::MiddlewareStack) folds an arbitrary number of
//! them. Every step of that fold has a different concrete type, so each one is
//! erased behind the same trait object:
//!
//! ```text
//! fn hello(req: &Request, res: &mut dyn ResponseWriter) { … }  ← user writes this
//!        ↓ stack.finalize(hello)
//! hello.boxed()                         ← Handler blanket impl
//!        ↓  BoxedHandler = Arc<dyn Handler>
//! logger(dont_cache(hello.boxed()))     ← each decorator wraps the previous Arc
//!        ↓
//! handler.serve(&req, &mut res)         ← one virtual call per layer
//! ```
//!
//! `Arc` rather than `Box` because the server shares one composed chain across
//! every concurrent request.

use std::sync::Arc;

use crate::request::Request;
use crate::response::ResponseWriter;

/// A heap-allocated, type-erased handler shared across concurrent requests.
pub type BoxedHandler = Arc<dyn Handler>;

/// Anything that can answer a request by writing into a response sink.
///
/// Implemented automatically for every function or closure with the signature
///
/// ```text
/// fn name(req: &Request, res: &mut dyn ResponseWriter)
/// ```
///
/// and by the decorator wrappers in [`middleware`](crate::middleware).
///
/// Handlers run synchronously. Failures are expressed by writing an error
/// status, or by panicking; nothing in this crate catches the panic.
pub trait Handler: Send + Sync + 'static {
    fn serve(&self, req: &Request, res: &mut dyn ResponseWriter);

    /// Erases the concrete type.
    fn boxed(self) -> BoxedHandler
    where
        Self: Sized,
    {
        Arc::new(self)
    }
}

impl<F> Handler for F
where
    F: Fn(&Request, &mut dyn ResponseWriter) + Send + Sync + 'static,
{
    fn serve(&self, req: &Request, res: &mut dyn ResponseWriter) {
        self(req, res);
    }
}

/// Pins a closure to the handler signature.
///
/// Closure parameter types are not inferred from a blanket impl, so
/// `|req, res| …` alone does not compile where an `impl Handler` is expected.
/// Passing it through `handler_fn` fixes the types:
///
/// ```rust
/// use quake::{handler_fn, MiddlewareStack};
///
/// let mut stack = MiddlewareStack::new();
/// stack.finalize(handler_fn(|_req, res| {
///     let _ = res.write_all(b"hello");
/// }));
/// ```
pub fn handler_fn<F>(f: F) -> F
where
    F: Fn(&Request, &mut dyn ResponseWriter) + Send + Sync + 'static,
{
    f
}
