use std::fmt;

use http::StatusCode;
use tracing::error;

use super::Decorator;
use crate::error::Error;
use crate::handler::{BoxedHandler, Handler};
use crate::request::Request;
use crate::response::ResponseWriter;

/// Where a [`MiddlewareStack`] is in its lifecycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StackState {
    /// No decorators, no terminal handler.
    Empty,
    /// Decorators registered, never finalized.
    Accumulating,
    /// A composed handler is ready to serve.
    Finalized,
}

/// An ordered list of decorators around one terminal handler.
///
/// Decorators run in registration order on the way in and in reverse on the
/// way out: the first one added is the outermost.
///
/// ```rust
/// use quake::middleware::{dont_cache, gzip, logger, timer};
/// use quake::{BufferedResponse, MiddlewareStack, Request, handler_fn};
///
/// let mut stack = MiddlewareStack::new();
/// stack.add(logger).add_all([timer, dont_cache, gzip]);
/// stack.finalize(handler_fn(|_req, res| {
///     let _ = res.write_all(b"hello");
/// }));
///
/// let req = Request::from_http(
///     http::Request::get("/").body(bytes::Bytes::new()).unwrap(),
///     "127.0.0.1:40000",
/// );
/// let mut res = BufferedResponse::new();
/// stack.serve(&req, &mut res).unwrap();
/// assert_eq!(res.body(), b"hello");
/// ```
///
/// Build it once at startup. Registering or finalizing needs `&mut self`, so
/// a stack shared with the server (behind an `Arc`) can no longer change.
#[derive(Default)]
pub struct MiddlewareStack {
    decorators: Vec<Box<dyn Decorator>>,
    composed: Option<BoxedHandler>,
}

impl MiddlewareStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a decorator. Returns `self` for chaining.
    ///
    /// On a finalized stack this only takes effect at the next
    /// [`finalize`](Self::finalize).
    pub fn add(&mut self, decorator: impl Decorator) -> &mut Self {
        self.decorators.push(Box::new(decorator));
        self
    }

    /// Appends several decorators, in iteration order.
    ///
    /// Plain decorator functions coerce to a common function-pointer type in
    /// an array literal, so `stack.add_all([timer, logger])` works.
    pub fn add_all<D: Decorator>(&mut self, decorators: impl IntoIterator<Item = D>) -> &mut Self {
        for decorator in decorators {
            self.add(decorator);
        }
        self
    }

    /// Sets the terminal handler and composes the chain.
    ///
    /// The decorators are folded from the last added to the first, each one
    /// wrapping the result so far. Calling it again recomposes from the
    /// current decorator list and the new terminal handler.
    pub fn finalize(&mut self, terminal: impl Handler) -> &mut Self {
        let composed = self
            .decorators
            .iter()
            .rev()
            .fold(terminal.boxed(), |next, decorator| decorator.wrap(next));
        self.composed = Some(composed);
        self
    }

    pub fn state(&self) -> StackState {
        match (&self.composed, self.decorators.is_empty()) {
            (Some(_), _) => StackState::Finalized,
            (None, true) => StackState::Empty,
            (None, false) => StackState::Accumulating,
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.composed.is_some()
    }

    /// Number of registered decorators.
    pub fn len(&self) -> usize {
        self.decorators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorators.is_empty()
    }

    /// Runs one request through the composed chain.
    ///
    /// Fails with [`Error::NotFinalized`] if no terminal handler was set.
    pub fn serve(&self, req: &Request, res: &mut dyn ResponseWriter) -> Result<(), Error> {
        let handler = self.composed.as_ref().ok_or(Error::NotFinalized)?;
        handler.serve(req, res);
        Ok(())
    }
}

/// A finalized stack is itself a handler, so stacks nest.
///
/// An unfinalized one logs the misconfiguration and answers `500`.
impl Handler for MiddlewareStack {
    fn serve(&self, req: &Request, res: &mut dyn ResponseWriter) {
        if let Err(e) = MiddlewareStack::serve(self, req, res) {
            error!(error = %e, path = req.path(), "cannot serve request");
            res.write_status(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}

impl fmt::Debug for MiddlewareStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareStack")
            .field("decorators", &self.decorators.len())
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::handler::handler_fn;
    use crate::middleware::test_support::request;
    use crate::response::BufferedResponse;

    type Trace = Arc<Mutex<Vec<String>>>;

    /// A decorator that records `<name>-before` / `<name>-after` around the call.
    fn recorder(name: &'static str, trace: &Trace) -> impl Decorator + use<> {
        let trace = Arc::clone(trace);
        move |next: BoxedHandler| -> BoxedHandler {
            let trace = Arc::clone(&trace);
            Arc::new(handler_fn(move |req, res| {
                trace.lock().unwrap().push(format!("{name}-before"));
                next.serve(req, res);
                trace.lock().unwrap().push(format!("{name}-after"));
            }))
        }
    }

    fn terminal(trace: &Trace) -> impl Handler + use<> {
        let trace = Arc::clone(trace);
        handler_fn(move |_req, res| {
            trace.lock().unwrap().push("T".to_owned());
            res.write_all(b"terminal").unwrap();
        })
    }

    fn run(stack: &MiddlewareStack) -> BufferedResponse {
        let mut res = BufferedResponse::new();
        stack.serve(&request("/", "127.0.0.1:1"), &mut res).unwrap();
        res
    }

    #[test]
    fn first_registered_runs_outermost() {
        let trace = Trace::default();
        let mut stack = MiddlewareStack::new();
        stack.add(recorder("A", &trace));
        stack.add(recorder("B", &trace));
        stack.finalize(terminal(&trace));

        run(&stack);

        assert_eq!(*trace.lock().unwrap(), ["A-before", "B-before", "T", "B-after", "A-after"]);
    }

    #[test]
    fn add_all_keeps_call_order() {
        let trace = Trace::default();
        let mut stack = MiddlewareStack::new();
        stack.add_all([recorder("A", &trace), recorder("A", &trace)]);
        stack.add(recorder("B", &trace));
        stack.finalize(terminal(&trace));

        run(&stack);

        assert_eq!(
            *trace.lock().unwrap(),
            ["A-before", "A-before", "B-before", "T", "B-after", "A-after", "A-after"]
        );
    }

    #[test]
    fn no_decorators_serves_the_terminal_directly() {
        let trace = Trace::default();
        let mut stack = MiddlewareStack::new();
        stack.finalize(terminal(&trace));

        let res = run(&stack);

        assert_eq!(res.body(), b"terminal");
        assert_eq!(*trace.lock().unwrap(), ["T"]);
    }

    #[test]
    fn finalizing_twice_behaves_like_once() {
        let once = Trace::default();
        let twice = Trace::default();

        let mut a = MiddlewareStack::new();
        a.add(recorder("A", &once)).finalize(terminal(&once));

        let mut b = MiddlewareStack::new();
        b.add(recorder("A", &twice));
        b.finalize(terminal(&twice));
        b.finalize(terminal(&twice));

        let res_a = run(&a);
        let res_b = run(&b);

        assert_eq!(res_a.body(), res_b.body());
        assert_eq!(*once.lock().unwrap(), *twice.lock().unwrap());
    }

    #[test]
    fn add_after_finalize_waits_for_the_next_finalize() {
        let trace = Trace::default();
        let mut stack = MiddlewareStack::new();
        stack.finalize(terminal(&trace));
        stack.add(recorder("late", &trace));

        run(&stack);
        assert_eq!(*trace.lock().unwrap(), ["T"]);

        trace.lock().unwrap().clear();
        stack.finalize(terminal(&trace));
        run(&stack);
        assert_eq!(*trace.lock().unwrap(), ["late-before", "T", "late-after"]);
    }

    #[test]
    fn lifecycle_states() {
        let trace = Trace::default();
        let mut stack = MiddlewareStack::new();
        assert_eq!(stack.state(), StackState::Empty);
        assert!(stack.is_empty());

        stack.add(recorder("A", &trace));
        assert_eq!(stack.state(), StackState::Accumulating);
        assert_eq!(stack.len(), 1);

        stack.finalize(terminal(&trace));
        assert_eq!(stack.state(), StackState::Finalized);

        stack.add(recorder("B", &trace));
        assert_eq!(stack.state(), StackState::Finalized);
    }

    #[test]
    fn serving_unfinalized_is_a_configuration_error() {
        let stack = MiddlewareStack::new();
        let mut res = BufferedResponse::new();

        let err = stack.serve(&request("/", "127.0.0.1:1"), &mut res).unwrap_err();

        assert!(matches!(err, Error::NotFinalized));
        assert!(!res.is_committed());
    }

    #[test]
    fn unfinalized_stack_as_handler_answers_500() {
        let stack = MiddlewareStack::new();
        let mut res = BufferedResponse::new();

        Handler::serve(&stack, &request("/", "127.0.0.1:1"), &mut res);

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn debug_reports_the_lifecycle() {
        let trace = Trace::default();
        let mut stack = MiddlewareStack::new();
        stack.add(recorder("A", &trace));
        assert_eq!(
            format!("{stack:?}"),
            "MiddlewareStack { decorators: 1, state: Accumulating }"
        );

        stack.finalize(terminal(&trace));
        assert_eq!(format!("{stack:?}"), "MiddlewareStack { decorators: 1, state: Finalized }");
    }

    #[test]
    fn stacks_nest() {
        let trace = Trace::default();
        let mut inner = MiddlewareStack::new();
        inner.add(recorder("inner", &trace)).finalize(terminal(&trace));

        let mut outer = MiddlewareStack::new();
        outer.add(recorder("outer", &trace)).finalize(inner);

        run(&outer);

        assert_eq!(
            *trace.lock().unwrap(),
            ["outer-before", "inner-before", "T", "inner-after", "outer-after"]
        );
    }
}
