use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::handler::{BoxedHandler, Handler};
use crate::request::Request;
use crate::response::ResponseWriter;

/// Logs how long the wrapped handler took, as `<microseconds> <path>`.
///
/// Only wall-clock time is observed; the response is left alone. The line is
/// also written when the handler panics, the panic itself keeps unwinding.
pub fn timer(next: BoxedHandler) -> BoxedHandler {
    Arc::new(Timer { next })
}

struct Timer {
    next: BoxedHandler,
}

impl Handler for Timer {
    fn serve(&self, req: &Request, res: &mut dyn ResponseWriter) {
        let _elapsed = Elapsed { start: Instant::now(), path: req.path() };
        self.next.serve(req, res);
    }
}

/// Emits the timing line on drop.
struct Elapsed<'a> {
    start: Instant,
    path: &'a str,
}

impl Drop for Elapsed<'_> {
    fn drop(&mut self) {
        info!("{} {}", self.start.elapsed().as_micros(), self.path);
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::time::Duration;

    use super::*;
    use crate::handler::handler_fn;
    use crate::middleware::test_support::{capture_logs, request};
    use crate::response::BufferedResponse;

    fn logged_micros(logs: &str, path: &str) -> u128 {
        let line = logs.lines().find(|l| l.ends_with(path)).unwrap();
        line.trim().split(' ').next().unwrap().parse().unwrap()
    }

    #[test]
    fn logs_elapsed_microseconds_and_path() {
        let handler = timer(
            handler_fn(|_req, res| {
                std::thread::sleep(Duration::from_millis(5));
                res.write_all(b"done").unwrap();
            })
            .boxed(),
        );

        let mut res = BufferedResponse::new();
        let logs = capture_logs(|| handler.serve(&request("/slow?x=1", "127.0.0.1:1"), &mut res));

        assert!(logged_micros(&logs, " /slow") >= 5_000);
        assert_eq!(res.body(), b"done");
    }

    #[test]
    fn leaves_the_response_untouched() {
        let handler = timer(
            handler_fn(|_req, res| {
                res.write_status(http::StatusCode::NO_CONTENT);
            })
            .boxed(),
        );

        let mut res = BufferedResponse::new();
        handler.serve(&request("/", "127.0.0.1:1"), &mut res);

        assert_eq!(res.status(), http::StatusCode::NO_CONTENT);
        assert!(res.sent_headers().is_empty());
    }

    #[test]
    fn logs_even_when_the_handler_panics() {
        let handler = timer(handler_fn(|_req, _res| panic!("boom")).boxed());

        let logs = capture_logs(|| {
            let mut res = BufferedResponse::new();
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                handler.serve(&request("/explode", "127.0.0.1:1"), &mut res);
            }));
            assert!(outcome.is_err());
        });

        assert!(logs.lines().any(|l| l.ends_with(" /explode")));
    }
}
