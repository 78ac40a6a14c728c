use std::sync::Arc;

use tracing::info;

use crate::handler::{BoxedHandler, Handler};
use crate::request::Request;
use crate::response::{ResponseObserver, ResponseWriter};

/// Logs one access line per request:
///
/// ```text
/// [203.0.113.5] GET /users/42?full=1 -200
/// ```
///
/// The port is cut from the peer address at the last `:`. That is not
/// bracket-aware, so a bare IPv6 peer loses its last group. The built-in server
/// passes IPv6 peers as `[::1]:port`, which logs as `[[::1]]`. The status is the
/// one the handler committed, `200` if it never set one. The line is written
/// even if the handler panics.
pub fn logger(next: BoxedHandler) -> BoxedHandler {
    Arc::new(Logger { next })
}

struct Logger {
    next: BoxedHandler,
}

impl Handler for Logger {
    fn serve(&self, req: &Request, res: &mut dyn ResponseWriter) {
        let mut access = AccessLog { req, observer: ResponseObserver::new(res) };
        self.next.serve(req, &mut access.observer);
    }
}

/// Owns the observer for the duration of the request and logs on drop.
struct AccessLog<'r, 'w> {
    req: &'r Request,
    observer: ResponseObserver<'w>,
}

impl Drop for AccessLog<'_, '_> {
    fn drop(&mut self) {
        info!(
            "[{}] {} /{} -{}",
            strip_port(self.req.remote_addr()),
            self.req.method(),
            strip_leading_slash(self.req.target()),
            self.observer.status().as_u16(),
        );
    }
}

fn strip_port(addr: &str) -> &str {
    addr.rfind(':').map_or(addr, |i| &addr[..i])
}

fn strip_leading_slash(target: &str) -> &str {
    target.strip_prefix('/').unwrap_or(target)
}
