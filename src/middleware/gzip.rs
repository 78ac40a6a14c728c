use std::sync::Arc;

use flate2::Compression;
use http::HeaderValue;
use http::header::{ACCEPT_ENCODING, CONTENT_ENCODING};

use super::Decorator;
use crate::handler::{BoxedHandler, Handler};
use crate::request::Request;
use crate::response::{GzipResponseWriter, ResponseWriter};

/// Gzip-encodes the response body when the request's `Accept-Encoding`
/// mentions `gzip`. Any other request passes through untouched.
///
/// Uses flate2's default compression level; see [`gzip_with_level`].
pub fn gzip(next: BoxedHandler) -> BoxedHandler {
    Arc::new(Gzip { next, level: Compression::default() })
}

/// [`gzip`] with an explicit compression level.
///
/// ```rust
/// use quake::MiddlewareStack;
/// use quake::middleware::{Compression, gzip_with_level};
///
/// let mut stack = MiddlewareStack::new();
/// stack.add(gzip_with_level(Compression::fast()));
/// ```
pub fn gzip_with_level(level: Compression) -> impl Decorator {
    move |next: BoxedHandler| -> BoxedHandler { Arc::new(Gzip { next, level }) }
}

struct Gzip {
    next: BoxedHandler,
    level: Compression,
}

impl Handler for Gzip {
    fn serve(&self, req: &Request, res: &mut dyn ResponseWriter) {
        // Substring match: "gzip;q=0" still counts, as does "x-gzip".
        let accepts_gzip = req.header(ACCEPT_ENCODING.as_str()).is_some_and(|v| v.contains("gzip"));
        if !accepts_gzip {
            self.next.serve(req, res);
            return;
        }

        res.headers_mut().insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        let mut gz = GzipResponseWriter::new(res, self.level);
        self.next.serve(req, &mut gz);
    }
}
