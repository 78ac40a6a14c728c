use std::sync::Arc;

use http::HeaderValue;
use http::header::CACHE_CONTROL;

use crate::handler::{BoxedHandler, Handler};
use crate::request::Request;
use crate::response::ResponseWriter;

const NO_CACHE: &str = "max-age=0, no-cache, must-revalidate";

/// Marks every response as non-cacheable unless the handler says otherwise.
///
/// The header is set *before* the wrapped handler runs, so a handler that
/// writes its own `Cache-Control` replaces it.
pub fn dont_cache(next: BoxedHandler) -> BoxedHandler {
    Arc::new(DontCache { next })
}

struct DontCache {
    next: BoxedHandler,
}

impl Handler for DontCache {
    fn serve(&self, req: &Request, res: &mut dyn ResponseWriter) {
        res.headers_mut().insert(CACHE_CONTROL, HeaderValue::from_static(NO_CACHE));
        self.next.serve(req, res);
    }
}
