//! Incoming HTTP request type.

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};

/// An incoming HTTP request, as seen by every handler in the chain.
///
/// Handlers receive it by shared reference: decorators only read it, and the
/// response goes out through the [`ResponseWriter`](crate::ResponseWriter).
#[derive(Debug)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) uri: Uri,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
    pub(crate) remote_addr: String,
}

impl Request {
    pub(crate) fn new(
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
        remote_addr: String,
    ) -> Self {
        Self { method, uri, headers, body, remote_addr }
    }

    /// Builds a request from an `http::Request` and the peer address it came
    /// from (usually `ip:port`).
    ///
    /// ```rust
    /// use bytes::Bytes;
    /// use quake::Request;
    ///
    /// let req = Request::from_http(
    ///     http::Request::get("/users/42").body(Bytes::new()).unwrap(),
    ///     "203.0.113.5:54321",
    /// );
    /// assert_eq!(req.path(), "/users/42");
    /// ```
    pub fn from_http(req: http::Request<Bytes>, remote_addr: impl Into<String>) -> Self {
        let (parts, body) = req.into_parts();
        Self::new(parts.method, parts.uri, parts.headers, body, remote_addr.into())
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// The peer address, port included when the host knows it.
    pub fn remote_addr(&self) -> &str { &self.remote_addr }

    /// The URI path, without the query string.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// The request target as received: path plus query string.
    pub fn target(&self) -> &str {
        self.uri.path_and_query().map_or_else(|| self.uri.path(), |pq| pq.as_str())
    }

    /// Case-insensitive header lookup. Values that are not visible ASCII are
    /// treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
