//! The response sink and its wrappers.
//!
//! A handler never builds a response value. It writes one, piece by piece,
//! into a [`ResponseWriter`]: headers first, then the status, then the body.
//! That shape is what lets decorators wrap the sink. A wrapper holds the real
//! writer, forwards every call, and overrides only the one it cares about:
//!
//! ```text
//! ResponseObserver     ← records the status that went out
//! GzipResponseWriter   ← pushes body bytes through a gzip stream
//!        ↓ forwards to
//! BufferedResponse     ← the real sink, turned into an http::Response by the server
//! ```
//!
//! # Commit rules
//!
//! Headers are mutable until the response is *committed*. The first
//! [`write_status`](ResponseWriter::write_status) commits it; so does the first
//! [`write`](ResponseWriter::write), with an implicit `200 OK`. After that the
//! status is fixed and header changes no longer reach the client.

use std::io;

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use http_body_util::Full;
use tracing::warn;

mod gzip;
mod observer;

pub use gzip::GzipResponseWriter;
pub use observer::ResponseObserver;

// ── ResponseWriter ────────────────────────────────────────────────────────────

/// The output channel a handler writes status, headers, and body bytes to.
///
/// Every sink wrapper in this crate implements the whole trait by delegation,
/// so a handler cannot tell whether it is talking to the real sink or to a
/// wrapper stacked on top of it.
pub trait ResponseWriter {
    /// Headers that will be sent when the response is committed.
    fn headers(&self) -> &HeaderMap;

    /// Mutable access to the pending headers. Last write wins.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Commits the status line and the current headers.
    ///
    /// Only the first call has an effect.
    fn write_status(&mut self, status: StatusCode);

    /// Appends body bytes, committing `200 OK` first if nothing was committed.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    fn flush(&mut self) -> io::Result<()>;

    /// Writes the entire buffer, retrying short writes.
    fn write_all(&mut self, mut buf: &[u8]) -> io::Result<()> {
        while !buf.is_empty() {
            match self.write(buf) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => buf = &buf[n..],
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

// ── BufferedResponse ──────────────────────────────────────────────────────────

/// The real sink: collects one response in memory.
///
/// The server creates one per request and converts it with
/// [`into_http`](BufferedResponse::into_http) once the handler chain returns.
/// Tests use it the same way to inspect what a chain produced.
#[derive(Debug, Default)]
pub struct BufferedResponse {
    headers: HeaderMap,
    committed: Option<(StatusCode, HeaderMap)>,
    body: Vec<u8>,
}

impl BufferedResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// The status the client receives. `200 OK` if the handler never set one.
    pub fn status(&self) -> StatusCode {
        self.committed.as_ref().map_or(StatusCode::OK, |(status, _)| *status)
    }

    /// Headers the client receives: the snapshot taken at commit time, or the
    /// pending headers if nothing was committed.
    pub fn sent_headers(&self) -> &HeaderMap {
        self.committed.as_ref().map_or(&self.headers, |(_, headers)| headers)
    }

    /// Convenience lookup into [`sent_headers`](Self::sent_headers).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.sent_headers().get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn is_committed(&self) -> bool {
        self.committed.is_some()
    }

    /// Converts the collected response into the type hyper sends.
    pub fn into_http(self) -> http::Response<Full<Bytes>> {
        let (status, headers) = self.committed.unwrap_or((StatusCode::OK, self.headers));
        let mut res = http::Response::new(Full::new(Bytes::from(self.body)));
        *res.status_mut() = status;
        *res.headers_mut() = headers;
        res
    }
}

impl ResponseWriter for BufferedResponse {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_status(&mut self, status: StatusCode) {
        if let Some((sent, _)) = &self.committed {
            warn!(%sent, ignored = %status, "superfluous write_status call");
            return;
        }
        self.committed = Some((status, self.headers.clone()));
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.committed.is_none() {
            self.write_status(StatusCode::OK);
        }
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
