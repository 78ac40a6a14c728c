use std::io;

use flate2::Compression;
use flate2::write::GzEncoder;
use http::{HeaderMap, StatusCode};
use tracing::warn;

use super::ResponseWriter;

/// Wraps a [`ResponseWriter`] and gzip-encodes every body byte on its way to
/// the real sink. Header and status calls pass straight through.
///
/// The gzip stream is finished when the writer is dropped, so the trailer is
/// written on every exit path, including a panic unwinding out of the handler
/// that held it. Call [`close`](Self::close) to finish early and see the error.
pub struct GzipResponseWriter<'a> {
    encoder: GzEncoder<Sink<'a>>,
}

/// `io::Write` view of a response sink, so flate2 can write into it.
struct Sink<'a>(&'a mut dyn ResponseWriter);

impl io::Write for Sink<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl<'a> GzipResponseWriter<'a> {
    pub fn new(inner: &'a mut dyn ResponseWriter, level: Compression) -> Self {
        Self { encoder: GzEncoder::new(Sink(inner), level) }
    }

    /// Writes any buffered output and the gzip trailer. Safe to call twice.
    pub fn close(&mut self) -> io::Result<()> {
        self.encoder.try_finish()
    }
}

impl ResponseWriter for GzipResponseWriter<'_> {
    fn headers(&self) -> &HeaderMap {
        self.encoder.get_ref().0.headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.encoder.get_mut().0.headers_mut()
    }

    fn write_status(&mut self, status: StatusCode) {
        self.encoder.get_mut().0.write_status(status);
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::Write::write(&mut self.encoder, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::Write::flush(&mut self.encoder)
    }
}

impl Drop for GzipResponseWriter<'_> {
    fn drop(&mut self) {
        // Status and headers are already out; all we can do is report it.
        if let Err(e) = self.close() {
            warn!(error = %e, "failed to close gzip stream");
        }
    }
}
