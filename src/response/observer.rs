use std::io;

use http::{HeaderMap, StatusCode};

use super::ResponseWriter;

/// Wraps a [`ResponseWriter`] and remembers the status that went out.
///
/// Everything is forwarded untouched. The recorded status starts at
/// `200 OK`, which is what the client gets when a handler writes a body
/// without ever calling `write_status`.
pub struct ResponseObserver<'a> {
    inner: &'a mut dyn ResponseWriter,
    status: StatusCode,
    committed: bool,
}

impl<'a> ResponseObserver<'a> {
    pub fn new(inner: &'a mut dyn ResponseWriter) -> Self {
        Self { inner, status: StatusCode::OK, committed: false }
    }

    /// The status committed so far.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl ResponseWriter for ResponseObserver<'_> {
    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn write_status(&mut self, status: StatusCode) {
        // Later calls are ignored by the sink; mirror that.
        if !self.committed {
            self.status = status;
            self.committed = true;
        }
        self.inner.write_status(status);
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.committed = true;
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::BufferedResponse;

    #[test]
    fn records_explicit_status() {
        let mut sink = BufferedResponse::new();
        let mut observer = ResponseObserver::new(&mut sink);
        observer.write_status(StatusCode::IM_A_TEAPOT);
        assert_eq!(observer.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(sink.status(), StatusCode::IM_A_TEAPOT);
    }

    #[test]
    fn defaults_to_ok() {
        let mut sink = BufferedResponse::new();
        let observer = ResponseObserver::new(&mut sink);
        assert_eq!(observer.status(), StatusCode::OK);
    }

    #[test]
    fn body_first_pins_ok() {
        let mut sink = BufferedResponse::new();
        let mut observer = ResponseObserver::new(&mut sink);
        observer.write_all(b"body").unwrap();
        observer.write_status(StatusCode::BAD_GATEWAY);
        assert_eq!(observer.status(), StatusCode::OK);
        assert_eq!(sink.status(), StatusCode::OK);
        assert_eq!(sink.body(), b"body");
    }

    #[test]
    fn bytes_pass_through_unchanged() {
        let mut sink = BufferedResponse::new();
        let mut observer = ResponseObserver::new(&mut sink);
        observer.write_status(StatusCode::CREATED);
        observer.write_all(b"abc").unwrap();
        observer.write_all(b"def").unwrap();
        observer.flush().unwrap();
        assert_eq!(sink.body(), b"abcdef");
    }
}
