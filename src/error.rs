//! Unified error type.

use std::fmt;

/// The error type returned by quake's fallible operations.
///
/// Handler-level failures are never turned into `Error`s: a handler either
/// writes a response or panics, and the decorators pass both through untouched.
/// This type surfaces misconfiguration and infrastructure failures.
#[derive(Debug)]
pub enum Error {
    /// Binding to a port or accepting a connection failed.
    Io(std::io::Error),
    /// The address handed to [`Server::bind`](crate::Server::bind) is not a
    /// valid `host:port` pair.
    InvalidAddress(String),
    /// A [`MiddlewareStack`](crate::MiddlewareStack) was asked to serve before
    /// [`finalize`](crate::MiddlewareStack::finalize) set its terminal handler.
    NotFinalized,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::InvalidAddress(addr) => write!(f, "invalid socket address `{addr}`"),
            Self::NotFinalized => {
                f.write_str("middleware stack served before a terminal handler was set")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::InvalidAddress(_) | Self::NotFinalized => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn io_errors_keep_their_source() {
        let err = Error::from(std::io::Error::other("boom"));
        assert_eq!(err.to_string(), "io: boom");
        assert!(err.source().is_some());
    }

    #[test]
    fn configuration_errors_have_no_source() {
        assert!(Error::NotFinalized.source().is_none());
        assert_eq!(
            Error::InvalidAddress("nope".into()).to_string(),
            "invalid socket address `nope`"
        );
    }
}
