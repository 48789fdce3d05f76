//! Error types for import1 operations.

use std::fmt;

/// Alias for `Result<T, import1::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by [`Session`](crate::Session) and [`Manager`](crate::Manager).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Opening, authenticating or registering on the bus failed, or the
    /// session was closed.
    #[error("system bus connection failed ({stage}): {source}")]
    Connection {
        /// Where the connection broke down.
        stage: Stage,
        /// The underlying transport failure.
        #[source]
        source: BusError,
    },

    /// A dispatched call failed at the transport or was rejected by the
    /// service.
    #[error("{method} failed: {source}")]
    RemoteCall {
        /// Interface-qualified method name.
        method: String,
        /// The transport or service error, verbatim.
        #[source]
        source: BusError,
    },

    /// The reply did not have the shape the protocol promises.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl Error {
    /// Wraps a transport failure raised at `stage`.
    pub(crate) fn connection(stage: Stage, source: BusError) -> Self {
        Self::Connection { stage, source }
    }
}

/// Stage of the connection lifecycle an [`Error::Connection`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Stage {
    /// Opening the private socket.
    Open,
    /// EXTERNAL authentication.
    Authenticate,
    /// `org.freedesktop.DBus.Hello` registration.
    Hello,
    /// The session has been closed.
    Closed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Open => "open",
            Self::Authenticate => "authenticate",
            Self::Hello => "hello",
            Self::Closed => "closed",
        })
    }
}

/// Failures reported by a bus transport.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BusError {
    /// The remote side answered with an error reply.
    #[error("{name}: {message}")]
    Remote {
        /// D-Bus error name (e.g. `org.freedesktop.DBus.Error.AccessDenied`).
        name: String,
        /// Human-readable message supplied by the service.
        message: String,
    },

    /// The connection was closed.
    #[error("connection closed")]
    Closed,

    /// A call was attempted before authentication completed.
    #[error("connection is not authenticated")]
    NotAuthenticated,

    /// The bus address could not be used.
    #[error("unusable bus address: {0}")]
    Address(String),

    /// Socket-level I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Authentication, marshalling or other protocol-level failure.
    #[error("{0}")]
    Protocol(String),
}

/// A reply value did not decode to the expected type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("reply position {position}: expected {expected}, got {}", .actual.as_deref().unwrap_or("nothing"))]
#[non_exhaustive]
pub struct DecodeError {
    /// Zero-based position in the reply tuple.
    pub position: usize,
    /// Description of the expected type.
    pub expected: &'static str,
    /// Rendering of the received value, `None` if the reply was too short.
    pub actual: Option<String>,
}

impl DecodeError {
    /// Creates a decode error for `position`.
    pub(crate) fn new(
        position: usize,
        expected: &'static str,
        actual: Option<&import1_proto::Value>,
    ) -> Self {
        Self {
            position,
            expected,
            actual: actual.map(ToString::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use import1_proto::Value;

    use super::*;

    #[test]
    fn decode_error_names_position_type_and_value() {
        let e = DecodeError::new(0, "unsigned integer", Some(&Value::Str("x".into())));
        assert_eq!(
            e.to_string(),
            "reply position 0: expected unsigned integer, got \"x\""
        );
    }

    #[test]
    fn decode_error_reports_missing_value() {
        let e = DecodeError::new(1, "object path", None);
        assert_eq!(e.to_string(), "reply position 1: expected object path, got nothing");
    }

    #[test]
    fn remote_error_is_verbatim() {
        let e = Error::RemoteCall {
            method: "org.freedesktop.import1.Manager.ImportTar".into(),
            source: BusError::Remote {
                name: "org.freedesktop.DBus.Error.AccessDenied".into(),
                message: "Access denied".into(),
            },
        };
        assert_eq!(
            e.to_string(),
            "org.freedesktop.import1.Manager.ImportTar failed: \
             org.freedesktop.DBus.Error.AccessDenied: Access denied"
        );
    }
}
