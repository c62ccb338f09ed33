//! Failure reasons carried by rejected promises.
//!
//! The kinds mirror the built-in error constructors a script would throw,
//! plus a network kind for transport failures.

use std::fmt;
use thiserror::Error;

/// The kind of failure.
///
/// These correspond to the built-in error constructors of a browser scripting
/// environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Plain `Error`
    Error,
    /// Type error (e.g. reading a property of a missing element)
    TypeError,
    /// Value out of allowed range
    RangeError,
    /// Malformed input, such as a response body that is not valid JSON
    SyntaxError,
    /// Transport-level failure
    NetworkError,
    /// Internal runtime error
    InternalError,
}

impl ErrorKind {
    /// Returns the constructor name used when rendering the error.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::NetworkError => "NetworkError",
            ErrorKind::InternalError => "InternalError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The reason a deferred result was rejected.
///
/// # Examples
///
/// ```
/// use core_types::{ErrorKind, Rejection};
///
/// let reason = Rejection::type_error("Failed to fetch");
/// assert_eq!(reason.kind, ErrorKind::TypeError);
/// assert_eq!(reason.to_string(), "TypeError: Failed to fetch");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct Rejection {
    /// The type of failure
    pub kind: ErrorKind,
    /// Human-readable failure message
    pub message: String,
}

impl Rejection {
    /// Creates a rejection of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates a plain `Error` rejection.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Error, message)
    }

    /// Creates a `TypeError` rejection.
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    /// Creates a `RangeError` rejection.
    pub fn range_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RangeError, message)
    }

    /// Creates a `SyntaxError` rejection.
    pub fn syntax_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SyntaxError, message)
    }

    /// Creates a `NetworkError` rejection.
    pub fn network_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NetworkError, message)
    }

    /// Creates an `InternalError` rejection.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, message)
    }
}
