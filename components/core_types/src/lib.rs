//! Core failure types shared by the deferred-result runtime and its hosts.
//!
//! Every rejected promise carries a [`Rejection`]: an [`ErrorKind`] plus a
//! human-readable message, rendered the way a browser console would print a
//! thrown error.
//!
//! # Examples
//!
//! ```
//! use core_types::{ErrorKind, Rejection};
//!
//! let reason = Rejection::error("HTTP error: 404");
//! assert_eq!(reason.kind, ErrorKind::Error);
//! assert_eq!(reason.to_string(), "Error: HTTP error: 404");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;

pub use error::{ErrorKind, Rejection};
