//! Asynchronous programming walkthrough
//!
//! Each module is one section of the walkthrough, written against the
//! promise runtime and the simulated web platform:
//! - [`primes`]: a long synchronous job blocking a click handler
//! - [`event_handlers`]: an evented request reporting through `loadend`
//! - [`callbacks`]: a callback pyramid and its flattened chain
//! - [`promises`]: fetching with chains, `catch`, `all` and `async` blocks
//! - [`implement`]: wiring a promise-based API into a page
//!
//! The [`Runner`] ties them to the `corten-async` binary.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod callbacks;
pub mod cli;
pub mod config;
pub mod console;
pub mod error;
pub mod event_handlers;
pub mod implement;
pub mod primes;
pub mod promises;
pub mod runner;

pub use cli::{Cli, Lesson};
pub use config::LessonConfig;
pub use console::{Console, ConsoleLine};
pub use error::{LessonError, LessonResult};
pub use runner::Runner;
