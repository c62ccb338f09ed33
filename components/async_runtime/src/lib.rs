//! Single-threaded async runtime built around deferred results.
//!
//! This crate provides:
//! - Event loop with task, microtask and timer queues
//! - [`Promise`], a deferred result with chained continuations
//! - Combinators over promise collections ([`all`], [`race`], [`all_settled`])
//! - Suspending functions: `async` blocks that await promises ([`spawn_async`])
//! - Unhandled rejection reporting through an injectable [`RejectionSink`]
//!
//! # Overview
//!
//! Everything runs on one thread. Observers attached to a promise are queued
//! as microtasks and run to completion one at a time; suspension only happens
//! at `.await` points.
//!
//! # Examples
//!
//! ## Continuation Chain
//!
//! ```
//! use async_runtime::{EventLoop, Promise};
//! use core_types::Rejection;
//!
//! let event_loop = EventLoop::new();
//! let source: Promise<u16> = Promise::resolved(&event_loop, 404);
//!
//! let checked = source
//!     .then(|status| {
//!         if !(200..300).contains(&status) {
//!             return Err(Rejection::error(format!("HTTP error: {status}")));
//!         }
//!         Ok(status)
//!     })
//!     .then(|status| Ok(status.to_string()))
//!     .catch(|reason| Ok(format!("Could not get products: {reason}")));
//!
//! event_loop.run_until_done();
//! assert_eq!(
//!     checked.value().as_deref(),
//!     Some("Could not get products: Error: HTTP error: 404")
//! );
//! ```
//!
//! ## Suspension
//!
//! ```
//! use async_runtime::{spawn_async, EventLoop, Promise};
//!
//! let event_loop = EventLoop::new();
//! let first = Promise::resolved(&event_loop, 20);
//! let el = event_loop.clone();
//!
//! let sum = spawn_async(&event_loop, async move {
//!     let a = first.await?;
//!     let b = Promise::resolved(&el, 22).await?;
//!     Ok(a + b)
//! });
//!
//! event_loop.run_until_done();
//! assert_eq!(sum.value(), Some(42));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod combinators;
pub mod event_loop;
pub mod promise;
pub mod rejection;
pub mod suspend;
pub mod task_queue;

// Re-export main types at crate root
pub use combinators::{all, all_settled, race};
pub use event_loop::{ClockMode, EventLoop, EventLoopBuilder};
pub use promise::{OnFulfilled, OnRejected, Promise, PromiseState, Rejecter, Resolver, Settled};
pub use rejection::{PromiseId, RecordingSink, RejectionSink, TracingSink, UnhandledRejection};
pub use suspend::spawn_async;
pub use task_queue::{MicroTask, MicrotaskQueue, Task, TaskQueue, TimerId, TimerQueue};
