//! Unhandled rejection reporting.
//!
//! A promise that rejects while nobody observes it is tracked. Attaching an
//! observer before the end of the current microtask checkpoint untracks it
//! silently. Whatever is still tracked when the checkpoint ends is handed to
//! the event loop's [`RejectionSink`] exactly once.
//!
//! Reported promises are remembered so a late observer can be announced.
//! An entry is dropped once its promise is gone, since nothing can observe
//! it any more; the set is bounded by the reported promises still alive.

use core_types::Rejection;
use std::cell::RefCell;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Identity of a promise within one event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PromiseId(pub(crate) u64);

impl fmt::Display for PromiseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "promise#{}", self.0)
    }
}

/// A rejection nobody handled by the end of a checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct UnhandledRejection {
    /// The promise that rejected
    pub promise: PromiseId,
    /// Why it rejected
    pub reason: Rejection,
}

/// Receives reports the event loop cannot deliver anywhere else.
///
/// Installed once when the loop is built; see
/// [`EventLoopBuilder::rejection_sink`](crate::EventLoopBuilder::rejection_sink).
pub trait RejectionSink {
    /// A rejection reached the end of its chain unobserved.
    fn unhandled(&self, report: &UnhandledRejection);

    /// An observer was attached to a promise already reported as unhandled.
    fn handled_late(&self, _promise: PromiseId) {}

    /// A host task failed.
    fn uncaught_error(&self, _reason: &Rejection) {}
}

/// Default sink: reports through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl RejectionSink for TracingSink {
    fn unhandled(&self, report: &UnhandledRejection) {
        tracing::error!(promise = %report.promise, reason = %report.reason, "Uncaught (in promise)");
    }

    fn handled_late(&self, promise: PromiseId) {
        tracing::warn!(%promise, "rejection handled asynchronously");
    }

    fn uncaught_error(&self, reason: &Rejection) {
        tracing::error!(%reason, "Uncaught");
    }
}

#[derive(Debug, Default)]
struct Recorded {
    unhandled: Vec<UnhandledRejection>,
    handled_late: Vec<PromiseId>,
    uncaught: Vec<Rejection>,
}

/// Sink that keeps every report for later inspection.
///
/// Clones share the same record, so keep one clone and hand the other to the
/// event loop.
///
/// # Examples
///
/// ```
/// use async_runtime::{EventLoop, Promise, RecordingSink};
/// use core_types::Rejection;
///
/// let sink = RecordingSink::new();
/// let event_loop = EventLoop::builder().rejection_sink(sink.clone()).build();
///
/// let _p: Promise<i32> = Promise::rejected(&event_loop, Rejection::error("nobody listens"));
/// event_loop.run_until_done();
///
/// assert_eq!(sink.unhandled().len(), 1);
/// ```
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    record: Rc<RefCell<Recorded>>,
}

impl RecordingSink {
    /// Creates an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Unhandled rejections reported so far, in report order.
    pub fn unhandled(&self) -> Vec<UnhandledRejection> {
        self.record.borrow().unhandled.clone()
    }

    /// Promises handled after being reported.
    pub fn handled_late(&self) -> Vec<PromiseId> {
        self.record.borrow().handled_late.clone()
    }

    /// Failures of host tasks.
    pub fn uncaught_errors(&self) -> Vec<Rejection> {
        self.record.borrow().uncaught.clone()
    }
}

impl RejectionSink for RecordingSink {
    fn unhandled(&self, report: &UnhandledRejection) {
        self.record.borrow_mut().unhandled.push(report.clone());
    }

    fn handled_late(&self, promise: PromiseId) {
        self.record.borrow_mut().handled_late.push(promise);
    }

    fn uncaught_error(&self, reason: &Rejection) {
        self.record.borrow_mut().uncaught.push(reason.clone());
    }
}

/// Outcome of untracking a promise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Untracked {
    /// Still inside the checkpoint it rejected in
    Silently,
    /// Already reported
    AfterReport,
    /// Never tracked
    NotTracked,
}

/// Weak handle to a promise's shared state, used only to test liveness.
pub(crate) type Liveness = Weak<dyn Any>;

struct Pending {
    report: UnhandledRejection,
    alive: Liveness,
}

/// Bookkeeping for rejections awaiting a handler.
#[derive(Default)]
pub(crate) struct RejectionTracker {
    pending: Vec<Pending>,
    reported: HashMap<PromiseId, Liveness>,
}

impl RejectionTracker {
    pub(crate) fn track(&mut self, promise: PromiseId, reason: Rejection, alive: Liveness) {
        self.pending.push(Pending {
            report: UnhandledRejection { promise, reason },
            alive,
        });
    }

    pub(crate) fn untrack(&mut self, promise: PromiseId) -> Untracked {
        if let Some(index) = self.pending.iter().position(|p| p.report.promise == promise) {
            self.pending.remove(index);
            Untracked::Silently
        } else if self.reported.remove(&promise).is_some() {
            Untracked::AfterReport
        } else {
            Untracked::NotTracked
        }
    }

    /// Moves every pending rejection to the reported set and returns them.
    ///
    /// Reported entries whose promise has been dropped are pruned first.
    pub(crate) fn take_pending(&mut self) -> Vec<UnhandledRejection> {
        self.reported.retain(|_, alive| alive.strong_count() > 0);
        std::mem::take(&mut self.pending)
            .into_iter()
            .map(|pending| {
                self.reported.insert(pending.report.promise, pending.alive);
                pending.report
            })
            .collect()
    }

    pub(crate) fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub(crate) fn reported_len(&self) -> usize {
        self.reported.len()
    }
}

impl fmt::Debug for RejectionTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RejectionTracker")
            .field("pending", &self.pending.len())
            .field("reported", &self.reported.len())
            .finish()
    }
}
