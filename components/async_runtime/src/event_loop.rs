//! Event loop implementation.
//!
//! This module provides the single-threaded cooperative event loop that
//! coordinates task, microtask and timer execution.

use crate::rejection::{
    Liveness, PromiseId, RejectionSink, RejectionTracker, TracingSink, Untracked,
};
use crate::suspend::Executor;
use crate::task_queue::{MicroTask, MicrotaskQueue, Task, TaskQueue, TimerId, TimerQueue};
use core_types::Rejection;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// How the loop's clock advances when only timers are left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockMode {
    /// Jump straight to the next deadline. Deterministic; used by tests.
    #[default]
    Virtual,
    /// Sleep the thread until the next deadline.
    Realtime,
}

#[derive(Debug)]
struct Clock {
    mode: ClockMode,
    origin: Instant,
    virtual_now: Duration,
}

impl Clock {
    fn new(mode: ClockMode) -> Self {
        Self {
            mode,
            origin: Instant::now(),
            virtual_now: Duration::ZERO,
        }
    }

    fn now(&self) -> Duration {
        match self.mode {
            ClockMode::Virtual => self.virtual_now,
            ClockMode::Realtime => self.origin.elapsed(),
        }
    }

    fn advance_to(&mut self, deadline: Duration) {
        match self.mode {
            ClockMode::Virtual => {
                if deadline > self.virtual_now {
                    self.virtual_now = deadline;
                }
            }
            ClockMode::Realtime => {
                let now = self.origin.elapsed();
                if deadline > now {
                    std::thread::sleep(deadline - now);
                }
            }
        }
    }
}

struct Inner {
    task_queue: RefCell<TaskQueue>,
    microtask_queue: RefCell<MicrotaskQueue>,
    timers: RefCell<TimerQueue>,
    clock: RefCell<Clock>,
    rejections: RefCell<RejectionTracker>,
    sink: Box<dyn RejectionSink>,
    executor: Executor,
    next_promise_id: Cell<u64>,
}

/// Builder for an [`EventLoop`].
///
/// The rejection sink is process-wide state for everything running on the
/// loop, so it is chosen here, once, instead of being an ambient global.
pub struct EventLoopBuilder {
    clock: ClockMode,
    sink: Box<dyn RejectionSink>,
}

impl EventLoopBuilder {
    /// Selects how time advances.
    pub fn clock(mut self, mode: ClockMode) -> Self {
        self.clock = mode;
        self
    }

    /// Installs the sink receiving unhandled rejections and task failures.
    pub fn rejection_sink(mut self, sink: impl RejectionSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Builds the event loop.
    pub fn build(self) -> EventLoop {
        EventLoop {
            inner: Rc::new(Inner {
                task_queue: RefCell::new(TaskQueue::new()),
                microtask_queue: RefCell::new(MicrotaskQueue::new()),
                timers: RefCell::new(TimerQueue::new()),
                clock: RefCell::new(Clock::new(self.clock)),
                rejections: RefCell::new(RejectionTracker::default()),
                sink: self.sink,
                executor: Executor::new(),
                next_promise_id: Cell::new(1),
            }),
        }
    }
}

impl Default for EventLoopBuilder {
    fn default() -> Self {
        Self {
            clock: ClockMode::default(),
            sink: Box::new(TracingSink),
        }
    }
}

/// The event loop.
///
/// A cheaply clonable handle; clones drive the same queues. Each turn of the
/// loop:
/// 1. Moves expired timers onto the task queue
/// 2. Takes the oldest task and executes it
/// 3. Drains all microtasks, resuming woken suspended functions as it goes
/// 4. Reports rejections nobody handled during the turn
///
/// # Examples
///
/// ```
/// use async_runtime::{EventLoop, Task};
///
/// let event_loop = EventLoop::new();
///
/// event_loop.enqueue_task(Task::new(|| Ok(())));
/// event_loop.run_until_done();
/// assert!(event_loop.is_task_queue_empty());
/// ```
#[derive(Clone)]
pub struct EventLoop {
    inner: Rc<Inner>,
}

impl EventLoop {
    /// Creates an event loop with a virtual clock and the tracing sink.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts configuring an event loop.
    pub fn builder() -> EventLoopBuilder {
        EventLoopBuilder::default()
    }

    /// Runs the event loop until no task, microtask or timer is left.
    ///
    /// Suspended functions waiting on a promise that never settles do not
    /// keep the loop alive.
    pub fn run_until_done(&self) {
        self.run_all_microtasks();
        while self.has_pending_work() {
            self.process_one_cycle();
        }
    }

    /// Processes one complete cycle: one task followed by all microtasks.
    ///
    /// When the task queue is empty the clock advances to the next timer.
    /// Returns true if a task ran.
    pub fn process_one_cycle(&self) -> bool {
        self.promote_due_timers();
        if self.is_task_queue_empty() {
            let next = self.inner.timers.borrow_mut().next_deadline();
            if let Some(deadline) = next {
                self.inner.clock.borrow_mut().advance_to(deadline);
                self.promote_due_timers();
            }
        }

        let task = self.inner.task_queue.borrow_mut().dequeue();
        let ran = match task {
            Some(task) => {
                self.run_task(task);
                true
            }
            None => false,
        };

        self.run_all_microtasks();
        ran
    }

    /// Runs all microtasks in the queue until empty.
    ///
    /// New microtasks added during execution, and suspended functions woken
    /// by them, are processed before this method returns. Ends with the
    /// unhandled-rejection report for the checkpoint.
    pub fn run_all_microtasks(&self) {
        loop {
            while let Some(microtask) = self.dequeue_microtask() {
                microtask.run();
            }
            if !self.inner.executor.poll_ready() {
                break;
            }
        }
        self.report_unhandled_rejections();
    }

    /// Adds a task to the task queue.
    pub fn enqueue_task(&self, task: Task) {
        self.inner.task_queue.borrow_mut().enqueue(task);
    }

    /// Adds a microtask to the microtask queue.
    pub fn enqueue_microtask(&self, microtask: MicroTask) {
        self.inner.microtask_queue.borrow_mut().enqueue(microtask);
    }

    /// Schedules `task` to run once `delay` has elapsed on the loop clock.
    pub fn set_timeout(&self, delay: Duration, task: Task) -> TimerId {
        let deadline = self.now() + delay;
        let id = self.inner.timers.borrow_mut().schedule(deadline, task);
        tracing::trace!(%id, ?deadline, "timer scheduled");
        id
    }

    /// Cancels a timer. Returns false if it already fired.
    pub fn clear_timeout(&self, id: TimerId) -> bool {
        self.inner.timers.borrow_mut().cancel(id)
    }

    /// Current time on the loop clock, measured from loop creation.
    pub fn now(&self) -> Duration {
        self.inner.clock.borrow().now()
    }

    /// Returns the clock mode this loop was built with.
    pub fn clock_mode(&self) -> ClockMode {
        self.inner.clock.borrow().mode
    }

    /// Returns true if the task queue is empty.
    pub fn is_task_queue_empty(&self) -> bool {
        self.inner.task_queue.borrow().is_empty()
    }

    /// Returns true if the microtask queue is empty.
    pub fn is_microtask_queue_empty(&self) -> bool {
        self.inner.microtask_queue.borrow().is_empty()
    }

    /// Returns the number of timers that have not fired.
    pub fn pending_timers(&self) -> usize {
        self.inner.timers.borrow().len()
    }

    /// Returns the number of suspended functions that have not completed.
    pub fn suspended_functions(&self) -> usize {
        self.inner.executor.len()
    }

    pub(crate) fn executor(&self) -> &Executor {
        &self.inner.executor
    }

    pub(crate) fn next_promise_id(&self) -> PromiseId {
        let id = self.inner.next_promise_id.get();
        self.inner.next_promise_id.set(id + 1);
        PromiseId(id)
    }

    pub(crate) fn track_rejection(&self, promise: PromiseId, reason: Rejection, alive: Liveness) {
        self.inner.rejections.borrow_mut().track(promise, reason, alive);
    }

    pub(crate) fn untrack_rejection(&self, promise: PromiseId) {
        let outcome = self.inner.rejections.borrow_mut().untrack(promise);
        if outcome == Untracked::AfterReport {
            self.inner.sink.handled_late(promise);
        }
    }

    fn has_pending_work(&self) -> bool {
        !self.is_task_queue_empty()
            || !self.is_microtask_queue_empty()
            || !self.inner.timers.borrow().is_empty()
            || self.inner.executor.has_ready()
            || self.inner.rejections.borrow().has_pending()
    }

    fn dequeue_microtask(&self) -> Option<MicroTask> {
        self.inner.microtask_queue.borrow_mut().dequeue()
    }

    fn promote_due_timers(&self) {
        let now = self.now();
        loop {
            let due = self.inner.timers.borrow_mut().pop_due(now);
            match due {
                Some(task) => self.enqueue_task(task),
                None => break,
            }
        }
    }

    fn run_task(&self, task: Task) {
        if let Err(reason) = task.run() {
            tracing::debug!(%reason, "task failed");
            self.inner.sink.uncaught_error(&reason);
        }
    }

    fn report_unhandled_rejections(&self) {
        let reports = self.inner.rejections.borrow_mut().take_pending();
        for report in &reports {
            self.inner.sink.unhandled(report);
        }
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("tasks", &self.inner.task_queue.borrow().len())
            .field("microtasks", &self.inner.microtask_queue.borrow().len())
            .field("timers", &self.inner.timers.borrow().len())
            .field("now", &self.now())
            .finish()
    }
}
