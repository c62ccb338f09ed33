//! Suspending functions.
//!
//! [`spawn_async`] turns an `async` block into a [`Promise`]. Inside the
//! block, `.await` on a promise suspends until that promise's continuation
//! fires; a rejection comes back as `Err` at the await point, so `?`
//! re-raises it and an ordinary `match` catches it.
//!
//! Suspended bodies are driven by the event loop: waking one pushes its id
//! onto a ready queue that the loop drains during each microtask checkpoint.

use crate::event_loop::EventLoop;
use crate::promise::Promise;
use core_types::Rejection;
use parking_lot::Mutex;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Wake, Waker};

type LocalFuture = Pin<Box<dyn Future<Output = ()>>>;

/// Runs `body` as a suspending function and returns its promise.
///
/// The body runs synchronously up to its first pending `.await`. `Ok`
/// fulfills the returned promise, `Err` rejects it.
///
/// # Examples
///
/// ```
/// use async_runtime::{spawn_async, EventLoop, Promise};
/// use core_types::Rejection;
///
/// let event_loop = EventLoop::new();
/// let failing: Promise<i32> = Promise::rejected(&event_loop, Rejection::error("nope"));
///
/// let recovered = spawn_async(&event_loop, async move {
///     match failing.await {
///         Ok(n) => Ok(n),
///         Err(reason) => Ok(reason.message.len() as i32),
///     }
/// });
///
/// event_loop.run_until_done();
/// assert_eq!(recovered.value(), Some(4));
/// ```
pub fn spawn_async<T, F>(event_loop: &EventLoop, body: F) -> Promise<T>
where
    T: Clone + 'static,
    F: Future<Output = Result<T, Rejection>> + 'static,
{
    let (promise, resolve, reject) = Promise::pending(event_loop);
    event_loop.executor().spawn(Box::pin(async move {
        match body.await {
            Ok(value) => {
                resolve.resolve(value);
            }
            Err(reason) => {
                reject.reject(reason);
            }
        }
    }));
    promise
}

struct TaskWaker {
    id: u64,
    ready: Arc<Mutex<VecDeque<u64>>>,
}

impl Wake for TaskWaker {
    fn wake(self: Arc<Self>) {
        self.ready.lock().push_back(self.id);
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.ready.lock().push_back(self.id);
    }
}

/// Owns suspended function bodies for one event loop.
pub(crate) struct Executor {
    tasks: RefCell<HashMap<u64, LocalFuture>>,
    ready: Arc<Mutex<VecDeque<u64>>>,
    next_id: Cell<u64>,
}

impl Executor {
    pub(crate) fn new() -> Self {
        Self {
            tasks: RefCell::new(HashMap::new()),
            ready: Arc::new(Mutex::new(VecDeque::new())),
            next_id: Cell::new(0),
        }
    }

    /// Stores `future` and polls it once right away.
    pub(crate) fn spawn(&self, future: LocalFuture) {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.tasks.borrow_mut().insert(id, future);
        tracing::trace!(task = id, "suspending function started");
        self.poll_task(id);
    }

    /// Polls every woken body. Returns false if none were woken.
    pub(crate) fn poll_ready(&self) -> bool {
        let woken: Vec<u64> = self.ready.lock().drain(..).collect();
        if woken.is_empty() {
            return false;
        }
        for id in woken {
            self.poll_task(id);
        }
        true
    }

    pub(crate) fn has_ready(&self) -> bool {
        !self.ready.lock().is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    fn poll_task(&self, id: u64) {
        // Taken out of the map while polling so the body may spawn others.
        let Some(mut future) = self.tasks.borrow_mut().remove(&id) else {
            return;
        };
        let waker = Waker::from(Arc::new(TaskWaker {
            id,
            ready: Arc::clone(&self.ready),
        }));
        let mut cx = Context::from_waker(&waker);
        if future.as_mut().poll(&mut cx).is_pending() {
            self.tasks.borrow_mut().insert(id, future);
        } else {
            tracing::trace!(task = id, "suspending function finished");
        }
    }
}
