//! Deferred results with chained continuations.
//!
//! A [`Promise`] starts pending and settles exactly once, as fulfilled with a
//! value or rejected with a [`Rejection`]. Observers registered through
//! [`Promise::then`] and friends always run as microtasks, never inside the
//! call that registers them, and each registration returns a new promise
//! settled by the observer's outcome.

use crate::event_loop::EventLoop;
use crate::rejection::{Liveness, PromiseId};
use crate::task_queue::MicroTask;
use core_types::Rejection;
use std::cell::RefCell;
use std::fmt;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll, Waker};

/// The state of a Promise.
///
/// Once settled (Fulfilled or Rejected), a Promise cannot change state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromiseState {
    /// The initial state; the promise is neither fulfilled nor rejected.
    Pending,
    /// The promise has been resolved with a value.
    Fulfilled,
    /// The promise has been rejected with an error.
    Rejected,
}

/// Success observer accepted by [`Promise::register`].
pub type OnFulfilled<T> = Box<dyn FnOnce(T) -> Result<T, Rejection>>;

/// Failure observer accepted by [`Promise::register`].
pub type OnRejected<T> = Box<dyn FnOnce(Rejection) -> Result<T, Rejection>>;

pub(crate) type Reaction<T> = Box<dyn FnOnce(Result<T, Rejection>)>;

enum Settlement<T> {
    Pending,
    Fulfilled(T),
    Rejected(Rejection),
}

struct Inner<T> {
    id: PromiseId,
    settlement: Settlement<T>,
    reactions: Vec<Reaction<T>>,
    // Set by the first resolve/reject/adopt, possibly before settlement.
    already_resolved: bool,
    handled: bool,
}

/// What an observer produced for the next link of the chain.
enum Step<U> {
    Fulfill(U),
    Adopt(Promise<U>),
    Reject(Rejection),
}

impl<U> From<Result<U, Rejection>> for Step<U> {
    fn from(result: Result<U, Rejection>) -> Self {
        match result {
            Ok(value) => Step::Fulfill(value),
            Err(reason) => Step::Reject(reason),
        }
    }
}

/// A deferred result.
///
/// Clones are handles to the same promise.
///
/// # Examples
///
/// ```
/// use async_runtime::{EventLoop, Promise, PromiseState};
///
/// let event_loop = EventLoop::new();
/// let promise = Promise::new(&event_loop, |resolve, _reject| {
///     resolve.resolve(1);
///     resolve.resolve(2);
///     Ok(())
/// });
///
/// let doubled = promise.then(|n| Ok(n * 2));
/// assert_eq!(doubled.state(), PromiseState::Pending);
///
/// event_loop.run_until_done();
/// assert_eq!(promise.value(), Some(1));
/// assert_eq!(doubled.value(), Some(2));
/// ```
pub struct Promise<T> {
    inner: Rc<RefCell<Inner<T>>>,
    event_loop: EventLoop,
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            event_loop: self.event_loop.clone(),
        }
    }
}

impl<T: Clone + 'static> Promise<T> {
    /// Creates a promise and runs `executor` synchronously.
    ///
    /// The executor receives the resolving functions. Returning `Err` from
    /// the executor rejects the promise, unless it was already resolved.
    pub fn new<F>(event_loop: &EventLoop, executor: F) -> Self
    where
        F: FnOnce(Resolver<T>, Rejecter) -> Result<(), Rejection>,
    {
        let (promise, resolve, reject) = Self::pending(event_loop);
        if let Err(reason) = executor(resolve, reject.clone()) {
            reject.reject(reason);
        }
        promise
    }

    /// Creates a pending promise along with its resolving functions.
    pub fn pending(event_loop: &EventLoop) -> (Self, Resolver<T>, Rejecter) {
        let promise = Self {
            inner: Rc::new(RefCell::new(Inner {
                id: event_loop.next_promise_id(),
                settlement: Settlement::Pending,
                reactions: Vec::new(),
                already_resolved: false,
                handled: false,
            })),
            event_loop: event_loop.clone(),
        };

        let target = promise.clone();
        let reject = Rejecter {
            reject: Rc::new(move |reason| target.lock() && target.settle(Err(reason))),
        };
        let resolve = Resolver {
            promise: promise.clone(),
        };
        (promise, resolve, reject)
    }

    /// Creates an already fulfilled promise.
    pub fn resolved(event_loop: &EventLoop, value: T) -> Self {
        let (promise, resolve, _) = Self::pending(event_loop);
        resolve.resolve(value);
        promise
    }

    /// Creates an already rejected promise.
    pub fn rejected(event_loop: &EventLoop, reason: Rejection) -> Self {
        let (promise, _, reject) = Self::pending(event_loop);
        reject.reject(reason);
        promise
    }

    /// Registers optional success and failure observers.
    ///
    /// A missing observer passes its outcome through unchanged. An observer
    /// returning `Err` rejects the returned promise.
    pub fn register(
        &self,
        on_fulfilled: Option<OnFulfilled<T>>,
        on_rejected: Option<OnRejected<T>>,
    ) -> Promise<T> {
        self.react(move |outcome| match outcome {
            Ok(value) => match on_fulfilled {
                Some(f) => f(value).into(),
                None => Step::Fulfill(value),
            },
            Err(reason) => match on_rejected {
                Some(f) => f(reason).into(),
                None => Step::Reject(reason),
            },
        })
    }

    /// Transforms the fulfillment value. Rejections skip `f`.
    pub fn then<U, F>(&self, f: F) -> Promise<U>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> Result<U, Rejection> + 'static,
    {
        self.react(move |outcome| match outcome {
            Ok(value) => f(value).into(),
            Err(reason) => Step::Reject(reason),
        })
    }

    /// Continues with another deferred result produced from the value.
    ///
    /// The returned promise follows whatever promise `f` returns.
    pub fn then_promise<U, F>(&self, f: F) -> Promise<U>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> Result<Promise<U>, Rejection> + 'static,
    {
        self.react(move |outcome| match outcome {
            Ok(value) => match f(value) {
                Ok(next) => Step::Adopt(next),
                Err(reason) => Step::Reject(reason),
            },
            Err(reason) => Step::Reject(reason),
        })
    }

    /// Handles both outcomes, converging on a new value type.
    pub fn then_or_else<U, F, R>(&self, on_fulfilled: F, on_rejected: R) -> Promise<U>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> Result<U, Rejection> + 'static,
        R: FnOnce(Rejection) -> Result<U, Rejection> + 'static,
    {
        self.react(move |outcome| match outcome {
            Ok(value) => on_fulfilled(value).into(),
            Err(reason) => on_rejected(reason).into(),
        })
    }

    /// Registers a failure-only observer. Fulfillment passes through.
    ///
    /// Returning `Ok` recovers the chain, returning `Err` keeps it rejected.
    pub fn catch<R>(&self, on_rejected: R) -> Promise<T>
    where
        R: FnOnce(Rejection) -> Result<T, Rejection> + 'static,
    {
        self.react(move |outcome| match outcome {
            Ok(value) => Step::Fulfill(value),
            Err(reason) => on_rejected(reason).into(),
        })
    }

    /// Runs `f` on either outcome and passes the outcome through.
    pub fn finally<F>(&self, f: F) -> Promise<T>
    where
        F: FnOnce() + 'static,
    {
        self.react(move |outcome| {
            f();
            outcome.into()
        })
    }

    /// Returns the current state.
    pub fn state(&self) -> PromiseState {
        match self.inner.borrow().settlement {
            Settlement::Pending => PromiseState::Pending,
            Settlement::Fulfilled(_) => PromiseState::Fulfilled,
            Settlement::Rejected(_) => PromiseState::Rejected,
        }
    }

    /// Returns the fulfillment value, if fulfilled.
    pub fn value(&self) -> Option<T> {
        match &self.inner.borrow().settlement {
            Settlement::Fulfilled(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// Returns the rejection reason, if rejected.
    pub fn reason(&self) -> Option<Rejection> {
        match &self.inner.borrow().settlement {
            Settlement::Rejected(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    /// Returns the settled outcome, or `None` while pending.
    pub fn outcome(&self) -> Option<Result<T, Rejection>> {
        match &self.inner.borrow().settlement {
            Settlement::Pending => None,
            Settlement::Fulfilled(value) => Some(Ok(value.clone())),
            Settlement::Rejected(reason) => Some(Err(reason.clone())),
        }
    }

    /// Returns true once fulfilled or rejected.
    pub fn is_settled(&self) -> bool {
        self.state() != PromiseState::Pending
    }

    /// Returns this promise's identity on its event loop.
    pub fn id(&self) -> PromiseId {
        self.inner.borrow().id
    }

    /// Returns the event loop this promise schedules its observers on.
    pub fn event_loop(&self) -> &EventLoop {
        &self.event_loop
    }

    fn react<U, H>(&self, handler: H) -> Promise<U>
    where
        U: Clone + 'static,
        H: FnOnce(Result<T, Rejection>) -> Step<U> + 'static,
    {
        let (next, resolve, reject) = Promise::pending(&self.event_loop);
        self.subscribe(Box::new(move |outcome| match handler(outcome) {
            Step::Fulfill(value) => {
                resolve.resolve(value);
            }
            Step::Adopt(promise) => {
                resolve.adopt(promise);
            }
            Step::Reject(reason) => {
                reject.reject(reason);
            }
        }));
        next
    }

    /// Attaches a raw reaction. It runs as a microtask once settled.
    pub(crate) fn subscribe(&self, reaction: Reaction<T>) {
        let (ready, was_handled, id) = {
            let mut inner = self.inner.borrow_mut();
            let was_handled = std::mem::replace(&mut inner.handled, true);
            let ready = match &inner.settlement {
                Settlement::Pending => None,
                Settlement::Fulfilled(value) => Some(Ok(value.clone())),
                Settlement::Rejected(reason) => Some(Err(reason.clone())),
            };
            (ready, was_handled, inner.id)
        };

        match ready {
            None => self.inner.borrow_mut().reactions.push(reaction),
            Some(outcome) => {
                if outcome.is_err() && !was_handled {
                    self.event_loop.untrack_rejection(id);
                }
                self.event_loop
                    .enqueue_microtask(MicroTask::new(move || reaction(outcome)));
            }
        }
    }

    fn liveness(&self) -> Liveness {
        let weak: Weak<RefCell<Inner<T>>> = Rc::downgrade(&self.inner);
        weak
    }

    /// Claims the right to resolve. Only the first caller gets it.
    fn lock(&self) -> bool {
        let mut inner = self.inner.borrow_mut();
        !std::mem::replace(&mut inner.already_resolved, true)
    }

    fn settle(&self, outcome: Result<T, Rejection>) -> bool {
        let (id, reactions, unobserved) = {
            let mut inner = self.inner.borrow_mut();
            if !matches!(inner.settlement, Settlement::Pending) {
                return false;
            }
            inner.settlement = match &outcome {
                Ok(value) => Settlement::Fulfilled(value.clone()),
                Err(reason) => Settlement::Rejected(reason.clone()),
            };
            (inner.id, std::mem::take(&mut inner.reactions), !inner.handled)
        };

        match &outcome {
            Ok(_) => tracing::trace!(promise = %id, "fulfilled"),
            Err(reason) => {
                tracing::trace!(promise = %id, %reason, "rejected");
                if unobserved {
                    self.event_loop
                        .track_rejection(id, reason.clone(), self.liveness());
                }
            }
        }

        for reaction in reactions {
            let outcome = outcome.clone();
            self.event_loop
                .enqueue_microtask(MicroTask::new(move || reaction(outcome)));
        }
        true
    }
}

impl<T: fmt::Debug> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.borrow().settlement {
            Settlement::Pending => write!(f, "Promise {{ <state>: \"pending\" }}"),
            Settlement::Fulfilled(value) => {
                write!(f, "Promise {{ <state>: \"fulfilled\", <value>: {:?} }}", value)
            }
            Settlement::Rejected(reason) => {
                write!(f, "Promise {{ <state>: \"rejected\", <reason>: {} }}", reason)
            }
        }
    }
}

/// Fulfills (or redirects) a promise. Calls after the first are no-ops.
pub struct Resolver<T> {
    promise: Promise<T>,
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            promise: self.promise.clone(),
        }
    }
}

impl<T: Clone + 'static> Resolver<T> {
    /// Fulfills the promise with `value`.
    ///
    /// Returns false if the promise was already resolved.
    pub fn resolve(&self, value: T) -> bool {
        self.promise.lock() && self.promise.settle(Ok(value))
    }

    /// Makes the promise follow `source`, settling the same way it does.
    ///
    /// A promise cannot follow itself; trying rejects it with a `TypeError`.
    pub fn adopt(&self, source: Promise<T>) -> bool {
        if !self.promise.lock() {
            return false;
        }
        if Rc::ptr_eq(&self.promise.inner, &source.inner) {
            return self.promise.settle(Err(Rejection::type_error(
                "Chaining cycle detected for promise",
            )));
        }
        let target = self.promise.clone();
        source.subscribe(Box::new(move |outcome| {
            target.settle(outcome);
        }));
        true
    }
}

impl<T> fmt::Debug for Resolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Resolver {{ ... }}")
    }
}

/// Rejects a promise. Calls after the first resolution are no-ops.
#[derive(Clone)]
pub struct Rejecter {
    reject: Rc<dyn Fn(Rejection) -> bool>,
}

impl Rejecter {
    /// Rejects the promise with `reason`.
    ///
    /// Returns false if the promise was already resolved.
    pub fn reject(&self, reason: Rejection) -> bool {
        (self.reject)(reason)
    }
}

impl fmt::Debug for Rejecter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rejecter {{ ... }}")
    }
}

struct AwaitSlot<T> {
    outcome: Option<Result<T, Rejection>>,
    waker: Option<Waker>,
}

/// Future returned by awaiting a [`Promise`].
///
/// Resumes on a later microtask even if the promise was already settled.
pub struct Settled<T> {
    promise: Promise<T>,
    slot: Rc<RefCell<AwaitSlot<T>>>,
    subscribed: bool,
}

impl<T: Clone + 'static> IntoFuture for Promise<T> {
    type Output = Result<T, Rejection>;
    type IntoFuture = Settled<T>;

    fn into_future(self) -> Settled<T> {
        Settled {
            promise: self,
            slot: Rc::new(RefCell::new(AwaitSlot {
                outcome: None,
                waker: None,
            })),
            subscribed: false,
        }
    }
}

impl<T: Clone + 'static> Future for Settled<T> {
    type Output = Result<T, Rejection>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        {
            let mut slot = self.slot.borrow_mut();
            if let Some(outcome) = slot.outcome.take() {
                return Poll::Ready(outcome);
            }
            slot.waker = Some(cx.waker().clone());
        }

        if !self.subscribed {
            self.subscribed = true;
            let slot = Rc::clone(&self.slot);
            self.promise.subscribe(Box::new(move |outcome| {
                let waker = {
                    let mut slot = slot.borrow_mut();
                    slot.outcome = Some(outcome);
                    slot.waker.take()
                };
                if let Some(waker) = waker {
                    waker.wake();
                }
            }));
        }
        Poll::Pending
    }
}
