//! Combinators over collections of promises.

use crate::event_loop::EventLoop;
use crate::promise::Promise;
use core_types::Rejection;
use std::cell::RefCell;
use std::rc::Rc;

struct Gather<T> {
    slots: Vec<Option<T>>,
    remaining: usize,
}

impl<T> Gather<T> {
    fn new(len: usize) -> Self {
        Self {
            slots: std::iter::repeat_with(|| None).take(len).collect(),
            remaining: len,
        }
    }

    /// Stores one result. Returns the full set once the last one arrives.
    fn fill(&mut self, index: usize, value: T) -> Option<Vec<T>> {
        if self.slots[index].replace(value).is_none() {
            self.remaining -= 1;
        }
        if self.remaining == 0 {
            Some(self.slots.drain(..).flatten().collect())
        } else {
            None
        }
    }
}

/// Waits for every promise to fulfill.
///
/// Fulfills with the values in input order, regardless of completion order.
/// Rejects with the first rejection to arrive; later outcomes are ignored,
/// though the operations behind them keep running. An empty input fulfills
/// at once with an empty vector.
///
/// # Examples
///
/// ```
/// use async_runtime::{all, EventLoop, Promise};
///
/// let event_loop = EventLoop::new();
/// let combined = all(&event_loop, vec![
///     Promise::resolved(&event_loop, 1),
///     Promise::resolved(&event_loop, 2),
/// ]);
/// event_loop.run_until_done();
/// assert_eq!(combined.value(), Some(vec![1, 2]));
/// ```
pub fn all<T>(event_loop: &EventLoop, promises: Vec<Promise<T>>) -> Promise<Vec<T>>
where
    T: Clone + 'static,
{
    let (combined, resolve, reject) = Promise::pending(event_loop);
    if promises.is_empty() {
        resolve.resolve(Vec::new());
        return combined;
    }

    let gather = Rc::new(RefCell::new(Gather::new(promises.len())));
    for (index, promise) in promises.into_iter().enumerate() {
        let gather = Rc::clone(&gather);
        let resolve = resolve.clone();
        let reject = reject.clone();
        promise.subscribe(Box::new(move |outcome| match outcome {
            Ok(value) => {
                let done = gather.borrow_mut().fill(index, value);
                if let Some(values) = done {
                    resolve.resolve(values);
                }
            }
            Err(reason) => {
                reject.reject(reason);
            }
        }));
    }
    combined
}

/// Settles the same way as the first promise to settle.
///
/// An empty input never settles.
pub fn race<T>(event_loop: &EventLoop, promises: Vec<Promise<T>>) -> Promise<T>
where
    T: Clone + 'static,
{
    let (winner, resolve, reject) = Promise::pending(event_loop);
    for promise in promises {
        let resolve = resolve.clone();
        let reject = reject.clone();
        promise.subscribe(Box::new(move |outcome| match outcome {
            Ok(value) => {
                resolve.resolve(value);
            }
            Err(reason) => {
                reject.reject(reason);
            }
        }));
    }
    winner
}

/// Waits for every promise to settle. Never rejects.
pub fn all_settled<T>(
    event_loop: &EventLoop,
    promises: Vec<Promise<T>>,
) -> Promise<Vec<Result<T, Rejection>>>
where
    T: Clone + 'static,
{
    let (combined, resolve, _) = Promise::pending(event_loop);
    if promises.is_empty() {
        resolve.resolve(Vec::new());
        return combined;
    }

    let gather = Rc::new(RefCell::new(Gather::new(promises.len())));
    for (index, promise) in promises.into_iter().enumerate() {
        let gather = Rc::clone(&gather);
        let resolve = resolve.clone();
        promise.subscribe(Box::new(move |outcome| {
            let done = gather.borrow_mut().fill(index, outcome);
            if let Some(outcomes) = done {
                resolve.resolve(outcomes);
            }
        }));
    }
    combined
}
