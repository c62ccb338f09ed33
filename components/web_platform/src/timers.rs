//! Timers and the promise-based alarm API.

use async_runtime::{EventLoop, Promise, Task, TimerId};
use core_types::Rejection;
use std::time::Duration;

/// Runs `f` once `delay` has elapsed.
pub fn set_timeout<F>(event_loop: &EventLoop, delay: Duration, f: F) -> TimerId
where
    F: FnOnce() + 'static,
{
    event_loop.set_timeout(
        delay,
        Task::new(move || {
            f();
            Ok(())
        }),
    )
}

/// Cancels a pending timeout. Returns false if it already ran.
pub fn clear_timeout(event_loop: &EventLoop, id: TimerId) -> bool {
    event_loop.clear_timeout(id)
}

/// Wakes `person` after `delay_ms` milliseconds.
///
/// A negative delay is thrown from inside the executor, so the returned
/// promise rejects instead of the call failing.
///
/// # Examples
///
/// ```
/// use async_runtime::EventLoop;
/// use web_platform::alarm;
///
/// let event_loop = EventLoop::new();
/// let wake = alarm(&event_loop, "Matilda", 1000);
/// event_loop.run_until_done();
/// assert_eq!(wake.value().as_deref(), Some("Wake up, Matilda!"));
/// ```
pub fn alarm(event_loop: &EventLoop, person: &str, delay_ms: i64) -> Promise<String> {
    let person = person.to_string();
    let handle = event_loop.clone();
    Promise::new(event_loop, move |resolve, _reject| {
        let delay = u64::try_from(delay_ms)
            .map_err(|_| Rejection::error("Alarm delay must not be negative"))?;
        set_timeout(&handle, Duration::from_millis(delay), move || {
            resolve.resolve(format!("Wake up, {person}!"));
        });
        Ok(())
    })
}
