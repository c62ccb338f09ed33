//! Callback-style steps, nested and then flattened into a chain.

use crate::console::Console;
use async_runtime::{EventLoop, Promise};

/// Callback shape the promisified steps hand to each `do_step`.
pub type StepCallback = Box<dyn FnOnce(i32)>;

/// Adds 1 and hands the result to `callback`.
pub fn do_step1<F: FnOnce(i32)>(init: i32, callback: F) {
    callback(init + 1);
}

/// Adds 2 and hands the result to `callback`.
pub fn do_step2<F: FnOnce(i32)>(init: i32, callback: F) {
    callback(init + 2);
}

/// Adds 3 and hands the result to `callback`.
pub fn do_step3<F: FnOnce(i32)>(init: i32, callback: F) {
    callback(init + 3);
}

/// Runs the three steps as a nested pyramid and logs `result: 6`.
pub fn do_operation(console: &Console) {
    do_step1(0, |result1| {
        do_step2(result1, |result2| {
            do_step3(result2, |result3| {
                console.log(format!("result: {result3}"));
            });
        });
    });
}

/// The same three steps as a flat continuation chain.
///
/// Each callback step is wrapped in a promise; the final value is logged
/// like [`do_operation`] and returned.
///
/// # Examples
///
/// ```
/// use async_runtime::EventLoop;
/// use lessons::{callbacks::do_operation_chained, Console};
///
/// let event_loop = EventLoop::new();
/// let console = Console::capture();
/// let result = do_operation_chained(&event_loop, &console);
/// event_loop.run_until_done();
/// assert_eq!(result.value(), Some(6));
/// assert_eq!(console.logs(), vec!["result: 6"]);
/// ```
pub fn do_operation_chained(event_loop: &EventLoop, console: &Console) -> Promise<i32> {
    let (l2, l3) = (event_loop.clone(), event_loop.clone());
    let console = console.clone();
    promisify(event_loop, 0, do_step1)
        .then_promise(move |result1| Ok(promisify(&l2, result1, do_step2)))
        .then_promise(move |result2| Ok(promisify(&l3, result2, do_step3)))
        .then(move |result3| {
            console.log(format!("result: {result3}"));
            Ok(result3)
        })
}

/// Wraps one callback step in a promise of its result.
pub fn promisify(event_loop: &EventLoop, init: i32, step: fn(i32, StepCallback)) -> Promise<i32> {
    Promise::new(event_loop, move |resolve, _| {
        step(
            init,
            Box::new(move |result| {
                resolve.resolve(result);
            }),
        );
        Ok(())
    })
}
