//! Unit tests for suspending functions

use async_runtime::{all, spawn_async, EventLoop, Promise, PromiseState, RecordingSink, Task};
use core_types::Rejection;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

fn after(el: &EventLoop, ms: u64, value: i32) -> Promise<i32> {
    let (promise, resolve, _) = Promise::pending(el);
    el.set_timeout(
        Duration::from_millis(ms),
        Task::new(move || {
            resolve.resolve(value);
            Ok(())
        }),
    );
    promise
}

#[test]
fn returned_promise_fulfills_with_body_value() {
    let el = EventLoop::new();
    let handle = el.clone();
    let sum = spawn_async(&el, async move {
        let a = after(&handle, 10, 1).await?;
        let b = after(&handle, 10, 2).await?;
        Ok(a + b)
    });
    el.run_until_done();
    assert_eq!(sum.value(), Some(3));
    assert_eq!(el.now(), Duration::from_millis(20));
}

#[test]
fn catch_block_receives_reason_and_recovers() {
    let el = EventLoop::new();
    let caught = Rc::new(RefCell::new(None));
    let c = caught.clone();
    let failing: Promise<i32> = Promise::rejected(&el, Rejection::error("HTTP error: 404"));

    let result = spawn_async(&el, async move {
        match failing.await {
            Ok(n) => Ok(n),
            Err(reason) => {
                *c.borrow_mut() = Some(reason);
                Ok(-1)
            }
        }
    });
    el.run_until_done();

    assert_eq!(*caught.borrow(), Some(Rejection::error("HTTP error: 404")));
    assert_eq!(result.value(), Some(-1));
}

#[test]
fn catch_block_reraising_rejects() {
    let sink = RecordingSink::new();
    let el = EventLoop::builder().rejection_sink(sink.clone()).build();
    let failing: Promise<i32> = Promise::rejected(&el, Rejection::error("inner"));

    let result = spawn_async(&el, async move {
        match failing.await {
            Ok(n) => Ok(n),
            Err(reason) => Err(Rejection::error(format!("rethrown: {}", reason.message))),
        }
    });
    el.run_until_done();

    assert_eq!(result.reason(), Some(Rejection::error("rethrown: inner")));
    assert_eq!(sink.unhandled().len(), 1);
    assert_eq!(sink.unhandled()[0].promise, result.id());
}

#[test]
fn awaiting_another_suspending_function() {
    let el = EventLoop::new();
    let h1 = el.clone();
    let h2 = el.clone();
    let outer = spawn_async(&el, async move {
        let inner = spawn_async(&h1, async move { Ok(after(&h2, 5, 20).await? + 1) });
        Ok(inner.await? * 2)
    });
    el.run_until_done();
    assert_eq!(outer.value(), Some(42));
}

#[test]
fn await_all_inside_body() {
    let el = EventLoop::new();
    let handle = el.clone();
    let total = spawn_async(&el, async move {
        let values = all(&handle, vec![after(&handle, 30, 1), after(&handle, 10, 2)]).await?;
        Ok(values.iter().sum::<i32>())
    });
    el.run_until_done();
    assert_eq!(total.value(), Some(3));
}

#[test]
fn body_waiting_forever_does_not_block_loop() {
    let el = EventLoop::new();
    let (never, _, _) = Promise::<i32>::pending(&el);
    let stuck = spawn_async(&el, async move { never.await });
    el.run_until_done();
    assert_eq!(stuck.state(), PromiseState::Pending);
    assert_eq!(el.suspended_functions(), 1);
}

#[test]
fn suspension_interleaves_with_plain_chains() {
    let el = EventLoop::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    let l = log.clone();
    let source = Promise::resolved(&el, ());
    spawn_async(&el, async move {
        l.borrow_mut().push("body start");
        source.await?;
        l.borrow_mut().push("body resumed");
        Ok(())
    });
    log.borrow_mut().push("after spawn");

    el.run_until_done();
    assert_eq!(*log.borrow(), vec!["body start", "after spawn", "body resumed"]);
}
