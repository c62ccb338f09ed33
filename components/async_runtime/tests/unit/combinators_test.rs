//! Unit tests for the promise combinators

use async_runtime::{all, all_settled, race, EventLoop, Promise, PromiseState, Task};
use core_types::Rejection;
use std::time::Duration;

fn delayed<T: Clone + 'static>(el: &EventLoop, ms: u64, outcome: Result<T, Rejection>) -> Promise<T> {
    let (promise, resolve, reject) = Promise::pending(el);
    el.set_timeout(
        Duration::from_millis(ms),
        Task::new(move || {
            match outcome {
                Ok(value) => resolve.resolve(value),
                Err(reason) => reject.reject(reason),
            };
            Ok(())
        }),
    );
    promise
}

#[test]
fn all_of_nothing_is_empty_vec() {
    let el = EventLoop::new();
    let combined = all::<u8>(&el, Vec::new());
    assert_eq!(combined.state(), PromiseState::Fulfilled);
    assert_eq!(combined.value(), Some(vec![]));
}

#[test]
fn all_orders_by_input_not_completion() {
    let el = EventLoop::new();
    let combined = all(
        &el,
        vec![
            delayed(&el, 30, Ok(1)),
            delayed(&el, 10, Ok(2)),
            delayed(&el, 20, Ok(3)),
        ],
    );
    el.run_until_done();
    assert_eq!(combined.value(), Some(vec![1, 2, 3]));
}

#[test]
fn all_rejects_with_middle_failure() {
    let el = EventLoop::new();
    let combined = all(
        &el,
        vec![
            delayed(&el, 10, Ok("p1")),
            delayed(&el, 20, Err(Rejection::error("p2 failed"))),
            delayed(&el, 30, Ok("p3")),
        ],
    );
    el.run_until_done();
    assert_eq!(combined.reason(), Some(Rejection::error("p2 failed")));
}

#[test]
fn all_first_failure_by_arrival_wins() {
    let el = EventLoop::new();
    let combined = all::<i32>(
        &el,
        vec![
            delayed(&el, 50, Err(Rejection::error("submitted first"))),
            delayed(&el, 5, Err(Rejection::error("arrived first"))),
        ],
    );
    el.run_until_done();
    assert_eq!(combined.reason(), Some(Rejection::error("arrived first")));
}

#[test]
fn all_rejects_before_slow_inputs_finish() {
    let el = EventLoop::new();
    let slow = delayed(&el, 1_000, Ok(1));
    let combined = all(&el, vec![slow.clone(), delayed(&el, 1, Err(Rejection::error("fast")))]);

    el.process_one_cycle();
    assert_eq!(combined.state(), PromiseState::Rejected);
    assert_eq!(slow.state(), PromiseState::Pending);

    el.run_until_done();
    assert_eq!(slow.value(), Some(1));
    assert_eq!(combined.reason(), Some(Rejection::error("fast")));
}

#[test]
fn race_takes_fastest() {
    let el = EventLoop::new();
    let winner = race(&el, vec![delayed(&el, 20, Ok("slow")), delayed(&el, 10, Ok("fast"))]);
    el.run_until_done();
    assert_eq!(winner.value(), Some("fast"));
}

#[test]
fn race_of_nothing_stays_pending() {
    let el = EventLoop::new();
    let winner = race::<i32>(&el, Vec::new());
    el.run_until_done();
    assert_eq!(winner.state(), PromiseState::Pending);
}

#[test]
fn all_settled_never_rejects() {
    let el = EventLoop::new();
    let outcomes = all_settled(
        &el,
        vec![delayed(&el, 20, Err(Rejection::error("a"))), delayed(&el, 10, Ok(2))],
    );
    el.run_until_done();
    assert_eq!(outcomes.value(), Some(vec![Err(Rejection::error("a")), Ok(2)]));
}
