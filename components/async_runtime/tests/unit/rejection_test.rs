//! Unit tests for unhandled rejection reporting

use async_runtime::{EventLoop, Promise, RecordingSink, Task};
use core_types::Rejection;
use std::time::Duration;

fn recording_loop() -> (EventLoop, RecordingSink) {
    let sink = RecordingSink::new();
    let el = EventLoop::builder().rejection_sink(sink.clone()).build();
    (el, sink)
}

#[test]
fn unobserved_rejection_is_reported_once() {
    let (el, sink) = recording_loop();
    let promise: Promise<i32> = Promise::rejected(&el, Rejection::error("lost"));
    el.run_until_done();
    el.run_until_done();

    let reports = sink.unhandled();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].promise, promise.id());
    assert_eq!(reports[0].reason, Rejection::error("lost"));
}

#[test]
fn rejection_at_end_of_chain_is_reported() {
    let (el, sink) = recording_loop();
    let end = Promise::<i32>::rejected(&el, Rejection::error("deep"))
        .then(|n| Ok(n + 1))
        .then(|n| Ok(n * 2));
    el.run_until_done();

    let reports = sink.unhandled();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].promise, end.id());
    assert_eq!(reports[0].reason, Rejection::error("deep"));
}

#[test]
fn caught_chain_reports_nothing() {
    let (el, sink) = recording_loop();
    Promise::<i32>::rejected(&el, Rejection::error("handled"))
        .then(|n| Ok(n + 1))
        .catch(|_| Ok(0));
    el.run_until_done();
    assert!(sink.unhandled().is_empty());
}

#[test]
fn handler_attached_in_same_turn_is_not_reported() {
    let (el, sink) = recording_loop();
    let (promise, _, reject) = Promise::<i32>::pending(&el);
    reject.reject(Rejection::error("quick"));
    promise.catch(|_| Ok(1));
    el.run_until_done();
    assert!(sink.unhandled().is_empty());
    assert!(sink.handled_late().is_empty());
}

#[test]
fn handler_attached_after_report_is_flagged_late() {
    let (el, sink) = recording_loop();
    let promise: Promise<i32> = Promise::rejected(&el, Rejection::error("slow"));
    let late = promise.clone();
    el.set_timeout(
        Duration::from_millis(10),
        Task::new(move || {
            late.catch(|_| Ok(0));
            Ok(())
        }),
    );
    el.run_until_done();

    assert_eq!(sink.unhandled().len(), 1);
    assert_eq!(sink.handled_late(), vec![promise.id()]);
}

#[test]
fn failing_task_goes_to_uncaught_errors() {
    let (el, sink) = recording_loop();
    el.enqueue_task(Task::new(|| Err(Rejection::type_error("Cannot read properties of null"))));
    el.run_until_done();
    assert_eq!(
        sink.uncaught_errors(),
        vec![Rejection::type_error("Cannot read properties of null")]
    );
    assert!(sink.unhandled().is_empty());
}
