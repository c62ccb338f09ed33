//! Promise Runtime / Web Platform Integration Tests
//!
//! Drives promises through real host sources (clicks, timers, fetches) and
//! checks ordering and rejection reporting across the crate boundary.

use async_runtime::{all, spawn_async, EventLoop, Promise, RecordingSink};
use core_types::{ErrorKind, Rejection};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use web_platform::{alarm, set_timeout, Document, Network, StaticTransport, PRODUCTS_URL};

fn recording_loop() -> (EventLoop, RecordingSink) {
    let sink = RecordingSink::new();
    let event_loop = EventLoop::builder().rejection_sink(sink.clone()).build();
    (event_loop, sink)
}

/// Test: Continuations queued by a click run before the next timer
#[test]
fn test_click_continuations_run_before_timers() {
    let event_loop = EventLoop::new();
    let document = Document::new(&event_loop);
    document.create_element("button");
    let order = Rc::new(RefCell::new(Vec::new()));

    let o = order.clone();
    set_timeout(&event_loop, Duration::ZERO, move || o.borrow_mut().push("timer"));

    let o = order.clone();
    let el = event_loop.clone();
    document
        .on_click("button", move || {
            o.borrow_mut().push("click");
            let o = o.clone();
            Promise::resolved(&el, ()).then(move |_| {
                o.borrow_mut().push("continuation");
                Ok(())
            });
            Ok(())
        })
        .unwrap();

    document.click("button").unwrap();
    event_loop.run_until_done();
    assert_eq!(*order.borrow(), vec!["click", "continuation", "timer"]);
}

/// Test: A rejected fetch nobody observes is reported exactly once
#[test]
fn test_unobserved_fetch_failure_reported_once() {
    let (event_loop, sink) = recording_loop();
    let network = Network::new(&event_loop, StaticTransport::tutorial());

    let failed = network.fetch("ftp://example.com/file");
    event_loop.run_until_done();

    let reports = sink.unhandled();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].promise, failed.id());
    assert_eq!(reports[0].reason, Rejection::type_error("Failed to fetch"));
}

/// Test: A failure observer attached after the report triggers handled_late
#[test]
fn test_late_observer_after_report() {
    let (event_loop, sink) = recording_loop();
    let network = Network::new(&event_loop, StaticTransport::tutorial());

    let failed = network.fetch("ftp://example.com/file");
    event_loop.run_until_done();
    assert_eq!(sink.unhandled().len(), 1);

    let recovered = failed.then_or_else(|_| Ok(false), |_| Ok(true));
    event_loop.run_until_done();

    assert_eq!(recovered.value(), Some(true));
    assert_eq!(sink.handled_late(), vec![failed.id()]);
}

/// Test: all over fetches keeps input order despite different latencies
#[test]
fn test_all_over_networks_with_different_latency() {
    let event_loop = EventLoop::new();
    let transport = StaticTransport::tutorial().with_route("https://example.com/a", 200, "a");
    let slow =
        Network::new(&event_loop, transport.clone()).with_latency(Duration::from_millis(500));
    let fast = Network::new(&event_loop, transport).with_latency(Duration::from_millis(10));

    let statuses = all(
        &event_loop,
        vec![slow.fetch(PRODUCTS_URL), fast.fetch("https://example.com/a")],
    )
    .then(|responses| Ok(responses.into_iter().map(|r| r.url).collect::<Vec<_>>()));
    event_loop.run_until_done();

    assert_eq!(
        statuses.value(),
        Some(vec![PRODUCTS_URL.to_string(), "https://example.com/a".to_string()])
    );
    assert_eq!(event_loop.now(), Duration::from_millis(500));
}

/// Test: Suspending function awaits alarm and fetch in sequence
#[test]
fn test_suspending_function_over_host_apis() {
    let event_loop = EventLoop::new();
    let network = Network::new(&event_loop, StaticTransport::tutorial());
    let el = event_loop.clone();

    let summary = spawn_async(&event_loop, async move {
        let wake = alarm(&el, "Ada", 300).await?;
        let response = network.fetch(PRODUCTS_URL).await?;
        let data = response.json().await?;
        Ok(format!("{wake} {}", data[1]["name"].as_str().unwrap_or("?")))
    });
    event_loop.run_until_done();

    assert_eq!(
        summary.value().as_deref(),
        Some("Wake up, Ada! hot dog sausages")
    );
    assert_eq!(event_loop.now(), Duration::from_millis(400));
}

/// Test: A failing click handler does not stop later tasks
#[test]
fn test_failing_handler_does_not_stop_the_loop() {
    let (event_loop, sink) = recording_loop();
    let document = Document::new(&event_loop);
    let output = document.create_element("output");

    document
        .on_click("output", || Err(Rejection::range_error("bad click")))
        .unwrap();
    let out = output.clone();
    set_timeout(&event_loop, Duration::from_millis(1), move || {
        out.set_text_content("timer ran")
    });

    document.click("output").unwrap();
    event_loop.run_until_done();

    assert_eq!(output.text_content(), "timer ran");
    assert_eq!(sink.uncaught_errors()[0].kind, ErrorKind::RangeError);
    assert!(sink.unhandled().is_empty());
}
