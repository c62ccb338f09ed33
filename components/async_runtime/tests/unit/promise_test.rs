//! Unit tests for Promise

use async_runtime::{EventLoop, OnFulfilled, OnRejected, Promise, PromiseState};
use core_types::{ErrorKind, Rejection};
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn new_promise_is_pending() {
    let el = EventLoop::new();
    let promise = Promise::new(&el, |_resolve: async_runtime::Resolver<i32>, _reject| Ok(()));
    assert_eq!(promise.state(), PromiseState::Pending);
    assert!(promise.outcome().is_none());
}

#[test]
fn executor_runs_synchronously() {
    let el = EventLoop::new();
    let ran = Rc::new(RefCell::new(false));
    let r = ran.clone();
    let _promise: Promise<()> = Promise::new(&el, move |_, _| {
        *r.borrow_mut() = true;
        Ok(())
    });
    assert!(*ran.borrow());
}

#[test]
fn resolve_then_resolve_keeps_first_value() {
    let el = EventLoop::new();
    let promise = Promise::new(&el, |resolve, _| {
        resolve.resolve(1);
        resolve.resolve(2);
        Ok(())
    });
    assert_eq!(promise.state(), PromiseState::Fulfilled);
    assert_eq!(promise.value(), Some(1));
}

#[test]
fn reject_after_resolve_is_ignored() {
    let el = EventLoop::new();
    let promise = Promise::new(&el, |resolve, reject| {
        resolve.resolve(42);
        reject.reject(Rejection::error("too late"));
        Ok(())
    });
    assert_eq!(promise.value(), Some(42));
    assert!(promise.reason().is_none());
}

#[test]
fn resolve_after_reject_is_ignored() {
    let el = EventLoop::new();
    let promise = Promise::new(&el, |resolve, reject| {
        reject.reject(Rejection::type_error("test"));
        resolve.resolve(42);
        Ok(())
    });
    assert_eq!(promise.state(), PromiseState::Rejected);
    assert_eq!(promise.reason().map(|r| r.kind), Some(ErrorKind::TypeError));
}

#[test]
fn executor_error_rejects() {
    let el = EventLoop::new();
    let promise: Promise<String> =
        Promise::new(&el, |_, _| Err(Rejection::error("Alarm delay must not be negative")));
    assert_eq!(
        promise.reason(),
        Some(Rejection::error("Alarm delay must not be negative"))
    );
}

#[test]
fn executor_error_after_resolve_is_ignored() {
    let el = EventLoop::new();
    let promise = Promise::new(&el, |resolve, _| {
        resolve.resolve("done");
        Err(Rejection::error("thrown afterwards"))
    });
    assert_eq!(promise.value(), Some("done"));
}

#[test]
fn then_returns_new_pending_promise() {
    let el = EventLoop::new();
    let promise = Promise::resolved(&el, 1);
    let chained = promise.then(|n| Ok(n + 1));
    assert_ne!(promise.id(), chained.id());
    assert_eq!(chained.state(), PromiseState::Pending);
    el.run_until_done();
    assert_eq!(chained.value(), Some(2));
}

#[test]
fn rejection_skips_success_observers() {
    let el = EventLoop::new();
    let calls = Rc::new(RefCell::new(Vec::new()));

    let c1 = calls.clone();
    let c2 = calls.clone();
    let c3 = calls.clone();
    let end = Promise::<i32>::rejected(&el, Rejection::error("boom"))
        .then(move |n| {
            c1.borrow_mut().push("f");
            Ok(n)
        })
        .then(move |n| {
            c2.borrow_mut().push("g");
            Ok(n)
        })
        .catch(move |reason| {
            c3.borrow_mut().push("catch");
            assert_eq!(reason, Rejection::error("boom"));
            Ok(0)
        });

    el.run_until_done();
    assert_eq!(*calls.borrow(), vec!["catch"]);
    assert_eq!(end.value(), Some(0));
}

#[test]
fn failing_observer_rejects_next_link() {
    let el = EventLoop::new();
    let next = Promise::resolved(&el, 500u16).then(|status| -> Result<u16, Rejection> {
        Err(Rejection::error(format!("HTTP error: {status}")))
    });
    el.run_until_done();
    assert_eq!(next.reason(), Some(Rejection::error("HTTP error: 500")));
}

#[test]
fn catch_can_rethrow() {
    let el = EventLoop::new();
    let next = Promise::<i32>::rejected(&el, Rejection::error("first"))
        .catch(|reason| Err(Rejection::type_error(format!("wrapped {}", reason.message))));
    el.run_until_done();
    assert_eq!(next.reason(), Some(Rejection::type_error("wrapped first")));
}

#[test]
fn catch_passes_fulfillment_through() {
    let el = EventLoop::new();
    let next = Promise::resolved(&el, 9).catch(|_| Ok(0));
    el.run_until_done();
    assert_eq!(next.value(), Some(9));
}

#[test]
fn register_without_observers_passes_both_outcomes() {
    let el = EventLoop::new();
    let ok = Promise::resolved(&el, 3).register(None, None);
    let err = Promise::<i32>::rejected(&el, Rejection::error("e")).register(None, None);
    let _ = err.catch(|_| Ok(0));
    el.run_until_done();
    assert_eq!(ok.value(), Some(3));
    assert_eq!(err.reason(), Some(Rejection::error("e")));
}

#[test]
fn register_with_both_observers() {
    let el = EventLoop::new();
    let on_ok: OnFulfilled<i32> = Box::new(|n| Ok(n * 10));
    let on_err: OnRejected<i32> = Box::new(|_| Ok(-1));
    let on_err2: OnRejected<i32> = Box::new(|_| Ok(-1));

    let ok = Promise::resolved(&el, 3).register(Some(on_ok), Some(on_err));
    let err = Promise::<i32>::rejected(&el, Rejection::error("e")).register(None, Some(on_err2));
    el.run_until_done();
    assert_eq!(ok.value(), Some(30));
    assert_eq!(err.value(), Some(-1));
}

#[test]
fn then_promise_adopts_returned_promise() {
    let el = EventLoop::new();
    let (inner, resolve_inner, _) = Promise::pending(&el);
    let inner_clone = inner.clone();
    let outer = Promise::resolved(&el, ()).then_promise(move |_| Ok(inner_clone));

    el.run_all_microtasks();
    assert_eq!(outer.state(), PromiseState::Pending);

    resolve_inner.resolve("parsed");
    el.run_all_microtasks();
    assert_eq!(outer.value(), Some("parsed"));
    let _ = inner;
}

#[test]
fn then_or_else_converges_types() {
    let el = EventLoop::new();
    let described = Promise::<i32>::rejected(&el, Rejection::error("x"))
        .then_or_else(|n| Ok(n.to_string()), |reason| Ok(reason.to_string()));
    el.run_until_done();
    assert_eq!(described.value().as_deref(), Some("Error: x"));
}

#[test]
fn finally_runs_on_both_outcomes() {
    let el = EventLoop::new();
    let count = Rc::new(RefCell::new(0));
    let c1 = count.clone();
    let c2 = count.clone();

    let ok = Promise::resolved(&el, 1).finally(move || *c1.borrow_mut() += 1);
    let err = Promise::<i32>::rejected(&el, Rejection::error("e"))
        .finally(move || *c2.borrow_mut() += 1)
        .catch(|_| Ok(0));
    el.run_until_done();
    assert_eq!(*count.borrow(), 2);
    assert_eq!(ok.value(), Some(1));
    assert_eq!(err.value(), Some(0));
}

#[test]
fn observers_on_same_promise_run_in_registration_order() {
    let el = EventLoop::new();
    let (promise, resolve, _) = Promise::pending(&el);
    let order = Rc::new(RefCell::new(Vec::new()));
    for n in 0..4 {
        let o = order.clone();
        promise.then(move |_: ()| {
            o.borrow_mut().push(n);
            Ok(())
        });
    }
    resolve.resolve(());
    el.run_until_done();
    assert_eq!(*order.borrow(), vec![0, 1, 2, 3]);
}

#[test]
fn pending_debug_matches_console() {
    let el = EventLoop::new();
    let (promise, _, reject) = Promise::<i32>::pending(&el);
    assert_eq!(format!("{:?}", promise), "Promise { <state>: \"pending\" }");
    reject.reject(Rejection::error("x"));
    let _ = promise.catch(|_| Ok(0));
    assert_eq!(
        format!("{:?}", promise),
        "Promise { <state>: \"rejected\", <reason>: Error: x }"
    );
}
