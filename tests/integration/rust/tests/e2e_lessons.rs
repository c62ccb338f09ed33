//! End-to-End Lesson Integration Tests
//!
//! Runs the lessons through the lessons Runner API, the same path the
//! `corten-async` binary takes.

use async_runtime::{ClockMode, RecordingSink};
use lessons::promises::{fetch_products, first_product_name_or_report};
use lessons::{Console, ConsoleLine, Lesson, LessonConfig, Runner};
use std::time::Duration;
use web_platform::{NOT_FOUND_URL, PRODUCTS_URL};

/// Test: Every lesson runs to completion without unhandled rejections
#[test]
fn test_e2e_all_lessons_clean() {
    let lessons = vec![
        Lesson::Primes {
            quota: 10,
            seed: Some(42),
        },
        Lesson::Xhr,
        Lesson::Callbacks,
        Lesson::Fetch {
            url: PRODUCTS_URL.to_string(),
        },
        Lesson::Chain {
            url: PRODUCTS_URL.to_string(),
        },
        Lesson::Catch {
            url: lessons::promises::BAD_SCHEME_PRODUCTS_URL.to_string(),
        },
        Lesson::All { urls: vec![] },
        Lesson::Await {
            url: PRODUCTS_URL.to_string(),
        },
        Lesson::Alarm {
            name: "Matilda".to_string(),
            delay: 50,
            awaiting: true,
        },
    ];

    for lesson in lessons {
        let sink = RecordingSink::new();
        let runner =
            Runner::with_sink(&LessonConfig::default(), Console::capture(), sink.clone()).unwrap();
        runner.run(&lesson).unwrap();
        assert!(sink.unhandled().is_empty(), "{lesson:?} left a rejection unhandled");
        assert!(sink.uncaught_errors().is_empty(), "{lesson:?} threw from a task");
        assert!(!runner.console().lines().is_empty(), "{lesson:?} printed nothing");
    }
}

/// Test: Chain-with-catch and the suspending version print the same lines
#[test]
fn test_e2e_chain_and_await_agree() {
    let runner = Runner::new(&LessonConfig::default(), Console::capture()).unwrap();
    let chained_console = Console::capture();
    let awaited_console = Console::capture();

    for url in [PRODUCTS_URL, NOT_FOUND_URL, "bad-scheme://nowhere"] {
        let chained = first_product_name_or_report(runner.network(), url, &chained_console);
        let awaited = fetch_products(runner.network(), url, &awaited_console);
        runner.event_loop().run_until_done();
        assert_eq!(chained.value(), awaited.value());
    }

    assert_eq!(chained_console.lines(), awaited_console.lines());
    assert_eq!(
        chained_console.lines(),
        vec![
            ConsoleLine::Log("baked beans".to_string()),
            ConsoleLine::Error("Could not get products: Error: HTTP error: 404".to_string()),
            ConsoleLine::Error("Could not get products: TypeError: Failed to fetch".to_string()),
        ]
    );
}

/// Test: Lessons sharing one runner share one clock
#[test]
fn test_e2e_runner_clock_accumulates() {
    let runner = Runner::new(&LessonConfig::default(), Console::capture()).unwrap();
    runner
        .run(&Lesson::Fetch {
            url: PRODUCTS_URL.to_string(),
        })
        .unwrap();
    runner
        .run(&Lesson::Alarm {
            name: "Ada".to_string(),
            delay: 1000,
            awaiting: false,
        })
        .unwrap();

    assert_eq!(runner.event_loop().now(), Duration::from_millis(1100));
    assert_eq!(
        runner.console().logs().last().map(String::as_str),
        Some("Wake up, Ada!")
    );
}

/// Test: Realtime clock actually waits for the timers
#[test]
fn test_e2e_realtime_clock() {
    let config = LessonConfig {
        clock: ClockMode::Realtime,
        latency: Duration::from_millis(20),
        ..LessonConfig::default()
    };
    let runner = Runner::new(&config, Console::capture()).unwrap();
    let started = std::time::Instant::now();
    runner
        .run(&Lesson::Await {
            url: PRODUCTS_URL.to_string(),
        })
        .unwrap();

    assert!(started.elapsed() >= Duration::from_millis(20));
    assert_eq!(runner.console().logs(), vec!["baked beans"]);
}
