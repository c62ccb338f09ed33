//! Lesson orchestration
//!
//! The Runner owns one event loop, the network bound to it and the console
//! every lesson prints to. Running a lesson starts it, drives the loop
//! until no work is left and turns an uncaught rejection into an error.

use crate::callbacks::{do_operation, do_operation_chained};
use crate::cli::Lesson;
use crate::config::LessonConfig;
use crate::console::Console;
use crate::error::{LessonError, LessonResult};
use crate::implement::AlarmHandler;
use crate::promises::{
    fetch_all_statuses, fetch_products, first_product_name, first_product_name_or_report,
    log_response_status, BAD_SCHEME_SUPERHEROES_URL,
};
use crate::{event_handlers, implement, primes};
use async_runtime::{EventLoop, Promise, RejectionSink, TracingSink};
use web_platform::{Document, Network, NOT_FOUND_URL, PRODUCTS_URL};

/// Runs lessons on a shared event loop.
pub struct Runner {
    event_loop: EventLoop,
    network: Network,
    console: Console,
}

impl Runner {
    /// Create a runner reporting unhandled rejections through `tracing`
    ///
    /// # Errors
    /// Returns `LessonError::Routes` if the configured routes file cannot be loaded
    ///
    /// # Example
    /// ```
    /// use lessons::{Console, Lesson, LessonConfig, Runner};
    ///
    /// let runner = Runner::new(&LessonConfig::default(), Console::capture()).unwrap();
    /// runner.run(&Lesson::Callbacks).unwrap();
    /// assert_eq!(runner.console().logs(), vec!["result: 6", "result: 6"]);
    /// ```
    pub fn new(config: &LessonConfig, console: Console) -> LessonResult<Self> {
        Self::with_sink(config, console, TracingSink)
    }

    /// Create a runner with a custom unhandled-rejection sink
    pub fn with_sink(
        config: &LessonConfig,
        console: Console,
        sink: impl RejectionSink + 'static,
    ) -> LessonResult<Self> {
        let event_loop = EventLoop::builder()
            .clock(config.clock)
            .rejection_sink(sink)
            .build();
        let network = Network::new(&event_loop, config.transport()?).with_latency(config.latency);
        Ok(Self {
            event_loop,
            network,
            console,
        })
    }

    /// Run one lesson to completion
    ///
    /// # Errors
    /// Returns `LessonError::Uncaught` if the lesson's result rejects, and
    /// `LessonError::Stalled` if it is still pending once the loop is idle
    pub fn run(&self, lesson: &Lesson) -> LessonResult<()> {
        tracing::debug!(?lesson, "running lesson");
        let network = &self.network;
        let console = &self.console;

        match lesson {
            Lesson::Primes { quota, seed } => {
                let seed = seed.unwrap_or_else(rand::random);
                let page = primes::prime_page(&self.event_loop, &quota.to_string(), seed)?;
                self.click_and_show(&page, "generate", "output")
            }
            Lesson::Xhr => {
                let page = event_handlers::xhr_page(network)?;
                self.click_and_show(&page, "xhr", "event-log")
            }
            Lesson::Callbacks => {
                do_operation(console);
                self.settle(do_operation_chained(&self.event_loop, console))
                    .map(drop)
            }
            Lesson::Fetch { url } => self
                .settle(log_response_status(network, url, console))
                .map(drop),
            Lesson::Chain { url } => self
                .settle(first_product_name(network, url, console))
                .map(drop),
            Lesson::Catch { url } => self
                .settle(first_product_name_or_report(network, url, console))
                .map(drop),
            Lesson::All { urls } => {
                let urls: Vec<&str> = if urls.is_empty() {
                    vec![PRODUCTS_URL, NOT_FOUND_URL, BAD_SCHEME_SUPERHEROES_URL]
                } else {
                    urls.iter().map(String::as_str).collect()
                };
                self.settle(fetch_all_statuses(network, &urls, console))
                    .map(drop)
            }
            Lesson::Await { url } => self
                .settle(fetch_products(network, url, console))
                .map(drop),
            Lesson::Alarm {
                name,
                delay,
                awaiting,
            } => {
                let page = implement::alarm_page(
                    &self.event_loop,
                    name,
                    &delay.to_string(),
                    if *awaiting {
                        AlarmHandler::Awaiting
                    } else {
                        AlarmHandler::Chained
                    },
                )?;
                self.click_and_show(&page, "set-alarm", "output")
            }
        }
    }

    /// The console lessons print to
    pub fn console(&self) -> &Console {
        &self.console
    }

    /// The event loop lessons run on
    pub fn event_loop(&self) -> &EventLoop {
        &self.event_loop
    }

    /// The network lessons fetch through
    pub fn network(&self) -> &Network {
        &self.network
    }

    fn settle<T: Clone + 'static>(&self, promise: Promise<T>) -> LessonResult<T> {
        self.event_loop.run_until_done();
        match promise.outcome() {
            Some(Ok(value)) => Ok(value),
            Some(Err(reason)) => Err(LessonError::Uncaught(reason)),
            None => Err(LessonError::Stalled),
        }
    }

    fn click_and_show(&self, page: &Document, button: &str, output: &str) -> LessonResult<()> {
        page.click(button)?;
        self.event_loop.run_until_done();
        if let Some(element) = page.get_element_by_id(output) {
            self.console.log(element.text_content());
        }
        Ok(())
    }
}
