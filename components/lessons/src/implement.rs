//! Wiring a promise-based API into a page.
//!
//! The `#set-alarm` button calls [`alarm`] with the values of `#name` and
//! `#delay`, and writes the outcome into `#output`.

use async_runtime::{spawn_async, EventLoop, Promise};
use core_types::Rejection;
use web_platform::{alarm, Document, Element};

/// How the click handler consumes the alarm promise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlarmHandler {
    /// `then` for the message, a failure observer for the error
    #[default]
    Chained,
    /// A suspending function awaiting the alarm
    Awaiting,
}

/// Builds the alarm page with `name` and `delay` prefilled, then wires it.
pub fn alarm_page(
    event_loop: &EventLoop,
    name: &str,
    delay: &str,
    handler: AlarmHandler,
) -> Result<Document, Rejection> {
    let document = Document::new(event_loop);
    document.create_input("name", name);
    document.create_input("delay", delay);
    document.create_element("set-alarm");
    document.create_element("output");
    wire_alarm_page(&document, handler)?;
    Ok(document)
}

/// Attaches the `#set-alarm` click handler to `document`.
pub fn wire_alarm_page(document: &Document, handler: AlarmHandler) -> Result<(), Rejection> {
    let name = lookup(document, "#name")?;
    let delay = lookup(document, "#delay")?;
    let output = lookup(document, "#output")?;
    let event_loop = document.event_loop().clone();

    document.on_click("set-alarm", move || {
        let wake = set_alarm(&event_loop, &name.value(), &delay.value());
        let output = output.clone();
        match handler {
            AlarmHandler::Chained => {
                let on_error = output.clone();
                wake.then_or_else(
                    move |message| {
                        output.set_text_content(message);
                        Ok(())
                    },
                    move |error| {
                        on_error.set_text_content(format!("Couldn't set alarm: {error}"));
                        Ok(())
                    },
                );
            }
            AlarmHandler::Awaiting => {
                spawn_async(&event_loop, async move {
                    match wake.await {
                        Ok(message) => output.set_text_content(message),
                        Err(error) => {
                            output.set_text_content(format!("Couldn't set alarm: {error}"))
                        }
                    }
                    Ok(())
                });
            }
        }
        Ok(())
    })
}

/// Starts an alarm from raw input values. An unparsable delay rejects.
fn set_alarm(event_loop: &EventLoop, person: &str, delay: &str) -> Promise<String> {
    match delay.trim().parse::<i64>() {
        Ok(ms) => alarm(event_loop, person, ms),
        Err(_) => Promise::rejected(
            event_loop,
            Rejection::type_error(format!("Invalid delay: {delay:?}")),
        ),
    }
}

fn lookup(document: &Document, selector: &str) -> Result<Element, Rejection> {
    document
        .query_selector(selector)
        .ok_or_else(|| Rejection::type_error(format!("{selector} is null")))
}
