//! Evented request object in the style of XMLHttpRequest.
//!
//! Completion is announced to `loadend` listeners instead of through a
//! promise. Listeners receive the request so they can read its status.

use crate::fetch::{check_scheme, Reply, Transport};
use async_runtime::{EventLoop, Task};
use core_types::Rejection;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

/// Progress of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    /// Created, `open` not called yet
    Unsent,
    /// Opened, possibly sent
    Opened,
    /// Finished, successfully or not
    Done,
}

type LoadEndHandler = Rc<dyn Fn(&XmlHttpRequest) -> Result<(), Rejection>>;

struct XhrInner {
    method: String,
    url: String,
    ready_state: ReadyState,
    sent: bool,
    status: u16,
    response_text: String,
    listeners: Vec<LoadEndHandler>,
}

/// An evented request. Create one with [`Network::xhr`](crate::Network::xhr).
#[derive(Clone)]
pub struct XmlHttpRequest {
    inner: Rc<RefCell<XhrInner>>,
    event_loop: EventLoop,
    transport: Rc<dyn Transport>,
    latency: Duration,
}

impl XmlHttpRequest {
    pub(crate) fn new(
        event_loop: &EventLoop,
        transport: Rc<dyn Transport>,
        latency: Duration,
    ) -> Self {
        Self {
            inner: Rc::new(RefCell::new(XhrInner {
                method: String::new(),
                url: String::new(),
                ready_state: ReadyState::Unsent,
                sent: false,
                status: 0,
                response_text: String::new(),
                listeners: Vec::new(),
            })),
            event_loop: event_loop.clone(),
            transport,
            latency,
        }
    }

    /// Registers a listener for the end of the request.
    ///
    /// Listeners run in registration order. A failing listener does not stop
    /// the others; the first failure is reported as the task's error.
    pub fn add_loadend_listener<F>(&self, handler: F)
    where
        F: Fn(&XmlHttpRequest) -> Result<(), Rejection> + 'static,
    {
        self.inner.borrow_mut().listeners.push(Rc::new(handler));
    }

    /// Sets the method and URL for the request.
    pub fn open(&self, method: &str, url: &str) {
        let mut inner = self.inner.borrow_mut();
        inner.method = method.to_string();
        inner.url = url.to_string();
        inner.ready_state = ReadyState::Opened;
        inner.sent = false;
        inner.status = 0;
        inner.response_text.clear();
    }

    /// Sends the request. `loadend` fires on a later task.
    ///
    /// Fails if the request is not opened or was already sent.
    pub fn send(&self) -> Result<(), Rejection> {
        let (method, url) = {
            let mut inner = self.inner.borrow_mut();
            if inner.ready_state != ReadyState::Opened || inner.sent {
                return Err(Rejection::error(
                    "InvalidStateError: The object's state must be OPENED.",
                ));
            }
            inner.sent = true;
            (inner.method.clone(), inner.url.clone())
        };

        let request = self.clone();
        tracing::debug!(%method, %url, "xhr sent");
        self.event_loop.set_timeout(
            self.latency,
            Task::new(move || {
                let answer =
                    check_scheme(&url).and_then(|_| request.transport.send(&method, &url));
                request.complete(answer)
            }),
        );
        Ok(())
    }

    /// HTTP status, or 0 before completion or after a network failure.
    pub fn status(&self) -> u16 {
        self.inner.borrow().status
    }

    /// Body received, empty until completion.
    pub fn response_text(&self) -> String {
        self.inner.borrow().response_text.clone()
    }

    /// Current progress.
    pub fn ready_state(&self) -> ReadyState {
        self.inner.borrow().ready_state
    }

    fn complete(&self, answer: Result<Reply, Rejection>) -> Result<(), Rejection> {
        let listeners = {
            let mut inner = self.inner.borrow_mut();
            match answer {
                Ok(reply) => {
                    inner.status = reply.status;
                    inner.response_text = reply.body;
                }
                Err(reason) => {
                    tracing::debug!(url = %inner.url, %reason, "xhr network failure");
                    inner.status = 0;
                }
            }
            inner.ready_state = ReadyState::Done;
            inner.listeners.clone()
        };

        let mut first_error = None;
        for listener in listeners {
            if let Err(reason) = listener(self) {
                tracing::debug!(%reason, "loadend listener failed");
                first_error.get_or_insert(reason);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl fmt::Debug for XmlHttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("XmlHttpRequest")
            .field("method", &inner.method)
            .field("url", &inner.url)
            .field("ready_state", &inner.ready_state)
            .field("status", &inner.status)
            .finish()
    }
}
