//! Promise-based network access.
//!
//! [`Network::fetch`] answers with a [`Promise`] of a [`Response`]. The
//! answer arrives after a configurable latency, as a timer on the event
//! loop. Where the bytes come from is up to a [`Transport`]; the bundled
//! [`StaticTransport`] serves a fixed route table.

use crate::xhr::XmlHttpRequest;
use async_runtime::{EventLoop, Promise, Task};
use core_types::Rejection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;
use thiserror::Error;

/// Products catalogue served by [`StaticTransport::tutorial`].
pub const PRODUCTS_URL: &str =
    "https://mdn.github.io/learning-area/javascript/apis/fetching-data/can-store/products.json";

/// A URL under the catalogue host with nothing behind it.
pub const NOT_FOUND_URL: &str =
    "https://mdn.github.io/learning-area/javascript/apis/fetching-data/can-store/not-found";

/// Superheroes document served by [`StaticTransport::tutorial`].
pub const SUPERHEROES_URL: &str =
    "https://mdn.github.io/learning-area/javascript/oojs/json/superheroes.json";

/// Large history file used by the XHR example.
pub const WIKI_HISTORY_URL: &str =
    "https://raw.githubusercontent.com/mdn/content/main/files/en-us/_wikihistory.json";

/// What a transport returns for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: String,
}

impl Reply {
    /// Creates a reply.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Moves a request to wherever it is served.
pub trait Transport {
    /// Performs the request. `Err` means no HTTP answer came back at all.
    fn send(&self, method: &str, url: &str) -> Result<Reply, Rejection>;
}

/// One entry of a routes file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteEntry {
    /// HTTP status code
    #[serde(default = "default_status")]
    pub status: u16,
    /// Body; strings are served verbatim, anything else as JSON text
    #[serde(default)]
    pub body: serde_json::Value,
}

fn default_status() -> u16 {
    200
}

impl From<RouteEntry> for Reply {
    fn from(entry: RouteEntry) -> Self {
        let body = match entry.body {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(text) => text,
            other => other.to_string(),
        };
        Reply::new(entry.status, body)
    }
}

/// Errors loading a routes file.
#[derive(Debug, Error)]
pub enum RoutesError {
    /// The file could not be read
    #[error("could not read routes file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not a JSON object of routes
    #[error("invalid routes file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Transport serving a fixed table of URLs. Unknown URLs answer 404.
///
/// # Examples
///
/// ```
/// use web_platform::{StaticTransport, Transport};
///
/// let transport = StaticTransport::new().with_route("https://example.com/a", 200, "hello");
/// assert_eq!(transport.send("GET", "https://example.com/a").unwrap().body, "hello");
/// assert_eq!(transport.send("GET", "https://example.com/b").unwrap().status, 404);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticTransport {
    routes: HashMap<String, Reply>,
}

impl StaticTransport {
    /// Creates a transport with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a route.
    pub fn with_route(mut self, url: &str, status: u16, body: impl Into<String>) -> Self {
        self.routes.insert(url.to_string(), Reply::new(status, body));
        self
    }

    /// Parses a JSON object mapping URLs to [`RouteEntry`]s.
    pub fn from_json_str(json: &str) -> Result<Self, RoutesError> {
        let entries: HashMap<String, RouteEntry> = serde_json::from_str(json)?;
        Ok(Self {
            routes: entries
                .into_iter()
                .map(|(url, entry)| (url, Reply::from(entry)))
                .collect(),
        })
    }

    /// Loads a routes file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RoutesError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Adds every route of `other`, replacing clashes.
    pub fn merge(mut self, other: StaticTransport) -> Self {
        self.routes.extend(other.routes);
        self
    }

    /// Routes the tutorial pages request.
    pub fn tutorial() -> Self {
        let products = serde_json::json!([
            { "name": "baked beans", "price": 0.4, "image": "beans.jpg", "type": "vegetables" },
            { "name": "hot dog sausages", "price": 1.99, "image": "hotdogs.jpg", "type": "meat" },
            { "name": "spam", "price": 2.85, "image": "spam.jpg", "type": "meat" },
        ]);
        let superheroes = serde_json::json!({
            "squadName": "Super hero squad",
            "homeTown": "Metro City",
            "active": true,
        });
        let history = serde_json::json!({ "Web": { "modified": "2020-10-15T21:46:53.311Z" } });

        Self::new()
            .with_route(PRODUCTS_URL, 200, products.to_string())
            .with_route(SUPERHEROES_URL, 200, superheroes.to_string())
            .with_route(WIKI_HISTORY_URL, 200, history.to_string())
    }

    /// Number of routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if there are no routes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Transport for StaticTransport {
    fn send(&self, method: &str, url: &str) -> Result<Reply, Rejection> {
        let reply = self
            .routes
            .get(url)
            .cloned()
            .unwrap_or_else(|| Reply::new(404, "Not Found"));
        tracing::trace!(%method, %url, status = reply.status, "static transport");
        Ok(reply)
    }
}

/// Returns the standard reason phrase for a status code.
pub fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "",
    }
}

/// Rejects URLs whose scheme the network layer cannot serve.
pub(crate) fn check_scheme(url: &str) -> Result<(), Rejection> {
    match url.split_once("://") {
        Some(("http", _)) | Some(("https", _)) => Ok(()),
        _ => Err(Rejection::type_error("Failed to fetch")),
    }
}

/// The answer to a fetch.
#[derive(Clone)]
pub struct Response {
    /// Final URL of the response
    pub url: String,
    /// HTTP status code
    pub status: u16,
    /// Reason phrase for the status
    pub status_text: String,
    /// True for 2xx statuses
    pub ok: bool,
    body: String,
    event_loop: EventLoop,
}

impl Response {
    fn new(event_loop: &EventLoop, url: String, reply: Reply) -> Self {
        Self {
            url,
            status: reply.status,
            status_text: status_text(reply.status).to_string(),
            ok: (200..=299).contains(&reply.status),
            body: reply.body,
            event_loop: event_loop.clone(),
        }
    }

    /// Decodes the body as JSON. Rejects with `SyntaxError` if it is not JSON.
    pub fn json(&self) -> Promise<serde_json::Value> {
        let body = self.body.clone();
        Promise::new(&self.event_loop, move |resolve, _| {
            let data = serde_json::from_str(&body)
                .map_err(|e| Rejection::syntax_error(format!("JSON.parse: {e}")))?;
            resolve.resolve(data);
            Ok(())
        })
    }

    /// Returns the body as text.
    pub fn text(&self) -> Promise<String> {
        Promise::resolved(&self.event_loop, self.body.clone())
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("url", &self.url)
            .field("status", &self.status)
            .field("ok", &self.ok)
            .finish()
    }
}

/// Network access bound to one event loop.
///
/// # Examples
///
/// ```
/// use async_runtime::EventLoop;
/// use web_platform::{Network, StaticTransport, PRODUCTS_URL};
///
/// let event_loop = EventLoop::new();
/// let network = Network::new(&event_loop, StaticTransport::tutorial());
///
/// let status = network.fetch(PRODUCTS_URL).then(|response| Ok(response.status));
/// event_loop.run_until_done();
/// assert_eq!(status.value(), Some(200));
/// ```
#[derive(Clone)]
pub struct Network {
    event_loop: EventLoop,
    transport: Rc<dyn Transport>,
    latency: Duration,
}

impl Network {
    /// Default time between a request and its answer.
    pub const DEFAULT_LATENCY: Duration = Duration::from_millis(100);

    /// Creates network access over `transport`.
    pub fn new(event_loop: &EventLoop, transport: impl Transport + 'static) -> Self {
        Self {
            event_loop: event_loop.clone(),
            transport: Rc::new(transport),
            latency: Self::DEFAULT_LATENCY,
        }
    }

    /// Sets the time between a request and its answer.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// The configured latency.
    pub fn latency(&self) -> Duration {
        self.latency
    }

    /// Starts a GET request.
    ///
    /// Rejects with `TypeError: Failed to fetch` for non-HTTP schemes or
    /// transport failures. HTTP error statuses still fulfill; check
    /// [`Response::ok`].
    pub fn fetch(&self, url: &str) -> Promise<Response> {
        let (promise, resolve, reject) = Promise::pending(&self.event_loop);
        let transport = Rc::clone(&self.transport);
        let event_loop = self.event_loop.clone();
        let url = url.to_string();

        tracing::debug!(%url, "fetch started");
        self.event_loop.set_timeout(
            self.latency,
            Task::new(move || {
                match check_scheme(&url).and_then(|_| transport.send("GET", &url)) {
                    Ok(reply) => {
                        tracing::debug!(%url, status = reply.status, "fetch answered");
                        resolve.resolve(Response::new(&event_loop, url, reply));
                    }
                    Err(reason) => {
                        tracing::debug!(%url, %reason, "fetch failed");
                        reject.reject(reason);
                    }
                }
                Ok(())
            }),
        );
        promise
    }

    /// Creates an evented request object sharing this network.
    pub fn xhr(&self) -> XmlHttpRequest {
        XmlHttpRequest::new(&self.event_loop, Rc::clone(&self.transport), self.latency)
    }

    /// Returns the event loop requests complete on.
    pub fn event_loop(&self) -> &EventLoop {
        &self.event_loop
    }
}

impl fmt::Debug for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Network")
            .field("latency", &self.latency)
            .finish()
    }
}
