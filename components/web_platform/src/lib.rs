//! Host collaborators for the async runtime
//!
//! Implements the pieces of a browser page that asynchronous code talks to:
//! a document with click listeners, promise-based fetch, an evented request
//! object, timers and the alarm API built on them.

pub mod dom;
pub mod fetch;
pub mod timers;
pub mod xhr;

// Re-export main types
pub use dom::{Document, Element, EventHandler};
pub use fetch::{
    status_text, Network, Reply, Response, RouteEntry, RoutesError, StaticTransport, Transport,
    NOT_FOUND_URL, PRODUCTS_URL, SUPERHEROES_URL, WIKI_HISTORY_URL,
};
pub use timers::{alarm, clear_timeout, set_timeout};
pub use xhr::{ReadyState, XmlHttpRequest};
