//! Minimal document model: elements looked up by id, plus event listeners.
//!
//! Dispatching an event never runs handlers inline. It queues one task on
//! the event loop that calls every listener for that element and event, in
//! registration order.

use async_runtime::{EventLoop, Task};
use core_types::Rejection;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Zero-argument event handler.
pub type EventHandler = Rc<dyn Fn() -> Result<(), Rejection>>;

#[derive(Debug, Clone, Default)]
struct ElementData {
    text_content: String,
    value: String,
    initial_value: String,
}

#[derive(Default)]
struct DocumentInner {
    elements: HashMap<String, ElementData>,
    listeners: HashMap<(String, String), Vec<EventHandler>>,
}

/// A document holding elements by id.
///
/// Clones are handles to the same document.
///
/// # Examples
///
/// ```
/// use async_runtime::EventLoop;
/// use web_platform::Document;
///
/// let event_loop = EventLoop::new();
/// let document = Document::new(&event_loop);
/// let output = document.create_element("output");
///
/// let target = output.clone();
/// document
///     .on_click("output", move || {
///         target.set_text_content("clicked");
///         Ok(())
///     })
///     .unwrap();
///
/// document.click("output").unwrap();
/// assert_eq!(output.text_content(), "");
/// event_loop.run_until_done();
/// assert_eq!(output.text_content(), "clicked");
/// ```
#[derive(Clone)]
pub struct Document {
    inner: Rc<RefCell<DocumentInner>>,
    event_loop: EventLoop,
}

impl Document {
    /// Creates an empty document bound to `event_loop`.
    pub fn new(event_loop: &EventLoop) -> Self {
        Self {
            inner: Rc::new(RefCell::new(DocumentInner::default())),
            event_loop: event_loop.clone(),
        }
    }

    /// Adds an element with an empty value, replacing any element with that id.
    pub fn create_element(&self, id: &str) -> Element {
        self.create_input(id, "")
    }

    /// Adds an element whose value starts as `value` and returns to it on reload.
    pub fn create_input(&self, id: &str, value: &str) -> Element {
        self.inner.borrow_mut().elements.insert(
            id.to_string(),
            ElementData {
                text_content: String::new(),
                value: value.to_string(),
                initial_value: value.to_string(),
            },
        );
        self.element(id)
    }

    /// Looks up an element by id.
    pub fn get_element_by_id(&self, id: &str) -> Option<Element> {
        if self.inner.borrow().elements.contains_key(id) {
            Some(self.element(id))
        } else {
            None
        }
    }

    /// Looks up an element with an id selector such as `#output`.
    ///
    /// Only id selectors are supported; anything else matches nothing.
    pub fn query_selector(&self, selector: &str) -> Option<Element> {
        selector
            .strip_prefix('#')
            .and_then(|id| self.get_element_by_id(id))
    }

    /// Registers `handler` for `event` on the element with id `id`.
    ///
    /// Fails with a `TypeError` if no such element exists.
    pub fn add_event_listener<F>(&self, id: &str, event: &str, handler: F) -> Result<(), Rejection>
    where
        F: Fn() -> Result<(), Rejection> + 'static,
    {
        self.require(id, "addEventListener")?;
        self.inner
            .borrow_mut()
            .listeners
            .entry((id.to_string(), event.to_string()))
            .or_default()
            .push(Rc::new(handler));
        Ok(())
    }

    /// Shorthand for a `click` listener.
    pub fn on_click<F>(&self, id: &str, handler: F) -> Result<(), Rejection>
    where
        F: Fn() -> Result<(), Rejection> + 'static,
    {
        self.add_event_listener(id, "click", handler)
    }

    /// Queues a task delivering `event` to the element's listeners.
    pub fn dispatch(&self, id: &str, event: &str) -> Result<(), Rejection> {
        self.require(id, "dispatchEvent")?;
        let handlers: Vec<EventHandler> = self
            .inner
            .borrow()
            .listeners
            .get(&(id.to_string(), event.to_string()))
            .cloned()
            .unwrap_or_default();

        let target = id.to_string();
        let event = event.to_string();
        tracing::debug!(%target, %event, listeners = handlers.len(), "event queued");
        self.event_loop.enqueue_task(Task::new(move || {
            let mut first_error = None;
            for handler in handlers {
                if let Err(reason) = handler() {
                    tracing::debug!(%target, %event, %reason, "listener failed");
                    first_error.get_or_insert(reason);
                }
            }
            first_error.map_or(Ok(()), Err)
        }));
        Ok(())
    }

    /// Simulates a user click on the element.
    pub fn click(&self, id: &str) -> Result<(), Rejection> {
        self.dispatch(id, "click")
    }

    /// Restores every element to its initial state. Listeners stay attached.
    pub fn reload(&self) {
        for element in self.inner.borrow_mut().elements.values_mut() {
            element.text_content.clear();
            element.value = element.initial_value.clone();
        }
    }

    /// Returns the event loop this document dispatches on.
    pub fn event_loop(&self) -> &EventLoop {
        &self.event_loop
    }

    fn element(&self, id: &str) -> Element {
        Element {
            id: id.to_string(),
            document: Rc::clone(&self.inner),
        }
    }

    fn require(&self, id: &str, reading: &str) -> Result<(), Rejection> {
        if self.inner.borrow().elements.contains_key(id) {
            Ok(())
        } else {
            Err(Rejection::type_error(format!(
                "Cannot read properties of null (reading '{reading}')"
            )))
        }
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        let mut ids: Vec<&String> = inner.elements.keys().collect();
        ids.sort();
        f.debug_struct("Document").field("elements", &ids).finish()
    }
}

/// Handle to one element of a [`Document`].
#[derive(Clone)]
pub struct Element {
    id: String,
    document: Rc<RefCell<DocumentInner>>,
}

impl Element {
    /// The element's id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current text content.
    pub fn text_content(&self) -> String {
        self.read(|e| e.text_content.clone())
    }

    /// Replaces the text content.
    pub fn set_text_content(&self, text: impl Into<String>) {
        let text = text.into();
        self.write(move |e| e.text_content = text);
    }

    /// Appends to the text content.
    pub fn append_text(&self, text: &str) {
        self.write(|e| e.text_content.push_str(text));
    }

    /// Current value (for input elements).
    pub fn value(&self) -> String {
        self.read(|e| e.value.clone())
    }

    /// Replaces the value.
    pub fn set_value(&self, value: impl Into<String>) {
        let value = value.into();
        self.write(move |e| e.value = value);
    }

    fn read<R>(&self, f: impl FnOnce(&ElementData) -> R) -> R {
        let document = self.document.borrow();
        match document.elements.get(&self.id) {
            Some(data) => f(data),
            None => f(&ElementData::default()),
        }
    }

    fn write(&self, f: impl FnOnce(&mut ElementData)) {
        if let Some(data) = self.document.borrow_mut().elements.get_mut(&self.id) {
            f(data);
        }
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("id", &self.id)
            .field("text_content", &self.text_content())
            .finish()
    }
}
