//! Event handlers as asynchronous callbacks.
//!
//! Clicking `#xhr` starts a request and returns straight away. The request
//! reports back later through its `loadend` listener.

use core_types::Rejection;
use web_platform::{Document, Network, WIKI_HISTORY_URL};

/// Builds the XHR page: `#xhr` and `#reload` buttons and an `#event-log`.
pub fn xhr_page(network: &Network) -> Result<Document, Rejection> {
    let document = Document::new(network.event_loop());
    document.create_element("xhr");
    document.create_element("reload");
    document.create_element("event-log");
    wire_xhr_page(&document, network, WIKI_HISTORY_URL)?;
    Ok(document)
}

/// Attaches the click handlers of the XHR page, requesting `url` on click.
pub fn wire_xhr_page(document: &Document, network: &Network, url: &str) -> Result<(), Rejection> {
    let log = document
        .query_selector("#event-log")
        .ok_or_else(|| Rejection::type_error("#event-log is null"))?;

    let request_log = log.clone();
    let network = network.clone();
    let url = url.to_string();
    document.on_click("xhr", move || {
        request_log.set_text_content("");

        let xhr = network.xhr();
        let done_log = request_log.clone();
        xhr.add_loadend_listener(move |request| {
            done_log.append_text(&format!("Finished with status: {}", request.status()));
            Ok(())
        });
        xhr.open("GET", &url);
        xhr.send()?;
        request_log.append_text("Started XHR request\n");
        Ok(())
    })?;

    let page = document.clone();
    document.on_click("reload", move || {
        log.set_text_content("");
        page.reload();
        Ok(())
    })
}
