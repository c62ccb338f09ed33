//! Using promises: fetching products with chains, `catch`, `all` and an
//! `async` block.

use crate::console::Console;
use async_runtime::{all, spawn_async, Promise};
use core_types::Rejection;
use serde_json::Value;
use web_platform::{Network, Response};

/// Products URL under a scheme the network layer refuses.
pub const BAD_SCHEME_PRODUCTS_URL: &str =
    "bad-scheme://mdn.github.io/learning-area/javascript/apis/fetching-data/can-store/products.json";

/// Superheroes URL under a scheme the network layer refuses.
pub const BAD_SCHEME_SUPERHEROES_URL: &str =
    "bad-scheme://mdn.github.io/learning-area/javascript/oojs/json/superheroes.json";

/// Starts a fetch and logs the pending promise, then the status on arrival.
///
/// Prints `Promise { <state>: "pending" }` and `Started request…` before
/// `Received response: <status>`.
pub fn log_response_status(network: &Network, url: &str, console: &Console) -> Promise<u16> {
    let fetch_promise = network.fetch(url);
    console.log(format!("{fetch_promise:?}"));

    let on_response = console.clone();
    let status = fetch_promise.then(move |response| {
        on_response.log(format!("Received response: {}", response.status));
        Ok(response.status)
    });

    console.log("Started request…");
    status
}

/// Fetches a product list and logs the first product's name.
///
/// A non-2xx status rejects with `Error: HTTP error: <status>`. Nothing
/// catches here, so failures reach the returned promise.
pub fn first_product_name(network: &Network, url: &str, console: &Console) -> Promise<String> {
    let console = console.clone();
    network
        .fetch(url)
        .then_promise(|response| Ok(ensure_ok(&response)?.json()))
        .then(move |data| {
            let name = product_name(&data)?;
            console.log(name.clone());
            Ok(name)
        })
}

/// [`first_product_name`] with one `catch` at the end of the chain.
///
/// Any failure along the chain is logged as
/// `Could not get products: <reason>` and the result is `None`.
pub fn first_product_name_or_report(
    network: &Network,
    url: &str,
    console: &Console,
) -> Promise<Option<String>> {
    let on_error = console.clone();
    first_product_name(network, url, console).then_or_else(
        |name| Ok(Some(name)),
        move |error| {
            on_error.error(format!("Could not get products: {error}"));
            Ok(None)
        },
    )
}

/// Fetches every URL at once and logs `<url>: <status>` for each, in input
/// order, once all have answered.
///
/// The first failed fetch rejects the whole batch, logged as
/// `Failed to fetch: <reason>`; the result is then `None`.
pub fn fetch_all_statuses(
    network: &Network,
    urls: &[&str],
    console: &Console,
) -> Promise<Option<Vec<u16>>> {
    let fetches = urls.iter().map(|url| network.fetch(url)).collect();
    let (on_responses, on_error) = (console.clone(), console.clone());

    all(network.event_loop(), fetches).then_or_else(
        move |responses| {
            for response in &responses {
                on_responses.log(format!("{}: {}", response.url, response.status));
            }
            Ok(Some(responses.iter().map(|r| r.status).collect()))
        },
        move |error| {
            on_error.error(format!("Failed to fetch: {error}"));
            Ok(None)
        },
    )
}

/// The product chain written as a suspending function.
///
/// Each `.await` suspends until its promise settles. A failure at either
/// await, or a bad status, lands in the same local handler.
///
/// # Examples
///
/// ```
/// use async_runtime::EventLoop;
/// use lessons::{promises::fetch_products, Console};
/// use web_platform::{Network, StaticTransport, PRODUCTS_URL};
///
/// let event_loop = EventLoop::new();
/// let network = Network::new(&event_loop, StaticTransport::tutorial());
/// let console = Console::capture();
///
/// let name = fetch_products(&network, PRODUCTS_URL, &console);
/// event_loop.run_until_done();
/// assert_eq!(name.value(), Some(Some("baked beans".to_string())));
/// ```
pub fn fetch_products(network: &Network, url: &str, console: &Console) -> Promise<Option<String>> {
    let event_loop = network.event_loop().clone();
    let network = network.clone();
    let console = console.clone();
    let url = url.to_string();

    spawn_async(&event_loop, async move {
        let attempt = async {
            let response = network.fetch(&url).await?;
            let data = ensure_ok(&response)?.json().await?;
            product_name(&data)
        };
        match attempt.await {
            Ok(name) => {
                console.log(name.clone());
                Ok(Some(name))
            }
            Err(error) => {
                console.error(format!("Could not get products: {error}"));
                Ok(None)
            }
        }
    })
}

fn ensure_ok(response: &Response) -> Result<&Response, Rejection> {
    if response.ok {
        Ok(response)
    } else {
        Err(Rejection::error(format!("HTTP error: {}", response.status)))
    }
}

fn product_name(data: &Value) -> Result<String, Rejection> {
    data.get(0)
        .and_then(|product| product.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            Rejection::type_error("Cannot read properties of undefined (reading 'name')")
        })
}
