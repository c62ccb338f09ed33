//! Synchronous prime generation inside a click handler.
//!
//! The handler computes every prime before returning, so nothing else on
//! the event loop runs until it is done.

use async_runtime::EventLoop;
use core_types::Rejection;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::rc::Rc;
use web_platform::{Document, Element};

/// Candidates are drawn from `0..MAX_PRIME`.
pub const MAX_PRIME: u32 = 1_000_000;

const PRIME_RESERVE: usize = 1024;

/// Trial division up to the square root.
pub fn is_prime(n: u32) -> bool {
    let n = u64::from(n);
    let mut i = 2u64;
    while i * i <= n {
        if n % i == 0 {
            return false;
        }
        i += 1;
    }
    n > 1
}

/// Draws random candidates until `quota` primes are found.
///
/// Duplicates are allowed; each hit counts toward the quota. The result
/// grows as primes are found, so the quota itself never sizes an allocation.
///
/// # Examples
///
/// ```
/// use lessons::primes::{generate_primes, is_prime};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let primes = generate_primes(5, &mut StdRng::seed_from_u64(1));
/// assert_eq!(primes.len(), 5);
/// assert!(primes.iter().all(|&p| is_prime(p)));
/// ```
pub fn generate_primes<R: Rng + ?Sized>(quota: usize, rng: &mut R) -> Vec<u32> {
    let mut primes = Vec::with_capacity(quota.min(PRIME_RESERVE));
    while primes.len() < quota {
        let candidate = rng.gen_range(0..MAX_PRIME);
        if is_prime(candidate) {
            primes.push(candidate);
        }
    }
    primes
}

/// Builds the prime page: `#quota` input, `#generate` and `#reload` buttons,
/// and an `#output` element. Then wires it with [`wire_prime_page`].
pub fn prime_page(
    event_loop: &EventLoop,
    quota: &str,
    seed: u64,
) -> Result<Document, Rejection> {
    let document = Document::new(event_loop);
    document.create_input("quota", quota);
    document.create_element("generate");
    document.create_element("reload");
    document.create_element("output");
    wire_prime_page(&document, StdRng::seed_from_u64(seed))?;
    Ok(document)
}

/// Attaches the click handlers of the prime page to `document`.
///
/// Fails if one of `#quota`, `#output`, `#generate` or `#reload` is missing.
pub fn wire_prime_page(document: &Document, rng: StdRng) -> Result<(), Rejection> {
    let quota = lookup(document, "#quota")?;
    let output = lookup(document, "#output")?;
    let rng = Rc::new(RefCell::new(rng));

    document.on_click("generate", move || {
        let raw = quota.value();
        let count: usize = raw
            .trim()
            .parse()
            .map_err(|_| Rejection::type_error(format!("Invalid quota: {raw:?}")))?;
        let primes = generate_primes(count, &mut *rng.borrow_mut());
        tracing::debug!(quota = count, largest = ?primes.iter().max(), "primes generated");
        output.set_text_content(format!("Finished generating {raw} primes!"));
        Ok(())
    })?;

    let page = document.clone();
    document.on_click("reload", move || {
        page.reload();
        Ok(())
    })
}

fn lookup(document: &Document, selector: &str) -> Result<Element, Rejection> {
    document
        .query_selector(selector)
        .ok_or_else(|| Rejection::type_error(format!("{selector} is null")))
}
