//! Command-line argument parsing

use crate::promises::BAD_SCHEME_PRODUCTS_URL;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use web_platform::PRODUCTS_URL;

/// Corten async walkthrough
#[derive(Parser, Debug)]
#[command(name = "corten-async")]
#[command(about = "Runs the asynchronous programming lessons on a simulated event loop", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Lesson to run
    #[command(subcommand)]
    pub lesson: Lesson,

    /// Sleep through timers instead of jumping the clock
    #[arg(long, global = true)]
    pub realtime: bool,

    /// Network latency in milliseconds
    #[arg(long, global = true, value_name = "MS", default_value_t = 100)]
    pub latency_ms: u64,

    /// JSON file of extra routes (`{ "<url>": { "status": 200, "body": ... } }`)
    #[arg(long, global = true, value_name = "FILE")]
    pub routes: Option<PathBuf>,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// The lessons, one per section of the walkthrough.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Lesson {
    /// Generate primes inside a click handler
    Primes {
        /// How many primes to generate
        #[arg(long, default_value_t = 1_000_000)]
        quota: usize,

        /// Seed for candidate selection (random if omitted)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Start a request from a click handler and wait for loadend
    Xhr,

    /// Nested callbacks, then the same steps as a chain
    Callbacks,

    /// Log a fetch promise and its response status
    Fetch {
        /// URL to fetch
        #[arg(default_value = PRODUCTS_URL)]
        url: String,
    },

    /// Chain fetch, status check and JSON decoding
    Chain {
        /// Product list URL
        #[arg(default_value = PRODUCTS_URL)]
        url: String,
    },

    /// The product chain with a catch at the end
    Catch {
        /// Product list URL
        #[arg(default_value = BAD_SCHEME_PRODUCTS_URL)]
        url: String,
    },

    /// Fetch several URLs at once and wait for all of them
    All {
        /// URLs to fetch (the three tutorial URLs if omitted)
        urls: Vec<String>,
    },

    /// The product chain as a suspending function
    Await {
        /// Product list URL
        #[arg(default_value = PRODUCTS_URL)]
        url: String,
    },

    /// Set an alarm from the alarm page
    Alarm {
        /// Who to wake
        #[arg(long, default_value = "Matilda")]
        name: String,

        /// Delay in milliseconds
        #[arg(long, default_value_t = 1000, allow_hyphen_values = true)]
        delay: i64,

        /// Await the alarm instead of chaining on it
        #[arg(long = "await")]
        awaiting: bool,
    },
}
