//! Run configuration assembled from the command line.

use crate::cli::Cli;
use crate::error::LessonResult;
use async_runtime::ClockMode;
use std::path::PathBuf;
use std::time::Duration;
use web_platform::{Network, StaticTransport};

/// Settings shared by every lesson.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonConfig {
    /// Virtual clock jumps to each deadline, realtime sleeps until it
    pub clock: ClockMode,
    /// Time between a request and its answer
    pub latency: Duration,
    /// Extra routes layered over the built-in ones
    pub routes: Option<PathBuf>,
    /// Log at debug level instead of warn
    pub verbose: bool,
}

impl Default for LessonConfig {
    fn default() -> Self {
        Self {
            clock: ClockMode::Virtual,
            latency: Network::DEFAULT_LATENCY,
            routes: None,
            verbose: false,
        }
    }
}

impl LessonConfig {
    /// Reads the global options of a parsed command line.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            clock: if cli.realtime {
                ClockMode::Realtime
            } else {
                ClockMode::Virtual
            },
            latency: Duration::from_millis(cli.latency_ms),
            routes: cli.routes.clone(),
            verbose: cli.verbose,
        }
    }

    /// The built-in routes, overridden by the routes file if one is set.
    pub fn transport(&self) -> LessonResult<StaticTransport> {
        let transport = StaticTransport::tutorial();
        match &self.routes {
            Some(path) => {
                let extra = StaticTransport::from_path(path)?;
                tracing::debug!(path = %path.display(), routes = extra.len(), "routes loaded");
                Ok(transport.merge(extra))
            }
            None => Ok(transport),
        }
    }

    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }
}
