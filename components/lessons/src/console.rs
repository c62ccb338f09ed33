//! Console capture.
//!
//! Lessons write through a [`Console`] instead of straight to stdout so
//! tests can read back exactly what was printed and in which order.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// One printed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleLine {
    /// `console.log`
    Log(String),
    /// `console.error`
    Error(String),
}

impl fmt::Display for ConsoleLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleLine::Log(text) => write!(f, "{text}"),
            ConsoleLine::Error(text) => write!(f, "error: {text}"),
        }
    }
}

/// Recording console. Clones share the same lines.
#[derive(Debug, Clone, Default)]
pub struct Console {
    lines: Rc<RefCell<Vec<ConsoleLine>>>,
    echo: bool,
}

impl Console {
    /// A console that only records.
    pub fn capture() -> Self {
        Self::default()
    }

    /// A console that records and also prints logs to stdout, errors to stderr.
    pub fn stdio() -> Self {
        Self {
            lines: Rc::default(),
            echo: true,
        }
    }

    /// Prints a log line.
    pub fn log(&self, text: impl Into<String>) {
        let text = text.into();
        if self.echo {
            println!("{text}");
        }
        self.lines.borrow_mut().push(ConsoleLine::Log(text));
    }

    /// Prints an error line.
    pub fn error(&self, text: impl Into<String>) {
        let text = text.into();
        if self.echo {
            eprintln!("{text}");
        }
        self.lines.borrow_mut().push(ConsoleLine::Error(text));
    }

    /// Every line so far, in print order.
    pub fn lines(&self) -> Vec<ConsoleLine> {
        self.lines.borrow().clone()
    }

    /// Log lines only.
    pub fn logs(&self) -> Vec<String> {
        self.lines
            .borrow()
            .iter()
            .filter_map(|line| match line {
                ConsoleLine::Log(text) => Some(text.clone()),
                ConsoleLine::Error(_) => None,
            })
            .collect()
    }

    /// Error lines only.
    pub fn errors(&self) -> Vec<String> {
        self.lines
            .borrow()
            .iter()
            .filter_map(|line| match line {
                ConsoleLine::Error(text) => Some(text.clone()),
                ConsoleLine::Log(_) => None,
            })
            .collect()
    }
}
