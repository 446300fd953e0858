//! User-facing output: the console sink plus listing and summary rendering.

pub mod json;
pub mod text;

use std::cell::RefCell;
use std::io::Write as _;

pub use json::to_json;
pub use text::{format_listing, format_summary};

/// Where user-facing text goes.
///
/// `Stdio` writes straight to the process streams; `Captured` keeps both
/// streams in memory so tests can assert on what a workflow printed.
pub enum Console {
    Stdio,
    Captured(RefCell<Captured>),
}

#[derive(Debug, Default)]
pub struct Captured {
    pub stdout: String,
    pub stderr: String,
}

impl Console {
    #[must_use]
    pub fn captured() -> Self {
        Self::Captured(RefCell::new(Captured::default()))
    }

    pub fn out(&self, text: &str) {
        match self {
            Self::Stdio => {
                let mut handle = std::io::stdout().lock();
                let _ = handle.write_all(text.as_bytes());
                let _ = handle.flush();
            }
            Self::Captured(buf) => buf.borrow_mut().stdout.push_str(text),
        }
    }

    pub fn outln(&self, text: &str) {
        self.out(text);
        self.out("\n");
    }

    pub fn errln(&self, text: &str) {
        match self {
            Self::Stdio => {
                let mut handle = std::io::stderr().lock();
                let _ = writeln!(handle, "{text}");
            }
            Self::Captured(buf) => {
                let mut buf = buf.borrow_mut();
                buf.stderr.push_str(text);
                buf.stderr.push('\n');
            }
        }
    }

    /// Everything written to stdout so far; empty for `Stdio`.
    #[must_use]
    pub fn stdout_text(&self) -> String {
        match self {
            Self::Stdio => String::new(),
            Self::Captured(buf) => buf.borrow().stdout.clone(),
        }
    }

    #[must_use]
    pub fn stderr_text(&self) -> String {
        match self {
            Self::Stdio => String::new(),
            Self::Captured(buf) => buf.borrow().stderr.clone(),
        }
    }
}
