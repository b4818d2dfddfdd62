//! The external linter seam.

use crate::issue::Issue;
use std::future::Future;
use thiserror::Error;

/// Errors from a lint invocation. Any of them aborts the detection cycle.
#[derive(Debug, Error)]
pub enum LintError {
    #[error("failed to spawn '{program}': {source}")]
    /// The linter process could not be started.
    Spawn {
        /// Program that was launched.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error talking to the linter: {0}")]
    /// Writing input or collecting output failed.
    Io(#[from] std::io::Error),

    #[error("linter exited with {}: {stderr}", exit_label(.code))]
    /// The linter exited with a status other than 0 (clean) or 1 (issues found).
    UnexpectedExit {
        /// Exit code, or `None` when terminated by a signal.
        code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },

    #[error("malformed linter output: {0}")]
    /// The linter's JSON output could not be decoded.
    MalformedOutput(#[from] serde_json::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {code}"),
        None => "a signal".to_string(),
    }
}

/// Runs the external prose linter over a piece of text.
///
/// Implementations must not hold on to the text after the returned future resolves. The issues'
/// line and span fields are relative to `text`.
pub trait Linter {
    /// Lint `text`, returning every reported issue in the linter's order.
    fn lint(&self, text: &str) -> impl Future<Output = Result<Vec<Issue>, LintError>> + Send;
}

impl<L: Linter + ?Sized> Linter for &L {
    fn lint(&self, text: &str) -> impl Future<Output = Result<Vec<Issue>, LintError>> + Send {
        (**self).lint(text)
    }
}
