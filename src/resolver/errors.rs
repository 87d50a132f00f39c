//! Resolver error types and diagnostics.

use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// A failed invocation of the external package manager.
///
/// The resolver is opaque: its exit status and stderr are carried verbatim.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("`{command}` failed ({})", status_text(*.status))]
pub struct ResolverFailure {
    /// The command line that was run
    pub command: String,

    /// Exit code; `None` if the process was killed or never started
    pub status: Option<i32>,

    /// Captured standard error
    pub stderr: String,
}

fn status_text(status: Option<i32>) -> String {
    match status {
        Some(code) => format!("exit code {}", code),
        None => "terminated".to_string(),
    }
}

impl ResolverFailure {
    pub fn new(command: impl Into<String>, status: Option<i32>, stderr: impl Into<String>) -> Self {
        ResolverFailure {
            command: command.into(),
            status,
            stderr: stderr.into(),
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(format!("package resolution failed: {}", self));

        for line in self.stderr.lines().filter(|l| !l.trim().is_empty()) {
            diag = diag.with_context(line.trim().to_string());
        }

        diag.with_suggestion(suggestions::RESOLVER_FAILED)
    }
}
