// ABOUTME: Release accounting for resources that must be closed together.
// ABOUTME: Collects every close failure and reports them as one error.

use std::fmt;
use thiserror::Error;

/// One resource that failed to close.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseFailure {
    pub resource: &'static str,
    pub reason: String,
}

impl fmt::Display for ReleaseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.resource, self.reason)
    }
}

/// Combined failure from releasing several resources.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("close {what}: {}", render_failures(.failures))]
pub struct CloseError {
    pub what: String,
    pub failures: Vec<ReleaseFailure>,
}

fn render_failures(failures: &[ReleaseFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Accumulates the outcome of each release on a cleanup path.
///
/// Record every close, even after an earlier one failed, then call
/// [`Releases::finish`].
#[derive(Debug, Default)]
pub struct Releases {
    failures: Vec<ReleaseFailure>,
}

impl Releases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the result of closing `resource`.
    pub fn record<E: fmt::Display>(&mut self, resource: &'static str, result: Result<(), E>) {
        if let Err(e) = result {
            self.failures.push(ReleaseFailure {
                resource,
                reason: e.to_string(),
            });
        }
    }

    /// Record that `resource` was already released.
    pub fn already_released(&mut self, resource: &'static str) {
        self.failures.push(ReleaseFailure {
            resource,
            reason: "already closed".to_string(),
        });
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn finish(self, what: impl Into<String>) -> Result<(), CloseError> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(CloseError {
                what: what.into(),
                failures: self.failures,
            })
        }
    }
}
