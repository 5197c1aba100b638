// ABOUTME: Injectable logging capability for SSH clients.
// ABOUTME: Wraps a tracing dispatcher so records go where the caller decides.

use std::fmt;
use tracing::Dispatch;
use tracing::dispatcher;

/// Destination for a client's log records.
///
/// Records emitted through [`Logger::in_scope`] go to the wrapped
/// dispatcher instead of the process-wide default, so tests and embedders
/// can capture or silence a single client.
#[derive(Clone)]
pub struct Logger {
    dispatch: Dispatch,
}

impl Logger {
    /// Wrap a subscriber.
    pub fn new(dispatch: impl Into<Dispatch>) -> Self {
        Self {
            dispatch: dispatch.into(),
        }
    }

    /// Capture the subscriber that is current for the calling thread.
    pub fn current() -> Self {
        Self {
            dispatch: dispatcher::get_default(Dispatch::clone),
        }
    }

    /// A logger that drops every record.
    pub fn silent() -> Self {
        Self {
            dispatch: Dispatch::none(),
        }
    }

    /// Run `f` with this logger as the default subscriber.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        dispatcher::with_default(&self.dispatch, f)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").finish_non_exhaustive()
    }
}
