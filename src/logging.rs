//! Logging and timing collaborators for the bundle passes.
//!
//! Both passes report progress through an injected [`Logger`] rather than a
//! process-wide logging facility, so the caller decides where messages go
//! and tests can drop them entirely.

use std::time::Instant;

/// Sink for the informational messages emitted by the passes.
///
/// One message is emitted per shebang match and per symlink relocation
/// decision. This is an observability side channel, not part of the
/// functional contract, so implementations are free to discard messages.
pub trait Logger {
    /// Record one informational message.
    fn info(&self, message: &str);
}

/// Logger that writes `INFO:`-prefixed lines to stderr.
pub struct StderrLogger;

impl Logger for StderrLogger {
    fn info(&self, message: &str) {
        eprintln!("INFO: {message}");
    }
}

/// Logger that discards every message.
pub struct NullLogger;

impl Logger for NullLogger {
    fn info(&self, _message: &str) {}
}

/// Scoped wall-clock timer for one pass.
///
/// Reports the elapsed time through the injected logger when dropped, so it
/// also covers early returns and error paths.
#[must_use = "timer reports when dropped"]
pub struct PassTimer<'a> {
    name: &'static str,
    started: Instant,
    log: &'a dyn Logger,
}

impl<'a> PassTimer<'a> {
    /// Start timing the named pass.
    pub fn start(name: &'static str, log: &'a dyn Logger) -> Self {
        Self {
            name,
            started: Instant::now(),
            log,
        }
    }
}

impl Drop for PassTimer<'_> {
    fn drop(&mut self) {
        let elapsed = self.started.elapsed();
        self.log
            .info(&format!("{} took {:.3}s", self.name, elapsed.as_secs_f64()));
    }
}
