//! Telemetry utilities for handler timing and span construction.

use crate::handlers::CommandPath;
use std::time::Instant;
use tracing::debug;

/// Guard for timing handler execution.
///
/// Logs the elapsed time when dropped.
pub struct CommandTimer {
    command: String,
    start: Instant,
}

impl CommandTimer {
    /// Start timing a command.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        debug!(command = %self.command, elapsed_ms, "Command finished");
    }
}

/// Standardized span constructors.
pub mod spans {
    use super::CommandPath;
    use tracing::{Span, debug_span, info_span};

    /// Span for one module during the ready sequence.
    pub fn module(id: &str) -> Span {
        info_span!("module", id = %id)
    }

    /// Span for one handler invocation.
    pub fn invocation(path: &CommandPath, id: &str, module: &str, user: Option<&str>) -> Span {
        if let Some(user) = user {
            debug_span!("invocation", path = %path, id = %id, module = %module, user = %user)
        } else {
            debug_span!("invocation", path = %path, id = %id, module = %module)
        }
    }
}
