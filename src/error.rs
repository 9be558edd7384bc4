//! Unified error handling for disbot-ng.
//!
//! Startup errors are fatal and abort the ready sequence. Handler errors are
//! scoped to a single invocation and are logged by the event loop.

use crate::config::ConfigError;
use crate::handlers::CommandPath;
use crate::modules::StoreError;
use crate::network::TransportError;
use thiserror::Error;

// ============================================================================
// Handler Errors (invocation processing)
// ============================================================================

/// Errors that can occur while a handler processes an invocation.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("missing option: {0}")]
    MissingOption(String),

    #[error("option {name} is not a valid {expected}")]
    InvalidOption { name: String, expected: &'static str },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingOption(_) => "missing_option",
            Self::InvalidOption { .. } => "invalid_option",
            Self::Store(_) => "store_error",
            Self::Transport(_) => "transport_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

/// Result type for command handlers.
pub type HandlerResult = Result<(), HandlerError>;

// ============================================================================
// Startup Errors (module and handler registration)
// ============================================================================

/// Errors raised while resolving modules or building the binding table.
///
/// All of these abort the boot sequence.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("a module with id '{id}' was already registered")]
    DuplicateModule { id: String },

    #[error("the module type {type_name} was already registered")]
    DuplicateModuleType { type_name: &'static str },

    #[error("handler '{handler}' of module '{module}' is invalid for path [{path}]: {reason}")]
    InvalidHandler {
        module: String,
        handler: &'static str,
        path: String,
        reason: &'static str,
    },

    #[error("command path '{path}' of module '{module}' is already bound by module '{existing}'")]
    DuplicateCommandPath {
        path: CommandPath,
        existing: String,
        module: String,
    },

    #[error("failed to initialize module '{module}': {source}")]
    Initialize {
        module: String,
        #[source]
        source: HandlerError,
    },

    #[error("configurator failed: {0}")]
    Configure(#[source] HandlerError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

// ============================================================================
// Bot Errors (lifecycle)
// ============================================================================

/// Errors from running or stopping the bot.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("this bot instance is already running")]
    AlreadyRunning,

    #[error("this bot instance is not running")]
    NotRunning,

    #[error("startup failed: {0}")]
    Startup(#[from] StartupError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_error_codes() {
        assert_eq!(HandlerError::MissingOption("key".into()).error_code(), "missing_option");
        assert_eq!(HandlerError::Internal("test".into()).error_code(), "internal_error");
        let err = HandlerError::InvalidOption {
            name: "count".into(),
            expected: "integer",
        };
        assert_eq!(err.error_code(), "invalid_option");
    }

    #[test]
    fn test_duplicate_path_message_names_both_modules() {
        let err = StartupError::DuplicateCommandPath {
            path: CommandPath::new(["config", "set"]).unwrap(),
            existing: "settings".into(),
            module: "other".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("config set"));
        assert!(msg.contains("settings"));
        assert!(msg.contains("other"));
    }
}
