//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("bot.name is required")]
    MissingBotName,
    #[error("bot.data_dir is required")]
    MissingDataDir,
    #[error("one of auth.token or auth.token_file is required")]
    MissingToken,
    #[error("auth.token and auth.token_file are mutually exclusive")]
    ConflictingToken,
    #[error("auth.token is empty")]
    EmptyToken,
    #[error("auth.token_file does not exist: {0}")]
    TokenFileNotFound(String),
    #[error("logging.level is not a valid filter: '{0}'")]
    InvalidLogLevel(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.bot.name.trim().is_empty() {
        errors.push(ValidationError::MissingBotName);
    }
    if config.bot.data_dir.as_os_str().is_empty() {
        errors.push(ValidationError::MissingDataDir);
    }

    match (&config.auth.token, &config.auth.token_file) {
        (None, None) => errors.push(ValidationError::MissingToken),
        (Some(_), Some(_)) => errors.push(ValidationError::ConflictingToken),
        (Some(token), None) if token.trim().is_empty() => {
            errors.push(ValidationError::EmptyToken);
        }
        (None, Some(path)) if !path.exists() => {
            errors.push(ValidationError::TokenFileNotFound(path.display().to_string()));
        }
        _ => {}
    }

    if EnvFilter::try_new(&config.logging.level).is_err() {
        errors.push(ValidationError::InvalidLogLevel(config.logging.level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
