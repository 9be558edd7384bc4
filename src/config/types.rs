//! Core configuration types and loading.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::defaults::{default_bot_name, default_data_dir, default_log_level};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("no token configured: set auth.token or auth.token_file")]
    MissingToken,
    #[error("bot token is empty")]
    EmptyToken,
    #[error("failed to read token file {}: {source}", .path.display())]
    TokenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Bot configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Bot identity and storage.
    #[serde(default)]
    pub bot: BotConfig,
    /// Platform credentials.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Configuration with an inline token and everything else defaulted.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            auth: AuthConfig {
                token: Some(token.into()),
                token_file: None,
            },
            ..Self::default()
        }
    }
}

/// Bot identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Display name, used in logs.
    #[serde(default = "default_bot_name")]
    pub name: String,
    /// Root directory for module stores (`<data_dir>/modules/<id>.json`).
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            data_dir: default_data_dir(),
        }
    }
}

/// Credentials, given inline or read from a file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    pub token: Option<String>,
    pub token_file: Option<PathBuf>,
}

impl AuthConfig {
    /// Resolve the token to log in with.
    ///
    /// An inline token wins over a token file. The file content is trimmed.
    pub fn resolve_token(&self) -> Result<String, ConfigError> {
        let token = match (&self.token, &self.token_file) {
            (Some(token), _) => token.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)
                .map_err(|source| ConfigError::TokenFile {
                    path: path.clone(),
                    source,
                })?
                .trim()
                .to_string(),
            (None, None) => return Err(ConfigError::MissingToken),
        };

        if token.trim().is_empty() {
            return Err(ConfigError::EmptyToken);
        }
        Ok(token)
    }
}

/// Logging configuration. `RUST_LOG` takes precedence over `level`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of the human-readable format.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
