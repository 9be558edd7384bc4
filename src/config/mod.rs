//! Configuration loading and management.
//!
//! - [`types`]: config struct definitions and token resolution
//! - [`validation`]: startup validation collecting every error
//! - `defaults`: serde default functions

mod defaults;
mod types;
pub mod validation;

pub use types::{AuthConfig, BotConfig, Config, ConfigError, LoggingConfig};
pub use validation::{ValidationError, validate};
