//! disbot-ng - command routing for chat bots.
//!
//! Modules declare slash commands and the handlers serving them. The bot
//! registers the commands with the platform on the first ready event and
//! routes each invocation to exactly one handler by its command path.

pub mod bot;
pub mod commands;
pub mod config;
pub mod error;
pub mod handlers;
pub mod modules;
pub mod network;
pub mod telemetry;

pub use bot::{Bot, BotState};
pub use commands::{CommandDefinition, Invocation, OptionsBuilder};
pub use config::Config;
pub use error::{BotError, HandlerError, HandlerResult, StartupError};
pub use handlers::{CommandPath, Dispatched, HandlerSet, Handlers};
pub use modules::{Module, ModuleContext, ModuleRegistry, ModuleStore};
pub use network::{GatewayEvent, LocalTransport, Transport};
