use super::context::ModuleContext;
use crate::commands::CommandDefinition;
use crate::error::HandlerResult;
use crate::handlers::HandlerSet;
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

/// Trait for feature modules.
///
/// A module is created once at startup and lives for the whole process.
/// During the ready sequence the bot attaches a [`ModuleContext`], calls
/// [`Module::initialize`], registers [`Module::commands`] and binds
/// [`Module::handlers`], in that order.
#[async_trait]
pub trait Module: Any + Send + Sync {
    /// Unique identifier (compared case-insensitively). Also names the
    /// module's store file.
    fn id(&self) -> &str;

    /// Called once after the context is attached, before commands are
    /// registered. Typical use: seeding store defaults.
    async fn initialize(&self, _ctx: &ModuleContext) -> HandlerResult {
        Ok(())
    }

    /// Command definitions to register with the platform.
    fn commands(&self) -> Vec<CommandDefinition> {
        Vec::new()
    }

    /// Handlers this module serves.
    fn handlers(self: Arc<Self>) -> HandlerSet {
        HandlerSet::default()
    }
}
