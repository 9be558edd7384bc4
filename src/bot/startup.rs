//! The ready sequence.
//!
//! Runs once per process on the first ready event: configurator, stale
//! command cleanup, then for every module in registration order attach,
//! initialize, validate handlers, register commands and bind handlers.
//! The resulting table is frozen into a [`Dispatcher`].

use super::Bot;
use super::lifecycle::BotState;
use crate::commands::CommandDefinition;
use crate::error::StartupError;
use crate::handlers::{CommandPath, Dispatcher, HandlerTableBuilder};
use crate::modules::{ModuleContext, ModuleEntry, ModuleStore};
use crate::telemetry::spans;
use std::sync::Arc;
use tracing::{Instrument, debug, error, info, warn};

impl Bot {
    /// Handle a ready event.
    ///
    /// Only the first ready event starts the sequence; later ones (and ones
    /// arriving while it runs) are ignored. A failed sequence resets the bot
    /// to [`BotState::Uninitialized`] and returns the error.
    pub async fn handle_ready(&self) -> Result<(), StartupError> {
        {
            let mut state = self.state.lock();
            if *state != BotState::Uninitialized {
                debug!(state = ?*state, "Ready event ignored");
                return Ok(());
            }
            *state = BotState::Initializing;
        }

        match self.initialize_modules().await {
            Ok(dispatcher) => {
                let paths = dispatcher.table().len();
                *self.dispatcher.write() = Some(Arc::new(dispatcher));
                *self.state.lock() = BotState::Ready;
                info!(bot = %self.config.bot.name, paths, "Bot ready");
                Ok(())
            }
            Err(e) => {
                *self.state.lock() = BotState::Uninitialized;
                error!(error = %e, "Startup failed");
                Err(e)
            }
        }
    }

    async fn initialize_modules(&self) -> Result<Dispatcher, StartupError> {
        if let Some(configure) = &self.configurator {
            configure(Arc::clone(&self.transport))
                .await
                .map_err(StartupError::Configure)?;
        }

        let stale = self.transport.list_registered_commands().await?;
        for command in &stale {
            self.transport.delete_registered_command(command).await?;
        }
        if !stale.is_empty() {
            info!(count = stale.len(), "Deleted previously registered commands");
        }

        let mut registry = self.registry.lock().await;
        let mut builder = HandlerTableBuilder::new();

        let mut failure = None;
        for entry in registry.entries_mut() {
            let span = spans::module(entry.id());
            if let Err(e) = self.start_module(entry, &mut builder).instrument(span).await {
                failure = Some(e);
                break;
            }
        }

        if let Some(e) = failure {
            for entry in registry.entries_mut() {
                entry.detach();
            }
            return Err(e);
        }

        Ok(Dispatcher::new(builder.build()))
    }

    async fn start_module(
        &self,
        entry: &mut ModuleEntry,
        builder: &mut HandlerTableBuilder,
    ) -> Result<(), StartupError> {
        let module = Arc::clone(entry.module());
        let id = module.id().to_string();

        let store = ModuleStore::for_module(&self.config.bot.data_dir, &id)?;
        let ctx = ModuleContext::new(&id, Arc::clone(&self.transport), Arc::new(store));
        entry.attach(ctx.clone());

        module
            .initialize(&ctx)
            .await
            .map_err(|source| StartupError::Initialize {
                module: id.clone(),
                source,
            })?;

        // Validate every handler before anything of this module is registered.
        let staged = builder.stage(&ctx, Arc::clone(&module).handlers())?;

        let definitions = module.commands();
        let declared: Vec<CommandPath> = definitions.iter().flat_map(CommandDefinition::paths).collect();
        for path in staged.paths().filter(|p| !declared.contains(p)) {
            warn!(module = %id, path = %path, "Handler path is not declared by any command");
        }

        for definition in &definitions {
            let registered = self.transport.register_command(definition).await?;
            debug!(module = %id, command = %registered.name, id = %registered.id, "Command registered");
        }

        let bound = builder.commit(staged);
        entry.mark_initialized();
        info!(module = %id, commands = definitions.len(), handlers = bound, "Module initialized");
        Ok(())
    }
}
