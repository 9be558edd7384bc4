//! Bot orchestration.
//!
//! A [`Bot`] owns the module registry, the transport handle and, once the
//! ready sequence has completed, the [`Dispatcher`]. `run` drives the event
//! loop: ready events start the ready sequence, command events are
//! dispatched on their own tasks.
//!
//! ```ignore
//! let mut bot = Bot::new(config, transport);
//! bot.registry_mut().add::<PingModule>()?;
//! let bot = Arc::new(bot);
//! bot.run(events).await?;
//! ```

mod lifecycle;
mod startup;

pub use lifecycle::{BotState, Lifecycle, RunGuard};

use crate::commands::Invocation;
use crate::config::Config;
use crate::error::{BotError, HandlerError, HandlerResult};
use crate::handlers::{CommandPath, Dispatched, Dispatcher};
use crate::modules::ModuleRegistry;
use crate::network::{GatewayEvent, Transport};
use futures_util::future::BoxFuture;
use parking_lot::{Mutex, RwLock};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{MutexGuard, mpsc};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

/// Hook run at the start of the ready sequence, before any module.
pub type Configurator = Arc<dyn Fn(Arc<dyn Transport>) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

type DispatchOutcome = (String, Result<Dispatched, HandlerError>);

pub struct Bot {
    config: Config,
    transport: Arc<dyn Transport>,
    registry: tokio::sync::Mutex<ModuleRegistry>,
    configurator: Option<Configurator>,
    state: Mutex<BotState>,
    dispatcher: RwLock<Option<Arc<Dispatcher>>>,
    lifecycle: Lifecycle,
}

impl Bot {
    pub fn new(config: Config, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            registry: tokio::sync::Mutex::new(ModuleRegistry::new()),
            configurator: None,
            state: Mutex::new(BotState::Uninitialized),
            dispatcher: RwLock::new(None),
            lifecycle: Lifecycle::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Module registry, for adding modules before the bot runs.
    pub fn registry_mut(&mut self) -> &mut ModuleRegistry {
        self.registry.get_mut()
    }

    /// Locked view of the module registry.
    pub async fn registry(&self) -> MutexGuard<'_, ModuleRegistry> {
        self.registry.lock().await
    }

    /// Set the hook run before modules are initialized.
    pub fn configure<F, Fut>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(Arc<dyn Transport>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.configurator = Some(Arc::new(move |transport: Arc<dyn Transport>| {
            Box::pin(hook(transport)) as BoxFuture<'static, HandlerResult>
        }));
        self
    }

    pub fn state(&self) -> BotState {
        *self.state.lock()
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle.is_running()
    }

    /// The dispatcher, once the ready sequence has completed.
    pub fn dispatcher(&self) -> Option<Arc<Dispatcher>> {
        self.dispatcher.read().clone()
    }

    /// Per-path invocation counts, most used first.
    pub fn command_stats(&self) -> Vec<(CommandPath, u64)> {
        self.dispatcher()
            .map(|d| d.command_stats())
            .unwrap_or_default()
    }

    /// Dispatch one invocation and wait for its handler.
    ///
    /// Before the bot is ready the invocation is dropped.
    pub async fn handle_invocation(&self, invocation: Invocation) -> Result<Dispatched, HandlerError> {
        let Some(dispatcher) = self.dispatcher() else {
            debug!(invocation = %invocation.id, command = %invocation.command_name, "Not ready, dropping invocation");
            return Ok(Dispatched::NotReady);
        };
        dispatcher.dispatch(invocation).await
    }

    /// Log in, start the transport and process events until stopped.
    ///
    /// Returns when [`Bot::stop`] is called, the event stream ends, or the
    /// ready sequence fails. In-flight handlers are awaited before the
    /// transport is shut down.
    pub async fn run(&self, mut events: mpsc::Receiver<GatewayEvent>) -> Result<(), BotError> {
        let mut shutdown_rx = self.lifecycle.subscribe();
        let _running = self.lifecycle.enter()?;

        let token = self.config.auth.resolve_token()?;
        self.transport.login(&token).await?;
        self.transport.start().await?;
        let modules = self.registry.lock().await.len();
        info!(bot = %self.config.bot.name, modules, "Bot started");

        let mut tasks: JoinSet<DispatchOutcome> = JoinSet::new();
        let result = loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Shutdown requested");
                    break Ok(());
                }
                event = events.recv() => match event {
                    None => {
                        info!("Event stream closed");
                        break Ok(());
                    }
                    Some(GatewayEvent::Ready) => {
                        if let Err(e) = self.handle_ready().await {
                            break Err(BotError::Startup(e));
                        }
                    }
                    Some(GatewayEvent::CommandInvoked(invocation)) => {
                        self.spawn_dispatch(&mut tasks, invocation);
                    }
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => log_outcome(joined),
            }
        };

        if !tasks.is_empty() {
            info!(in_flight = tasks.len(), "Waiting for running handlers");
        }
        while let Some(joined) = tasks.join_next().await {
            log_outcome(joined);
        }

        match self.transport.shutdown().await {
            Ok(()) => info!("Bot stopped"),
            Err(e) if result.is_ok() => return Err(e.into()),
            Err(e) => warn!(error = %e, "Transport shutdown failed"),
        }
        result
    }

    /// Ask the running event loop to stop.
    pub fn stop(&self) -> Result<(), BotError> {
        self.lifecycle.request_stop()
    }

    fn spawn_dispatch(&self, tasks: &mut JoinSet<DispatchOutcome>, invocation: Invocation) {
        let Some(dispatcher) = self.dispatcher() else {
            debug!(invocation = %invocation.id, command = %invocation.command_name, "Not ready, dropping invocation");
            return;
        };
        tasks.spawn(async move {
            let id = invocation.id.clone();
            (id, dispatcher.dispatch(invocation).await)
        });
    }
}

fn log_outcome(joined: Result<DispatchOutcome, JoinError>) {
    match joined {
        Ok((_, Ok(_))) => {}
        Ok((id, Err(e))) => {
            warn!(invocation = %id, error = %e, code = e.error_code(), "Handler failed");
        }
        Err(e) => error!(error = %e, "Handler task panicked"),
    }
}
