//! `/ping` liveness check.
//!
//! Replies `pong` and keeps a running total of pings in the module store.

use super::context::ModuleContext;
use super::traits::Module;
use crate::commands::{CommandDefinition, Invocation, OptionsBuilder};
use crate::error::HandlerResult;
use crate::handlers::{HandlerSet, Handlers};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

const PINGS_KEY: &str = "pings";

#[derive(Default)]
pub struct PingModule {
    /// Serializes the read-modify-write of the counter.
    counter: Mutex<()>,
}

impl PingModule {
    async fn ping(self: Arc<Self>, ctx: ModuleContext, invocation: Invocation) -> HandlerResult {
        let total = {
            let _guard = self.counter.lock();
            let total = ctx.store().get::<u64>(PINGS_KEY)? + 1;
            ctx.store().set(PINGS_KEY, total)?;
            total
        };

        let reply = match invocation.option("note").and_then(|v| v.as_str()) {
            Some(note) => format!("pong: {note}"),
            None => "pong".to_string(),
        };
        debug!(total, "Ping answered");
        ctx.respond(&invocation, &reply).await
    }
}

#[async_trait]
impl Module for PingModule {
    fn id(&self) -> &str {
        "ping"
    }

    async fn initialize(&self, ctx: &ModuleContext) -> HandlerResult {
        ctx.store().set_default(PINGS_KEY, 0u64)?;
        Ok(())
    }

    fn commands(&self) -> Vec<CommandDefinition> {
        vec![
            CommandDefinition::new("ping", "Check that the bot is alive")
                .dm_enabled(true)
                .string_option("note", "Text echoed back with the reply", false),
        ]
    }

    fn handlers(self: Arc<Self>) -> HandlerSet {
        Handlers::new(self).route(["ping"], Self::ping).build()
    }
}
