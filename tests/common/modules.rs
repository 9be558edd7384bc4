//! Modules used only by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use disbot::commands::OptionsBuilder;
use disbot::error::HandlerError;
use disbot::{
    CommandDefinition, HandlerResult, HandlerSet, Handlers, Invocation, Module, ModuleContext,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Shared record of handler calls, as `"<path>:<invocation id>"`.
#[derive(Default)]
pub struct CallLog {
    calls: Mutex<Vec<String>>,
    /// Signalled when a slow handler has started.
    pub started: Notify,
}

impl CallLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record(&self, entry: String) {
        self.calls.lock().push(entry);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.starts_with(prefix)).count()
    }
}

/// `/echo text`, `/echo twice text`, plus `/slow` which takes a while.
pub struct EchoModule {
    log: Arc<CallLog>,
}

impl EchoModule {
    pub fn new(log: Arc<CallLog>) -> Self {
        Self { log }
    }

    async fn echo(self: Arc<Self>, ctx: ModuleContext, inv: Invocation) -> HandlerResult {
        self.log.record(format!("echo:{}", inv.id));
        let text = inv.get_string("text")?.to_string();
        ctx.respond(&inv, &text).await
    }

    async fn twice(self: Arc<Self>, ctx: ModuleContext, inv: Invocation) -> HandlerResult {
        self.log.record(format!("echo twice:{}", inv.id));
        let text = inv.get_string("text")?;
        ctx.respond(&inv, &format!("{text} {text}")).await
    }

    async fn slow(self: Arc<Self>, ctx: ModuleContext, inv: Invocation) -> HandlerResult {
        self.log.started.notify_one();
        tokio::time::sleep(Duration::from_millis(100)).await;
        self.log.record(format!("slow:{}", inv.id));
        ctx.respond(&inv, "done").await
    }
}

#[async_trait]
impl Module for EchoModule {
    fn id(&self) -> &str {
        "echo"
    }

    fn commands(&self) -> Vec<CommandDefinition> {
        vec![
            CommandDefinition::new("echo", "Repeat text")
                .sub_command("once", "Repeat once", |s| s.string_option("text", "Text", true))
                .sub_command("twice", "Repeat twice", |s| s.string_option("text", "Text", true)),
            CommandDefinition::new("slow", "Answer after a while"),
        ]
    }

    fn handlers(self: Arc<Self>) -> HandlerSet {
        Handlers::new(self)
            .routes([vec!["echo", "once"], vec!["say"]], Self::echo)
            .route(["echo", "twice"], Self::twice)
            .route(["slow"], Self::slow)
            .build()
    }
}

/// Binds `config set`, which the settings module already owns.
#[derive(Default)]
pub struct ClashModule;

impl ClashModule {
    async fn set(self: Arc<Self>, _ctx: ModuleContext, _inv: Invocation) -> HandlerResult {
        Ok(())
    }
}

#[async_trait]
impl Module for ClashModule {
    fn id(&self) -> &str {
        "clash"
    }

    fn commands(&self) -> Vec<CommandDefinition> {
        vec![CommandDefinition::new("clash", "Never registered")]
    }

    fn handlers(self: Arc<Self>) -> HandlerSet {
        Handlers::new(self).route(["config", "set"], Self::set).build()
    }
}

/// Declares a handler path containing whitespace.
#[derive(Default)]
pub struct BrokenModule;

impl BrokenModule {
    async fn handle(self: Arc<Self>, _ctx: ModuleContext, _inv: Invocation) -> HandlerResult {
        Ok(())
    }
}

#[async_trait]
impl Module for BrokenModule {
    fn id(&self) -> &str {
        "broken"
    }

    fn commands(&self) -> Vec<CommandDefinition> {
        vec![CommandDefinition::new("broken", "Never registered")]
    }

    fn handlers(self: Arc<Self>) -> HandlerSet {
        Handlers::new(self).route(["broken", "bad name"], Self::handle).build()
    }
}

/// Fails in `initialize`.
#[derive(Default)]
pub struct FailingModule;

#[async_trait]
impl Module for FailingModule {
    fn id(&self) -> &str {
        "failing"
    }

    async fn initialize(&self, _ctx: &ModuleContext) -> HandlerResult {
        Err(HandlerError::Internal("init refused".to_string()))
    }

    fn commands(&self) -> Vec<CommandDefinition> {
        vec![CommandDefinition::new("failing", "Never registered")]
    }
}
