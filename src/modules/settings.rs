//! `/config` key/value settings backed by the module store.
//!
//! - `/config set key value`: store `value` under `key`
//! - `/config get key`: read it back
//! - `/config unset key`: remove it

use super::context::ModuleContext;
use super::traits::Module;
use crate::commands::{CommandDefinition, Invocation, OptionsBuilder};
use crate::error::HandlerResult;
use crate::handlers::{HandlerSet, Handlers};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Permission bit required by default to see `/config`.
const MANAGE_GUILD: u64 = 1 << 5;

#[derive(Default)]
pub struct SettingsModule;

impl SettingsModule {
    async fn set(self: Arc<Self>, ctx: ModuleContext, invocation: Invocation) -> HandlerResult {
        let key = invocation.get_string("key")?;
        let value = invocation.get_string("value")?;

        ctx.store().set(key, value)?;
        info!(key, user = invocation.user.as_deref().unwrap_or("-"), "Setting changed");
        ctx.respond(&invocation, &format!("{key} = {value}")).await
    }

    async fn get(self: Arc<Self>, ctx: ModuleContext, invocation: Invocation) -> HandlerResult {
        let key = invocation.get_string("key")?;

        let reply = match ctx.store().value(key) {
            Some(Value::String(s)) => format!("{key} = {s}"),
            Some(other) => format!("{key} = {other}"),
            None => format!("{key} is not set"),
        };
        ctx.respond(&invocation, &reply).await
    }

    async fn unset(self: Arc<Self>, ctx: ModuleContext, invocation: Invocation) -> HandlerResult {
        let key = invocation.get_string("key")?;

        let reply = match ctx.store().remove(key)? {
            Some(_) => format!("{key} removed"),
            None => format!("{key} is not set"),
        };
        ctx.respond(&invocation, &reply).await
    }
}

#[async_trait]
impl Module for SettingsModule {
    fn id(&self) -> &str {
        "settings"
    }

    fn commands(&self) -> Vec<CommandDefinition> {
        vec![
            CommandDefinition::new("config", "Read and change bot settings")
                .default_member_permissions(MANAGE_GUILD)
                .sub_command("set", "Set a value", |s| {
                    s.string_option("key", "Setting name", true)
                        .string_option("value", "New value", true)
                })
                .sub_command("get", "Show a value", |s| s.string_option("key", "Setting name", true))
                .sub_command("unset", "Remove a value", |s| {
                    s.string_option("key", "Setting name", true)
                }),
        ]
    }

    fn handlers(self: Arc<Self>) -> HandlerSet {
        Handlers::new(self)
            .route(["config", "set"], Self::set)
            .route(["config", "get"], Self::get)
            .route(["config", "unset"], Self::unset)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{InvocationOption, OptionKind};
    use crate::error::HandlerError;
    use crate::modules::ModuleStore;
    use crate::network::LocalTransport;

    fn invocation(sub: &str, args: &[(&str, &str)]) -> Invocation {
        let options = args
            .iter()
            .map(|(name, value)| InvocationOption::value(*name, OptionKind::String, *value))
            .collect();
        Invocation::new(format!("{sub}-1"), "config")
            .with_option(InvocationOption::sub_command(sub, options))
    }

    #[tokio::test]
    async fn test_set_get_unset() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(LocalTransport::new());
        let store = Arc::new(ModuleStore::for_module(dir.path(), "settings").unwrap());
        let ctx = ModuleContext::new("settings", transport.clone(), store);
        let module = Arc::new(SettingsModule);

        Arc::clone(&module)
            .set(ctx.clone(), invocation("set", &[("key", "prefix"), ("value", "!")]))
            .await
            .unwrap();
        Arc::clone(&module)
            .get(ctx.clone(), invocation("get", &[("key", "prefix")]))
            .await
            .unwrap();
        Arc::clone(&module)
            .unset(ctx.clone(), invocation("unset", &[("key", "prefix")]))
            .await
            .unwrap();
        module
            .get(ctx.clone(), invocation("get", &[("key", "prefix")]))
            .await
            .unwrap();

        let replies: Vec<_> = transport.responses().into_iter().map(|r| r.content).collect();
        assert_eq!(
            replies,
            vec!["prefix = !", "prefix = !", "prefix removed", "prefix is not set"]
        );

        // Survives a reopen.
        ctx.store().set("lang", "en").unwrap();
        let reopened = ModuleStore::for_module(dir.path(), "Settings").unwrap();
        assert_eq!(reopened.get::<String>("lang").unwrap(), "en");
    }

    #[tokio::test]
    async fn test_missing_option_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ModuleStore::for_module(dir.path(), "settings").unwrap());
        let ctx = ModuleContext::new("settings", Arc::new(LocalTransport::new()), store);

        let err = Arc::new(SettingsModule)
            .set(ctx, invocation("set", &[("key", "prefix")]))
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::MissingOption(name) if name == "value"));
    }

    #[test]
    fn test_declared_paths_match_handlers() {
        let module = Arc::new(SettingsModule);
        let declared: Vec<String> = module
            .commands()
            .iter()
            .flat_map(|c| c.paths())
            .map(|p| p.to_string())
            .collect();
        let bound: Vec<String> = module.handlers().entries().iter().map(|e| e.path.join(" ")).collect();
        assert_eq!(declared, bound);
    }
}
