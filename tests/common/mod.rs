//! Integration test common infrastructure.
//!
//! Provides a bot wired to an in-memory transport, invocation builders and a
//! handful of test modules.

#![allow(dead_code)]

pub mod modules;

use disbot::commands::{InvocationOption, OptionKind};
use disbot::{Bot, Config, Invocation, LocalTransport};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

#[allow(unused_imports)]
pub use modules::{BrokenModule, CallLog, ClashModule, EchoModule, FailingModule};

/// Configuration pointing the stores at `data_dir`.
pub fn test_config(data_dir: &Path) -> Config {
    let mut config = Config::with_token("test-token");
    config.bot.name = "testbot".to_string();
    config.bot.data_dir = data_dir.to_path_buf();
    config
}

/// A bot with no modules over a fresh local transport.
pub fn test_bot(data_dir: &Path) -> (Bot, Arc<LocalTransport>) {
    let transport = Arc::new(LocalTransport::new());
    let bot = Bot::new(test_config(data_dir), transport.clone());
    (bot, transport)
}

/// Build an invocation of `path` with `args` as the leaf options.
///
/// `invocation("1", &["config", "set"], &[("key", "a".into())])`
pub fn invocation(id: &str, path: &[&str], args: &[(&str, Value)]) -> Invocation {
    let (root, subs) = path.split_first().expect("invocation path must not be empty");

    let mut options: Vec<InvocationOption> = args
        .iter()
        .map(|(name, value)| InvocationOption::value(*name, kind_of(value), value.clone()))
        .collect();
    for name in subs.iter().rev() {
        options = vec![InvocationOption::sub_command(*name, options)];
    }

    options
        .into_iter()
        .fold(Invocation::new(id, *root), Invocation::with_option)
}

fn kind_of(value: &Value) -> OptionKind {
    match value {
        Value::Bool(_) => OptionKind::Boolean,
        Value::Number(n) if n.is_i64() => OptionKind::Integer,
        Value::Number(_) => OptionKind::Number,
        _ => OptionKind::String,
    }
}
