//! Integration tests for routing invocations to handlers.

mod common;

use common::{CallLog, EchoModule, invocation, test_bot};
use disbot::modules::{PingModule, SettingsModule};
use disbot::{Bot, Dispatched, HandlerError, LocalTransport, ModuleStore};
use serde_json::json;
use std::sync::Arc;

async fn ready_bot(dir: &tempfile::TempDir, log: &Arc<CallLog>) -> (Arc<Bot>, Arc<LocalTransport>) {
    let (mut bot, transport) = test_bot(dir.path());
    bot.registry_mut()
        .add::<PingModule>()
        .unwrap()
        .add::<SettingsModule>()
        .unwrap()
        .register(EchoModule::new(Arc::clone(log)))
        .unwrap();
    bot.handle_ready().await.unwrap();
    (Arc::new(bot), transport)
}

fn replies(transport: &LocalTransport) -> Vec<(String, String)> {
    transport
        .responses()
        .into_iter()
        .map(|r| (r.invocation_id, r.content))
        .collect()
}

#[tokio::test]
async fn test_sub_command_reaches_its_handler() {
    let dir = tempfile::tempdir().unwrap();
    let log = CallLog::new();
    let (bot, transport) = ready_bot(&dir, &log).await;

    let set = invocation("1", &["config", "set"], &[("key", json!("lang")), ("value", json!("en"))]);
    assert_eq!(bot.handle_invocation(set).await.unwrap(), Dispatched::Handled);
    let get = invocation("2", &["config", "get"], &[("key", json!("lang"))]);
    assert_eq!(bot.handle_invocation(get).await.unwrap(), Dispatched::Handled);

    assert_eq!(
        replies(&transport),
        vec![
            ("1".to_string(), "lang = en".to_string()),
            ("2".to_string(), "lang = en".to_string())
        ]
    );

    let store = ModuleStore::for_module(dir.path(), "settings").unwrap();
    assert_eq!(store.get::<String>("lang").unwrap(), "en");
}

#[tokio::test]
async fn test_unmatched_paths_are_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let log = CallLog::new();
    let (bot, transport) = ready_bot(&dir, &log).await;

    for inv in [
        invocation("1", &["weather"], &[]),
        invocation("2", &["config"], &[]),
        invocation("3", &["config", "reset"], &[]),
        invocation("4", &["echo", "once", "extra"], &[("text", json!("x"))]),
    ] {
        assert_eq!(bot.handle_invocation(inv).await.unwrap(), Dispatched::Unmatched);
    }

    assert!(transport.responses().is_empty());
    assert!(log.calls().is_empty());
}

#[tokio::test]
async fn test_alias_paths_share_one_handler() {
    let dir = tempfile::tempdir().unwrap();
    let log = CallLog::new();
    let (bot, transport) = ready_bot(&dir, &log).await;

    bot.handle_invocation(invocation("a", &["echo", "once"], &[("text", json!("hi"))]))
        .await
        .unwrap();
    bot.handle_invocation(invocation("b", &["say"], &[("text", json!("yo"))]))
        .await
        .unwrap();
    bot.handle_invocation(invocation("c", &["echo", "twice"], &[("text", json!("hey"))]))
        .await
        .unwrap();

    assert_eq!(log.calls(), vec!["echo:a", "echo:b", "echo twice:c"]);
    let contents: Vec<_> = replies(&transport).into_iter().map(|(_, c)| c).collect();
    assert_eq!(contents, vec!["hi", "yo", "hey hey"]);
}

#[tokio::test]
async fn test_handler_error_is_returned_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let log = CallLog::new();
    let (bot, _transport) = ready_bot(&dir, &log).await;

    let missing = invocation("1", &["config", "set"], &[("key", json!("lang"))]);
    let err = bot.handle_invocation(missing).await.unwrap_err();
    assert!(matches!(err, HandlerError::MissingOption(ref name) if name == "value"));

    let wrong_type = invocation("2", &["echo", "once"], &[("text", json!(5))]);
    let err = bot.handle_invocation(wrong_type).await.unwrap_err();
    assert_eq!(err.error_code(), "invalid_option");

    // Still serving.
    let ping = invocation("3", &["ping"], &[]);
    assert_eq!(bot.handle_invocation(ping).await.unwrap(), Dispatched::Handled);
}

#[tokio::test]
async fn test_concurrent_invocations_each_run_once() {
    let dir = tempfile::tempdir().unwrap();
    let log = CallLog::new();
    let (bot, transport) = ready_bot(&dir, &log).await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let bot = Arc::clone(&bot);
        handles.push(tokio::spawn(async move {
            let path: &[&str] = if i % 2 == 0 { &["slow"] } else { &["say"] };
            bot.handle_invocation(invocation(&i.to_string(), path, &[("text", json!("t"))]))
                .await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), Dispatched::Handled);
    }

    assert_eq!(log.count("slow:"), 4);
    assert_eq!(log.count("echo:"), 4);
    assert_eq!(transport.responses().len(), 8);
    for i in 0..8 {
        let id = i.to_string();
        assert_eq!(log.calls().iter().filter(|c| c.ends_with(&format!(":{id}"))).count(), 1);
    }
}

#[tokio::test]
async fn test_command_stats_follow_usage() {
    let dir = tempfile::tempdir().unwrap();
    let log = CallLog::new();
    let (bot, _transport) = ready_bot(&dir, &log).await;

    for i in 0..3 {
        bot.handle_invocation(invocation(&format!("p{i}"), &["ping"], &[]))
            .await
            .unwrap();
    }
    bot.handle_invocation(invocation("g", &["config", "get"], &[("key", json!("x"))]))
        .await
        .unwrap();
    bot.handle_invocation(invocation("u", &["unknown"], &[]))
        .await
        .unwrap();

    let stats: Vec<_> = bot
        .command_stats()
        .into_iter()
        .map(|(path, n)| (path.to_string(), n))
        .collect();
    assert_eq!(stats, vec![("ping".to_string(), 3), ("config get".to_string(), 1)]);
}

#[tokio::test]
async fn test_ping_count_persists_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let log = CallLog::new();
    {
        let (bot, _transport) = ready_bot(&dir, &log).await;
        bot.handle_invocation(invocation("1", &["ping"], &[])).await.unwrap();
        bot.handle_invocation(invocation("2", &["ping"], &[])).await.unwrap();
    }

    let (bot, _transport) = ready_bot(&dir, &log).await;
    bot.handle_invocation(invocation("3", &["ping"], &[])).await.unwrap();

    let store = ModuleStore::for_module(dir.path(), "ping").unwrap();
    assert_eq!(store.get::<u64>("pings").unwrap(), 3);
}
