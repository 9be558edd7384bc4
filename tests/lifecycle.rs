//! Integration tests for running and stopping the bot.

mod common;

use common::{CallLog, EchoModule, FailingModule, invocation, test_bot, test_config};
use disbot::bot::BotState;
use disbot::modules::PingModule;
use disbot::{Bot, BotError, GatewayEvent, LocalTransport, StartupError};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn spawn_run(bot: &Arc<Bot>, events: mpsc::Receiver<GatewayEvent>) -> tokio::task::JoinHandle<Result<(), BotError>> {
    let bot = Arc::clone(bot);
    tokio::spawn(async move { bot.run(events).await })
}

async fn wait_until<F: Fn() -> bool>(condition: F) {
    timeout(WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn test_run_serves_events_until_stopped() {
    let dir = tempfile::tempdir().unwrap();
    let (mut bot, transport) = test_bot(dir.path());
    bot.registry_mut().add::<PingModule>().unwrap();
    let bot = Arc::new(bot);

    let (tx, rx) = mpsc::channel(16);
    let runner = spawn_run(&bot, rx);

    tx.send(GatewayEvent::Ready).await.unwrap();
    tx.send(GatewayEvent::CommandInvoked(invocation("1", &["ping"], &[])))
        .await
        .unwrap();
    wait_until(|| transport.responses().len() == 1).await;
    assert!(bot.is_running());
    assert_eq!(bot.state(), BotState::Ready);
    assert!(transport.is_authenticated());

    bot.stop().unwrap();
    timeout(WAIT, runner).await.unwrap().unwrap().unwrap();
    assert!(!bot.is_running());
    assert!(transport.is_closed());
    assert_eq!(transport.responses()[0].content, "pong");
}

#[tokio::test]
async fn test_run_twice_and_stop_when_idle() {
    let dir = tempfile::tempdir().unwrap();
    let (bot, _transport) = test_bot(dir.path());
    let bot = Arc::new(bot);

    assert!(matches!(bot.stop(), Err(BotError::NotRunning)));

    let (_tx, rx) = mpsc::channel(1);
    let runner = spawn_run(&bot, rx);
    wait_until(|| bot.is_running()).await;

    let (_tx2, rx2) = mpsc::channel(1);
    assert!(matches!(bot.run(rx2).await, Err(BotError::AlreadyRunning)));

    bot.stop().unwrap();
    timeout(WAIT, runner).await.unwrap().unwrap().unwrap();
    assert!(matches!(bot.stop(), Err(BotError::NotRunning)));
}

#[tokio::test]
async fn test_stop_waits_for_in_flight_handlers() {
    let dir = tempfile::tempdir().unwrap();
    let log = CallLog::new();
    let (mut bot, transport) = test_bot(dir.path());
    bot.registry_mut()
        .register(EchoModule::new(Arc::clone(&log)))
        .unwrap();
    let bot = Arc::new(bot);

    let (tx, rx) = mpsc::channel(16);
    let runner = spawn_run(&bot, rx);
    tx.send(GatewayEvent::Ready).await.unwrap();
    tx.send(GatewayEvent::CommandInvoked(invocation("s", &["slow"], &[])))
        .await
        .unwrap();

    timeout(WAIT, log.started.notified()).await.unwrap();
    bot.stop().unwrap();
    timeout(WAIT, runner).await.unwrap().unwrap().unwrap();

    assert_eq!(log.calls(), vec!["slow:s"]);
    assert_eq!(transport.responses().len(), 1);
}

#[tokio::test]
async fn test_invocations_before_ready_are_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let log = CallLog::new();
    let (mut bot, transport) = test_bot(dir.path());
    bot.registry_mut()
        .register(EchoModule::new(Arc::clone(&log)))
        .unwrap();
    let bot = Arc::new(bot);

    let (tx, rx) = mpsc::channel(16);
    let runner = spawn_run(&bot, rx);
    let say = |id: &str| GatewayEvent::CommandInvoked(invocation(id, &["say"], &[("text", json!(id))]));

    tx.send(say("early")).await.unwrap();
    tx.send(GatewayEvent::Ready).await.unwrap();
    tx.send(say("late")).await.unwrap();
    drop(tx);

    // Closing the event stream ends the loop as well.
    timeout(WAIT, runner).await.unwrap().unwrap().unwrap();
    assert_eq!(log.calls(), vec!["echo:late"]);
    assert_eq!(transport.responses().len(), 1);
}

#[tokio::test]
async fn test_startup_failure_ends_run() {
    let dir = tempfile::tempdir().unwrap();
    let (mut bot, transport) = test_bot(dir.path());
    bot.registry_mut().add::<FailingModule>().unwrap();
    let bot = Arc::new(bot);

    let (tx, rx) = mpsc::channel(4);
    let runner = spawn_run(&bot, rx);
    tx.send(GatewayEvent::Ready).await.unwrap();

    let result = timeout(WAIT, runner).await.unwrap().unwrap();
    assert!(matches!(
        result,
        Err(BotError::Startup(StartupError::Initialize { .. }))
    ));
    assert_eq!(bot.state(), BotState::Uninitialized);
    assert!(!bot.is_running());
    assert!(transport.is_closed());
}

#[tokio::test]
async fn test_missing_token_fails_before_login() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.auth.token = None;
    let transport = Arc::new(LocalTransport::new());
    let bot = Bot::new(config, transport.clone());

    let (_tx, rx) = mpsc::channel(1);
    assert!(matches!(bot.run(rx).await, Err(BotError::Config(_))));
    assert!(!transport.is_authenticated());
    assert!(!bot.is_running());
}
