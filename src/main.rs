//! disbot-ng - runs the built-in modules over the local JSON-lines gateway.
//!
//! Events are read from stdin, one JSON object per line; registrations and
//! replies are written to stdout the same way.

use disbot::config::{self, Config};
use disbot::modules::{BUILTIN_SCOPE, builtin_catalog};
use disbot::network::{LocalTransport, gateway};
use disbot::Bot;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Inbound event queue depth; the reader waits when it is full.
const EVENT_QUEUE: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        eprintln!("Failed to load config {config_path}: {e}");
        e
    })?;

    // Initialize tracing; logs go to stderr, stdout carries gateway frames.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if config.logging.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        return Err(anyhow::anyhow!(
            "{} configuration error(s) in {config_path}",
            errors.len()
        ));
    }

    info!(
        bot = %config.bot.name,
        data_dir = %config.bot.data_dir.display(),
        "Starting disbot-ng"
    );

    let (frames_tx, frames_rx) = mpsc::unbounded_channel();
    let transport = Arc::new(LocalTransport::with_output(frames_tx));
    let writer = gateway::spawn_writer(tokio::io::stdout(), frames_rx);

    let mut bot = Bot::new(config, transport);
    let added = bot
        .registry_mut()
        .discover(&builtin_catalog(), BUILTIN_SCOPE, true)?;
    info!(modules = added, "Modules discovered");
    let bot = Arc::new(bot);

    let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE);
    let reader = gateway::spawn_reader(tokio::io::stdin(), events_tx);

    let signals = {
        let bot = Arc::clone(&bot);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received");
                if let Err(e) = bot.stop() {
                    warn!(error = %e, "Stop request ignored");
                }
            }
        })
    };

    let result = bot.run(events_rx).await;
    reader.abort();
    signals.abort();
    let _ = signals.await;
    drop(bot);
    if let Err(e) = writer.await {
        warn!(error = %e, "Gateway writer ended abnormally");
    }

    result?;
    Ok(())
}
