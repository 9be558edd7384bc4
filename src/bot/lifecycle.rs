//! Run/stop bookkeeping.
//!
//! Isolates the "is the event loop running" flag and the shutdown broadcast
//! from the rest of the bot.

use crate::error::BotError;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

/// Startup progress of a bot instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotState {
    /// No ready event handled yet, or the last startup attempt failed.
    Uninitialized,
    /// The ready sequence is in progress.
    Initializing,
    /// Modules are initialized and the handler table is frozen.
    Ready,
}

pub struct Lifecycle {
    /// Shutdown signal broadcaster.
    shutdown_tx: broadcast::Sender<()>,
    running: AtomicBool,
}

impl Lifecycle {
    pub fn new() -> Self {
        // Capacity 16 provides buffer for multiple slow subscribers during shutdown
        let (shutdown_tx, _) = broadcast::channel(16);
        Self {
            shutdown_tx,
            running: AtomicBool::new(false),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Mark the event loop as running until the guard is dropped.
    pub fn enter(&self) -> Result<RunGuard<'_>, BotError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(BotError::AlreadyRunning);
        }
        Ok(RunGuard {
            running: &self.running,
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Signal the running event loop to stop.
    pub fn request_stop(&self) -> Result<(), BotError> {
        if !self.is_running() {
            return Err(BotError::NotRunning);
        }
        // No receivers only means the loop is already on its way out.
        let _ = self.shutdown_tx.send(());
        Ok(())
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Clears the running flag on drop, whatever way the loop exits.
pub struct RunGuard<'a> {
    running: &'a AtomicBool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_twice_fails() {
        let lifecycle = Lifecycle::new();
        let guard = lifecycle.enter().unwrap();
        assert!(matches!(lifecycle.enter(), Err(BotError::AlreadyRunning)));
        drop(guard);
        assert!(!lifecycle.is_running());
        assert!(lifecycle.enter().is_ok());
    }

    #[tokio::test]
    async fn test_stop_requires_running() {
        let lifecycle = Lifecycle::new();
        assert!(matches!(lifecycle.request_stop(), Err(BotError::NotRunning)));

        let mut rx = lifecycle.subscribe();
        let _guard = lifecycle.enter().unwrap();
        lifecycle.request_stop().unwrap();
        assert!(rx.recv().await.is_ok());
    }
}
