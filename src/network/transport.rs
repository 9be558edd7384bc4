//! Transport abstraction between the router and the chat platform.
//!
//! The router never talks to the network directly. It consumes
//! [`GatewayEvent`]s and calls back into a [`Transport`] to register
//! commands and send replies.

use crate::commands::{CommandDefinition, Invocation};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

/// Errors reported by a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("transport is not connected")]
    NotConnected,

    #[error("unknown registered command: {0}")]
    UnknownCommand(Uuid),

    #[error("command '{0}' is already registered")]
    CommandExists(String),

    #[error("transport closed")]
    Closed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Handle to a command the platform has accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredCommand {
    pub id: Uuid,
    pub name: String,
    pub registered_at: DateTime<Utc>,
}

impl RegisteredCommand {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            registered_at: Utc::now(),
        }
    }
}

/// Events delivered by the platform connection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayEvent {
    /// The connection is established and guild/user data is loaded.
    /// May fire again after a reconnect.
    Ready,
    /// A user ran one of the registered commands.
    #[serde(rename = "command")]
    CommandInvoked(Invocation),
}

/// Outbound side of the platform connection.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Authenticate with the platform.
    async fn login(&self, token: &str) -> Result<(), TransportError>;

    /// Start delivering events.
    async fn start(&self) -> Result<(), TransportError>;

    /// Register a global command.
    async fn register_command(
        &self,
        definition: &CommandDefinition,
    ) -> Result<RegisteredCommand, TransportError>;

    /// All commands currently registered for this application.
    async fn list_registered_commands(&self) -> Result<Vec<RegisteredCommand>, TransportError>;

    /// Remove a registered command.
    async fn delete_registered_command(&self, command: &RegisteredCommand) -> Result<(), TransportError>;

    /// Reply to an invocation.
    async fn respond(&self, invocation: &Invocation, content: &str) -> Result<(), TransportError>;

    /// Close the connection. Called once after the event loop has drained.
    async fn shutdown(&self) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gateway_event_tags() {
        let ready: GatewayEvent = serde_json::from_value(json!({"type": "ready"})).unwrap();
        assert_eq!(ready, GatewayEvent::Ready);

        let cmd: GatewayEvent =
            serde_json::from_value(json!({"type": "command", "id": "7", "command": "ping"})).unwrap();
        match cmd {
            GatewayEvent::CommandInvoked(inv) => {
                assert_eq!(inv.id, "7");
                assert_eq!(inv.command_name, "ping");
                assert!(inv.options.is_empty());
            }
            other => panic!("expected command, got {:?}", other),
        }
    }

    #[test]
    fn test_registered_command_ids_are_unique() {
        let a = RegisteredCommand::new("ping");
        let b = RegisteredCommand::new("ping");
        assert_ne!(a.id, b.id);
    }
}
