//! In-process transport.
//!
//! Keeps the registered command table in memory and emits everything the
//! platform would see as [`OutboundFrame`]s. The binary writes those frames to
//! stdout; tests inspect the recorded state directly.

use super::transport::{RegisteredCommand, Transport, TransportError};
use crate::commands::{CommandDefinition, Invocation};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

/// Frames emitted towards the platform side.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    Registered {
        id: Uuid,
        definition: CommandDefinition,
    },
    Deleted {
        id: Uuid,
        name: String,
    },
    Response {
        invocation: String,
        content: String,
    },
}

/// A reply recorded by the local transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub invocation_id: String,
    pub content: String,
}

#[derive(Default)]
struct LocalState {
    authenticated: bool,
    started: bool,
    closed: bool,
    commands: Vec<(RegisteredCommand, CommandDefinition)>,
    register_calls: usize,
    responses: Vec<Response>,
}

/// Transport that keeps everything in memory.
#[derive(Default)]
pub struct LocalTransport {
    state: Mutex<LocalState>,
    output: Option<mpsc::UnboundedSender<OutboundFrame>>,
}

impl LocalTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also forward every frame to `output`.
    pub fn with_output(output: mpsc::UnboundedSender<OutboundFrame>) -> Self {
        Self {
            state: Mutex::default(),
            output: Some(output),
        }
    }

    /// Pretend a command is left over from a previous run.
    pub fn seed_command(&self, definition: CommandDefinition) -> RegisteredCommand {
        let handle = RegisteredCommand::new(definition.name.clone());
        self.state.lock().commands.push((handle.clone(), definition));
        handle
    }

    /// Definitions currently registered, in registration order.
    pub fn registered_definitions(&self) -> Vec<CommandDefinition> {
        self.state
            .lock()
            .commands
            .iter()
            .map(|(_, def)| def.clone())
            .collect()
    }

    /// Total number of `register_command` calls made.
    pub fn register_calls(&self) -> usize {
        self.state.lock().register_calls
    }

    pub fn responses(&self) -> Vec<Response> {
        self.state.lock().responses.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.lock().authenticated
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    fn emit(&self, frame: OutboundFrame) {
        if let Some(output) = &self.output {
            // Receiver gone means nobody is watching stdout anymore.
            let _ = output.send(frame);
        }
    }

    fn ensure_open(state: &LocalState) -> Result<(), TransportError> {
        if state.closed {
            return Err(TransportError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn login(&self, token: &str) -> Result<(), TransportError> {
        if token.trim().is_empty() {
            return Err(TransportError::Authentication("empty token".to_string()));
        }
        let mut state = self.state.lock();
        Self::ensure_open(&state)?;
        state.authenticated = true;
        info!("Local transport authenticated");
        Ok(())
    }

    async fn start(&self) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        Self::ensure_open(&state)?;
        if !state.authenticated {
            return Err(TransportError::NotConnected);
        }
        state.started = true;
        Ok(())
    }

    async fn register_command(
        &self,
        definition: &CommandDefinition,
    ) -> Result<RegisteredCommand, TransportError> {
        let handle = {
            let mut state = self.state.lock();
            Self::ensure_open(&state)?;
            state.register_calls += 1;
            if state.commands.iter().any(|(h, _)| h.name == definition.name) {
                return Err(TransportError::CommandExists(definition.name.clone()));
            }
            let handle = RegisteredCommand::new(definition.name.clone());
            state.commands.push((handle.clone(), definition.clone()));
            handle
        };

        debug!(command = %definition.name, id = %handle.id, "Registered command");
        self.emit(OutboundFrame::Registered {
            id: handle.id,
            definition: definition.clone(),
        });
        Ok(handle)
    }

    async fn list_registered_commands(&self) -> Result<Vec<RegisteredCommand>, TransportError> {
        let state = self.state.lock();
        Self::ensure_open(&state)?;
        Ok(state.commands.iter().map(|(h, _)| h.clone()).collect())
    }

    async fn delete_registered_command(&self, command: &RegisteredCommand) -> Result<(), TransportError> {
        {
            let mut state = self.state.lock();
            Self::ensure_open(&state)?;
            let before = state.commands.len();
            state.commands.retain(|(h, _)| h.id != command.id);
            if state.commands.len() == before {
                return Err(TransportError::UnknownCommand(command.id));
            }
        }

        self.emit(OutboundFrame::Deleted {
            id: command.id,
            name: command.name.clone(),
        });
        Ok(())
    }

    async fn respond(&self, invocation: &Invocation, content: &str) -> Result<(), TransportError> {
        {
            let mut state = self.state.lock();
            Self::ensure_open(&state)?;
            state.responses.push(Response {
                invocation_id: invocation.id.clone(),
                content: content.to_string(),
            });
        }

        self.emit(OutboundFrame::Response {
            invocation: invocation.id.clone(),
            content: content.to_string(),
        });
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.started = false;
        state.closed = true;
        info!("Local transport closed");
        Ok(())
    }
}
