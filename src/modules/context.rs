//! Handles attached to a module at startup.

use super::store::ModuleStore;
use crate::commands::Invocation;
use crate::error::HandlerError;
use crate::network::Transport;
use std::sync::Arc;

/// Everything a module can reach once it is attached: the outbound
/// transport and its own persistent store.
///
/// Cheap to clone; every handler invocation receives its own copy.
#[derive(Clone)]
pub struct ModuleContext {
    module_id: Arc<str>,
    transport: Arc<dyn Transport>,
    store: Arc<ModuleStore>,
}

impl ModuleContext {
    pub fn new(module_id: &str, transport: Arc<dyn Transport>, store: Arc<ModuleStore>) -> Self {
        Self {
            module_id: Arc::from(module_id),
            transport,
            store,
        }
    }

    /// Identifier of the owning module.
    pub fn module_id(&self) -> &str {
        &self.module_id
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn store(&self) -> &ModuleStore {
        &self.store
    }

    /// Reply to an invocation through the transport.
    pub async fn respond(&self, invocation: &Invocation, content: &str) -> Result<(), HandlerError> {
        self.transport.respond(invocation, content).await?;
        Ok(())
    }
}

impl std::fmt::Debug for ModuleContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleContext")
            .field("module_id", &self.module_id)
            .field("store", &self.store.path())
            .finish_non_exhaustive()
    }
}
