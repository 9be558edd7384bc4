//! Module registry.
//!
//! Holds the resolved module set in registration order and enforces that no
//! two modules share an identifier (case-insensitively) or a concrete type.
//! Modules are added explicitly, either one by one or by discovering them
//! from a static [`ModuleFactory`] catalog.

use super::context::ModuleContext;
use super::traits::Module;
use crate::error::StartupError;
use std::any::TypeId;
use std::sync::Arc;
use tracing::debug;

/// Lifecycle of a registered module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    /// Registered, no context yet.
    Unattached,
    /// Transport handle and store attached.
    Attached,
    /// `initialize` completed and handlers are bound.
    Initialized,
}

/// A registered module with its bookkeeping.
pub struct ModuleEntry {
    module: Arc<dyn Module>,
    type_id: TypeId,
    type_name: &'static str,
    state: ModuleState,
    context: Option<ModuleContext>,
}

impl ModuleEntry {
    pub fn id(&self) -> &str {
        self.module.id()
    }

    pub fn module(&self) -> &Arc<dyn Module> {
        &self.module
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn state(&self) -> ModuleState {
        self.state
    }

    pub fn context(&self) -> Option<&ModuleContext> {
        self.context.as_ref()
    }

    pub(crate) fn attach(&mut self, context: ModuleContext) {
        self.context = Some(context);
        self.state = ModuleState::Attached;
    }

    pub(crate) fn mark_initialized(&mut self) {
        self.state = ModuleState::Initialized;
    }

    pub(crate) fn detach(&mut self) {
        self.context = None;
        self.state = ModuleState::Unattached;
    }
}

/// Constructor for a module type, tagged with the scope it belongs to.
///
/// Scopes are `::`-separated names, e.g. `builtin` or `builtin::admin`.
#[derive(Clone, Copy)]
pub struct ModuleFactory {
    pub scope: &'static str,
    type_id: TypeId,
    type_name: &'static str,
    build: fn() -> Arc<dyn Module>,
}

impl ModuleFactory {
    pub fn of<M: Module + Default>(scope: &'static str) -> Self {
        Self {
            scope,
            type_id: TypeId::of::<M>(),
            type_name: std::any::type_name::<M>(),
            build: || Arc::new(M::default()) as Arc<dyn Module>,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether this factory lies in `scope` (or below it, with `nested`).
    pub fn in_scope(&self, scope: &str, nested: bool) -> bool {
        if self.scope == scope {
            return true;
        }
        nested
            && self
                .scope
                .strip_prefix(scope)
                .is_some_and(|rest| rest.starts_with("::"))
    }
}

impl std::fmt::Debug for ModuleFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleFactory")
            .field("scope", &self.scope)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Ordered set of resolved modules.
#[derive(Default)]
pub struct ModuleRegistry {
    entries: Vec<ModuleEntry>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module instance.
    pub fn register<M: Module>(&mut self, module: M) -> Result<&mut Self, StartupError> {
        self.insert(
            Arc::new(module),
            TypeId::of::<M>(),
            std::any::type_name::<M>(),
        )?;
        Ok(self)
    }

    /// Construct and register a module from its `Default` impl.
    pub fn add<M: Module + Default>(&mut self) -> Result<&mut Self, StartupError> {
        if self.contains_type(TypeId::of::<M>()) {
            return Err(StartupError::DuplicateModuleType {
                type_name: std::any::type_name::<M>(),
            });
        }
        self.register(M::default())
    }

    /// Register every catalog entry in `scope` whose type is not present yet.
    ///
    /// Returns how many modules were added. Identifier clashes still fail.
    pub fn discover(
        &mut self,
        catalog: &[ModuleFactory],
        scope: &str,
        include_nested: bool,
    ) -> Result<usize, StartupError> {
        let mut added = 0;
        for factory in catalog.iter().filter(|f| f.in_scope(scope, include_nested)) {
            if self.contains_type(factory.type_id) {
                continue;
            }
            self.insert((factory.build)(), factory.type_id, factory.type_name)?;
            added += 1;
        }
        debug!(scope, added, "Module discovery finished");
        Ok(added)
    }

    fn insert(
        &mut self,
        module: Arc<dyn Module>,
        type_id: TypeId,
        type_name: &'static str,
    ) -> Result<(), StartupError> {
        if self.contains_type(type_id) {
            return Err(StartupError::DuplicateModuleType { type_name });
        }

        let id = module.id().to_lowercase();
        if self.entries.iter().any(|e| e.id().to_lowercase() == id) {
            return Err(StartupError::DuplicateModule {
                id: module.id().to_string(),
            });
        }

        debug!(module = %module.id(), type_name, "Module registered");
        self.entries.push(ModuleEntry {
            module,
            type_id,
            type_name,
            state: ModuleState::Unattached,
            context: None,
        });
        Ok(())
    }

    fn contains_type(&self, type_id: TypeId) -> bool {
        self.entries.iter().any(|e| e.type_id == type_id)
    }

    /// Look up a module by identifier, case-insensitively.
    pub fn get(&self, id: &str) -> Option<&ModuleEntry> {
        let id = id.to_lowercase();
        self.entries.iter().find(|e| e.id().to_lowercase() == id)
    }

    /// Registered modules in registration order.
    pub fn modules(&self) -> impl Iterator<Item = &Arc<dyn Module>> {
        self.entries.iter().map(|e| &e.module)
    }

    pub fn entries(&self) -> &[ModuleEntry] {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [ModuleEntry] {
        &mut self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
