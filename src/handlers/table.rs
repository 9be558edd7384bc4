//! Handler binding table.
//!
//! Maps each [`CommandPath`] to exactly one bound handler. The table is
//! assembled once during the ready sequence with [`HandlerTableBuilder`] and
//! is read-only afterwards, so concurrent dispatches share it without locks.
//!
//! Insertion happens in two steps per module: [`HandlerTableBuilder::stage`]
//! validates every declared path and checks it against the table, then
//! [`HandlerTableBuilder::commit`] inserts. The bot registers the module's
//! commands between the two, so a module with a bad handler never gets any
//! command registered.

use super::path::CommandPath;
use super::set::HandlerSet;
use crate::commands::Invocation;
use crate::error::{HandlerResult, StartupError};
use crate::modules::ModuleContext;
use futures_util::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Handler with its module and context already bound.
pub type BoundHandler = Arc<dyn Fn(Invocation) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// A table entry.
#[derive(Clone)]
pub struct Binding {
    pub module_id: String,
    pub handler_name: &'static str,
    handler: BoundHandler,
}

impl Binding {
    /// Start the handler for an invocation.
    pub fn call(&self, invocation: Invocation) -> BoxFuture<'static, HandlerResult> {
        (self.handler)(invocation)
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("module_id", &self.module_id)
            .field("handler_name", &self.handler_name)
            .finish_non_exhaustive()
    }
}

/// Read-only map from command path to handler.
#[derive(Debug, Default)]
pub struct HandlerTable {
    bindings: HashMap<CommandPath, Binding>,
    /// Insertion order, for listing.
    order: Vec<CommandPath>,
}

impl HandlerTable {
    pub fn get(&self, path: &CommandPath) -> Option<&Binding> {
        self.bindings.get(path)
    }

    pub fn contains(&self, path: &CommandPath) -> bool {
        self.bindings.contains_key(path)
    }

    /// Bound paths in insertion order.
    pub fn paths(&self) -> &[CommandPath] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Validated bindings of one module, ready to be committed.
#[must_use = "staged bindings do nothing until committed"]
pub struct StagedBindings {
    module_id: String,
    bindings: Vec<(CommandPath, Binding)>,
}

impl StagedBindings {
    pub fn paths(&self) -> impl Iterator<Item = &CommandPath> {
        self.bindings.iter().map(|(path, _)| path)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Accumulates bindings module by module.
#[derive(Default)]
pub struct HandlerTableBuilder {
    table: HandlerTable,
}

impl HandlerTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a module's handler set and bind it to `ctx`.
    ///
    /// Fails on the first invalid path or on a path that is already bound,
    /// either by an earlier module or earlier in the same set.
    pub fn stage(&self, ctx: &ModuleContext, set: HandlerSet) -> Result<StagedBindings, StartupError> {
        let module_id = ctx.module_id().to_string();
        let mut bindings: Vec<(CommandPath, Binding)> = Vec::with_capacity(set.len());

        for entry in set.entries() {
            let path = CommandPath::new(entry.path.iter().cloned()).map_err(|e| {
                StartupError::InvalidHandler {
                    module: module_id.clone(),
                    handler: entry.name,
                    path: entry.path.join(" "),
                    reason: e.reason(),
                }
            })?;

            if let Some(existing) = self.table.get(&path) {
                return Err(StartupError::DuplicateCommandPath {
                    path,
                    existing: existing.module_id.clone(),
                    module: module_id,
                });
            }
            if bindings.iter().any(|(p, _)| *p == path) {
                return Err(StartupError::DuplicateCommandPath {
                    path,
                    existing: module_id.clone(),
                    module: module_id,
                });
            }

            let ctx = ctx.clone();
            let handler = Arc::clone(&entry.handler);
            let bound: BoundHandler = Arc::new(move |invocation: Invocation| handler(ctx.clone(), invocation));

            bindings.push((
                path,
                Binding {
                    module_id: module_id.clone(),
                    handler_name: entry.name,
                    handler: bound,
                },
            ));
        }

        Ok(StagedBindings { module_id, bindings })
    }

    /// Insert previously staged bindings.
    pub fn commit(&mut self, staged: StagedBindings) -> usize {
        let count = staged.bindings.len();
        for (path, binding) in staged.bindings {
            debug!(
                module = %staged.module_id,
                path = %path,
                handler = binding.handler_name,
                "Handler bound"
            );
            self.table.order.push(path.clone());
            self.table.bindings.insert(path, binding);
        }
        count
    }

    /// Paths bound so far.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn build(self) -> HandlerTable {
        self.table
    }
}
