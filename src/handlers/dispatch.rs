//! Invocation dispatch.
//!
//! The `Dispatcher` owns the frozen handler table, derives the command path
//! of each invocation and runs the matching handler. Unmatched invocations
//! are dropped without error. Includes per-path usage counters.

use super::path::CommandPath;
use super::table::HandlerTable;
use crate::commands::Invocation;
use crate::error::HandlerError;
use crate::telemetry::{CommandTimer, spans};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{Instrument, trace};

/// Outcome of a dispatch that did not fail.
///
/// [`Dispatcher::dispatch`] yields `Handled` or `Unmatched`. `NotReady` comes
/// only from [`Bot::handle_invocation`](crate::Bot::handle_invocation), before
/// a dispatcher exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// A handler ran to completion.
    Handled,
    /// No handler is bound to the derived path.
    Unmatched,
    /// Startup has not completed; the invocation was dropped by the bot.
    NotReady,
}

/// Derive the command path of an invocation.
///
/// Starts with the root command name and follows the selected sub-command at
/// each level. At most one sub-command is selected per level; if a payload
/// ever carried more, the first one is followed.
pub fn derive_command_path(invocation: &Invocation) -> CommandPath {
    let mut names = vec![invocation.command_name.clone()];
    let mut current = &invocation.options;
    while let Some(sub) = current.iter().find(|o| o.kind.is_sub_command()) {
        names.push(sub.name.clone());
        current = &sub.options;
    }
    CommandPath::from_platform(names)
}

/// Routes invocations to bound handlers.
pub struct Dispatcher {
    table: HandlerTable,
    /// Invocation counters, one per bound path.
    counts: HashMap<CommandPath, AtomicU64>,
}

impl Dispatcher {
    pub fn new(table: HandlerTable) -> Self {
        let counts = table
            .paths()
            .iter()
            .map(|path| (path.clone(), AtomicU64::new(0)))
            .collect();
        Self { table, counts }
    }

    pub fn table(&self) -> &HandlerTable {
        &self.table
    }

    /// Dispatch an invocation to its handler and wait for it to finish.
    ///
    /// Returns [`Dispatched::Unmatched`] when nothing is bound to the path.
    /// Handler errors are returned to the caller unchanged.
    pub async fn dispatch(&self, invocation: Invocation) -> Result<Dispatched, HandlerError> {
        let path = derive_command_path(&invocation);

        let Some(binding) = self.table.get(&path) else {
            trace!(path = %path, invocation = %invocation.id, "No handler bound, dropping");
            return Ok(Dispatched::Unmatched);
        };

        if let Some(counter) = self.counts.get(&path) {
            counter.fetch_add(1, Ordering::Relaxed);
        }

        let span = spans::invocation(
            &path,
            &invocation.id,
            &binding.module_id,
            invocation.user.as_deref(),
        );
        let _timer = CommandTimer::new(path.to_string());

        binding
            .call(invocation)
            .instrument(span)
            .await
            .map(|()| Dispatched::Handled)
    }

    /// Usage statistics: (path, invocations), most used first.
    ///
    /// Paths that were never invoked are omitted.
    pub fn command_stats(&self) -> Vec<(CommandPath, u64)> {
        let mut stats: Vec<_> = self
            .counts
            .iter()
            .map(|(path, count)| (path.clone(), count.load(Ordering::Relaxed)))
            .filter(|(_, count)| *count > 0)
            .collect();

        stats.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        stats
    }
}
