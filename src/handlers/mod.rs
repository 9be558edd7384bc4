//! Command handler infrastructure.
//!
//! - [`path`]: `CommandPath`, the binding key
//! - [`set`]: declarative handler sets returned by modules
//! - [`table`]: the startup-built binding table
//! - [`dispatch`]: path derivation and dispatch

pub mod dispatch;
pub mod path;
pub mod set;
pub mod table;

pub use dispatch::{Dispatched, Dispatcher, derive_command_path};
pub use path::{CommandPath, PathError};
pub use set::{HandlerEntry, HandlerSet, Handlers, ModuleHandler};
pub use table::{Binding, BoundHandler, HandlerTable, HandlerTableBuilder, StagedBindings};
