//! Feature modules and the infrastructure around them.
//!
//! - [`traits`]: the `Module` trait
//! - [`context`]: handles attached to a module at startup
//! - [`registry`]: identity-checked module set and the factory catalog
//! - [`store`]: per-module persistent JSON store
//! - [`ping`], [`settings`]: built-in modules

pub mod context;
pub mod ping;
pub mod registry;
pub mod settings;
pub mod store;
pub mod traits;

pub use context::ModuleContext;
pub use ping::PingModule;
pub use registry::{ModuleEntry, ModuleFactory, ModuleRegistry, ModuleState};
pub use settings::SettingsModule;
pub use store::{ModuleStore, StoreError};
pub use traits::Module;

/// Scope of the modules shipped with the crate.
pub const BUILTIN_SCOPE: &str = "builtin";

/// Factory catalog of the built-in modules, for [`ModuleRegistry::discover`].
pub fn builtin_catalog() -> Vec<ModuleFactory> {
    vec![
        ModuleFactory::of::<PingModule>(BUILTIN_SCOPE),
        ModuleFactory::of::<SettingsModule>("builtin::admin"),
    ]
}
