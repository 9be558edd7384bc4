//! Command shapes and inbound invocations.
//!
//! - [`definition`]: command definition trees registered with the platform
//! - [`interaction`]: invocation payloads delivered by the platform

pub mod definition;
pub mod interaction;

pub use definition::{CommandDefinition, CommandOption, OptionKind, OptionsBuilder};
pub use interaction::{Invocation, InvocationOption};
