//! Command definition trees.
//!
//! A definition describes the shape of a command as it is registered with the
//! platform: its name, description and options. Options of kind
//! [`OptionKind::SubCommand`] nest further and form the branches a
//! [`CommandPath`] walks through; every other kind is a leaf value.

use crate::handlers::CommandPath;
use serde::{Deserialize, Serialize};

/// Kind of a command option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    SubCommand,
    String,
    Integer,
    Boolean,
    User,
    Channel,
    Role,
    Mentionable,
    Number,
    Attachment,
}

impl OptionKind {
    /// Whether options of this kind carry nested options that extend a path.
    #[inline]
    pub fn is_sub_command(self) -> bool {
        matches!(self, Self::SubCommand)
    }
}

/// A single option (or sub-command) of a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandOption {
    pub name: String,
    pub description: String,
    pub kind: OptionKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<CommandOption>,
}

impl CommandOption {
    pub fn new(kind: OptionKind, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            required: false,
            options: Vec::new(),
        }
    }

    /// Mark this option as required.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

/// A root command as sent to the platform for registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandDefinition {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub nsfw: bool,
    #[serde(default)]
    pub dm_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_member_permissions: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<CommandOption>,
}

impl CommandDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            nsfw: false,
            dm_enabled: false,
            default_member_permissions: None,
            options: Vec::new(),
        }
    }

    pub fn nsfw(mut self, nsfw: bool) -> Self {
        self.nsfw = nsfw;
        self
    }

    pub fn dm_enabled(mut self, enabled: bool) -> Self {
        self.dm_enabled = enabled;
        self
    }

    /// Permission bitset a member needs by default to see the command.
    pub fn default_member_permissions(mut self, permissions: u64) -> Self {
        self.default_member_permissions = Some(permissions);
        self
    }

    /// Every command path this tree exposes.
    ///
    /// A path ends at the root when it has no sub-commands, otherwise at each
    /// sub-command that has no sub-commands of its own.
    pub fn paths(&self) -> Vec<CommandPath> {
        let mut out = Vec::new();
        let mut prefix = vec![self.name.clone()];
        collect_paths(&self.options, &mut prefix, &mut out);
        out
    }
}

fn collect_paths(options: &[CommandOption], prefix: &mut Vec<String>, out: &mut Vec<CommandPath>) {
    let mut branched = false;
    for option in options.iter().filter(|o| o.kind.is_sub_command()) {
        branched = true;
        prefix.push(option.name.clone());
        collect_paths(&option.options, prefix, out);
        prefix.pop();
    }
    if !branched && let Ok(path) = CommandPath::new(prefix.iter().cloned()) {
        out.push(path);
    }
}

/// Fluent option builders shared by root commands and sub-commands.
pub trait OptionsBuilder: Sized {
    fn options_mut(&mut self) -> &mut Vec<CommandOption>;

    /// Append a fully built option.
    fn with_option(mut self, option: CommandOption) -> Self {
        self.options_mut().push(option);
        self
    }

    /// Append a sub-command, configured by `build`.
    fn sub_command<F>(self, name: impl Into<String>, description: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(CommandOption) -> CommandOption,
    {
        let sub = build(CommandOption::new(OptionKind::SubCommand, name, description));
        self.with_option(sub)
    }

    fn option(self, kind: OptionKind, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.with_option(CommandOption::new(kind, name, description).required(required))
    }

    fn string_option(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.option(OptionKind::String, name, description, required)
    }

    fn integer_option(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.option(OptionKind::Integer, name, description, required)
    }

    fn bool_option(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.option(OptionKind::Boolean, name, description, required)
    }

    fn user_option(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.option(OptionKind::User, name, description, required)
    }

    fn channel_option(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.option(OptionKind::Channel, name, description, required)
    }

    fn role_option(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.option(OptionKind::Role, name, description, required)
    }

    fn mentionable_option(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.option(OptionKind::Mentionable, name, description, required)
    }

    fn number_option(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.option(OptionKind::Number, name, description, required)
    }

    fn attachment_option(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.option(OptionKind::Attachment, name, description, required)
    }
}

impl OptionsBuilder for CommandDefinition {
    fn options_mut(&mut self) -> &mut Vec<CommandOption> {
        &mut self.options
    }
}

impl OptionsBuilder for CommandOption {
    fn options_mut(&mut self) -> &mut Vec<CommandOption> {
        &mut self.options
    }
}
