//! Inbound command invocations.
//!
//! An [`Invocation`] is what the platform delivers when a user runs a
//! command: the root command name plus the tree of options the user
//! selected. Exactly one sub-command is selected per level.

use super::definition::OptionKind;
use crate::error::HandlerError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A selected option inside an invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationOption {
    pub name: String,
    pub kind: OptionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<InvocationOption>,
}

impl InvocationOption {
    /// A selected sub-command carrying nested options.
    pub fn sub_command(name: impl Into<String>, options: Vec<InvocationOption>) -> Self {
        Self {
            name: name.into(),
            kind: OptionKind::SubCommand,
            value: None,
            options,
        }
    }

    /// A leaf option with a value.
    pub fn value(name: impl Into<String>, kind: OptionKind, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            kind,
            value: Some(value.into()),
            options: Vec::new(),
        }
    }
}

/// A single user-issued command execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    /// Platform-assigned invocation id, used to route the reply.
    pub id: String,
    /// Root command name.
    #[serde(rename = "command")]
    pub command_name: String,
    #[serde(default)]
    pub options: Vec<InvocationOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

impl Invocation {
    pub fn new(id: impl Into<String>, command_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            command_name: command_name.into(),
            options: Vec::new(),
            user: None,
            channel: None,
        }
    }

    pub fn with_option(mut self, option: InvocationOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Leaf options of the innermost selected sub-command.
    ///
    /// These are the values a handler reads; for a flat command they are the
    /// root options.
    pub fn leaf_options(&self) -> &[InvocationOption] {
        let mut current = &self.options;
        while let Some(sub) = current.iter().find(|o| o.kind.is_sub_command()) {
            current = &sub.options;
        }
        current
    }

    /// Raw value of a leaf option, if supplied.
    pub fn option(&self, name: &str) -> Option<&Value> {
        self.leaf_options()
            .iter()
            .find(|o| o.name == name)
            .and_then(|o| o.value.as_ref())
    }

    /// Required string option.
    pub fn get_string(&self, name: &str) -> Result<&str, HandlerError> {
        let value = self
            .option(name)
            .ok_or_else(|| HandlerError::MissingOption(name.to_string()))?;
        value.as_str().ok_or_else(|| HandlerError::InvalidOption {
            name: name.to_string(),
            expected: "string",
        })
    }

    /// Required integer option.
    pub fn get_integer(&self, name: &str) -> Result<i64, HandlerError> {
        let value = self
            .option(name)
            .ok_or_else(|| HandlerError::MissingOption(name.to_string()))?;
        value.as_i64().ok_or_else(|| HandlerError::InvalidOption {
            name: name.to_string(),
            expected: "integer",
        })
    }

    /// Optional boolean option.
    pub fn get_bool(&self, name: &str) -> Result<Option<bool>, HandlerError> {
        match self.option(name) {
            None => Ok(None),
            Some(value) => value.as_bool().map(Some).ok_or_else(|| HandlerError::InvalidOption {
                name: name.to_string(),
                expected: "boolean",
            }),
        }
    }
}
