//! Command paths.
//!
//! A path is the root command name followed by the names of the selected
//! sub-commands, e.g. `config set`. Paths are the binding table keys and
//! cannot be modified once constructed.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Reasons a sequence of names is not a valid command path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("command path is empty")]
    Empty,

    #[error("command path segment {index} is empty")]
    EmptySegment { index: usize },

    #[error("command path segment '{0}' contains whitespace")]
    Whitespace(String),
}

impl PathError {
    /// Short static description, used in startup diagnostics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Empty => "empty command path",
            Self::EmptySegment { .. } => "empty path segment",
            Self::Whitespace(_) => "path segment contains whitespace",
        }
    }
}

/// An ordered, non-empty sequence of command names.
///
/// Equality is element-wise ordinal comparison; `["config", "set"]` and
/// `["Config", "set"]` are different paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandPath(Vec<String>);

impl CommandPath {
    /// Build a validated path.
    pub fn new<I, S>(names: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(PathError::Empty);
        }
        for (index, name) in names.iter().enumerate() {
            if name.is_empty() {
                return Err(PathError::EmptySegment { index });
            }
            if name.chars().any(char::is_whitespace) {
                return Err(PathError::Whitespace(name.clone()));
            }
        }
        Ok(Self(names))
    }

    /// Build a path from names supplied by the platform.
    ///
    /// The caller guarantees at least one name. No other validation happens:
    /// a path that fails [`CommandPath::new`] simply never matches a binding.
    pub(crate) fn from_platform(names: Vec<String>) -> Self {
        debug_assert!(!names.is_empty(), "platform command path without a root");
        Self(names)
    }

    /// The root command name.
    pub fn root(&self) -> &str {
        &self.0[0]
    }

    /// All names, root first.
    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// Number of names in the path (always at least 1).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether this path is exactly the given names.
    pub fn matches(&self, names: &[&str]) -> bool {
        self.0.len() == names.len() && self.0.iter().zip(names).all(|(a, b)| a == b)
    }
}

impl fmt::Display for CommandPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}

impl FromStr for CommandPath {
    type Err = PathError;

    /// Parse a space-separated path such as `"config set"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.split_whitespace())
    }
}
