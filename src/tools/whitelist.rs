//! Command Whitelist
//!
//! This module holds the set of command names the gateway is permitted to run.
//! It is the only authorization boundary: commands are never handed to a shell,
//! so an argument cannot smuggle in a second command. A name that is not a
//! member never reaches process creation.

use std::collections::HashSet;

/// Commands allowed when no whitelist is configured.
///
/// Common read-only inspection tools plus the usual development toolchains.
pub const DEFAULT_ALLOWED_COMMANDS: &[&str] = &[
    "ls", "cat", "echo", "pwd", "head", "tail", "wc", "grep", "find", "git", "node", "npm",
    "npx", "python3", "cargo",
];

/// Immutable set of permitted command names
///
/// Built once at startup and shared read-only (via `Arc`) between every
/// in-flight execution. There is no way to add or remove an entry after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Whitelist {
    allowed: HashSet<String>,
}

impl Default for Whitelist {
    fn default() -> Self {
        Self::from_commands(DEFAULT_ALLOWED_COMMANDS.iter().copied())
    }
}

impl Whitelist {
    /// Build a whitelist from an explicit list of command names
    ///
    /// Names are trimmed and empty names are dropped, same as [`Whitelist::parse`].
    pub fn from_commands<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = commands
            .into_iter()
            .map(|c| c.as_ref().trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        Self { allowed }
    }

    /// Parse a comma-delimited list of command names
    ///
    /// # Example
    ///
    /// ```
    /// use exec_gateway::tools::Whitelist;
    ///
    /// let whitelist = Whitelist::parse(" ls, git ,,cat");
    /// assert!(whitelist.is_allowed("git"));
    /// assert_eq!(whitelist.len(), 3);
    /// ```
    pub fn parse(source: &str) -> Self {
        Self::from_commands(source.split(','))
    }

    /// Parse the configured source, or fall back to the default set when absent
    pub fn from_source(source: Option<&str>) -> Self {
        match source {
            Some(csv) => Self::parse(csv),
            None => Self::default(),
        }
    }

    /// Check whether a command name is a member
    ///
    /// Exact match only: `/bin/ls` is not `ls`, and surrounding whitespace is
    /// not trimmed from the queried name.
    pub fn is_allowed(&self, command: &str) -> bool {
        self.allowed.contains(command)
    }

    /// Members in sorted order
    pub fn commands(&self) -> Vec<&str> {
        let mut commands: Vec<&str> = self.allowed.iter().map(String::as_str).collect();
        commands.sort_unstable();
        commands
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}
