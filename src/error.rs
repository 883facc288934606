//! Error types shared across the crate.
//!
//! Nothing here ever reaches the host through `status` or `execute`: those
//! entry points log and fail closed. The types exist so handlers and
//! collaborators can propagate with `?` up to that boundary.

use thiserror::Error;

/// A collaborator call (tree, selection, document opener) failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("host call failed: {reason}")]
pub struct HostError {
    pub reason: String,
}

impl HostError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

pub type HostResult<T> = Result<T, HostError>;

/// Launching an external program failed.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("no terminal emulator found")]
    NoTerminal,

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Reasons a command invocation did not run to completion.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unknown command: {name}")]
    UnknownCommand { name: String },

    #[error("command {name} is not available for the current selection")]
    Disabled { name: String },

    #[error("no filesystem path for {node}")]
    Unresolvable { node: String },

    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error(transparent)]
    Host(#[from] HostError),
}

/// Settings could not be read or written.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}
