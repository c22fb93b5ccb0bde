//! Executor error taxonomy.

use thiserror::Error;

/// Errors that can occur while executing a queue item.
///
/// These never propagate out of a run; they are captured into the item's
/// status and log, and the run continues or halts per `continue_on_error`.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid package name: {name:?}")]
    InvalidName { name: String },

    #[error("no commands defined")]
    NoCommands,

    #[error("package manager not found: {manager}")]
    ManagerNotFound { manager: String },

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}
