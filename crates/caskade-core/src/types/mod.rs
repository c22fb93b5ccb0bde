//! Shared core types used across the queue, executor, and config layers.

use serde::{Deserialize, Serialize};

/// Per-item lifecycle status.
///
/// Transitions within a run: `pending -> (checking) -> installing ->
/// {success | failed | skipped | already_installed}`. `checking` only
/// applies to package items while the installed set is consulted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Pending,
    Checking,
    Installing,
    Success,
    Failed,
    Skipped,
    AlreadyInstalled,
}

impl ItemStatus {
    /// Terminal states never transition again within a run.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ItemStatus::Success
                | ItemStatus::Failed
                | ItemStatus::Skipped
                | ItemStatus::AlreadyInstalled
        )
    }
}

/// Whether a run installs fresh or forces a reinstall.
///
/// `Reinstall` bypasses the installed-set pre-pass and switches package
/// managers to their reinstall verb.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallAction {
    #[default]
    Install,
    Reinstall,
}

/// Which stream a child-process log line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStream {
    Stdout,
    Stderr,
}
