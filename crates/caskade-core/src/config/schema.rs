//! Settings and queue-file schemas.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::queue::item::InstallItem;

/// Run-level settings persisted in `caskade.toml` and embedded in queue
/// files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub continue_on_error: bool,
    pub skip_already_installed: bool,
    /// Present for config compatibility; the executor runs items one at a
    /// time regardless.
    pub parallel_installs: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            continue_on_error: true,
            skip_already_installed: true,
            parallel_installs: false,
        }
    }
}

/// The JSON shape produced and consumed by queue import/export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueFile {
    #[serde(default)]
    pub items: Vec<InstallItem>,
    /// Absent in files exported without settings; callers fall back to the
    /// persistent settings store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
    /// Values for `{{token}}` substitution, resolved by the UI layer from
    /// each script's prompts before a run starts.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub values: HashMap<String, String>,
}
