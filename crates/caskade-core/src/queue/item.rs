//! Queue item model: kinds, prompts, and the bounded per-item log.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::types::ItemStatus;

/// Maximum number of log lines retained per item. Oldest lines are evicted
/// whole, never truncated mid-line.
pub const MAX_ITEM_LOG_LINES: usize = 500;

/// Prompt metadata for a script variable, resolved by the UI layer into the
/// substitution values before a run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputPrompt {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<String>,
}

/// What an item is: a package in one of the supported managers, or a script.
///
/// Script-only payloads live on the `Script` variant so a package item can
/// never carry commands; likewise `extensions` exist only on casks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ItemKind {
    Formula,
    Cask {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        extensions: Vec<String>,
    },
    Mas,
    Winget,
    Chocolatey,
    Apt,
    Dnf,
    Pacman,
    Script {
        #[serde(default)]
        commands: Vec<String>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        prompt_for_input: BTreeMap<String, InputPrompt>,
    },
}

impl ItemKind {
    /// Lowercase tag used in ids and duplicate checks.
    pub fn tag(&self) -> &'static str {
        match self {
            ItemKind::Formula => "formula",
            ItemKind::Cask { .. } => "cask",
            ItemKind::Mas => "mas",
            ItemKind::Winget => "winget",
            ItemKind::Chocolatey => "chocolatey",
            ItemKind::Apt => "apt",
            ItemKind::Dnf => "dnf",
            ItemKind::Pacman => "pacman",
            ItemKind::Script { .. } => "script",
        }
    }

    pub fn is_script(&self) -> bool {
        matches!(self, ItemKind::Script { .. })
    }

    /// Default description used when the caller provides none.
    pub fn default_description(&self) -> &'static str {
        match self {
            ItemKind::Formula => "CLI tool",
            ItemKind::Cask { .. } => "Application",
            ItemKind::Mas => "Mac App Store app",
            ItemKind::Script { .. } => "Custom script",
            ItemKind::Winget | ItemKind::Chocolatey => "Windows package",
            ItemKind::Apt | ItemKind::Dnf | ItemKind::Pacman => "Linux package",
        }
    }
}

/// One unit of work in the install queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallItem {
    /// `kind:normalized-name` for packages; scripts get a timestamp and a
    /// random suffix appended so the same script can be queued twice.
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub kind: ItemKind,
    /// 1-based dense position after `reindex`. Imported data may carry
    /// missing or out-of-range values; they sort to an extreme and get
    /// overwritten on the next reindex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    /// Shell commands run after a successful package install.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_install: Vec<String>,
    #[serde(default, skip_serializing_if = "VecDeque::is_empty")]
    pub logs: VecDeque<String>,
}

impl InstallItem {
    /// Append a log line, evicting the oldest line once the bound is hit.
    pub fn push_log(&mut self, line: impl Into<String>) {
        if self.logs.len() == MAX_ITEM_LOG_LINES {
            self.logs.pop_front();
        }
        self.logs.push_back(line.into());
    }

    /// Trimmed, lowercased name used for duplicate checks.
    pub fn normalized_name(&self) -> String {
        self.name.trim().to_lowercase()
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script_item() -> InstallItem {
        InstallItem {
            id: "script:setup-1700000000000-abcd1234".to_string(),
            name: "Setup".to_string(),
            kind: ItemKind::Script {
                commands: vec!["echo hi".to_string()],
                prompt_for_input: BTreeMap::new(),
            },
            position: Some(1),
            status: ItemStatus::Pending,
            description: "Custom script".to_string(),
            version: None,
            required: false,
            post_install: Vec::new(),
            logs: VecDeque::new(),
        }
    }

    #[test]
    fn test_push_log_evicts_oldest_first() {
        let mut item = script_item();
        for i in 0..(MAX_ITEM_LOG_LINES + 10) {
            item.push_log(format!("line {i}"));
        }

        assert_eq!(item.logs.len(), MAX_ITEM_LOG_LINES);
        assert_eq!(item.logs.front().map(String::as_str), Some("line 10"));
        assert_eq!(
            item.logs.back().map(String::as_str),
            Some(format!("line {}", MAX_ITEM_LOG_LINES + 9).as_str())
        );
    }

    #[test]
    fn test_item_serializes_with_kind_tag() {
        let item = script_item();
        let json = serde_json::to_value(&item).unwrap();

        assert_eq!(json["type"], "script");
        assert_eq!(json["commands"][0], "echo hi");
        assert_eq!(json["status"], "pending");
    }

    #[test]
    fn test_package_item_deserializes_without_optional_fields() {
        let json = r#"{"id":"formula:git","name":"git","type":"formula"}"#;
        let item: InstallItem = serde_json::from_str(json).unwrap();

        assert_eq!(item.kind, ItemKind::Formula);
        assert_eq!(item.status, ItemStatus::Pending);
        assert!(item.position.is_none());
        assert!(item.logs.is_empty());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&ItemStatus::AlreadyInstalled).unwrap();
        assert_eq!(json, r#""already_installed""#);
    }
}
