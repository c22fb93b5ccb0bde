//! Stores for settings (TOML) and queue files (JSON).

use std::path::{Path, PathBuf};

use anyhow::Context;

use super::paths::settings_path;
use super::schema::{QueueFile, Settings};

#[derive(Debug, Clone)]
pub struct SettingsStore {
    config_path: PathBuf,
}

impl SettingsStore {
    pub fn from_default_dir() -> anyhow::Result<Self> {
        let dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("caskade");
        Ok(Self::from_dir(dir))
    }

    pub fn from_dir(dir: PathBuf) -> Self {
        Self {
            config_path: settings_path(&dir),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn load(&self) -> anyhow::Result<Settings> {
        if !self.config_path.exists() {
            return Ok(Settings::default());
        }
        let content = std::fs::read_to_string(&self.config_path).with_context(|| {
            format!(
                "Failed to read settings file: {}",
                self.config_path.display()
            )
        })?;
        toml::from_str(&content).with_context(|| {
            format!(
                "Failed to parse settings file: {}",
                self.config_path.display()
            )
        })
    }

    pub fn save(&self, settings: &Settings) -> anyhow::Result<()> {
        let content =
            toml::to_string_pretty(settings).context("Failed to serialize settings to TOML")?;
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        std::fs::write(&self.config_path, content).with_context(|| {
            format!(
                "Failed to write settings file: {}",
                self.config_path.display()
            )
        })?;
        Ok(())
    }
}

/// Load a queue file; a missing file is an error, since the caller decides
/// whether to start from an empty queue.
pub fn load_queue_file(path: &Path) -> anyhow::Result<QueueFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read queue file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse queue file: {}", path.display()))
}

pub fn save_queue_file(path: &Path, queue: &QueueFile) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(queue).context("Failed to serialize queue")?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write queue file: {}", path.display()))?;
    Ok(())
}
