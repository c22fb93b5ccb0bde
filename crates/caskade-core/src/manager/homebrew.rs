//! Homebrew discovery and installed-package queries.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tokio::process::Command;
use tracing::debug;

use super::{InstalledQuery, InstalledSet};

/// Locations Homebrew installs to when it is not already on PATH.
const WELL_KNOWN_BREW_PATHS: &[&str] = &[
    "/opt/homebrew/bin/brew",
    "/usr/local/bin/brew",
    "/home/linuxbrew/.linuxbrew/bin/brew",
];

/// Handle to a located brew binary.
#[derive(Debug, Clone)]
pub struct Homebrew {
    binary: PathBuf,
}

impl Homebrew {
    /// Locate brew via PATH, falling back to the standard install
    /// locations. GUI-launched processes often run with a stripped PATH
    /// that misses all of them.
    pub fn discover() -> anyhow::Result<Self> {
        if let Ok(path) = which::which("brew") {
            return Ok(Self { binary: path });
        }
        for candidate in WELL_KNOWN_BREW_PATHS {
            let path = PathBuf::from(candidate);
            if path.exists() {
                debug!(path = %path.display(), "found brew outside PATH");
                return Ok(Self { binary: path });
            }
        }
        anyhow::bail!("Homebrew not found on PATH or in standard locations")
    }

    pub fn at(binary: PathBuf) -> Self {
        Self { binary }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Environment for spawned installs: PATH with the brew prefix first,
    /// and auto-update suppressed so installs do not stall on it.
    pub fn enhanced_env(&self) -> HashMap<String, String> {
        let mut env = HashMap::new();
        let current = std::env::var("PATH").unwrap_or_default();
        if let Some(bin_dir) = self.binary.parent() {
            env.insert(
                "PATH".to_string(),
                format!("{}:{current}", bin_dir.display()),
            );
        }
        env.insert("HOMEBREW_NO_AUTO_UPDATE".to_string(), "1".to_string());
        env
    }

    async fn list(&self, flag: &str) -> anyhow::Result<Vec<String>> {
        let output = Command::new(&self.binary)
            .args(["list", flag, "-1"])
            .output()
            .await
            .with_context(|| format!("Failed to run {} list {flag}", self.binary.display()))?;
        if !output.status.success() {
            anyhow::bail!("brew list {flag} exited with {}", output.status);
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect())
    }
}

#[async_trait::async_trait]
impl InstalledQuery for Homebrew {
    async fn installed(&self) -> anyhow::Result<InstalledSet> {
        let mut set = InstalledSet::default();
        for name in self.list("--formula").await? {
            set.insert_formula(name);
        }
        for name in self.list("--cask").await? {
            set.insert_cask(name);
        }
        debug!(
            formulae = set.formulae.len(),
            casks = set.casks.len(),
            "queried installed packages"
        );
        Ok(set)
    }
}
