//! Config path resolution helpers.

use std::path::{Path, PathBuf};

pub fn settings_path(config_dir: &Path) -> PathBuf {
    config_dir.join("caskade.toml")
}

/// Default queue file location in the working directory.
pub fn default_queue_path() -> PathBuf {
    PathBuf::from("caskade.json")
}
