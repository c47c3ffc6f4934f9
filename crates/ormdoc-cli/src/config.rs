//! Project configuration (`ormdoc.json`).

use anyhow::{Context, Result};
use ormdoc_sync::SyncOptions;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "ormdoc.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConfigFile {
    #[serde(flatten)]
    pub sync: SyncOptions,
    /// Directory for the daily append-only run log.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

/// Load the explicit config file, else `<project>/ormdoc.json` when present,
/// else defaults.
pub fn load(project: &Path, explicit: Option<&Path>) -> Result<ConfigFile> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let candidate = project.join(DEFAULT_CONFIG_FILE);
            if !candidate.is_file() {
                return Ok(ConfigFile::default());
            }
            candidate
        }
    };

    let text = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let mut config: ConfigFile = serde_json::from_str(&text)
        .with_context(|| format!("invalid config {}", path.display()))?;

    // A relative log directory is relative to the project.
    if let Some(dir) = config.log_dir.as_mut() {
        if dir.is_relative() {
            *dir = project.join(&*dir);
        }
    }

    tracing::debug!(path = %path.display(), "config loaded");
    Ok(config)
}
