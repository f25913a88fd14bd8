//! YAML configuration I/O
//!
//! Generic loading and saving for any serializable configuration type.
//! Both the converter options and the classifier settings go through here.
//!
//! Two read modes:
//! - [`read_config`] for a file the user named explicitly: every failure,
//!   including a missing file, is an error.
//! - [`load_config`] for the implicit default location: a missing or broken
//!   file falls back to `T::default()` with a warning.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "audio-sentiment.yaml";

/// Get the default config file path
///
/// Returns `./audio-sentiment.yaml` when it exists, otherwise
/// `~/.config/audio-sentiment/config.yaml`.
pub fn default_config_path() -> PathBuf {
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.exists() {
        return local;
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("audio-sentiment")
        .join("config.yaml")
}

/// Read and parse a configuration file that must exist and be valid
pub fn read_config<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {:?}", path))?;
    let config = serde_yaml::from_str(&contents)
        .with_context(|| format!("Invalid YAML in config file {:?}", path))?;
    log::debug!("Read config from {:?}", path);
    Ok(config)
}

/// Load configuration from an optional YAML file
///
/// A missing file means defaults. A file that cannot be read or parsed is
/// reported at warn level and also yields defaults.
///
/// ```ignore
/// let config: AppConfig = load_config(&default_config_path());
/// ```
pub fn load_config<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        log::info!("No config at {:?}, using defaults", path);
        return T::default();
    }

    read_config(path).unwrap_or_else(|e| {
        log::warn!("{:#}, using defaults", e);
        T::default()
    })
}

/// Write `config` as YAML to `path`, creating missing parent directories
pub fn save_config<T>(config: &T, path: &Path) -> Result<()>
where
    T: Serialize,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {:?}", parent))?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;
    std::fs::write(path, yaml).with_context(|| format!("Failed to write config file {:?}", path))?;

    log::info!("Saved config to {:?}", path);
    Ok(())
}
