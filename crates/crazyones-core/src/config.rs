//! Shared configuration paths for CrazyOnes.
//!
//! Provides functions to locate the data directory and the well-known
//! files within it, shared by both the monitor and the bot.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Environment variable for a custom data directory.
const DATA_DIR_ENV: &str = "CRAZYONES_DATA_DIR";

/// Default data directory name under home.
const DEFAULT_DATA_DIR: &str = ".crazyones";

/// Get the CrazyOnes data directory.
///
/// Determined by:
/// 1. `CRAZYONES_DATA_DIR` environment variable if set
/// 2. `~/.crazyones` if home directory is available
/// 3. `./data` in current directory as fallback
pub fn data_dir() -> PathBuf {
    std::env::var(DATA_DIR_ENV).map(PathBuf::from).unwrap_or_else(|_| {
        dirs::home_dir()
            .map(|h| h.join(DEFAULT_DATA_DIR))
            .unwrap_or_else(|| PathBuf::from("data"))
    })
}

/// Path to the JSON configuration file (`config.json`).
pub fn config_file() -> PathBuf {
    data_dir().join("config.json")
}

/// Path to the per-locale updates directory (`updates/`).
pub fn updates_dir() -> PathBuf {
    data_dir().join("updates")
}

/// Path to the operator log file.
pub fn log_file() -> PathBuf {
    data_dir().join("logs").join("crazyones.log")
}

/// Path to the translation catalog directory, read-only at runtime.
pub fn translations_dir() -> PathBuf {
    data_dir().join("translations")
}

/// Path to the monitor's single-instance lock file.
pub fn monitor_lock_file() -> PathBuf {
    data_dir().join("monitor.pid")
}

/// Path to the bot's single-instance lock file.
pub fn bot_lock_file() -> PathBuf {
    data_dir().join("bot.pid")
}

/// Ensure the data directory and its subdirectories exist.
///
/// # Errors
/// Returns an error if a directory cannot be created.
pub fn ensure_data_dirs() -> std::io::Result<()> {
    for dir in [data_dir(), updates_dir(), log_file().parent().unwrap().to_path_buf()] {
        if !dir.exists() {
            std::fs::create_dir_all(&dir)?;
        }
    }
    Ok(())
}

/// The on-disk shape of `config.json` (spec.md §6). Every field is
/// optional so a partial file still deserializes; callers fill gaps
/// from environment variables and built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    pub version: Option<String>,
    pub apple_updates_url: Option<String>,
    pub telegram_bot_token: Option<String>,
}

/// Reads `config.json` at `path`, returning the default (all-`None`)
/// config if the file does not exist.
///
/// # Errors
/// Returns an error if the file exists but is not valid JSON.
pub fn load_file_config(path: &std::path::Path) -> std::io::Result<FileConfig> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let body = std::fs::read_to_string(path)?;
    serde_json::from_str(&body).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}
