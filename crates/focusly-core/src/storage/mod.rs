mod config;
pub mod database;
pub mod migrations;

pub use config::{
    DisplaySettings, NotificationSettings, SettingChange, Settings, SettingsStore, SoundSettings,
    TimerSettings,
};
pub use database::Database;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/focusly[-dev]/` based on FOCUSLY_ENV.
///
/// Set FOCUSLY_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("FOCUSLY_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("focusly-dev")
    } else {
        base_dir.join("focusly")
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
