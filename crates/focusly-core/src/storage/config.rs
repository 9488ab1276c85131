//! TOML-based application settings.
//!
//! Stores user preferences including:
//! - Timer durations and cycle count
//! - Notification toggles
//! - Sound choices and volume
//! - Display toggles used by front-ends
//!
//! Settings are stored at `~/.config/focusly/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::data_dir;
use crate::collaborators::SettingsSource;
use crate::error::ConfigError;
use crate::notifications::NotificationPreferences;
use crate::presets::TimerPreset;
use crate::sound::SoundType;
use crate::timer::TimerConfiguration;

/// Timer durations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettings {
    #[serde(default = "default_work_duration")]
    pub work_duration_secs: u64,
    #[serde(default = "default_break_duration")]
    pub break_duration_secs: u64,
    #[serde(default = "default_max_cycles")]
    pub max_cycles: u32,
}

/// Notification toggles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default = "default_true")]
    pub break_notifications: bool,
    #[serde(default = "default_true")]
    pub session_complete_notifications: bool,
    #[serde(default = "default_true")]
    pub achievement_notifications: bool,
    #[serde(default = "default_true")]
    pub task_due_notifications: bool,
    #[serde(default = "default_true")]
    pub task_overdue_notifications: bool,
    #[serde(default = "default_true")]
    pub calendar_reminders: bool,
    #[serde(default = "default_reminder_minutes")]
    pub calendar_reminder_minutes: u32,
    #[serde(default = "default_true")]
    pub daily_summary_notifications: bool,
    #[serde(default = "default_true")]
    pub weekly_summary_notifications: bool,
}

/// Sound configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// 0.0 ..= 1.0
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default = "default_work_sound")]
    pub work_complete: SoundType,
    #[serde(default = "default_break_sound")]
    pub break_complete: SoundType,
    #[serde(default = "default_session_sound")]
    pub session_complete: SoundType,
}

/// Front-end display toggles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySettings {
    #[serde(default = "default_true")]
    pub show_time_display: bool,
    #[serde(default = "default_true")]
    pub show_break_overlay: bool,
    #[serde(default = "default_true")]
    pub show_break_activities: bool,
}

/// Application settings.
///
/// Serialized to/from TOML at `~/.config/focusly/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub timer: TimerSettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub sound: SoundSettings,
    #[serde(default)]
    pub display: DisplaySettings,
}

// Default functions
fn default_work_duration() -> u64 {
    50 * 60
}
fn default_break_duration() -> u64 {
    10 * 60
}
fn default_max_cycles() -> u32 {
    4
}
fn default_true() -> bool {
    true
}
fn default_reminder_minutes() -> u32 {
    15
}
fn default_volume() -> f32 {
    0.5
}
fn default_work_sound() -> SoundType {
    SoundType::WorkComplete
}
fn default_break_sound() -> SoundType {
    SoundType::BreakTime
}
fn default_session_sound() -> SoundType {
    SoundType::Celebration
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            work_duration_secs: default_work_duration(),
            break_duration_secs: default_break_duration(),
            max_cycles: default_max_cycles(),
        }
    }
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            break_notifications: true,
            session_complete_notifications: true,
            achievement_notifications: true,
            task_due_notifications: true,
            task_overdue_notifications: true,
            calendar_reminders: true,
            calendar_reminder_minutes: default_reminder_minutes(),
            daily_summary_notifications: true,
            weekly_summary_notifications: true,
        }
    }
}

impl Default for SoundSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: default_volume(),
            work_complete: default_work_sound(),
            break_complete: default_break_sound(),
            session_complete: default_session_sound(),
        }
    }
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_time_display: true,
            show_break_overlay: true,
            show_break_activities: true,
        }
    }
}

impl Settings {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => {
                    if let Ok(n) = value.parse::<u64>() {
                        serde_json::Value::Number(n.into())
                    } else if let Ok(n) = value.parse::<f64>() {
                        serde_json::Number::from_f64(n)
                            .map(serde_json::Value::Number)
                            .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                    } else {
                        return Err(invalid(format!("cannot parse '{value}' as number")));
                    }
                }
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// Default location of the settings file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults when absent.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed,
    /// or if the default settings cannot be written to disk.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let settings = Self::default();
                settings.save_to(path)?;
                info!(path = %path.display(), "wrote default settings");
                Ok(settings)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Get a setting as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a setting by key, type-checked against the current value.
    /// Does not persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Every leaf key with its current value, sorted by key.
    pub fn entries(&self) -> Vec<(String, String)> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (k, v) in map {
                        let key = if prefix.is_empty() {
                            k.clone()
                        } else {
                            format!("{prefix}.{k}")
                        };
                        walk(&key, v, out);
                    }
                }
                serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
                other => out.push((prefix.to_string(), other.to_string())),
            }
        }

        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut out);
        }
        out
    }

    /// Durations the timer runs with. Zero values fall back to defaults.
    pub fn timer_configuration(&self) -> TimerConfiguration {
        let defaults = TimerConfiguration::default();
        TimerConfiguration {
            work_duration_secs: non_zero(self.timer.work_duration_secs)
                .unwrap_or(defaults.work_duration_secs),
            break_duration_secs: non_zero(self.timer.break_duration_secs)
                .unwrap_or(defaults.break_duration_secs),
            max_cycles: if self.timer.max_cycles == 0 {
                defaults.max_cycles
            } else {
                self.timer.max_cycles
            },
        }
    }

    pub fn notification_preferences(&self) -> NotificationPreferences {
        NotificationPreferences {
            break_notifications: self.notifications.break_notifications,
            session_complete_notifications: self.notifications.session_complete_notifications,
            achievement_notifications: self.notifications.achievement_notifications,
        }
    }

    /// Copy a preset's work/break/cycles into the timer section.
    pub fn apply_preset(&mut self, preset: &TimerPreset) {
        self.timer.work_duration_secs = preset.work_duration_secs;
        self.timer.break_duration_secs = preset.break_duration_secs;
        self.timer.max_cycles = preset.max_cycles;
    }
}

fn non_zero(secs: u64) -> Option<u64> {
    (secs > 0).then_some(secs)
}

impl SettingsSource for Settings {
    fn timer_configuration(&self) -> TimerConfiguration {
        Settings::timer_configuration(self)
    }

    fn notification_preferences(&self) -> NotificationPreferences {
        Settings::notification_preferences(self)
    }
}

/// One observed change, published to [`SettingsStore`] subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingChange {
    pub key: String,
    pub old: Option<String>,
    pub new: Option<String>,
}

type Listener = Box<dyn FnMut(&SettingChange)>;

/// Settings plus persistence and change subscribers.
pub struct SettingsStore {
    settings: Settings,
    path: Option<PathBuf>,
    listeners: Vec<Listener>,
}

impl SettingsStore {
    /// Load from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::open(Settings::path()?)
    }

    /// Load from (or create) `path`; every change is written back.
    pub fn open(path: PathBuf) -> Result<Self, ConfigError> {
        let settings = Settings::load_from(&path)?;
        Ok(Self {
            settings,
            path: Some(path),
            listeners: Vec::new(),
        })
    }

    /// Store that never touches disk.
    pub fn in_memory(settings: Settings) -> Self {
        Self {
            settings,
            path: None,
            listeners: Vec::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&SettingChange) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Set one key, persist, and publish the change when the value moved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<Option<SettingChange>, ConfigError> {
        let before = self.settings.clone();
        self.settings.set(key, value)?;
        let changes = self.commit(&before)?;
        Ok(changes.into_iter().next())
    }

    /// Apply a preset's timer values; returns every key that changed.
    pub fn apply_preset(&mut self, preset: &TimerPreset) -> Result<Vec<SettingChange>, ConfigError> {
        let before = self.settings.clone();
        self.settings.apply_preset(preset);
        debug!(preset = %preset.name, "applied preset");
        self.commit(&before)
    }

    /// Restore defaults.
    pub fn reset(&mut self) -> Result<Vec<SettingChange>, ConfigError> {
        let before = std::mem::take(&mut self.settings);
        self.commit(&before)
    }

    fn commit(&mut self, before: &Settings) -> Result<Vec<SettingChange>, ConfigError> {
        if let Some(path) = &self.path {
            self.settings.save_to(path)?;
        }

        let old_entries = before.entries();
        let changes: Vec<SettingChange> = self
            .settings
            .entries()
            .into_iter()
            .zip(old_entries)
            .filter(|((_, new), (_, old))| new != old)
            .map(|((key, new), (_, old))| SettingChange {
                key,
                old: Some(old),
                new: Some(new),
            })
            .collect();

        for change in &changes {
            debug!(key = %change.key, old = ?change.old, new = ?change.new, "setting changed");
            for listener in &mut self.listeners {
                listener(change);
            }
        }
        Ok(changes)
    }
}

impl SettingsSource for SettingsStore {
    fn timer_configuration(&self) -> TimerConfiguration {
        self.settings.timer_configuration()
    }

    fn notification_preferences(&self) -> NotificationPreferences {
        self.settings.notification_preferences()
    }
}
