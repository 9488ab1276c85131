//! Timer presets.
//!
//! A preset bundles work/break durations, an optional long break and the
//! cadence used to place long breaks. Eight presets ship built in; user
//! presets are stored as a JSON blob in the `kv` table.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::collaborators::PresetSource;
use crate::error::{Result, ValidationError};
use crate::storage::Database;

const CUSTOM_PRESETS_KEY: &str = "custom_presets";
const CURRENT_PRESET_KEY: &str = "current_preset_id";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerPreset {
    pub id: Uuid,
    pub name: String,
    pub work_duration_secs: u64,
    pub break_duration_secs: u64,
    #[serde(default)]
    pub long_break_duration_secs: Option<u64>,
    /// Long-break cadence: every n-th break is long.
    pub max_cycles: u32,
    pub icon: String,
    pub color: String,
    #[serde(default)]
    pub is_built_in: bool,
}

impl TimerPreset {
    /// A user preset with a fresh id and default styling.
    pub fn custom(
        name: impl Into<String>,
        work_duration_secs: u64,
        break_duration_secs: u64,
        long_break_duration_secs: Option<u64>,
        max_cycles: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            work_duration_secs,
            break_duration_secs,
            long_break_duration_secs,
            max_cycles,
            icon: "timer".to_string(),
            color: "blue".to_string(),
            is_built_in: false,
        }
    }

    pub fn work_minutes(&self) -> u64 {
        self.work_duration_secs / 60
    }

    pub fn break_minutes(&self) -> u64 {
        self.break_duration_secs / 60
    }

    /// e.g. `25m work / 5m break × 4`
    pub fn description(&self) -> String {
        format!(
            "{}m work / {}m break × {}",
            self.work_minutes(),
            self.break_minutes(),
            self.max_cycles
        )
    }

    fn built_in(
        id: u128,
        name: &str,
        minutes: (u64, u64, u64),
        max_cycles: u32,
        icon: &str,
        color: &str,
    ) -> Self {
        let (work, brk, long) = minutes;
        Self {
            id: Uuid::from_u128(id),
            name: name.to_string(),
            work_duration_secs: work * 60,
            break_duration_secs: brk * 60,
            long_break_duration_secs: Some(long * 60),
            max_cycles,
            icon: icon.to_string(),
            color: color.to_string(),
            is_built_in: true,
        }
    }

    pub fn classic_pomodoro() -> Self {
        Self::built_in(0xf0c1_0001, "Classic Pomodoro", (25, 5, 15), 4, "timer", "red")
    }

    pub fn deep_work() -> Self {
        Self::built_in(0xf0c1_0002, "Deep Work", (50, 10, 20), 4, "brain.head.profile", "purple")
    }

    pub fn ultra_focus() -> Self {
        Self::built_in(0xf0c1_0003, "Ultra Focus", (90, 15, 30), 3, "flame.fill", "orange")
    }

    pub fn short_sprint() -> Self {
        Self::built_in(0xf0c1_0004, "Short Sprint", (15, 3, 10), 6, "hare.fill", "green")
    }

    pub fn study_session() -> Self {
        Self::built_in(0xf0c1_0005, "Study Session", (45, 10, 20), 4, "book.fill", "blue")
    }

    pub fn long_break() -> Self {
        Self::built_in(0xf0c1_0006, "Long Break", (30, 15, 30), 3, "moon.stars.fill", "purple")
    }

    pub fn creative_flow() -> Self {
        Self::built_in(0xf0c1_0007, "Creative Flow", (60, 12, 25), 3, "paintbrush.fill", "pink")
    }

    pub fn quick_bursts() -> Self {
        Self::built_in(0xf0c1_0008, "Quick Bursts", (10, 2, 5), 8, "bolt.fill", "yellow")
    }

    pub fn built_in_presets() -> Vec<Self> {
        vec![
            Self::classic_pomodoro(),
            Self::deep_work(),
            Self::ultra_focus(),
            Self::short_sprint(),
            Self::study_session(),
            Self::long_break(),
            Self::creative_flow(),
            Self::quick_bursts(),
        ]
    }
}

/// Preset catalogue plus the current selection.
pub struct PresetManager {
    presets: Vec<TimerPreset>,
    current: TimerPreset,
    db: Option<Rc<Database>>,
}

impl PresetManager {
    /// Built-ins only, nothing persisted.
    pub fn in_memory() -> Self {
        Self {
            presets: TimerPreset::built_in_presets(),
            current: TimerPreset::deep_work(),
            db: None,
        }
    }

    /// Load custom presets and the current selection from `db`.
    pub fn load(db: Rc<Database>) -> Result<Self> {
        let custom: Vec<TimerPreset> = db
            .kv_get_json(CUSTOM_PRESETS_KEY)?
            .unwrap_or_default();
        let mut presets = TimerPreset::built_in_presets();
        for preset in custom {
            if !presets.iter().any(|p| p.id == preset.id) {
                presets.push(preset);
            }
        }

        let current = db
            .kv_get(CURRENT_PRESET_KEY)?
            .and_then(|raw| Uuid::parse_str(&raw).ok())
            .and_then(|id| presets.iter().find(|p| p.id == id).cloned())
            .unwrap_or_else(TimerPreset::deep_work);

        debug!(count = presets.len(), current = %current.name, "presets loaded");
        Ok(Self {
            presets,
            current,
            db: Some(db),
        })
    }

    pub fn presets(&self) -> &[TimerPreset] {
        &self.presets
    }

    pub fn current(&self) -> &TimerPreset {
        &self.current
    }

    pub fn built_in_presets(&self) -> Vec<&TimerPreset> {
        self.presets.iter().filter(|p| p.is_built_in).collect()
    }

    pub fn custom_presets(&self) -> Vec<&TimerPreset> {
        self.presets.iter().filter(|p| !p.is_built_in).collect()
    }

    pub fn find(&self, id: Uuid) -> Option<&TimerPreset> {
        self.presets.iter().find(|p| p.id == id)
    }

    /// Case-insensitive lookup by name.
    pub fn find_by_name(&self, name: &str) -> Option<&TimerPreset> {
        self.presets
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn add(&mut self, preset: TimerPreset) -> Result<()> {
        validate(&preset)?;
        let name = preset.name.clone();
        let mut next = self.presets.clone();
        next.push(preset);
        self.save_presets(&next)?;
        self.presets = next;
        info!(%name, "preset added");
        Ok(())
    }

    /// Replace the preset with the same id; refreshes the current selection.
    pub fn update(&mut self, preset: TimerPreset) -> Result<()> {
        validate(&preset)?;
        let index = self
            .presets
            .iter()
            .position(|p| p.id == preset.id)
            .ok_or_else(|| not_found(preset.id))?;
        let mut next = self.presets.clone();
        next[index] = preset.clone();
        self.save_presets(&next)?;
        self.presets = next;

        if self.current.id == preset.id {
            self.current = preset;
            self.save_current()?;
        }
        Ok(())
    }

    /// Remove a custom preset. Deleting the current one falls back to Deep Work.
    pub fn delete(&mut self, id: Uuid) -> Result<TimerPreset> {
        let index = self
            .presets
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| not_found(id))?;
        if self.presets[index].is_built_in {
            return Err(ValidationError::BuiltIn {
                kind: "preset",
                name: self.presets[index].name.clone(),
            }
            .into());
        }

        let mut next = self.presets.clone();
        let removed = next.remove(index);
        self.save_presets(&next)?;
        self.presets = next;
        if self.current.id == id {
            self.current = TimerPreset::deep_work();
            self.save_current()?;
        }
        info!(name = %removed.name, "preset deleted");
        Ok(removed)
    }

    pub fn set_current(&mut self, id: Uuid) -> Result<&TimerPreset> {
        let preset = self.find(id).cloned().ok_or_else(|| not_found(id))?;
        self.current = preset;
        self.save_current()?;
        Ok(&self.current)
    }

    fn save_presets(&self, presets: &[TimerPreset]) -> Result<()> {
        if let Some(db) = &self.db {
            let custom: Vec<&TimerPreset> = presets.iter().filter(|p| !p.is_built_in).collect();
            db.kv_set_json(CUSTOM_PRESETS_KEY, &custom)?;
        }
        Ok(())
    }

    fn save_current(&self) -> Result<()> {
        if let Some(db) = &self.db {
            db.kv_set(CURRENT_PRESET_KEY, &self.current.id.to_string())?;
        }
        Ok(())
    }
}

fn validate(preset: &TimerPreset) -> Result<(), ValidationError> {
    let invalid = |field: &str, message: &str| ValidationError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    };
    if preset.name.trim().is_empty() {
        return Err(invalid("name", "must not be empty"));
    }
    if preset.work_duration_secs == 0 {
        return Err(invalid("work_duration_secs", "must be positive"));
    }
    if preset.break_duration_secs == 0 {
        return Err(invalid("break_duration_secs", "must be positive"));
    }
    Ok(())
}

fn not_found(id: Uuid) -> ValidationError {
    ValidationError::NotFound {
        kind: "preset",
        id: id.to_string(),
    }
}

impl PresetSource for PresetManager {
    fn current_preset(&self) -> Option<TimerPreset> {
        Some(self.current.clone())
    }
}
