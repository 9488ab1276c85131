//! Completion sounds.
//!
//! [`SoundManager`] maps timer transitions to the configured [`SoundType`]
//! and hands them to a [`SoundPlayer`] backend. The core ships no audio
//! backend; front-ends supply one (the CLI rings the terminal bell).

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::collaborators::SoundSink;
use crate::error::Result;
use crate::storage::SoundSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundType {
    None,
    WorkComplete,
    BreakTime,
    SessionComplete,
    Gentle,
    Notification,
    Celebration,
}

impl SoundType {
    pub const ALL: [SoundType; 7] = [
        SoundType::None,
        SoundType::WorkComplete,
        SoundType::BreakTime,
        SoundType::SessionComplete,
        SoundType::Gentle,
        SoundType::Notification,
        SoundType::Celebration,
    ];

    /// Name of the system sound backing this type. `None` is silent.
    pub fn system_sound_name(self) -> Option<&'static str> {
        match self {
            SoundType::None => None,
            SoundType::WorkComplete => Some("Hero"),
            SoundType::BreakTime => Some("Glass"),
            SoundType::SessionComplete => Some("Sosumi"),
            SoundType::Gentle => Some("Tink"),
            SoundType::Notification => Some("Ping"),
            SoundType::Celebration => Some("Funk"),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SoundType::None => "None",
            SoundType::WorkComplete => "Work Complete (Hero)",
            SoundType::BreakTime => "Break Time (Glass)",
            SoundType::SessionComplete => "Session Complete (Sosumi)",
            SoundType::Gentle => "Gentle (Tink)",
            SoundType::Notification => "Notification (Ping)",
            SoundType::Celebration => "Celebration (Funk)",
        }
    }
}

/// Audio backend.
pub trait SoundPlayer {
    /// Play `sound` at `volume` (0.0 ..= 1.0). Never called with `SoundType::None`.
    fn play(&mut self, sound: SoundType, volume: f32) -> Result<()>;
}

pub struct SoundManager<P> {
    settings: SoundSettings,
    player: P,
}

impl<P: SoundPlayer> SoundManager<P> {
    pub fn new(settings: SoundSettings, player: P) -> Self {
        Self { settings, player }
    }

    pub fn settings(&self) -> &SoundSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: SoundSettings) {
        self.settings = settings;
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    /// Play regardless of the enabled flag.
    pub fn preview(&mut self, sound: SoundType) -> Result<()> {
        self.play(sound)
    }

    fn play(&mut self, sound: SoundType) -> Result<()> {
        if sound == SoundType::None {
            return Ok(());
        }
        trace!(?sound, "playing sound");
        let volume = self.settings.volume.clamp(0.0, 1.0);
        self.player.play(sound, volume)
    }

    fn play_if_enabled(&mut self, sound: SoundType) -> Result<()> {
        if !self.settings.enabled {
            return Ok(());
        }
        self.play(sound)
    }
}

impl<P: SoundPlayer> SoundSink for SoundManager<P> {
    fn play_work_complete(&mut self) -> Result<()> {
        self.play_if_enabled(self.settings.work_complete)
    }

    fn play_break_complete(&mut self) -> Result<()> {
        self.play_if_enabled(self.settings.break_complete)
    }

    fn play_session_complete(&mut self) -> Result<()> {
        self.play_if_enabled(self.settings.session_complete)
    }
}
