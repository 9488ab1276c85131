//! # Focusly Core Library
//!
//! This library provides the core logic for the Focusly focus timer: a
//! focus/break state machine plus the managers it reports to. Front-ends
//! (the `focusly` CLI today) own the tick source and the wiring.
//!
//! ## Architecture
//!
//! - **Timer**: A caller-ticked state machine. `tick()` is invoked once per
//!   second; transitions fire side effects through injected collaborators.
//! - **Collaborators**: Narrow traits (settings, presets, statistics, sound,
//!   notifications, journal, achievements) with no-op defaults.
//! - **Storage**: SQLite-based session, journal and task storage and
//!   TOML-based settings.
//! - **Managers**: Presets, statistics, journal, tasks, break activities and
//!   calendar advice, each usable on its own.
//!
//! ## Key Components
//!
//! - [`TimerManager`]: Core timer state machine
//! - [`Collaborators`]: Everything the timer talks to
//! - [`Database`]: Persistence
//! - [`SettingsStore`]: Settings with change subscribers

pub mod activities;
pub mod calendar;
pub mod collaborators;
pub mod error;
pub mod events;
pub mod journal;
pub mod notifications;
pub mod presets;
pub mod sound;
pub mod stats;
pub mod storage;
pub mod task;
pub mod timer;

pub use activities::{ActivityCategory, BreakActivity, BreakActivityManager};
pub use calendar::{CalendarAdvisor, CalendarEvent};
pub use collaborators::{
    AchievementEvaluator, Collaborators, JournalSink, NoopSink, NotificationSink, PresetSource,
    SessionLog, SettingsSource, SoundSink, StatisticsSink,
};
pub use error::{ConfigError, CoreError, DatabaseError, Result, ValidationError};
pub use events::Event;
pub use journal::{Mood, PendingSession, SessionJournal, SessionNote};
pub use notifications::{Notification, NotificationKind, NotificationPreferences};
pub use presets::{PresetManager, TimerPreset};
pub use sound::{SoundManager, SoundPlayer, SoundType};
pub use stats::{DailyStats, FocusSession, StatisticsManager, StatsSummary};
pub use storage::{Database, SettingChange, Settings, SettingsStore};
pub use task::{Priority, Task, TaskFilter, TaskManager, TaskSort};
pub use timer::{select_break, BreakSelection, TimerConfiguration, TimerManager, TimerPhase, TimerSession};
