//! Seams between the timer and everything it notifies.
//!
//! The timer owns a [`Collaborators`] bundle. Every slot defaults to
//! [`NoopSink`], so a timer with nothing wired still runs every transition.
//! Sinks are listeners: they receive values and never reach back into the
//! timer's state. A sink that returns an error is logged and skipped.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{CoreError, Result};
use crate::notifications::{Notification, NotificationPreferences};
use crate::presets::TimerPreset;
use crate::timer::TimerConfiguration;

/// Payload of a statistics log call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLog {
    pub duration_secs: u64,
    pub break_duration_secs: u64,
    pub cycles_completed: u32,
    pub was_completed: bool,
    pub task_label: Option<String>,
}

/// Live view of the user's settings. Read on every tick.
pub trait SettingsSource {
    fn timer_configuration(&self) -> TimerConfiguration;

    fn notification_preferences(&self) -> NotificationPreferences {
        NotificationPreferences::default()
    }
}

/// Supplies the preset whose cadence decides long breaks.
pub trait PresetSource {
    fn current_preset(&self) -> Option<TimerPreset> {
        None
    }
}

pub trait StatisticsSink {
    fn log_session(&mut self, _log: &SessionLog) -> Result<()> {
        Ok(()) // default no-op
    }
}

pub trait SoundSink {
    fn play_work_complete(&mut self) -> Result<()> {
        Ok(())
    }

    fn play_break_complete(&mut self) -> Result<()> {
        Ok(())
    }

    fn play_session_complete(&mut self) -> Result<()> {
        Ok(())
    }
}

pub trait NotificationSink {
    fn deliver(&mut self, _notification: &Notification) -> Result<()> {
        Ok(())
    }
}

pub trait JournalSink {
    fn prompt_for_note(&mut self, _duration_secs: u64, _cycles: u32) -> Result<()> {
        Ok(())
    }
}

/// Turns freshly logged statistics into achievement descriptions.
pub trait AchievementEvaluator {
    fn check_achievements(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Stand-in for any collaborator that is not wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl PresetSource for NoopSink {}
impl StatisticsSink for NoopSink {}
impl SoundSink for NoopSink {}
impl NotificationSink for NoopSink {}
impl JournalSink for NoopSink {}
impl AchievementEvaluator for NoopSink {}

/// Everything the timer talks to.
pub struct Collaborators {
    pub settings: Box<dyn SettingsSource>,
    pub presets: Box<dyn PresetSource>,
    pub statistics: Box<dyn StatisticsSink>,
    pub sound: Box<dyn SoundSink>,
    pub notifications: Box<dyn NotificationSink>,
    pub journal: Box<dyn JournalSink>,
    pub achievements: Box<dyn AchievementEvaluator>,
    /// Label attached to logged sessions (e.g. the current task title).
    pub task_label: Option<String>,
}

impl Collaborators {
    /// Only settings are mandatory; every sink starts as a no-op.
    pub fn new(settings: impl SettingsSource + 'static) -> Self {
        Self {
            settings: Box::new(settings),
            presets: Box::new(NoopSink),
            statistics: Box::new(NoopSink),
            sound: Box::new(NoopSink),
            notifications: Box::new(NoopSink),
            journal: Box::new(NoopSink),
            achievements: Box::new(NoopSink),
            task_label: None,
        }
    }

    pub fn with_presets(mut self, presets: impl PresetSource + 'static) -> Self {
        self.presets = Box::new(presets);
        self
    }

    pub fn with_statistics(mut self, statistics: impl StatisticsSink + 'static) -> Self {
        self.statistics = Box::new(statistics);
        self
    }

    pub fn with_sound(mut self, sound: impl SoundSink + 'static) -> Self {
        self.sound = Box::new(sound);
        self
    }

    pub fn with_notifications(mut self, notifications: impl NotificationSink + 'static) -> Self {
        self.notifications = Box::new(notifications);
        self
    }

    pub fn with_journal(mut self, journal: impl JournalSink + 'static) -> Self {
        self.journal = Box::new(journal);
        self
    }

    pub fn with_achievements(mut self, achievements: impl AchievementEvaluator + 'static) -> Self {
        self.achievements = Box::new(achievements);
        self
    }

    pub fn with_task_label(mut self, label: Option<String>) -> Self {
        self.task_label = label;
        self
    }
}

impl SettingsSource for TimerConfiguration {
    fn timer_configuration(&self) -> TimerConfiguration {
        *self
    }
}

// Shared handles let the caller keep using a collaborator (e.g. query stats)
// while the timer holds it. Everything runs on one thread.

impl<T: SettingsSource> SettingsSource for Rc<RefCell<T>> {
    fn timer_configuration(&self) -> TimerConfiguration {
        self.borrow().timer_configuration()
    }

    fn notification_preferences(&self) -> NotificationPreferences {
        self.borrow().notification_preferences()
    }
}

impl<T: PresetSource> PresetSource for Rc<RefCell<T>> {
    fn current_preset(&self) -> Option<TimerPreset> {
        self.try_borrow().ok()?.current_preset()
    }
}

fn busy(name: &'static str) -> CoreError {
    CoreError::collaborator(name, "already borrowed")
}

impl<T: StatisticsSink> StatisticsSink for Rc<RefCell<T>> {
    fn log_session(&mut self, log: &SessionLog) -> Result<()> {
        self.try_borrow_mut()
            .map_err(|_| busy("statistics"))?
            .log_session(log)
    }
}

impl<T: SoundSink> SoundSink for Rc<RefCell<T>> {
    fn play_work_complete(&mut self) -> Result<()> {
        self.try_borrow_mut().map_err(|_| busy("sound"))?.play_work_complete()
    }

    fn play_break_complete(&mut self) -> Result<()> {
        self.try_borrow_mut().map_err(|_| busy("sound"))?.play_break_complete()
    }

    fn play_session_complete(&mut self) -> Result<()> {
        self.try_borrow_mut()
            .map_err(|_| busy("sound"))?
            .play_session_complete()
    }
}

impl<T: NotificationSink> NotificationSink for Rc<RefCell<T>> {
    fn deliver(&mut self, notification: &Notification) -> Result<()> {
        self.try_borrow_mut()
            .map_err(|_| busy("notifications"))?
            .deliver(notification)
    }
}

impl<T: JournalSink> JournalSink for Rc<RefCell<T>> {
    fn prompt_for_note(&mut self, duration_secs: u64, cycles: u32) -> Result<()> {
        self.try_borrow_mut()
            .map_err(|_| busy("journal"))?
            .prompt_for_note(duration_secs, cycles)
    }
}

impl<T: AchievementEvaluator> AchievementEvaluator for Rc<RefCell<T>> {
    fn check_achievements(&self) -> Vec<String> {
        self.try_borrow()
            .map(|inner| inner.check_achievements())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_sinks_accept_everything() {
        let mut sink = NoopSink;
        let log = SessionLog {
            duration_secs: 0,
            break_duration_secs: 0,
            cycles_completed: 0,
            was_completed: false,
            task_label: None,
        };
        assert!(sink.log_session(&log).is_ok());
        assert!(sink.play_session_complete().is_ok());
        assert!(sink.prompt_for_note(0, 0).is_ok());
        assert!(sink.check_achievements().is_empty());
        assert!(sink.current_preset().is_none());
    }

    #[test]
    fn borrowed_shared_sink_reports_error_instead_of_panicking() {
        #[derive(Default)]
        struct Counter(u32);
        impl StatisticsSink for Counter {
            fn log_session(&mut self, _log: &SessionLog) -> Result<()> {
                self.0 += 1;
                Ok(())
            }
        }

        let shared = Rc::new(RefCell::new(Counter::default()));
        let mut handle = Rc::clone(&shared);
        let log = SessionLog {
            duration_secs: 60,
            break_duration_secs: 0,
            cycles_completed: 1,
            was_completed: true,
            task_label: None,
        };

        let guard = shared.borrow();
        assert!(handle.log_session(&log).is_err());
        drop(guard);

        handle.log_session(&log).unwrap();
        assert_eq!(shared.borrow().0, 1);
    }
}
