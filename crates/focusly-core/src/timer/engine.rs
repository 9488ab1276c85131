//! Focus/break state machine.
//!
//! The timer has no thread of its own. The caller starts it and then invokes
//! `tick()` once per elapsed second for as long as it runs; missed seconds
//! are not replayed.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start--> Working --0s--> OnBreak --0s--> Working ... --last 0s--> Idle
//!                  ^   |             |
//!                  |   +----stop-----+--stop--> Idle
//!                  +--skip_break_start_work--+
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = TimerManager::new(Collaborators::new(settings));
//! timer.start();
//! // Once per second:
//! if let Some(event) = timer.tick() { /* phase changed */ }
//! ```

use chrono::Utc;
use tracing::{debug, warn};

use super::long_break::select_break;
use super::session::{TimerConfiguration, TimerPhase, TimerSession};
use crate::collaborators::{Collaborators, SessionLog};
use crate::error::Result;
use crate::events::Event;
use crate::notifications::Notification;

/// Core timer.
pub struct TimerManager {
    session: TimerSession,
    collaborators: Collaborators,
}

impl TimerManager {
    /// Create an idle timer loaded with one work phase.
    pub fn new(collaborators: Collaborators) -> Self {
        let work = collaborators.settings.timer_configuration().work_duration_secs;
        Self {
            session: TimerSession::new(work),
            collaborators,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> TimerPhase {
        self.session.phase()
    }

    pub fn is_running(&self) -> bool {
        self.session.is_running
    }

    pub fn is_break_time(&self) -> bool {
        self.session.is_break_time
    }

    pub fn remaining_secs(&self) -> u64 {
        self.session.remaining_secs
    }

    pub fn current_cycle(&self) -> u32 {
        self.session.current_cycle
    }

    pub fn session(&self) -> &TimerSession {
        &self.session
    }

    pub fn collaborators_mut(&mut self) -> &mut Collaborators {
        &mut self.collaborators
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            phase: self.phase(),
            remaining_secs: self.session.remaining_secs,
            current_cycle: self.session.current_cycle,
            max_cycles: self.config().max_cycles,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin (or resume) working. No-op while already running.
    pub fn start(&mut self) -> Option<Event> {
        if self.session.is_running {
            return None;
        }
        if self.session.remaining_secs == 0 {
            self.session.remaining_secs = self.config().work_duration_secs;
        }
        if self.session.session_start.is_none() {
            self.session.session_start = Some(Utc::now());
        }
        self.session.is_running = true;
        debug!(
            remaining_secs = self.session.remaining_secs,
            cycle = self.session.current_cycle,
            "timer started"
        );
        Some(Event::TimerStarted {
            remaining_secs: self.session.remaining_secs,
            current_cycle: self.session.current_cycle,
            at: Utc::now(),
        })
    }

    /// Return to Idle from any phase. Always safe to call.
    ///
    /// Stopping mid-work logs an incomplete session. Stopping on a break
    /// discards the break and reloads a work phase.
    pub fn stop(&mut self) -> Option<Event> {
        let from = self.phase();
        self.session.is_running = false;

        if !self.session.is_break_time && self.session.session_start.is_some() {
            self.log_session(false);
        }
        if self.session.is_break_time {
            self.session.is_break_time = false;
            self.session.remaining_secs = self.config().work_duration_secs;
        }
        self.session.clear_bookkeeping();

        debug!(?from, "timer stopped");
        Some(Event::TimerStopped { from, at: Utc::now() })
    }

    /// Cut the current break short and go straight back to work.
    /// Ignored unless a break is in progress.
    pub fn skip_break_start_work(&mut self) -> Option<Event> {
        if !self.session.is_break_time {
            return None;
        }
        self.session.is_break_time = false;
        self.session.remaining_secs = self.config().work_duration_secs;
        if !self.session.is_running {
            self.start();
        }
        debug!(cycle = self.session.current_cycle, "break skipped");
        Some(Event::BreakSkipped {
            cycle: self.session.current_cycle,
            at: Utc::now(),
        })
    }

    /// Advance by one second. Returns an event when the phase changes.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.session.is_running {
            return None;
        }
        if self.session.remaining_secs > 0 {
            self.session.remaining_secs -= 1;
            return None;
        }

        let config = self.config();
        if self.session.is_break_time {
            Some(self.finish_break(&config))
        } else if self.session.current_cycle < config.max_cycles {
            Some(self.finish_work_phase(&config))
        } else {
            Some(self.finish_session(&config))
        }
    }

    // ── Transitions ──────────────────────────────────────────────────

    fn finish_break(&mut self, config: &TimerConfiguration) -> Event {
        self.session.is_break_time = false;
        self.session.remaining_secs = config.work_duration_secs;

        if self.prefs().break_notifications {
            self.notify(&Notification::break_complete());
        }
        let played = self.collaborators.sound.play_break_complete();
        report("sound", played);

        debug!(cycle = self.session.current_cycle, "break finished");
        Event::BreakEnded {
            cycle: self.session.current_cycle,
            at: Utc::now(),
        }
    }

    fn finish_work_phase(&mut self, config: &TimerConfiguration) -> Event {
        self.session.complete_work_phase(config.work_duration_secs);
        self.session.current_cycle += 1;

        let preset = self.collaborators.presets.current_preset();
        let selection = select_break(self.session.current_cycle, config, preset.as_ref());
        self.session.is_break_time = true;
        self.session.remaining_secs = selection.duration_secs;

        if self.prefs().break_notifications {
            self.notify(&Notification::break_time(selection.duration_secs));
        }
        let played = self.collaborators.sound.play_work_complete();
        report("sound", played);

        debug!(
            cycle = self.session.current_cycle,
            break_secs = selection.duration_secs,
            long_break = selection.long_break,
            "work phase finished"
        );
        Event::BreakStarted {
            cycle: self.session.current_cycle,
            duration_secs: selection.duration_secs,
            long_break: selection.long_break,
            at: Utc::now(),
        }
    }

    fn finish_session(&mut self, config: &TimerConfiguration) -> Event {
        self.session.complete_work_phase(config.work_duration_secs);
        let work_secs = self.session.total_work_secs;
        let cycles = self.session.cycles_completed_in_session;

        self.session.is_running = false;
        self.session.is_break_time = false;
        self.session.current_cycle = 0;
        self.session.remaining_secs = config.work_duration_secs;

        let prefs = self.prefs();
        if prefs.session_complete_notifications {
            self.notify(&Notification::session_complete());
        }
        let played = self.collaborators.sound.play_session_complete();
        report("sound", played);

        self.log_session(true);
        let prompted = self.collaborators.journal.prompt_for_note(work_secs, cycles);
        report("journal", prompted);

        let achievements = self.collaborators.achievements.check_achievements();
        if prefs.achievement_notifications {
            for achievement in &achievements {
                self.notify(&Notification::achievement(achievement));
            }
        }

        self.session.clear_bookkeeping();
        debug!(cycles, work_secs, "session completed");
        Event::SessionCompleted {
            cycles_completed: cycles,
            work_secs,
            at: Utc::now(),
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn config(&self) -> TimerConfiguration {
        self.collaborators.settings.timer_configuration()
    }

    fn prefs(&self) -> crate::notifications::NotificationPreferences {
        self.collaborators.settings.notification_preferences()
    }

    fn notify(&mut self, notification: &Notification) {
        let delivered = self.collaborators.notifications.deliver(notification);
        report("notifications", delivered);
    }

    fn log_session(&mut self, was_completed: bool) {
        if self.session.session_start.is_none() {
            return;
        }
        let break_secs = self.config().break_duration_secs;
        let log = SessionLog {
            duration_secs: self.session.total_work_secs,
            break_duration_secs: break_secs
                .saturating_mul(u64::from(self.session.cycles_completed_in_session)),
            cycles_completed: self.session.cycles_completed_in_session,
            was_completed,
            task_label: self.collaborators.task_label.clone(),
        };
        let logged = self.collaborators.statistics.log_session(&log);
        report("statistics", logged);
    }
}

/// Collaborator failures never reach the state machine.
fn report(collaborator: &str, result: Result<()>) {
    if let Err(e) = result {
        warn!(collaborator, error = %e, "side effect failed");
    }
}
