use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durations and cycle count the timer runs with.
///
/// Owned by the settings layer, which guarantees positive durations and at
/// least one cycle before the timer ever reads them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfiguration {
    pub work_duration_secs: u64,
    pub break_duration_secs: u64,
    pub max_cycles: u32,
}

impl Default for TimerConfiguration {
    fn default() -> Self {
        Self {
            work_duration_secs: 50 * 60,
            break_duration_secs: 10 * 60,
            max_cycles: 4,
        }
    }
}

/// Phase of the focus/break cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    Idle,
    Working,
    OnBreak,
}

/// Mutable state of a running (or resumable) timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSession {
    pub is_running: bool,
    pub remaining_secs: u64,
    pub current_cycle: u32,
    pub is_break_time: bool,
    pub session_start: Option<DateTime<Utc>>,
    /// Work seconds from fully completed work phases only.
    pub total_work_secs: u64,
    pub cycles_completed_in_session: u32,
}

impl TimerSession {
    pub fn new(work_duration_secs: u64) -> Self {
        Self {
            is_running: false,
            remaining_secs: work_duration_secs,
            current_cycle: 0,
            is_break_time: false,
            session_start: None,
            total_work_secs: 0,
            cycles_completed_in_session: 0,
        }
    }

    pub fn phase(&self) -> TimerPhase {
        match (self.is_running, self.is_break_time) {
            (false, _) => TimerPhase::Idle,
            (true, false) => TimerPhase::Working,
            (true, true) => TimerPhase::OnBreak,
        }
    }

    /// Record one finished work phase.
    pub(crate) fn complete_work_phase(&mut self, work_duration_secs: u64) {
        self.total_work_secs = self.total_work_secs.saturating_add(work_duration_secs);
        self.cycles_completed_in_session += 1;
    }

    /// Forget everything tied to the current session.
    pub(crate) fn clear_bookkeeping(&mut self) {
        self.session_start = None;
        self.total_work_secs = 0;
        self.cycles_completed_in_session = 0;
    }
}
