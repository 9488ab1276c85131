use std::collections::BTreeSet;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One logged focus session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusSession {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub duration_secs: u64,
    pub break_duration_secs: u64,
    pub cycles_completed: u32,
    pub was_completed: bool,
    #[serde(default)]
    pub task_label: Option<String>,
}

impl FocusSession {
    /// Calendar day of the session in local time.
    pub fn local_day(&self) -> NaiveDate {
        self.date.with_timezone(&Local).date_naive()
    }
}

/// Aggregate for a single day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub total_focus_secs: u64,
    /// Sessions that ran to completion.
    pub sessions_completed: usize,
    pub cycles_completed: u32,
}

impl DailyStats {
    pub fn formatted_focus_time(&self) -> String {
        let hours = self.total_focus_secs / 3600;
        let minutes = (self.total_focus_secs % 3600) / 60;
        if hours > 0 {
            format!("{hours}h {minutes}m")
        } else {
            format!("{minutes}m")
        }
    }
}

/// All-time totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub total_focus_secs: u64,
    pub total_sessions: usize,
    pub current_streak: u32,
    pub longest_streak: u32,
}

/// Consecutive days with at least one session, ending `today`.
pub fn current_streak(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut check = today;
    while days.contains(&check) {
        streak += 1;
        match check.pred_opt() {
            Some(prev) => check = prev,
            None => break,
        }
    }
    streak
}

/// Longest run of consecutive days anywhere in the history.
pub fn longest_streak(days: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;
    for &day in days {
        run = match previous {
            Some(prev) if prev.succ_opt() == Some(day) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(day);
    }
    longest
}
