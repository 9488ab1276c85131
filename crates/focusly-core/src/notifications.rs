//! User-facing alerts.
//!
//! Builders for every alert the app raises plus the preference flags the
//! timer checks before handing timer alerts to a [`NotificationSink`].
//! Delivery itself (desktop notification, terminal line, ...) is up to the
//! sink.
//!
//! [`NotificationSink`]: crate::collaborators::NotificationSink

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stats::DailyStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    TaskDue,
    TaskOverdue,
    CalendarReminder,
    DailySummary,
    WeeklySummary,
    Achievement,
    BreakTime,
    BreakComplete,
    SessionComplete,
}

/// Flags the timer evaluates before notifying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub break_notifications: bool,
    pub session_complete_notifications: bool,
    pub achievement_notifications: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            break_notifications: true,
            session_complete_notifications: true,
            achievement_notifications: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub identifier: String,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    /// When to deliver; `None` means immediately.
    #[serde(default)]
    pub deliver_at: Option<DateTime<Utc>>,
}

impl Notification {
    fn immediate(identifier: impl Into<String>, kind: NotificationKind, title: &str, body: String) -> Self {
        Self {
            identifier: identifier.into(),
            kind,
            title: title.to_string(),
            body,
            deliver_at: None,
        }
    }

    pub fn break_time(break_duration_secs: u64) -> Self {
        Self::immediate(
            "breakTime",
            NotificationKind::BreakTime,
            "Break Time!",
            format!("Take a {} minute break.", break_duration_secs / 60),
        )
    }

    pub fn break_complete() -> Self {
        Self::immediate(
            "breakComplete",
            NotificationKind::BreakComplete,
            "Break Complete",
            "Time to get back to work!".to_string(),
        )
    }

    pub fn session_complete() -> Self {
        Self::immediate(
            "sessionComplete",
            NotificationKind::SessionComplete,
            "Session Complete!",
            "Great job! You've completed all cycles.".to_string(),
        )
    }

    pub fn achievement(description: &str) -> Self {
        Self::immediate(
            format!("achievement_{}", uuid::Uuid::new_v4()),
            NotificationKind::Achievement,
            "Achievement Unlocked!",
            description.to_string(),
        )
    }

    /// Reminder thirty minutes before a task is due. `None` when that moment
    /// has already passed.
    pub fn task_due(task_id: &str, title: &str, due: DateTime<Utc>, now: DateTime<Utc>) -> Option<Self> {
        let trigger = due - chrono::Duration::minutes(30);
        if due <= now || trigger <= now {
            return None;
        }
        Some(Self {
            identifier: format!("task_{task_id}"),
            kind: NotificationKind::TaskDue,
            title: "Task Due Soon".to_string(),
            body: format!("📋 {title}"),
            deliver_at: Some(trigger),
        })
    }

    pub fn overdue_tasks(overdue_count: usize) -> Option<Self> {
        if overdue_count == 0 {
            return None;
        }
        let plural = if overdue_count > 1 { "s" } else { "" };
        Some(Self::immediate(
            "overdue_tasks_daily",
            NotificationKind::TaskOverdue,
            "Overdue Tasks",
            format!("⚠️ You have {overdue_count} overdue task{plural}"),
        ))
    }

    pub fn calendar_reminder(
        event_id: &str,
        title: &str,
        start: DateTime<Utc>,
        minutes_before: i64,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let trigger = start - chrono::Duration::minutes(minutes_before);
        if start <= now || trigger <= now {
            return None;
        }
        Some(Self {
            identifier: format!("calendar_{event_id}"),
            kind: NotificationKind::CalendarReminder,
            title: "Upcoming Meeting".to_string(),
            body: format!("📅 {title} in {minutes_before} minutes"),
            deliver_at: Some(trigger),
        })
    }

    pub fn daily_summary(stats: &DailyStats) -> Self {
        let body = if stats.total_focus_secs > 0 {
            format!(
                "🎯 Today: {} of focus time across {} sessions",
                stats.formatted_focus_time(),
                stats.sessions_completed
            )
        } else {
            "💡 No focus sessions today. Try one tomorrow!".to_string()
        };
        Self::immediate("daily_summary", NotificationKind::DailySummary, "Daily Summary", body)
    }

    pub fn weekly_summary(total_hours: f64, sessions: usize, streak: u32) -> Self {
        Self::immediate(
            "weekly_summary",
            NotificationKind::WeeklySummary,
            "Weekly Progress",
            format!(
                "📊 This week:\n• {total_hours:.1} hours focused\n• {sessions} sessions completed\n• {streak} day streak 🔥"
            ),
        )
    }
}
