//! Tasks worked on during focus sessions.
//!
//! A task carries a pomodoro estimate; the CLI attaches the current task to
//! logged sessions and bumps its pomodoro count after each work block.

mod manager;

pub use manager::{TaskFilter, TaskManager, TaskSort};

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ValidationError;

/// Task priority. Stored as its level (0..=3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Priority {
    Low = 0,
    Medium = 1,
    High = 2,
    Urgent = 3,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl Priority {
    /// Out-of-range levels clamp to the nearest priority.
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => Priority::Low,
            1 => Priority::Medium,
            2 => Priority::High,
            _ => Priority::Urgent,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Priority::Low => "gray",
            Priority::Medium => "blue",
            Priority::High => "orange",
            Priority::Urgent => "red",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Urgent => "Urgent",
        })
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" | "0" => Ok(Priority::Low),
            "medium" | "1" => Ok(Priority::Medium),
            "high" | "2" => Ok(Priority::High),
            "urgent" | "3" => Ok(Priority::Urgent),
            other => Err(ValidationError::InvalidValue {
                field: "priority".to_string(),
                message: format!("unknown priority '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub priority: Priority,
    pub estimated_pomodoros: u32,
    #[serde(default)]
    pub completed_pomodoros: u32,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Task {
    /// Medium priority, one pomodoro, created now.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            is_completed: false,
            priority: Priority::default(),
            estimated_pomodoros: 1,
            completed_pomodoros: 0,
            due_date: None,
            notes: None,
            created_at: Utc::now(),
            completed_at: None,
            tags: Vec::new(),
        }
    }

    /// Completed / estimated, 0.0 when nothing is estimated.
    pub fn progress(&self) -> f64 {
        if self.estimated_pomodoros == 0 {
            return 0.0;
        }
        f64::from(self.completed_pomodoros) / f64::from(self.estimated_pomodoros)
    }

    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        match self.due_date {
            Some(due) if !self.is_completed => due < now,
            _ => false,
        }
    }

    /// Due on `day` in local time.
    pub fn is_due_on(&self, day: NaiveDate) -> bool {
        self.due_date
            .is_some_and(|due| due.with_timezone(&Local).date_naive() == day)
    }

    /// Open and due within the next three days.
    pub fn is_due_soon_at(&self, now: DateTime<Utc>) -> bool {
        match self.due_date {
            Some(due) if !self.is_completed => (0..=3).contains(&(due - now).num_days()),
            _ => false,
        }
    }

    pub(crate) fn is_in_progress(&self) -> bool {
        self.completed_pomodoros > 0 && self.completed_pomodoros < self.estimated_pomodoros
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn progress_handles_zero_estimate() {
        let mut task = Task::new("Plan");
        task.estimated_pomodoros = 0;
        assert_eq!(task.progress(), 0.0);
        task.estimated_pomodoros = 4;
        task.completed_pomodoros = 1;
        assert!((task.progress() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn overdue_ignores_completed_tasks() {
        let now = Utc::now();
        let mut task = Task::new("Ship");
        task.due_date = Some(now - Duration::hours(1));
        assert!(task.is_overdue_at(now));
        task.is_completed = true;
        assert!(!task.is_overdue_at(now));
    }

    #[test]
    fn due_soon_window() {
        let now = Utc::now();
        let mut task = Task::new("Review");
        task.due_date = Some(now + Duration::days(2));
        assert!(task.is_due_soon_at(now));
        task.due_date = Some(now + Duration::days(5));
        assert!(!task.is_due_soon_at(now));
    }

    #[test]
    fn priority_parses_names_and_levels() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("0".parse::<Priority>().unwrap(), Priority::Low);
        assert!("whenever".parse::<Priority>().is_err());
        assert_eq!(Priority::from_level(9), Priority::Urgent);
        assert_eq!(Priority::Urgent as u8, 3);
    }
}
