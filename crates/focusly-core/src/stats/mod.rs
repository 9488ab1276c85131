//! Focus session statistics.
//!
//! Logged sessions, per-day aggregates, streaks, exports and the
//! achievements unlocked after a full session.

mod manager;
mod records;

pub use manager::StatisticsManager;
pub use records::{current_streak, longest_streak, DailyStats, FocusSession, StatsSummary};
