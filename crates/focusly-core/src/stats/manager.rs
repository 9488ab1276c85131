use std::collections::BTreeSet;
use std::rc::Rc;

use chrono::{Duration, Local, NaiveDate, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use super::records::{current_streak, longest_streak, DailyStats, FocusSession, StatsSummary};
use crate::collaborators::{AchievementEvaluator, SessionLog, StatisticsSink};
use crate::error::{CoreError, Result};
use crate::storage::Database;

const CSV_HEADER: [&str; 6] = [
    "Date",
    "Duration (minutes)",
    "Break Duration (minutes)",
    "Cycles",
    "Completed",
    "Task",
];

const POWER_USER_SECS: u64 = 100 * 3600;
const HOT_STREAK_DAYS: u32 = 7;

/// Session history and the aggregates derived from it.
pub struct StatisticsManager {
    /// Most recent first.
    sessions: Vec<FocusSession>,
    db: Option<Rc<Database>>,
}

impl StatisticsManager {
    pub fn in_memory() -> Self {
        Self {
            sessions: Vec::new(),
            db: None,
        }
    }

    pub fn load(db: Rc<Database>) -> Result<Self> {
        let sessions = db.list_focus_sessions()?;
        debug!(count = sessions.len(), "sessions loaded");
        Ok(Self {
            sessions,
            db: Some(db),
        })
    }

    pub fn sessions(&self) -> &[FocusSession] {
        &self.sessions
    }

    /// Record a session that just ended.
    pub fn log(&mut self, log: &SessionLog) -> Result<FocusSession> {
        let session = FocusSession {
            id: Uuid::new_v4(),
            date: Utc::now(),
            duration_secs: log.duration_secs,
            break_duration_secs: log.break_duration_secs,
            cycles_completed: log.cycles_completed,
            was_completed: log.was_completed,
            task_label: log.task_label.clone(),
        };
        self.record(session.clone())?;
        info!(
            duration_secs = session.duration_secs,
            cycles = session.cycles_completed,
            completed = session.was_completed,
            "session logged"
        );
        Ok(session)
    }

    /// Insert an existing record, keeping most-recent-first order.
    pub fn record(&mut self, session: FocusSession) -> Result<()> {
        if let Some(db) = &self.db {
            db.insert_focus_session(&session)?;
        }
        let at = self
            .sessions
            .iter()
            .position(|s| s.date <= session.date)
            .unwrap_or(self.sessions.len());
        self.sessions.insert(at, session);
        Ok(())
    }

    pub fn clear_all(&mut self) -> Result<()> {
        if let Some(db) = &self.db {
            db.clear_focus_sessions()?;
        }
        self.sessions.clear();
        info!("statistics cleared");
        Ok(())
    }

    // ── Aggregates ───────────────────────────────────────────────────

    pub fn total_focus_secs(&self) -> u64 {
        self.sessions.iter().map(|s| s.duration_secs).sum()
    }

    pub fn total_sessions(&self) -> usize {
        self.sessions.len()
    }

    fn active_days(&self) -> BTreeSet<NaiveDate> {
        self.sessions.iter().map(FocusSession::local_day).collect()
    }

    pub fn summary(&self) -> StatsSummary {
        self.summary_on(Local::now().date_naive())
    }

    pub fn summary_on(&self, today: NaiveDate) -> StatsSummary {
        let days = self.active_days();
        StatsSummary {
            total_focus_secs: self.total_focus_secs(),
            total_sessions: self.total_sessions(),
            current_streak: current_streak(&days, today),
            longest_streak: longest_streak(&days),
        }
    }

    pub fn daily_stats(&self, date: NaiveDate) -> DailyStats {
        let day: Vec<&FocusSession> = self
            .sessions
            .iter()
            .filter(|s| s.local_day() == date)
            .collect();
        DailyStats {
            date,
            total_focus_secs: day.iter().map(|s| s.duration_secs).sum(),
            sessions_completed: day.iter().filter(|s| s.was_completed).count(),
            cycles_completed: day.iter().map(|s| s.cycles_completed).sum(),
        }
    }

    /// Seven days ending `today`, oldest first.
    pub fn weekly_stats(&self, today: NaiveDate) -> Vec<DailyStats> {
        self.trailing_days(today, 7)
    }

    /// Thirty days ending `today`, oldest first.
    pub fn monthly_stats(&self, today: NaiveDate) -> Vec<DailyStats> {
        self.trailing_days(today, 30)
    }

    fn trailing_days(&self, today: NaiveDate, days: i64) -> Vec<DailyStats> {
        (0..days)
            .rev()
            .filter_map(|ago| today.checked_sub_signed(Duration::days(ago)))
            .map(|date| self.daily_stats(date))
            .collect()
    }

    // ── Export ───────────────────────────────────────────────────────

    pub fn export_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        let csv_err = |e: csv::Error| CoreError::Custom(format!("CSV export failed: {e}"));

        writer.write_record(CSV_HEADER).map_err(csv_err)?;
        for session in &self.sessions {
            let date = session.date.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string();
            writer
                .write_record([
                    date,
                    (session.duration_secs / 60).to_string(),
                    (session.break_duration_secs / 60).to_string(),
                    session.cycles_completed.to_string(),
                    if session.was_completed { "Yes" } else { "No" }.to_string(),
                    session.task_label.clone().unwrap_or_default(),
                ])
                .map_err(csv_err)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| CoreError::Custom(format!("CSV export failed: {e}")))?;
        String::from_utf8(bytes).map_err(|e| CoreError::Custom(format!("CSV export failed: {e}")))
    }

    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.sessions)?)
    }

    // ── Achievements ─────────────────────────────────────────────────

    pub fn achievements_on(&self, today: NaiveDate) -> Vec<String> {
        let summary = self.summary_on(today);
        let mut unlocked = Vec::new();
        if summary.total_sessions == 1 {
            unlocked.push("🏆 First Focus - Completed your first session!".to_string());
        }
        if summary.current_streak >= HOT_STREAK_DAYS {
            unlocked.push("🔥 Hot Streak - 7 days in a row!".to_string());
        }
        if summary.total_focus_secs >= POWER_USER_SECS {
            unlocked.push("🚀 Power User - 100 hours of focus!".to_string());
        }
        unlocked
    }
}

impl StatisticsSink for StatisticsManager {
    fn log_session(&mut self, log: &SessionLog) -> Result<()> {
        self.log(log).map(|_| ())
    }
}

impl AchievementEvaluator for StatisticsManager {
    fn check_achievements(&self) -> Vec<String> {
        self.achievements_on(Local::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};

    fn local_noon(date: NaiveDate) -> DateTime<Utc> {
        Local
            .from_local_datetime(&date.and_hms_opt(12, 0, 0).unwrap())
            .earliest()
            .unwrap()
            .with_timezone(&Utc)
    }

    fn session_on(date: NaiveDate, secs: u64, completed: bool) -> FocusSession {
        FocusSession {
            id: Uuid::new_v4(),
            date: local_noon(date),
            duration_secs: secs,
            break_duration_secs: 600,
            cycles_completed: 2,
            was_completed: completed,
            task_label: None,
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn completed_log(secs: u64) -> SessionLog {
        SessionLog {
            duration_secs: secs,
            break_duration_secs: 1200,
            cycles_completed: 2,
            was_completed: true,
            task_label: Some("Docs, part 2".into()),
        }
    }

    #[test]
    fn log_keeps_most_recent_first() {
        let mut stats = StatisticsManager::in_memory();
        stats.record(session_on(day(2024, 1, 2), 60, true)).unwrap();
        stats.record(session_on(day(2024, 1, 1), 60, true)).unwrap();
        stats.record(session_on(day(2024, 1, 3), 60, true)).unwrap();
        let days: Vec<_> = stats.sessions().iter().map(|s| s.local_day()).collect();
        assert_eq!(days, vec![day(2024, 1, 3), day(2024, 1, 2), day(2024, 1, 1)]);
    }

    #[test]
    fn summary_counts_streaks() {
        let mut stats = StatisticsManager::in_memory();
        for d in [1, 2, 3, 5, 6] {
            stats.record(session_on(day(2024, 2, d), 1500, true)).unwrap();
        }
        let summary = stats.summary_on(day(2024, 2, 6));
        assert_eq!(summary.total_sessions, 5);
        assert_eq!(summary.total_focus_secs, 7500);
        assert_eq!(summary.current_streak, 2);
        assert_eq!(summary.longest_streak, 3);
    }

    #[test]
    fn daily_stats_count_only_completed_sessions() {
        let mut stats = StatisticsManager::in_memory();
        stats.record(session_on(day(2024, 3, 1), 3000, true)).unwrap();
        stats.record(session_on(day(2024, 3, 1), 600, false)).unwrap();
        let daily = stats.daily_stats(day(2024, 3, 1));
        assert_eq!(daily.total_focus_secs, 3600);
        assert_eq!(daily.sessions_completed, 1);
        assert_eq!(daily.cycles_completed, 4);
        assert_eq!(daily.formatted_focus_time(), "1h 0m");
    }

    #[test]
    fn weekly_and_monthly_windows() {
        let mut stats = StatisticsManager::in_memory();
        stats.record(session_on(day(2024, 3, 1), 3000, true)).unwrap();
        let week = stats.weekly_stats(day(2024, 3, 3));
        assert_eq!(week.len(), 7);
        assert_eq!(week.first().unwrap().date, day(2024, 2, 26));
        assert_eq!(week.last().unwrap().date, day(2024, 3, 3));
        assert_eq!(week[4].total_focus_secs, 3000);
        assert_eq!(stats.monthly_stats(day(2024, 3, 3)).len(), 30);
    }

    #[test]
    fn achievements() {
        let mut stats = StatisticsManager::in_memory();
        let today = Local::now().date_naive();
        assert!(stats.achievements_on(today).is_empty());

        stats.log(&completed_log(1500)).unwrap();
        assert_eq!(stats.achievements_on(today).len(), 1);
        assert!(stats.achievements_on(today)[0].contains("First Focus"));

        stats.clear_all().unwrap();
        for ago in 0..7 {
            let date = today - Duration::days(ago);
            stats.record(session_on(date, 15 * 3600, true)).unwrap();
        }
        let unlocked = stats.achievements_on(today);
        assert_eq!(unlocked.len(), 2);
        assert!(unlocked[0].contains("Hot Streak"));
        assert!(unlocked[1].contains("Power User"));
    }

    #[test]
    fn csv_export_quotes_task_labels() {
        let mut stats = StatisticsManager::in_memory();
        stats.log(&completed_log(3000)).unwrap();
        let csv = stats.export_csv().unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("Date,Duration (minutes),Break Duration (minutes),Cycles,Completed,Task")
        );
        let row = lines.next().unwrap();
        assert!(row.ends_with(",50,20,2,Yes,\"Docs, part 2\""), "{row}");
    }

    #[test]
    fn json_export_round_trips() {
        let mut stats = StatisticsManager::in_memory();
        stats.log(&completed_log(60)).unwrap();
        let parsed: Vec<FocusSession> = serde_json::from_str(&stats.export_json().unwrap()).unwrap();
        assert_eq!(parsed, stats.sessions());
    }

    #[test]
    fn sessions_persist_and_clear() {
        let db = Rc::new(Database::open_memory().unwrap());
        let mut stats = StatisticsManager::load(Rc::clone(&db)).unwrap();
        stats.log_session(&completed_log(1500)).unwrap();
        assert_eq!(StatisticsManager::load(Rc::clone(&db)).unwrap().total_sessions(), 1);

        stats.clear_all().unwrap();
        assert_eq!(StatisticsManager::load(db).unwrap().total_sessions(), 0);
    }
}
