//! Calendar awareness.
//!
//! Events come from the caller (the CLI reads a JSON file); the advisor
//! answers scheduling questions relative to an injected `now`.

use chrono::{DateTime, Duration, Local, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};
use crate::notifications::Notification;

/// Focus blocks are only suggested before this local time.
const DEFAULT_DAY_END: (u32, u32) = (18, 0);
const MAX_SUGGESTIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub calendar: String,
}

impl CalendarEvent {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::InvalidTimeRange { start, end });
        }
        Ok(Self {
            id: id.into(),
            title: title.into(),
            start,
            end,
            all_day: false,
            calendar: String::new(),
        })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn is_in_progress(&self, now: DateTime<Utc>) -> bool {
        now >= self.start && now <= self.end
    }

    /// Time until start, `None` once started.
    pub fn starts_within(&self, now: DateTime<Utc>) -> Option<Duration> {
        (self.start > now).then(|| self.start - now)
    }

    /// Check if this event overlaps with a time range
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && self.end > start
    }
}

pub struct CalendarAdvisor {
    events: Vec<CalendarEvent>,
    now: DateTime<Utc>,
    day_end: NaiveTime,
}

impl CalendarAdvisor {
    pub fn new(mut events: Vec<CalendarEvent>, now: DateTime<Utc>) -> Self {
        events.sort_by_key(|e| e.start);
        let (h, m) = DEFAULT_DAY_END;
        Self {
            events,
            now,
            day_end: NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN),
        }
    }

    /// Parse a JSON array of events. Events ending before they start are rejected.
    pub fn from_json(json: &str, now: DateTime<Utc>) -> Result<Self> {
        let events: Vec<CalendarEvent> = serde_json::from_str(json)?;
        if let Some(bad) = events.iter().find(|e| e.end < e.start) {
            return Err(ValidationError::InvalidTimeRange {
                start: bad.start,
                end: bad.end,
            }
            .into());
        }
        Ok(Self::new(events, now))
    }

    pub fn with_day_end(mut self, day_end: NaiveTime) -> Self {
        self.day_end = day_end;
        self
    }

    /// Sorted by start.
    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    /// First timed event that has not started yet.
    pub fn next_meeting(&self) -> Option<&CalendarEvent> {
        self.events
            .iter()
            .find(|e| !e.all_day && e.start > self.now)
    }

    pub fn time_until_next_meeting(&self) -> Option<Duration> {
        self.next_meeting().map(|e| e.start - self.now)
    }

    /// Up to five conflict-free start times before the end of the local day.
    /// A conflict pushes the candidate forward by 30 minutes.
    pub fn suggest_focus_blocks(&self, duration: Duration) -> Vec<DateTime<Utc>> {
        let mut suggestions = Vec::new();
        let Some(end_of_day) = self.end_of_day() else {
            return suggestions;
        };
        if duration <= Duration::zero() {
            return suggestions;
        }

        let mut current = self.now;
        while current < end_of_day && suggestions.len() < MAX_SUGGESTIONS {
            let proposed_end = current + duration;
            let conflict = self
                .events
                .iter()
                .any(|e| !e.all_day && e.overlaps(current, proposed_end));
            if conflict {
                current += Duration::minutes(30);
            } else {
                suggestions.push(current);
                current = proposed_end;
            }
        }
        suggestions
    }

    /// Whether a session of `duration` (plus a 5-minute buffer) ends before the next meeting.
    pub fn can_fit_focus_session(&self, duration: Duration) -> bool {
        match self.time_until_next_meeting() {
            Some(until) => until >= duration + Duration::minutes(5),
            None => true,
        }
    }

    /// A meeting starts within five minutes or is under way.
    pub fn should_pause_focus(&self) -> bool {
        let imminent = self
            .next_meeting()
            .and_then(|e| e.starts_within(self.now))
            .is_some_and(|d| d <= Duration::minutes(5));
        imminent
            || self
                .events
                .iter()
                .any(|e| !e.all_day && e.is_in_progress(self.now))
    }

    /// End of the first current or upcoming event that is followed by at
    /// least 30 free minutes; `now` when nothing is scheduled.
    pub fn next_available_time(&self) -> DateTime<Utc> {
        for event in self.events.iter().filter(|e| e.end > self.now) {
            match self.events.iter().find(|e| e.start >= event.end) {
                Some(next) if next.start - event.end >= Duration::minutes(30) => return event.end,
                Some(_) => {}
                None => return event.end,
            }
        }
        self.now
    }

    /// Reminders for upcoming timed events, `minutes_before` each start.
    pub fn reminders(&self, minutes_before: i64) -> Vec<Notification> {
        self.events
            .iter()
            .filter(|e| !e.all_day)
            .filter_map(|e| Notification::calendar_reminder(&e.id, &e.title, e.start, minutes_before, self.now))
            .collect()
    }

    fn end_of_day(&self) -> Option<DateTime<Utc>> {
        self.now
            .with_timezone(&Local)
            .date_naive()
            .and_time(self.day_end)
            .and_local_timezone(Local)
            .earliest()
            .map(|t| t.with_timezone(&Utc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Local
            .with_ymd_and_hms(2024, 5, 6, h, m, 0)
            .earliest()
            .unwrap()
            .with_timezone(&Utc)
    }

    fn meeting(id: &str, start: DateTime<Utc>, minutes: i64) -> CalendarEvent {
        CalendarEvent::new(id, format!("Meeting {id}"), start, start + Duration::minutes(minutes)).unwrap()
    }

    #[test]
    fn rejects_inverted_range() {
        assert!(CalendarEvent::new("x", "x", at(10, 0), at(9, 0)).is_err());
        let json = format!(
            r#"[{{"id":"x","title":"x","start":"{}","end":"{}"}}]"#,
            at(10, 0).to_rfc3339(),
            at(9, 0).to_rfc3339()
        );
        assert!(CalendarAdvisor::from_json(&json, at(8, 0)).is_err());
    }

    #[test]
    fn next_meeting_skips_all_day_and_started() {
        let mut holiday = meeting("h", at(9, 30), 60);
        holiday.all_day = true;
        let started = meeting("s", at(8, 30), 60);
        let later = meeting("l", at(11, 0), 30);
        let advisor = CalendarAdvisor::new(vec![later.clone(), holiday, started], at(9, 0));
        assert_eq!(advisor.next_meeting(), Some(&later));
        assert_eq!(advisor.time_until_next_meeting(), Some(Duration::hours(2)));
    }

    #[test]
    fn focus_blocks_step_around_meetings() {
        let advisor = CalendarAdvisor::new(vec![meeting("a", at(10, 0), 60)], at(9, 0));
        let blocks = advisor.suggest_focus_blocks(Duration::minutes(60));
        // 9:00 fits; 10:00 and 10:30 collide; 11:00 onwards is free.
        assert_eq!(blocks, vec![at(9, 0), at(11, 0), at(12, 0), at(13, 0), at(14, 0)]);
    }

    #[test]
    fn no_blocks_after_day_end() {
        let advisor = CalendarAdvisor::new(vec![], at(18, 30));
        assert!(advisor.suggest_focus_blocks(Duration::minutes(25)).is_empty());
    }

    #[test]
    fn fit_needs_five_minute_buffer() {
        let advisor = CalendarAdvisor::new(vec![meeting("a", at(10, 0), 30)], at(9, 0));
        assert!(advisor.can_fit_focus_session(Duration::minutes(55)));
        assert!(!advisor.can_fit_focus_session(Duration::minutes(56)));
        assert!(CalendarAdvisor::new(vec![], at(9, 0)).can_fit_focus_session(Duration::hours(8)));
    }

    #[test]
    fn pause_for_imminent_or_running_meeting() {
        let events = vec![meeting("a", at(10, 0), 30)];
        assert!(!CalendarAdvisor::new(events.clone(), at(9, 50)).should_pause_focus());
        assert!(CalendarAdvisor::new(events.clone(), at(9, 56)).should_pause_focus());
        assert!(CalendarAdvisor::new(events, at(10, 15)).should_pause_focus());
    }

    #[test]
    fn next_available_needs_thirty_minute_gap() {
        let events = vec![
            meeting("a", at(9, 0), 60),
            meeting("b", at(10, 10), 50),
            meeting("c", at(12, 0), 30),
        ];
        let advisor = CalendarAdvisor::new(events, at(9, 15));
        assert_eq!(advisor.next_available_time(), at(11, 0));
        assert_eq!(CalendarAdvisor::new(vec![], at(9, 15)).next_available_time(), at(9, 15));
    }

    #[test]
    fn reminders_only_for_future_triggers() {
        let events = vec![meeting("soon", at(9, 10), 30), meeting("later", at(11, 0), 30)];
        let reminders = CalendarAdvisor::new(events, at(9, 0)).reminders(15);
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].identifier, "calendar_later");
        assert_eq!(reminders[0].deliver_at, Some(at(10, 45)));
    }
}
