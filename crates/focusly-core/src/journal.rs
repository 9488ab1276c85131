//! Session journal.
//!
//! After a full session the timer prompts the journal; the pending session
//! waits until the user saves a note for it or skips.

use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::collaborators::JournalSink;
use crate::error::{Result, ValidationError};
use crate::storage::Database;

/// How the session felt. Stored as its emoji.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Mood {
    Great,
    Good,
    Okay,
    Tired,
    Frustrated,
}

impl Mood {
    pub const ALL: [Mood; 5] = [Mood::Great, Mood::Good, Mood::Okay, Mood::Tired, Mood::Frustrated];

    pub fn emoji(self) -> &'static str {
        match self {
            Mood::Great => "😊",
            Mood::Good => "🙂",
            Mood::Okay => "😐",
            Mood::Tired => "😴",
            Mood::Frustrated => "😤",
        }
    }

    fn score(self) -> u32 {
        match self {
            Mood::Great => 5,
            Mood::Good => 4,
            Mood::Okay => 3,
            Mood::Tired => 2,
            Mood::Frustrated => 1,
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            Mood::Great => "Great",
            Mood::Good => "Good",
            Mood::Okay => "Okay",
            Mood::Tired => "Tired",
            Mood::Frustrated => "Frustrated",
        };
        f.write_str(word)
    }
}

/// Accepts the emoji or the word ("ok" works too).
impl FromStr for Mood {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if let Some(mood) = Mood::ALL.into_iter().find(|m| m.emoji() == raw) {
            return Ok(mood);
        }
        match raw.trim().to_lowercase().as_str() {
            "great" => Ok(Mood::Great),
            "good" => Ok(Mood::Good),
            "ok" | "okay" => Ok(Mood::Okay),
            "tired" => Ok(Mood::Tired),
            "frustrated" => Ok(Mood::Frustrated),
            _ => Err(ValidationError::InvalidValue {
                field: "mood".to_string(),
                message: format!("unrecognized mood: {raw}"),
            }),
        }
    }
}

impl TryFrom<String> for Mood {
    type Error = ValidationError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<Mood> for String {
    fn from(mood: Mood) -> Self {
        mood.emoji().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionNote {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub session_duration_secs: u64,
    pub cycles_completed: u32,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub mood: Option<Mood>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub task_completed: Option<String>,
}

impl SessionNote {
    /// Empty note dated now.
    pub fn new(session_duration_secs: u64, cycles_completed: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            date: Utc::now(),
            session_duration_secs,
            cycles_completed,
            note: String::new(),
            mood: None,
            tags: Vec::new(),
            task_completed: None,
        }
    }
}

/// A finished session waiting for its note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingSession {
    pub duration_secs: u64,
    pub cycles: u32,
}

pub struct SessionJournal {
    notes: Vec<SessionNote>,
    pending: Option<PendingSession>,
    db: Option<Rc<Database>>,
}

impl SessionJournal {
    pub fn in_memory() -> Self {
        Self {
            notes: Vec::new(),
            pending: None,
            db: None,
        }
    }

    pub fn load(db: Rc<Database>) -> Result<Self> {
        let notes = db.list_notes()?;
        debug!(count = notes.len(), "journal loaded");
        Ok(Self {
            notes,
            pending: None,
            db: Some(db),
        })
    }

    /// Most recent first.
    pub fn notes(&self) -> &[SessionNote] {
        &self.notes
    }

    pub fn pending(&self) -> Option<PendingSession> {
        self.pending
    }

    pub fn add(&mut self, note: SessionNote) -> Result<()> {
        if let Some(db) = &self.db {
            db.upsert_note(&note)?;
        }
        self.notes.insert(0, note);
        Ok(())
    }

    pub fn update(&mut self, note: SessionNote) -> Result<()> {
        let slot = self
            .notes
            .iter_mut()
            .find(|n| n.id == note.id)
            .ok_or_else(|| ValidationError::NotFound {
                kind: "note",
                id: note.id.to_string(),
            })?;
        if let Some(db) = &self.db {
            db.upsert_note(&note)?;
        }
        *slot = note;
        Ok(())
    }

    /// Returns whether a note was removed.
    pub fn delete(&mut self, id: Uuid) -> Result<bool> {
        let before = self.notes.len();
        self.notes.retain(|n| n.id != id);
        if let Some(db) = &self.db {
            db.delete_note(id)?;
        }
        Ok(self.notes.len() != before)
    }

    pub fn skip_note(&mut self) {
        self.pending = None;
    }

    /// Turn the pending session into a note. `None` when nothing is pending.
    pub fn save_session_note(
        &mut self,
        note: &str,
        mood: Option<Mood>,
        tags: Vec<String>,
        task_completed: Option<String>,
    ) -> Result<Option<SessionNote>> {
        let Some(session) = self.pending else {
            return Ok(None);
        };
        let mut entry = SessionNote::new(session.duration_secs, session.cycles);
        entry.note = note.to_string();
        entry.mood = mood;
        entry.tags = tags;
        entry.task_completed = task_completed;

        self.add(entry.clone())?;
        self.pending = None;
        info!(id = %entry.id, "journal entry saved");
        Ok(Some(entry))
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Notes written on `day` (local time).
    pub fn notes_for_date(&self, day: NaiveDate) -> Vec<&SessionNote> {
        self.notes
            .iter()
            .filter(|n| n.date.with_timezone(&Local).date_naive() == day)
            .collect()
    }

    /// Notes from the seven days before `now`.
    pub fn notes_for_week(&self, now: DateTime<Utc>) -> Vec<&SessionNote> {
        let week_ago = now - Duration::days(7);
        self.notes.iter().filter(|n| n.date >= week_ago).collect()
    }

    pub fn notes_with_mood(&self, mood: Mood) -> Vec<&SessionNote> {
        self.notes.iter().filter(|n| n.mood == Some(mood)).collect()
    }

    pub fn notes_with_tag(&self, tag: &str) -> Vec<&SessionNote> {
        self.notes
            .iter()
            .filter(|n| n.tags.iter().any(|t| t == tag))
            .collect()
    }

    /// Sorted, de-duplicated.
    pub fn all_tags(&self) -> Vec<String> {
        self.notes
            .iter()
            .flat_map(|n| n.tags.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn average_mood(&self) -> Option<Mood> {
        let scores: Vec<u32> = self.notes.iter().filter_map(|n| n.mood).map(Mood::score).collect();
        if scores.is_empty() {
            return None;
        }
        let average = f64::from(scores.iter().sum::<u32>()) / scores.len() as f64;
        Some(match average {
            a if a >= 4.5 => Mood::Great,
            a if a >= 3.5 => Mood::Good,
            a if a >= 2.5 => Mood::Okay,
            a if a >= 1.5 => Mood::Tired,
            _ => Mood::Frustrated,
        })
    }

    pub fn export_markdown(&self) -> String {
        let mut markdown = String::from("# Focus Session Journal\n\n");
        for note in &self.notes {
            let when = note.date.with_timezone(&Local);
            markdown.push_str(&format!("## {}\n\n", when.format("%B %-d, %Y at %-I:%M %p")));
            if let Some(mood) = note.mood {
                markdown.push_str(&format!("**Mood:** {} {mood}\n\n", mood.emoji()));
            }
            markdown.push_str(&format!(
                "**Duration:** {} minutes\n**Cycles:** {}\n\n",
                note.session_duration_secs / 60,
                note.cycles_completed
            ));
            if let Some(task) = &note.task_completed {
                markdown.push_str(&format!("**Task:** {task}\n\n"));
            }
            if !note.tags.is_empty() {
                markdown.push_str(&format!("**Tags:** {}\n\n", note.tags.join(", ")));
            }
            markdown.push_str(&format!("**Notes:**\n{}\n\n---\n\n", note.note));
        }
        markdown
    }
}

impl JournalSink for SessionJournal {
    fn prompt_for_note(&mut self, duration_secs: u64, cycles: u32) -> Result<()> {
        debug!(duration_secs, cycles, "journal prompt pending");
        self.pending = Some(PendingSession {
            duration_secs,
            cycles,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note_with(mood: Option<Mood>, tags: &[&str]) -> SessionNote {
        let mut note = SessionNote::new(1500, 1);
        note.mood = mood;
        note.tags = tags.iter().map(|t| t.to_string()).collect();
        note
    }

    #[test]
    fn mood_parses_emoji_and_words() {
        assert_eq!("😴".parse::<Mood>().unwrap(), Mood::Tired);
        assert_eq!(" OK ".parse::<Mood>().unwrap(), Mood::Okay);
        assert_eq!("great".parse::<Mood>().unwrap(), Mood::Great);
        assert!("meh".parse::<Mood>().is_err());
    }

    #[test]
    fn mood_serializes_as_emoji() {
        assert_eq!(serde_json::to_string(&Mood::Good).unwrap(), "\"🙂\"");
        let parsed: Mood = serde_json::from_str("\"frustrated\"").unwrap();
        assert_eq!(parsed, Mood::Frustrated);
    }

    #[test]
    fn save_requires_pending_session() {
        let mut journal = SessionJournal::in_memory();
        assert!(journal.save_session_note("x", None, vec![], None).unwrap().is_none());

        journal.prompt_for_note(3000, 2).unwrap();
        let saved = journal
            .save_session_note("Wrote the intro", Some(Mood::Great), vec!["writing".into()], None)
            .unwrap()
            .unwrap();
        assert_eq!(saved.session_duration_secs, 3000);
        assert_eq!(saved.cycles_completed, 2);
        assert!(journal.pending().is_none());
        assert_eq!(journal.notes().len(), 1);
    }

    #[test]
    fn skip_clears_pending() {
        let mut journal = SessionJournal::in_memory();
        journal.prompt_for_note(60, 1).unwrap();
        journal.skip_note();
        assert!(journal.pending().is_none());
        assert!(journal.notes().is_empty());
    }

    #[test]
    fn average_mood_thresholds() {
        let mut journal = SessionJournal::in_memory();
        assert!(journal.average_mood().is_none());
        journal.add(note_with(Some(Mood::Great), &[])).unwrap();
        journal.add(note_with(Some(Mood::Okay), &[])).unwrap();
        // (5 + 3) / 2 = 4.0
        assert_eq!(journal.average_mood(), Some(Mood::Good));
        journal.add(note_with(None, &[])).unwrap();
        assert_eq!(journal.average_mood(), Some(Mood::Good));
        journal.add(note_with(Some(Mood::Frustrated), &[])).unwrap();
        // 9 / 3 = 3.0
        assert_eq!(journal.average_mood(), Some(Mood::Okay));
    }

    #[test]
    fn filters_and_tags() {
        let mut journal = SessionJournal::in_memory();
        journal.add(note_with(Some(Mood::Tired), &["reading", "deep"])).unwrap();
        journal.add(note_with(None, &["deep"])).unwrap();
        let mut old = note_with(None, &["archive"]);
        old.date = Utc::now() - Duration::days(10);
        journal.add(old).unwrap();

        assert_eq!(journal.all_tags(), vec!["archive", "deep", "reading"]);
        assert_eq!(journal.notes_with_tag("deep").len(), 2);
        assert_eq!(journal.notes_with_mood(Mood::Tired).len(), 1);
        assert_eq!(journal.notes_for_week(Utc::now()).len(), 2);
        assert_eq!(journal.notes_for_date(Local::now().date_naive()).len(), 2);
    }

    #[test]
    fn update_and_delete() {
        let mut journal = SessionJournal::in_memory();
        let mut note = note_with(None, &[]);
        journal.add(note.clone()).unwrap();
        note.note = "edited".into();
        journal.update(note.clone()).unwrap();
        assert_eq!(journal.notes()[0].note, "edited");

        assert!(journal.update(note_with(None, &[])).is_err());
        assert!(journal.delete(note.id).unwrap());
        assert!(!journal.delete(note.id).unwrap());
    }

    #[test]
    fn markdown_export_lists_fields() {
        let mut journal = SessionJournal::in_memory();
        let mut note = note_with(Some(Mood::Good), &["a", "b"]);
        note.note = "Focused".into();
        note.task_completed = Some("Draft".into());
        journal.add(note).unwrap();

        let md = journal.export_markdown();
        assert!(md.starts_with("# Focus Session Journal\n\n## "));
        assert!(md.contains("**Mood:** 🙂 Good"));
        assert!(md.contains("**Duration:** 25 minutes\n**Cycles:** 1"));
        assert!(md.contains("**Task:** Draft"));
        assert!(md.contains("**Tags:** a, b"));
        assert!(md.contains("**Notes:**\nFocused"));
    }

    #[test]
    fn notes_persist_through_database() {
        let db = Rc::new(Database::open_memory().unwrap());
        let mut journal = SessionJournal::load(Rc::clone(&db)).unwrap();
        journal.prompt_for_note(1800, 1).unwrap();
        journal
            .save_session_note("ok", Some(Mood::Okay), vec![], None)
            .unwrap();

        let reloaded = SessionJournal::load(db).unwrap();
        assert_eq!(reloaded.notes().len(), 1);
        assert_eq!(reloaded.notes()[0].mood, Some(Mood::Okay));
    }
}
