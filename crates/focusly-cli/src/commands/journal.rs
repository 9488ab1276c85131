use chrono::Utc;
use clap::Subcommand;
use focusly_core::{Mood, SessionJournal, SessionNote};
use uuid::Uuid;

use super::{format_secs, local_time, open_db, parse_date, print_json, CmdResult};

#[derive(Subcommand)]
pub enum JournalAction {
    /// List notes, newest first
    List {
        /// Only notes written on this local date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        /// Only notes from the last seven days
        #[arg(long, conflicts_with = "date")]
        week: bool,
        #[arg(long)]
        mood: Option<String>,
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Write a note for a session logged outside the timer
    Add {
        note: String,
        /// Session minutes
        #[arg(long, default_value = "0")]
        minutes: u64,
        #[arg(long, default_value = "1")]
        cycles: u32,
        /// great, good, okay, tired, frustrated (or the emoji)
        #[arg(long)]
        mood: Option<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Task finished during the session
        #[arg(long)]
        task: Option<String>,
    },
    /// Delete a note by id
    Delete {
        id: Uuid,
    },
    /// Every tag used in notes
    Tags,
    /// Average mood across notes
    Mood,
    /// Print all notes as Markdown
    Export,
}

fn print_note(note: &SessionNote) {
    let mood = note.mood.map(|m| m.emoji()).unwrap_or(" ");
    println!(
        "{}  {mood}  {}  {} cycles  {}",
        local_time(note.date),
        format_secs(note.session_duration_secs),
        note.cycles_completed,
        note.note
    );
}

pub fn run(action: JournalAction) -> CmdResult {
    let mut journal = SessionJournal::load(open_db()?)?;

    match action {
        JournalAction::List {
            date,
            week,
            mood,
            tag,
            json,
        } => {
            let mut notes: Vec<&SessionNote> = match (date, week) {
                (Some(date), _) => journal.notes_for_date(parse_date(&date)?),
                (None, true) => journal.notes_for_week(Utc::now()),
                (None, false) => journal.notes().iter().collect(),
            };
            if let Some(mood) = mood {
                let mood: Mood = mood.parse()?;
                notes.retain(|n| n.mood == Some(mood));
            }
            if let Some(tag) = tag {
                notes.retain(|n| n.tags.contains(&tag));
            }
            if json {
                print_json(&notes)?;
            } else {
                notes.into_iter().for_each(print_note);
            }
        }
        JournalAction::Add {
            note,
            minutes,
            cycles,
            mood,
            tags,
            task,
        } => {
            let mut entry = SessionNote::new(minutes * 60, cycles);
            entry.note = note;
            entry.mood = mood.as_deref().map(str::parse).transpose()?;
            entry.tags = tags;
            entry.task_completed = task;
            let id = entry.id;
            journal.add(entry)?;
            println!("saved {id}");
        }
        JournalAction::Delete { id } => {
            if !journal.delete(id)? {
                return Err(format!("no note with id {id}").into());
            }
            println!("deleted {id}");
        }
        JournalAction::Tags => {
            for tag in journal.all_tags() {
                println!("{tag} ({})", journal.notes_with_tag(&tag).len());
            }
        }
        JournalAction::Mood => match journal.average_mood() {
            Some(mood) => {
                let count = journal.notes_with_mood(mood).len();
                println!("{} {mood} on average ({count} notes marked {mood})", mood.emoji());
            }
            None => println!("No moods recorded yet."),
        },
        JournalAction::Export => print!("{}", journal.export_markdown()),
    }
    Ok(())
}
