//! Calendar commands. Events live in a JSON file the user (or a sync
//! script) maintains; nothing here talks to a calendar service.

use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveTime, Utc};
use clap::{Args, Subcommand};
use focusly_core::storage::data_dir;
use focusly_core::{CalendarAdvisor, CalendarEvent, Settings};

use super::{local_time, parse_datetime, CmdResult};

#[derive(Args)]
pub struct CalendarArgs {
    /// Events file (JSON array); defaults to calendar.json in the data directory
    #[arg(long, global = true)]
    events: Option<PathBuf>,
    #[command(subcommand)]
    action: CalendarAction,
}

#[derive(Subcommand)]
pub enum CalendarAction {
    /// Show the next meeting
    Next,
    /// Suggest focus blocks for the rest of today
    Blocks {
        #[arg(long, default_value = "25")]
        minutes: i64,
        /// Local end of the working day, HH:MM
        #[arg(long, default_value = "18:00")]
        day_end: String,
    },
    /// Check whether a session fits before the next meeting
    Fit {
        #[arg(long, default_value = "25")]
        minutes: i64,
    },
    /// Earliest time with a 30 minute gap
    Available,
    /// Whether to pause focus for a meeting
    Pause,
    /// Upcoming meeting reminders
    Reminders,
    /// Append an event to the events file
    Add {
        title: String,
        /// RFC 3339 start
        #[arg(long)]
        start: String,
        /// RFC 3339 end
        #[arg(long)]
        end: String,
    },
}

fn events_path(explicit: Option<PathBuf>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match explicit {
        Some(path) => Ok(path),
        None => Ok(data_dir()?.join("calendar.json")),
    }
}

fn read_events(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    match std::fs::read_to_string(path) {
        Ok(json) => Ok(json),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok("[]".to_string()),
        Err(e) => Err(e.into()),
    }
}

pub fn run(args: CalendarArgs) -> CmdResult {
    let path = events_path(args.events)?;
    let json = read_events(&path)?;
    let now = Utc::now();
    let advisor = CalendarAdvisor::from_json(&json, now)?;

    match args.action {
        CalendarAction::Next => match advisor.next_meeting() {
            Some(event) => {
                let until = event.start - now;
                println!(
                    "{} at {} (in {} min)",
                    event.title,
                    local_time(event.start),
                    until.num_minutes()
                );
            }
            None => println!("No upcoming meetings."),
        },
        CalendarAction::Blocks { minutes, day_end } => {
            let day_end = NaiveTime::parse_from_str(&day_end, "%H:%M")?;
            let blocks = advisor
                .with_day_end(day_end)
                .suggest_focus_blocks(Duration::minutes(minutes));
            if blocks.is_empty() {
                println!("No free blocks left today.");
            }
            for start in blocks {
                println!("{} - {}", local_time(start), local_time(start + Duration::minutes(minutes)));
            }
        }
        CalendarAction::Fit { minutes } => {
            if advisor.can_fit_focus_session(Duration::minutes(minutes)) {
                println!("yes");
            } else {
                let until = advisor
                    .time_until_next_meeting()
                    .map(|d| d.num_minutes())
                    .unwrap_or_default();
                println!("no: next meeting in {until} min");
            }
        }
        CalendarAction::Available => println!("{}", local_time(advisor.next_available_time())),
        CalendarAction::Pause => {
            println!("{}", if advisor.should_pause_focus() { "pause" } else { "continue" });
        }
        CalendarAction::Reminders => {
            let prefs = Settings::load_or_default().notifications;
            if !prefs.calendar_reminders {
                println!("Calendar reminders are disabled.");
                return Ok(());
            }
            for reminder in advisor.reminders(i64::from(prefs.calendar_reminder_minutes)) {
                let when = reminder.deliver_at.map(local_time).unwrap_or_default();
                println!("{when}  {}", reminder.body);
            }
        }
        CalendarAction::Add { title, start, end } => {
            let mut events = advisor.events().to_vec();
            let id = uuid::Uuid::new_v4().to_string();
            events.push(CalendarEvent::new(id, title, parse_datetime(&start)?, parse_datetime(&end)?)?);
            std::fs::write(&path, serde_json::to_string_pretty(&events)?)?;
            println!("{} events in {}", events.len(), path.display());
        }
    }
    Ok(())
}
