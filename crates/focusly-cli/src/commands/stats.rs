use chrono::Local;
use clap::{Subcommand, ValueEnum};
use focusly_core::{DailyStats, Notification, Settings, StatisticsManager};

use super::{format_secs, local_time, open_db, parse_date, print_json, CmdResult};

#[derive(Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's stats
    Today {
        #[arg(long)]
        json: bool,
    },
    /// One day's stats
    Day {
        /// Local date, YYYY-MM-DD
        date: String,
    },
    /// Last 7 days
    Week {
        #[arg(long)]
        json: bool,
    },
    /// Last 30 days
    Month {
        #[arg(long)]
        json: bool,
    },
    /// All-time totals and streaks
    All {
        #[arg(long)]
        json: bool,
    },
    /// Recent sessions, newest first
    Sessions {
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Achievements currently unlocked
    Achievements,
    /// Daily and weekly summaries as they would be notified
    Summary,
    /// Export every session
    Export {
        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,
    },
    /// Delete all sessions
    Clear {
        /// Required; there is no undo
        #[arg(long)]
        yes: bool,
    },
}

fn print_days(days: &[DailyStats]) {
    for day in days {
        println!(
            "{}  {:>8}  {} sessions  {} cycles",
            day.date,
            day.formatted_focus_time(),
            day.sessions_completed,
            day.cycles_completed
        );
    }
}

pub fn run(action: StatsAction) -> CmdResult {
    let mut stats = StatisticsManager::load(open_db()?)?;
    let today = Local::now().date_naive();

    match action {
        StatsAction::Today { json } => {
            let day = stats.daily_stats(today);
            if json {
                print_json(&day)?;
            } else {
                print_days(std::slice::from_ref(&day));
            }
        }
        StatsAction::Day { date } => {
            print_json(&stats.daily_stats(parse_date(&date)?))?;
        }
        StatsAction::Week { json } => {
            let days = stats.weekly_stats(today);
            if json {
                print_json(&days)?;
            } else {
                print_days(&days);
            }
        }
        StatsAction::Month { json } => {
            let days = stats.monthly_stats(today);
            if json {
                print_json(&days)?;
            } else {
                print_days(&days);
            }
        }
        StatsAction::All { json } => {
            let summary = stats.summary_on(today);
            if json {
                print_json(&summary)?;
            } else {
                println!("Total focus:     {}", format_secs(summary.total_focus_secs));
                println!("Sessions:        {}", summary.total_sessions);
                println!("Current streak:  {} days", summary.current_streak);
                println!("Longest streak:  {} days", summary.longest_streak);
            }
        }
        StatsAction::Sessions { limit } => {
            for session in stats.sessions().iter().take(limit) {
                println!(
                    "{}  {:>8}  {} cycles  {}{}",
                    local_time(session.date),
                    format_secs(session.duration_secs),
                    session.cycles_completed,
                    if session.was_completed { "completed" } else { "stopped" },
                    session
                        .task_label
                        .as_deref()
                        .map(|t| format!("  [{t}]"))
                        .unwrap_or_default()
                );
            }
        }
        StatsAction::Achievements => {
            let unlocked = stats.achievements_on(today);
            if unlocked.is_empty() {
                println!("No achievements yet.");
            }
            for achievement in unlocked {
                println!("{achievement}");
            }
        }
        StatsAction::Summary => {
            let prefs = Settings::load_or_default().notifications;
            let summary = stats.summary_on(today);
            let week = stats.weekly_stats(today);
            let mut notes = Vec::new();
            if prefs.daily_summary_notifications {
                notes.push(Notification::daily_summary(&stats.daily_stats(today)));
            }
            if prefs.weekly_summary_notifications {
                let week_secs: u64 = week.iter().map(|d| d.total_focus_secs).sum();
                let week_sessions: usize = week.iter().map(|d| d.sessions_completed).sum();
                notes.push(Notification::weekly_summary(
                    week_secs as f64 / 3600.0,
                    week_sessions,
                    summary.current_streak,
                ));
            }
            for note in notes {
                println!("{}\n{}\n", note.title, note.body);
            }
        }
        StatsAction::Export { format } => match format {
            ExportFormat::Csv => print!("{}", stats.export_csv()?),
            ExportFormat::Json => println!("{}", stats.export_json()?),
        },
        StatsAction::Clear { yes } => {
            if !yes {
                return Err("refusing to clear statistics without --yes".into());
            }
            let removed = stats.total_sessions();
            stats.clear_all()?;
            println!("removed {removed} sessions");
        }
    }
    Ok(())
}
