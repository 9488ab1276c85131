use std::cell::RefCell;
use std::error::Error;
use std::io::Write;
use std::rc::Rc;
use std::time::Duration;

use clap::Subcommand;
use focusly_core::storage::DisplaySettings;
use focusly_core::{
    BreakActivityManager, Collaborators, Event, Mood, PresetManager, SessionJournal,
    SettingsStore, SoundManager, SoundType, StatisticsManager, TaskManager, TimerManager,
    TimerPhase,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use uuid::Uuid;

use super::{format_secs, open_db, print_json, CmdResult};
use crate::sinks::{DesktopNotifier, SystemSoundPlayer};

const HELP: &str = "Commands: s = skip break, q = stop";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run focus cycles in the foreground until the session completes
    Run {
        /// Task (id, id prefix or title) credited with each finished work phase
        #[arg(long)]
        task: Option<String>,
        /// Switch to this preset before starting
        #[arg(long)]
        preset: Option<String>,
        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
        /// Terminal output only, no desktop notifications
        #[arg(long)]
        no_desktop: bool,
    },
    /// Print the idle timer state for the current settings
    Status,
    /// Play a completion sound, or list them
    Sound {
        /// e.g. work_complete, break_time, celebration
        name: Option<String>,
    },
}

type StdinLines = Lines<BufReader<Stdin>>;

/// One foreground run: the timer plus what the CLI does around it.
struct ForegroundSession {
    timer: TimerManager,
    tasks: TaskManager,
    task_id: Option<Uuid>,
    journal: Rc<RefCell<SessionJournal>>,
    activities: BreakActivityManager,
    display: DisplaySettings,
    json: bool,
}

impl ForegroundSession {
    fn open(
        task: Option<String>,
        preset: Option<String>,
        json: bool,
        desktop: bool,
    ) -> Result<Self, Box<dyn Error>> {
        let db = open_db()?;
        let mut store = SettingsStore::load()?;

        let mut presets = PresetManager::load(Rc::clone(&db))?;
        if let Some(needle) = preset {
            let id = super::preset::find(&presets, &needle)?.id;
            let selected = presets.set_current(id)?.clone();
            store.apply_preset(&selected)?;
        }

        let mut tasks = TaskManager::load(Rc::clone(&db))?;
        let task_id = match task {
            Some(needle) => Some(
                tasks
                    .resolve(&needle)
                    .map(|t| t.id)
                    .ok_or_else(|| format!("no task matching '{needle}'"))?,
            ),
            None => None,
        };
        tasks.set_current(task_id)?;
        let label = tasks.current().map(|t| t.title.clone());

        let settings = store.settings().clone();
        let stats = Rc::new(RefCell::new(StatisticsManager::load(Rc::clone(&db))?));
        let journal = Rc::new(RefCell::new(SessionJournal::load(Rc::clone(&db))?));
        let activities = BreakActivityManager::load(db)?;

        let timer = TimerManager::new(
            Collaborators::new(store)
                .with_presets(presets)
                .with_statistics(Rc::clone(&stats))
                .with_achievements(stats)
                .with_journal(Rc::clone(&journal))
                .with_notifications(DesktopNotifier::new(desktop, json))
                .with_sound(SoundManager::new(settings.sound.clone(), SystemSoundPlayer::default()))
                .with_task_label(label),
        );

        Ok(Self {
            timer,
            tasks,
            task_id,
            journal,
            activities,
            display: settings.display,
            json,
        })
    }

    fn handle(&mut self, event: &Event) {
        if self.json {
            if let Ok(line) = serde_json::to_string(event) {
                println!("{line}");
            }
        } else {
            self.describe(event);
        }

        match event {
            Event::BreakStarted { duration_secs, .. } => {
                self.credit_task();
                if !self.json && self.display.show_break_activities {
                    let activity = self.activities.suggest_activity(*duration_secs);
                    println!("   Try: {} ({})", activity.title, activity.description);
                }
            }
            Event::SessionCompleted { .. } => self.credit_task(),
            _ => {}
        }
    }

    fn describe(&self, event: &Event) {
        match event {
            Event::TimerStarted {
                remaining_secs,
                current_cycle,
                ..
            } => println!("Focus: {} (cycle {})", format_secs(*remaining_secs), current_cycle + 1),
            Event::BreakStarted {
                duration_secs,
                long_break,
                ..
            } => {
                let kind = if *long_break { "Long break" } else { "Break" };
                if self.display.show_break_overlay {
                    println!("\n==================== {} ====================", kind.to_uppercase());
                }
                println!("{kind}: {}", format_secs(*duration_secs));
            }
            Event::BreakEnded { cycle, .. } => println!("\nBack to work (cycle {})", cycle + 1),
            Event::BreakSkipped { .. } => println!("\nBreak skipped"),
            Event::SessionCompleted {
                cycles_completed,
                work_secs,
                ..
            } => println!(
                "\nSession complete: {cycles_completed} work phases, {} focused",
                format_secs(*work_secs)
            ),
            Event::TimerStopped { from, .. } => println!("\nStopped ({from:?})"),
            Event::StateSnapshot { .. } => {}
        }
    }

    fn render_status(&self) {
        if self.json || !self.display.show_time_display {
            return;
        }
        if let Event::StateSnapshot {
            phase,
            remaining_secs,
            current_cycle,
            max_cycles,
            ..
        } = self.timer.snapshot()
        {
            let label = match phase {
                TimerPhase::Working => "Focus",
                TimerPhase::OnBreak => "Break",
                TimerPhase::Idle => "Idle",
            };
            print!(
                "\r{label} {:02}:{:02}  cycle {}/{}   ",
                remaining_secs / 60,
                remaining_secs % 60,
                current_cycle,
                max_cycles
            );
            let _ = std::io::stdout().flush();
        }
    }

    fn credit_task(&mut self) {
        let Some(id) = self.task_id else {
            return;
        };
        match self.tasks.increment_pomodoro(id) {
            Ok(task) => info!(
                title = %task.title,
                done = task.completed_pomodoros,
                estimated = task.estimated_pomodoros,
                "pomodoro credited"
            ),
            Err(e) => warn!(error = %e, "could not credit task"),
        }
    }

    /// Offer to turn the finished session into a journal entry.
    async fn write_journal(&mut self, lines: &mut StdinLines) -> CmdResult {
        let Some(pending) = self.journal.borrow().pending() else {
            return Ok(());
        };
        println!(
            "\nJournal: {} focused over {} work phases.",
            format_secs(pending.duration_secs),
            pending.cycles
        );

        let note = ask(lines, "Note (empty to skip): ").await?.unwrap_or_default();
        if note.is_empty() {
            self.journal.borrow_mut().skip_note();
            return Ok(());
        }
        let mood = ask(lines, "Mood [great/good/okay/tired/frustrated]: ")
            .await?
            .and_then(|m| m.parse::<Mood>().ok());
        let tags: Vec<String> = ask(lines, "Tags (comma separated): ")
            .await?
            .map(|t| {
                t.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        let task_completed = self
            .tasks
            .current()
            .filter(|t| t.is_completed)
            .map(|t| t.title.clone());

        if let Some(entry) = self
            .journal
            .borrow_mut()
            .save_session_note(&note, mood, tags, task_completed)?
        {
            println!("Saved journal entry {}", entry.id);
        }
        Ok(())
    }
}

async fn ask(lines: &mut StdinLines, question: &str) -> Result<Option<String>, Box<dyn Error>> {
    print!("{question}");
    std::io::stdout().flush()?;
    Ok(lines.next_line().await?.map(|l| l.trim().to_string()))
}

async fn drive(mut session: ForegroundSession) -> CmdResult {
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    if let Some(event) = session.timer.start() {
        session.handle(&event);
    }
    if !session.json {
        println!("{HELP}");
    }

    loop {
        tokio::select! {
            _ = ticker.tick() => match session.timer.tick() {
                Some(event) => session.handle(&event),
                None => session.render_status(),
            },
            signal = &mut ctrl_c => {
                signal?;
                if let Some(event) = session.timer.stop() {
                    session.handle(&event);
                }
                break;
            }
            line = lines.next_line(), if stdin_open => match line? {
                Some(command) => match command.trim() {
                    "s" | "skip" => match session.timer.skip_break_start_work() {
                        Some(event) => session.handle(&event),
                        None => println!("Not on a break."),
                    },
                    "q" | "stop" => {
                        if let Some(event) = session.timer.stop() {
                            session.handle(&event);
                        }
                        break;
                    }
                    "" => {}
                    other => println!("Unknown command '{other}'. {HELP}"),
                },
                None => stdin_open = false,
            },
        }
        if !session.timer.is_running() {
            break;
        }
    }

    if stdin_open && !session.json {
        session.write_journal(&mut lines).await?;
    }
    Ok(())
}

pub fn run(action: TimerAction) -> CmdResult {
    match action {
        TimerAction::Run {
            task,
            preset,
            json,
            no_desktop,
        } => {
            let session = ForegroundSession::open(task, preset, json, !no_desktop)?;
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(drive(session))?;
        }
        TimerAction::Status => {
            let presets = PresetManager::load(open_db()?)?;
            let preset = presets.current().name.clone();
            let timer = TimerManager::new(Collaborators::new(SettingsStore::load()?).with_presets(presets));
            print_json(&timer.snapshot())?;
            println!("preset: {preset}");
        }
        TimerAction::Sound { name: None } => {
            for sound in SoundType::ALL {
                println!("{:<18} {}", serde_json::to_string(&sound)?.trim_matches('"'), sound.label());
            }
        }
        TimerAction::Sound { name: Some(name) } => {
            let sound: SoundType = serde_json::from_value(serde_json::Value::String(name))?;
            let settings = SettingsStore::load()?.settings().sound.clone();
            SoundManager::new(settings, SystemSoundPlayer::default()).preview(sound)?;
        }
    }
    Ok(())
}
