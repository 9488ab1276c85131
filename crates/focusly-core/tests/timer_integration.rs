//! End-to-end tests: timer wired to the real managers over one database.
//!
//! Every manager is shared through `Rc<RefCell<_>>` so the test can inspect
//! it while the timer holds a handle.

use std::cell::RefCell;
use std::rc::Rc;

use focusly_core::{
    Collaborators, Database, Event, Notification, NotificationKind, NotificationSink,
    PresetManager, Result, SessionJournal, Settings, SettingsStore, SoundManager, SoundPlayer,
    SoundType, StatisticsManager, TimerManager, TimerPhase, TimerPreset,
};

// ============================================================================
// Test Helpers
// ============================================================================

#[derive(Default)]
struct Inbox(Vec<Notification>);

impl NotificationSink for Inbox {
    fn deliver(&mut self, notification: &Notification) -> Result<()> {
        self.0.push(notification.clone());
        Ok(())
    }
}

#[derive(Default)]
struct Speaker(Vec<SoundType>);

impl SoundPlayer for Speaker {
    fn play(&mut self, sound: SoundType, _volume: f32) -> Result<()> {
        self.0.push(sound);
        Ok(())
    }
}

fn short_settings(work: u64, brk: u64, cycles: u32) -> Settings {
    let mut settings = Settings::default();
    settings.timer.work_duration_secs = work;
    settings.timer.break_duration_secs = brk;
    settings.timer.max_cycles = cycles;
    settings
}

struct Rig {
    timer: TimerManager,
    settings: Rc<RefCell<SettingsStore>>,
    stats: Rc<RefCell<StatisticsManager>>,
    journal: Rc<RefCell<SessionJournal>>,
    inbox: Rc<RefCell<Inbox>>,
    sound: Rc<RefCell<SoundManager<Speaker>>>,
    db: Rc<Database>,
}

fn rig(settings: Settings, presets: PresetManager, db: Rc<Database>) -> Rig {
    let sound_settings = settings.sound.clone();
    let settings = Rc::new(RefCell::new(SettingsStore::in_memory(settings)));
    let stats = Rc::new(RefCell::new(StatisticsManager::load(Rc::clone(&db)).unwrap()));
    let journal = Rc::new(RefCell::new(SessionJournal::load(Rc::clone(&db)).unwrap()));
    let inbox = Rc::new(RefCell::new(Inbox::default()));
    let sound = Rc::new(RefCell::new(SoundManager::new(sound_settings, Speaker::default())));

    let timer = TimerManager::new(
        Collaborators::new(Rc::clone(&settings))
            .with_presets(presets)
            .with_statistics(Rc::clone(&stats))
            .with_achievements(Rc::clone(&stats))
            .with_journal(Rc::clone(&journal))
            .with_notifications(Rc::clone(&inbox))
            .with_sound(Rc::clone(&sound))
            .with_task_label(Some("Write report".into())),
    );
    Rig {
        timer,
        settings,
        stats,
        journal,
        inbox,
        sound,
        db,
    }
}

fn memory_db() -> Rc<Database> {
    Rc::new(Database::open_memory().unwrap())
}

fn run_until_idle(timer: &mut TimerManager) -> Vec<Event> {
    let mut events = Vec::new();
    for _ in 0..1_000_000 {
        if let Some(event) = timer.tick() {
            events.push(event);
        }
        if !timer.is_running() {
            return events;
        }
    }
    panic!("timer never stopped");
}

// ============================================================================
// Full sessions
// ============================================================================

#[test]
fn full_session_logs_once_and_prompts_journal() {
    let mut rig = rig(short_settings(3, 2, 2), PresetManager::in_memory(), memory_db());
    rig.timer.start();
    let events = run_until_idle(&mut rig.timer);

    let completions = events
        .iter()
        .filter(|e| matches!(e, Event::SessionCompleted { .. }))
        .count();
    assert_eq!(completions, 1);
    assert_eq!(rig.timer.phase(), TimerPhase::Idle);
    assert_eq!(rig.timer.current_cycle(), 0);

    let stats = rig.stats.borrow();
    assert_eq!(stats.total_sessions(), 1);
    let session = &stats.sessions()[0];
    assert!(session.was_completed);
    assert_eq!(session.duration_secs, 9);
    assert_eq!(session.cycles_completed, 3);
    assert_eq!(session.break_duration_secs, 6);
    assert_eq!(session.task_label.as_deref(), Some("Write report"));

    let pending = rig.journal.borrow().pending().unwrap();
    assert_eq!((pending.duration_secs, pending.cycles), (9, 3));

    let kinds: Vec<_> = rig.inbox.borrow().0.iter().map(|n| n.kind).collect();
    assert_eq!(kinds.last(), Some(&NotificationKind::Achievement));
    assert!(kinds.contains(&NotificationKind::SessionComplete));

    assert_eq!(rig.sound.borrow().player().0.last(), Some(&SoundType::Celebration));

    // Persisted through the shared database.
    assert_eq!(rig.db.list_focus_sessions().unwrap().len(), 1);
}

#[test]
fn journal_entry_saved_after_session_persists() {
    let db = memory_db();
    let mut rig = rig(short_settings(1, 1, 1), PresetManager::in_memory(), Rc::clone(&db));
    rig.timer.start();
    run_until_idle(&mut rig.timer);

    rig.journal
        .borrow_mut()
        .save_session_note("Good block", "great".parse().ok(), vec!["deep".into()], None)
        .unwrap()
        .unwrap();

    let reloaded = SessionJournal::load(db).unwrap();
    assert_eq!(reloaded.notes().len(), 1);
    assert_eq!(reloaded.notes()[0].session_duration_secs, 2);
}

#[test]
fn preset_cadence_places_long_breaks() {
    let db = memory_db();
    let mut presets = PresetManager::load(Rc::clone(&db)).unwrap();
    let preset = TimerPreset::custom("Cadence", 2, 1, Some(5), 2);
    let id = preset.id;
    presets.add(preset).unwrap();
    presets.set_current(id).unwrap();

    let mut rig = rig(short_settings(2, 1, 6), presets, db);
    rig.timer.start();
    let events = run_until_idle(&mut rig.timer);

    let breaks: Vec<(u32, u64)> = events
        .iter()
        .filter_map(|e| match e {
            Event::BreakStarted {
                cycle,
                duration_secs,
                ..
            } => Some((*cycle, *duration_secs)),
            _ => None,
        })
        .collect();
    assert_eq!(breaks, vec![(1, 1), (2, 5), (3, 1), (4, 5), (5, 1), (6, 1)]);
}

// ============================================================================
// Interruptions
// ============================================================================

#[test]
fn stop_mid_work_logs_incomplete_session() {
    let mut rig = rig(short_settings(30, 5, 4), PresetManager::in_memory(), memory_db());
    rig.timer.start();
    for _ in 0..10 {
        rig.timer.tick();
    }
    rig.timer.stop();

    let stats = rig.stats.borrow();
    assert_eq!(stats.total_sessions(), 1);
    assert!(!stats.sessions()[0].was_completed);
    assert_eq!(stats.sessions()[0].duration_secs, 0);
    assert!(rig.journal.borrow().pending().is_none());
    assert!(!rig
        .inbox
        .borrow()
        .0
        .iter()
        .any(|n| n.kind == NotificationKind::Achievement));
}

#[test]
fn settings_changes_apply_to_next_phase() {
    let mut rig = rig(short_settings(2, 1, 3), PresetManager::in_memory(), memory_db());
    rig.timer.start();
    rig.settings
        .borrow_mut()
        .set("timer.break_duration_secs", "4")
        .unwrap();

    let mut started = None;
    while started.is_none() {
        if let Some(Event::BreakStarted { duration_secs, .. }) = rig.timer.tick() {
            started = Some(duration_secs);
        }
    }
    assert_eq!(started, Some(4));
    let body = &rig.inbox.borrow().0[0].body;
    assert_eq!(body, &Notification::break_time(4).body);
}

#[test]
fn notification_toggles_are_honoured() {
    let mut settings = short_settings(1, 1, 1);
    settings.notifications.break_notifications = false;
    settings.notifications.session_complete_notifications = false;
    settings.notifications.achievement_notifications = false;
    settings.sound.enabled = false;

    let mut rig = rig(settings, PresetManager::in_memory(), memory_db());
    rig.timer.start();
    run_until_idle(&mut rig.timer);

    assert!(rig.inbox.borrow().0.is_empty());
    assert!(rig.sound.borrow().player().0.is_empty());
    assert_eq!(rig.stats.borrow().total_sessions(), 1);
}

#[test]
fn on_disk_database_survives_reopen() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("focusly.db");
    {
        let db = Rc::new(Database::open_at(&path).unwrap());
        let mut rig = rig(short_settings(1, 1, 1), PresetManager::in_memory(), db);
        rig.timer.start();
        run_until_idle(&mut rig.timer);
    }
    let db = Rc::new(Database::open_at(&path).unwrap());
    let stats = StatisticsManager::load(db).unwrap();
    assert_eq!(stats.total_sessions(), 1);
    assert!(stats.sessions()[0].was_completed);
}
