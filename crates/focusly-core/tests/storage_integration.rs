//! Persistence tests against real files in a temporary directory.

use std::cell::RefCell;
use std::rc::Rc;

use focusly_core::{
    ActivityCategory, BreakActivity, BreakActivityManager, Database, PresetManager, Priority,
    Settings, SettingsStore, Task, TaskManager, TimerPreset,
};
use tempfile::TempDir;

fn open(dir: &TempDir) -> Rc<Database> {
    Rc::new(Database::open_at(&dir.path().join("focusly.db")).unwrap())
}

// ============================================================================
// Settings
// ============================================================================

#[test]
fn settings_store_writes_through_and_reloads() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    let seen = Rc::new(RefCell::new(Vec::new()));
    {
        let mut store = SettingsStore::open(path.clone()).unwrap();
        let sink = Rc::clone(&seen);
        store.subscribe(move |change| sink.borrow_mut().push(change.key.clone()));

        store.set("timer.max_cycles", "6").unwrap();
        // Same value again publishes nothing.
        assert!(store.set("timer.max_cycles", "6").unwrap().is_none());
        store.apply_preset(&TimerPreset::classic_pomodoro()).unwrap();
    }

    let reloaded = Settings::load_from(&path).unwrap();
    assert_eq!(reloaded.timer.work_duration_secs, 25 * 60);
    assert_eq!(reloaded.timer.break_duration_secs, 5 * 60);
    assert_eq!(seen.borrow().first().map(String::as_str), Some("timer.max_cycles"));
}

#[test]
fn bad_values_leave_file_untouched() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    let mut store = SettingsStore::open(path.clone()).unwrap();

    assert!(store.set("timer.max_cycles", "many").is_err());
    assert!(store.set("timer.nope", "1").is_err());
    assert_eq!(Settings::load_from(&path).unwrap(), Settings::default());
}

// ============================================================================
// Managers over a reopened database
// ============================================================================

#[test]
fn presets_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let id = {
        let mut presets = PresetManager::load(open(&dir)).unwrap();
        let preset = TimerPreset::custom("Morning", 40 * 60, 8 * 60, None, 3);
        let id = preset.id;
        presets.add(preset).unwrap();
        presets.set_current(id).unwrap();
        id
    };

    let presets = PresetManager::load(open(&dir)).unwrap();
    assert_eq!(presets.current().id, id);
    assert_eq!(presets.custom_presets().len(), 1);
    assert_eq!(presets.built_in_presets().len(), TimerPreset::built_in_presets().len());
}

#[test]
fn tasks_keep_order_and_progress() {
    let dir = TempDir::new().unwrap();
    {
        let mut tasks = TaskManager::load(open(&dir)).unwrap();
        let mut first = Task::new("Draft outline");
        first.priority = Priority::High;
        first.estimated_pomodoros = 2;
        let first_id = first.id;
        tasks.add(first).unwrap();
        tasks.add(Task::new("Review notes")).unwrap();
        tasks.increment_pomodoro(first_id).unwrap();
        tasks.increment_pomodoro(first_id).unwrap();
    }

    let tasks = TaskManager::load(open(&dir)).unwrap();
    let titles: Vec<_> = tasks.tasks().iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, ["Review notes", "Draft outline"]);
    let outline = tasks.resolve("Draft outline").unwrap();
    assert!(outline.is_completed);
    assert_eq!(outline.completed_pomodoros, 2);
    assert!(tasks.current().is_none());
}

#[test]
fn activity_completions_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let custom = BreakActivity::custom("Juggle", "Three balls", 3, ActivityCategory::Physical);
    let id = custom.id;
    {
        let mut activities = BreakActivityManager::load(open(&dir)).unwrap();
        activities.add(custom).unwrap();
        activities.mark_completed(id).unwrap();
        activities.mark_completed(id).unwrap();
    }

    let activities = BreakActivityManager::load(open(&dir)).unwrap();
    assert_eq!(activities.completion_count(id), 2);
    assert_eq!(activities.custom_activities().len(), 1);
    assert_eq!(activities.most_completed().map(|a| a.id), Some(id));
}
