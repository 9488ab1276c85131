use std::collections::{BTreeSet, HashSet};
use std::rc::Rc;

use chrono::{DateTime, Local, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use super::{Priority, Task};
use crate::error::{Result, ValidationError};
use crate::storage::Database;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TaskFilter {
    #[default]
    All,
    Active,
    Completed,
    /// Open and due today.
    Today,
    Overdue,
    Tag(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskSort {
    /// Highest first.
    #[default]
    Priority,
    /// Earliest first; undated last.
    DueDate,
    /// Newest first.
    Created,
    Title,
}

/// Ordered task list (newest first) plus the task being worked on.
pub struct TaskManager {
    tasks: Vec<Task>,
    current: Option<Uuid>,
    db: Option<Rc<Database>>,
}

impl TaskManager {
    pub fn in_memory() -> Self {
        Self {
            tasks: Vec::new(),
            current: None,
            db: None,
        }
    }

    pub fn load(db: Rc<Database>) -> Result<Self> {
        let tasks = db.list_tasks()?;
        debug!(count = tasks.len(), "tasks loaded");
        Ok(Self {
            tasks,
            current: None,
            db: Some(db),
        })
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Resolve a full id, an id prefix, or a case-insensitive title.
    pub fn resolve(&self, needle: &str) -> Option<&Task> {
        if let Ok(id) = Uuid::parse_str(needle) {
            return self.get(id);
        }
        let lowered = needle.to_lowercase();
        self.tasks
            .iter()
            .find(|t| t.id.to_string().starts_with(&lowered))
            .or_else(|| self.tasks.iter().find(|t| t.title.to_lowercase() == lowered))
    }

    pub fn current(&self) -> Option<&Task> {
        self.current.and_then(|id| self.get(id))
    }

    pub fn set_current(&mut self, id: Option<Uuid>) -> Result<()> {
        if let Some(id) = id {
            self.index_of(id)?;
        }
        self.current = id;
        Ok(())
    }

    pub fn add(&mut self, task: Task) -> Result<()> {
        if task.title.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "title".to_string(),
                message: "must not be empty".to_string(),
            }
            .into());
        }
        let title = task.title.clone();
        let mut next = self.tasks.clone();
        next.insert(0, task);
        self.commit(next)?;
        info!(%title, "task added");
        Ok(())
    }

    pub fn update(&mut self, task: Task) -> Result<()> {
        let index = self.index_of(task.id)?;
        let mut next = self.tasks.clone();
        next[index] = task;
        self.commit(next)
    }

    /// Remove a task; clears the current selection when it pointed there.
    pub fn delete(&mut self, id: Uuid) -> Result<Task> {
        let index = self.index_of(id)?;
        let mut next = self.tasks.clone();
        let removed = next.remove(index);
        self.commit(next)?;
        if self.current == Some(id) {
            self.current = None;
        }
        Ok(removed)
    }

    pub fn toggle_completion(&mut self, id: Uuid) -> Result<&Task> {
        let index = self.index_of(id)?;
        let mut next = self.tasks.clone();
        let task = &mut next[index];
        task.is_completed = !task.is_completed;
        task.completed_at = task.is_completed.then(Utc::now);
        self.commit(next)?;
        Ok(&self.tasks[index])
    }

    /// Count one finished pomodoro. Completes the task once the estimate is reached.
    pub fn increment_pomodoro(&mut self, id: Uuid) -> Result<&Task> {
        let index = self.index_of(id)?;
        let mut next = self.tasks.clone();
        let task = &mut next[index];
        task.completed_pomodoros += 1;
        let finished = task.completed_pomodoros >= task.estimated_pomodoros && !task.is_completed;
        if finished {
            task.is_completed = true;
            task.completed_at = Some(Utc::now());
        }
        self.commit(next)?;
        if finished {
            info!(title = %self.tasks[index].title, "task completed");
        }
        Ok(&self.tasks[index])
    }

    pub fn filtered(&self, filter: &TaskFilter, sort: TaskSort, now: DateTime<Utc>) -> Vec<&Task> {
        let today = now.with_timezone(&Local).date_naive();
        let mut out: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| match filter {
                TaskFilter::All => true,
                TaskFilter::Active => !t.is_completed,
                TaskFilter::Completed => t.is_completed,
                TaskFilter::Today => t.is_due_on(today) && !t.is_completed,
                TaskFilter::Overdue => t.is_overdue_at(now),
                TaskFilter::Tag(tag) => t.tags.iter().any(|x| x == tag),
            })
            .collect();

        match sort {
            TaskSort::Priority => out.sort_by(|a, b| b.priority.cmp(&a.priority)),
            TaskSort::DueDate => out.sort_by_key(|t| (t.due_date.is_none(), t.due_date)),
            TaskSort::Created => out.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            TaskSort::Title => out.sort_by_key(|t| t.title.to_lowercase()),
        }
        out
    }

    // ── Counters ─────────────────────────────────────────────────────

    pub fn active_count(&self) -> usize {
        self.tasks.iter().filter(|t| !t.is_completed).count()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_completed).count()
    }

    pub fn today_count(&self, now: DateTime<Utc>) -> usize {
        self.filtered(&TaskFilter::Today, TaskSort::Priority, now).len()
    }

    pub fn overdue_count(&self, now: DateTime<Utc>) -> usize {
        self.tasks.iter().filter(|t| t.is_overdue_at(now)).count()
    }

    /// Estimated pomodoros across open tasks.
    pub fn total_estimated_pomodoros(&self) -> u32 {
        self.tasks
            .iter()
            .filter(|t| !t.is_completed)
            .map(|t| t.estimated_pomodoros)
            .sum()
    }

    pub fn total_completed_pomodoros(&self) -> u32 {
        self.tasks.iter().map(|t| t.completed_pomodoros).sum()
    }

    // ── Suggestions ──────────────────────────────────────────────────

    /// Overdue, then due today, then in progress, then highest priority.
    pub fn suggest_next_task(&self, now: DateTime<Utc>) -> Option<&Task> {
        let today = now.with_timezone(&Local).date_naive();
        let active: Vec<&Task> = self.tasks.iter().filter(|t| !t.is_completed).collect();

        active
            .iter()
            .find(|t| t.is_overdue_at(now))
            .or_else(|| active.iter().find(|t| t.is_due_on(today)))
            .or_else(|| active.iter().find(|t| t.is_in_progress()))
            .copied()
            .or_else(|| {
                // First of the highest priority, keeping list order on ties.
                let top = active.iter().map(|t| t.priority).max()?;
                active.iter().copied().find(|t| t.priority == top)
            })
    }

    /// Open tasks due today or marked urgent, highest priority first.
    pub fn tasks_for_today(&self, now: DateTime<Utc>) -> Vec<&Task> {
        let today = now.with_timezone(&Local).date_naive();
        let mut out: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| !t.is_completed && (t.is_due_on(today) || t.priority == Priority::Urgent))
            .collect();
        out.sort_by(|a, b| b.priority.cmp(&a.priority));
        out
    }

    pub fn all_tags(&self) -> Vec<String> {
        self.tasks
            .iter()
            .flat_map(|t| t.tags.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn tasks_with_tag(&self, tag: &str) -> Vec<&Task> {
        self.filtered(&TaskFilter::Tag(tag.to_string()), TaskSort::Created, Utc::now())
    }

    // ── Bulk ─────────────────────────────────────────────────────────

    pub fn delete_completed(&mut self) -> Result<usize> {
        let before = self.tasks.len();
        let next: Vec<Task> = self.tasks.iter().filter(|t| !t.is_completed).cloned().collect();
        self.commit(next)?;
        if self.current.is_some() && self.current().is_none() {
            self.current = None;
        }
        Ok(before - self.tasks.len())
    }

    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.tasks)?)
    }

    /// Append tasks from a JSON array. Returns how many were added.
    ///
    /// Imported tasks whose id is already taken get a fresh id, so
    /// re-importing an export duplicates rather than fails. Nothing changes
    /// unless the write succeeds.
    pub fn import_json(&mut self, json: &str) -> Result<usize> {
        let mut imported: Vec<Task> = serde_json::from_str(json)?;
        let mut taken: HashSet<Uuid> = self.tasks.iter().map(|t| t.id).collect();
        for task in &mut imported {
            if !taken.insert(task.id) {
                task.id = Uuid::new_v4();
            }
        }

        let count = imported.len();
        let mut merged = self.tasks.clone();
        merged.extend(imported);
        self.commit(merged)?;
        info!(count, "tasks imported");
        Ok(count)
    }

    fn index_of(&self, id: Uuid) -> Result<usize, ValidationError> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| ValidationError::NotFound {
                kind: "task",
                id: id.to_string(),
            })
    }

    /// Store `next`, then adopt it. A failed write leaves the list as it was.
    fn commit(&mut self, next: Vec<Task>) -> Result<()> {
        if let Some(db) = &self.db {
            db.replace_tasks(&next)?;
        }
        self.tasks = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn task(title: &str, priority: Priority) -> Task {
        let mut t = Task::new(title);
        t.priority = priority;
        t
    }

    #[test]
    fn add_puts_newest_first() {
        let mut manager = TaskManager::in_memory();
        manager.add(Task::new("a")).unwrap();
        manager.add(Task::new("b")).unwrap();
        assert_eq!(manager.tasks()[0].title, "b");
        assert!(manager.add(Task::new("  ")).is_err());
    }

    #[test]
    fn increment_auto_completes_at_estimate() {
        let mut manager = TaskManager::in_memory();
        let mut t = Task::new("Essay");
        t.estimated_pomodoros = 2;
        let id = t.id;
        manager.add(t).unwrap();

        assert!(!manager.increment_pomodoro(id).unwrap().is_completed);
        let done = manager.increment_pomodoro(id).unwrap();
        assert!(done.is_completed);
        assert!(done.completed_at.is_some());
    }

    #[test]
    fn toggle_sets_and_clears_completed_at() {
        let mut manager = TaskManager::in_memory();
        let t = Task::new("Mail");
        let id = t.id;
        manager.add(t).unwrap();
        assert!(manager.toggle_completion(id).unwrap().completed_at.is_some());
        assert!(manager.toggle_completion(id).unwrap().completed_at.is_none());
    }

    #[test]
    fn delete_clears_current() {
        let mut manager = TaskManager::in_memory();
        let t = Task::new("Focus");
        let id = t.id;
        manager.add(t).unwrap();
        manager.set_current(Some(id)).unwrap();
        assert_eq!(manager.current().map(|t| t.id), Some(id));
        manager.delete(id).unwrap();
        assert!(manager.current().is_none());
        assert!(manager.set_current(Some(id)).is_err());
    }

    #[test]
    fn suggestion_order() {
        let now = Utc::now();
        let mut manager = TaskManager::in_memory();

        manager.add(task("low", Priority::Low)).unwrap();
        manager.add(task("high", Priority::High)).unwrap();
        assert_eq!(manager.suggest_next_task(now).unwrap().title, "high");

        let mut started = task("started", Priority::Low);
        started.estimated_pomodoros = 3;
        started.completed_pomodoros = 1;
        manager.add(started).unwrap();
        assert_eq!(manager.suggest_next_task(now).unwrap().title, "started");

        let mut late = task("late", Priority::Low);
        late.due_date = Some(now - Duration::days(1));
        manager.add(late).unwrap();
        assert_eq!(manager.suggest_next_task(now).unwrap().title, "late");
    }

    #[test]
    fn filters_and_sorts() {
        let now = Utc::now();
        let mut manager = TaskManager::in_memory();
        let mut b = task("beta", Priority::Low);
        b.due_date = Some(now + Duration::days(2));
        b.tags = vec!["work".into()];
        let mut a = task("Alpha", Priority::Urgent);
        a.due_date = Some(now + Duration::days(1));
        let mut done = task("gamma", Priority::High);
        done.is_completed = true;
        manager.add(b).unwrap();
        manager.add(a).unwrap();
        manager.add(done).unwrap();

        let titles = |v: Vec<&Task>| v.into_iter().map(|t| t.title.clone()).collect::<Vec<_>>();
        assert_eq!(
            titles(manager.filtered(&TaskFilter::All, TaskSort::Title, now)),
            vec!["Alpha", "beta", "gamma"]
        );
        assert_eq!(
            titles(manager.filtered(&TaskFilter::All, TaskSort::DueDate, now)),
            vec!["Alpha", "beta", "gamma"]
        );
        assert_eq!(
            titles(manager.filtered(&TaskFilter::Active, TaskSort::Priority, now)),
            vec!["Alpha", "beta"]
        );
        assert_eq!(
            titles(manager.filtered(&TaskFilter::Tag("work".into()), TaskSort::Priority, now)),
            vec!["beta"]
        );
        assert_eq!(manager.completed_count(), 1);
        assert_eq!(manager.total_estimated_pomodoros(), 2);
        assert_eq!(titles(manager.tasks_for_today(now)), vec!["Alpha"]);
    }

    #[test]
    fn import_export_and_bulk_delete() {
        let mut manager = TaskManager::in_memory();
        let mut done = Task::new("old");
        done.is_completed = true;
        manager.add(done).unwrap();
        manager.add(Task::new("new")).unwrap();
        let json = manager.export_json().unwrap();

        let mut other = TaskManager::in_memory();
        assert_eq!(other.import_json(&json).unwrap(), 2);
        assert_eq!(other.delete_completed().unwrap(), 1);
        assert_eq!(other.tasks().len(), 1);
        assert!(other.import_json("not json").is_err());
    }

    #[test]
    fn resolve_by_prefix_or_title() {
        let mut manager = TaskManager::in_memory();
        let t = Task::new("Write Report");
        let id = t.id;
        manager.add(t).unwrap();
        assert_eq!(manager.resolve(&id.to_string()[..8]).map(|t| t.id), Some(id));
        assert_eq!(manager.resolve("write report").map(|t| t.id), Some(id));
        assert!(manager.resolve("nothing").is_none());
    }

    #[test]
    fn tasks_persist() {
        let db = Rc::new(Database::open_memory().unwrap());
        let mut manager = TaskManager::load(Rc::clone(&db)).unwrap();
        let mut t = Task::new("Persisted");
        t.tags = vec!["x".into()];
        manager.add(t.clone()).unwrap();
        manager.increment_pomodoro(t.id).unwrap();

        let reloaded = TaskManager::load(db).unwrap();
        assert_eq!(reloaded.tasks().len(), 1);
        assert_eq!(reloaded.tasks()[0].completed_pomodoros, 1);
        assert_eq!(reloaded.all_tags(), vec!["x"]);
    }

    #[test]
    fn reimporting_own_export_duplicates_with_fresh_ids() {
        let db = Rc::new(Database::open_memory().unwrap());
        let mut manager = TaskManager::load(Rc::clone(&db)).unwrap();
        let original = Task::new("Plan sprint");
        let original_id = original.id;
        manager.add(original).unwrap();

        let json = manager.export_json().unwrap();
        assert_eq!(manager.import_json(&json).unwrap(), 1);

        assert_eq!(manager.tasks().len(), 2);
        assert_eq!(manager.tasks()[0].id, original_id);
        assert_ne!(manager.tasks()[1].id, original_id);
        assert_eq!(manager.tasks()[1].title, "Plan sprint");

        let reloaded = TaskManager::load(db).unwrap();
        let ids = |m: &TaskManager| m.tasks().iter().map(|t| t.id).collect::<Vec<_>>();
        assert_eq!(ids(&reloaded), ids(&manager));
    }

    #[test]
    fn failed_import_leaves_tasks_untouched() {
        let mut manager = TaskManager::in_memory();
        manager.add(Task::new("Keep me")).unwrap();
        assert!(manager.import_json("[{\"title\": 3}]").is_err());
        assert_eq!(manager.tasks().len(), 1);
    }
}
