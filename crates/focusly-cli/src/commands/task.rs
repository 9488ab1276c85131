//! Task management commands for CLI.

use chrono::Utc;
use clap::{Subcommand, ValueEnum};
use focusly_core::{Notification, Priority, Settings, Task, TaskFilter, TaskManager, TaskSort};

use super::{local_time, open_db, parse_datetime, print_json, CmdResult};

#[derive(Clone, Copy, ValueEnum)]
pub enum ListFilter {
    All,
    Active,
    Completed,
    Today,
    Overdue,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SortKey {
    Priority,
    Due,
    Created,
    Title,
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Add {
        /// Task title
        title: String,
        /// low, medium, high or urgent
        #[arg(long, default_value = "medium")]
        priority: String,
        /// Estimated pomodoros
        #[arg(long, default_value = "1")]
        estimate: u32,
        /// Due date, RFC 3339 or YYYY-MM-DD
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Repeatable
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// List tasks
    List {
        #[arg(long, value_enum, default_value = "active")]
        filter: ListFilter,
        /// Only tasks carrying this tag
        #[arg(long)]
        tag: Option<String>,
        #[arg(long, value_enum, default_value = "priority")]
        sort: SortKey,
        #[arg(long)]
        json: bool,
    },
    /// Get task details
    Show {
        /// Task id, id prefix or title
        task: String,
    },
    /// Toggle a task's completion
    Done {
        task: String,
    },
    /// Count one finished pomodoro against a task
    Pomodoro {
        task: String,
    },
    /// Delete a task
    Delete {
        task: String,
    },
    /// Suggest what to work on next
    Next,
    /// Open tasks due today or urgent
    Today,
    /// Every tag in use
    Tags,
    /// Counts and pomodoro totals
    Summary,
    /// Due-soon and overdue reminders
    Reminders,
    /// Remove completed tasks
    ClearCompleted,
    /// Print all tasks as JSON
    Export,
    /// Append tasks from a JSON file
    Import {
        path: std::path::PathBuf,
    },
}

fn resolve<'a>(tasks: &'a TaskManager, needle: &str) -> Result<&'a Task, String> {
    tasks
        .resolve(needle)
        .ok_or_else(|| format!("no task matching '{needle}'"))
}

fn print_task(task: &Task) {
    let check = if task.is_completed { "x" } else { " " };
    let due = task
        .due_date
        .map(|d| format!("  due {}", local_time(d)))
        .unwrap_or_default();
    let tags = if task.tags.is_empty() {
        String::new()
    } else {
        format!("  #{}", task.tags.join(" #"))
    };
    println!(
        "[{check}] {}  {:<32} {:<7} {}/{}{due}{tags}",
        &task.id.to_string()[..8],
        task.title,
        task.priority.to_string(),
        task.completed_pomodoros,
        task.estimated_pomodoros,
    );
}

pub fn run(action: TaskAction) -> CmdResult {
    let mut tasks = TaskManager::load(open_db()?)?;
    let now = Utc::now();

    match action {
        TaskAction::Add {
            title,
            priority,
            estimate,
            due,
            notes,
            tags,
        } => {
            let mut task = Task::new(title);
            task.priority = priority.parse::<Priority>()?;
            task.estimated_pomodoros = estimate.max(1);
            task.due_date = due.as_deref().map(parse_datetime).transpose()?;
            task.notes = notes;
            task.tags = tags;
            let id = task.id;
            tasks.add(task)?;
            println!("Task created: {id}");
        }
        TaskAction::List {
            filter,
            tag,
            sort,
            json,
        } => {
            let filter = match (tag, filter) {
                (Some(tag), _) => TaskFilter::Tag(tag),
                (None, ListFilter::All) => TaskFilter::All,
                (None, ListFilter::Active) => TaskFilter::Active,
                (None, ListFilter::Completed) => TaskFilter::Completed,
                (None, ListFilter::Today) => TaskFilter::Today,
                (None, ListFilter::Overdue) => TaskFilter::Overdue,
            };
            let sort = match sort {
                SortKey::Priority => TaskSort::Priority,
                SortKey::Due => TaskSort::DueDate,
                SortKey::Created => TaskSort::Created,
                SortKey::Title => TaskSort::Title,
            };
            let listed = tasks.filtered(&filter, sort, now);
            if json {
                print_json(&listed)?;
            } else {
                listed.into_iter().for_each(print_task);
            }
        }
        TaskAction::Show { task } => print_json(resolve(&tasks, &task)?)?,
        TaskAction::Done { task } => {
            let id = resolve(&tasks, &task)?.id;
            let task = tasks.toggle_completion(id)?;
            let state = if task.is_completed { "completed" } else { "reopened" };
            println!("{state}: {}", task.title);
        }
        TaskAction::Pomodoro { task } => {
            let id = resolve(&tasks, &task)?.id;
            print_task(tasks.increment_pomodoro(id)?);
        }
        TaskAction::Delete { task } => {
            let id = resolve(&tasks, &task)?.id;
            let removed = tasks.delete(id)?;
            println!("deleted: {}", removed.title);
        }
        TaskAction::Next => match tasks.suggest_next_task(now) {
            Some(task) => print_task(task),
            None => println!("Nothing to do."),
        },
        TaskAction::Today => tasks.tasks_for_today(now).into_iter().for_each(print_task),
        TaskAction::Tags => {
            for tag in tasks.all_tags() {
                println!("{tag} ({})", tasks.tasks_with_tag(&tag).len());
            }
        }
        TaskAction::Summary => {
            println!("Active:     {}", tasks.active_count());
            println!("Completed:  {}", tasks.completed_count());
            println!("Due today:  {}", tasks.today_count(now));
            println!("Overdue:    {}", tasks.overdue_count(now));
            println!(
                "Pomodoros:  {} done, {} estimated for open tasks",
                tasks.total_completed_pomodoros(),
                tasks.total_estimated_pomodoros()
            );
        }
        TaskAction::Reminders => {
            let prefs = Settings::load_or_default().notifications;
            let mut reminders = Vec::new();
            if prefs.task_due_notifications {
                reminders.extend(
                    tasks
                        .tasks()
                        .iter()
                        .filter(|t| !t.is_completed)
                        .filter_map(|t| {
                            let due = t.due_date?;
                            Notification::task_due(&t.id.to_string(), &t.title, due, now)
                        }),
                );
            }
            if prefs.task_overdue_notifications {
                reminders.extend(Notification::overdue_tasks(tasks.overdue_count(now)));
            }
            for reminder in reminders {
                let when = reminder
                    .deliver_at
                    .map(local_time)
                    .unwrap_or_else(|| "now".to_string());
                println!("{when:>16}  {}: {}", reminder.title, reminder.body);
            }
        }
        TaskAction::ClearCompleted => {
            println!("removed {} completed tasks", tasks.delete_completed()?);
        }
        TaskAction::Export => println!("{}", tasks.export_json()?),
        TaskAction::Import { path } => {
            let json = std::fs::read_to_string(&path)?;
            println!("imported {} tasks", tasks.import_json(&json)?);
        }
    }
    Ok(())
}
