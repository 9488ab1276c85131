use clap::Subcommand;
use focusly_core::{ActivityCategory, BreakActivity, BreakActivityManager};

use super::{open_db, print_json, CmdResult};

#[derive(Subcommand)]
pub enum ActivityAction {
    /// Suggest something to do during a break
    Suggest {
        /// Break length in minutes; omit for any activity
        #[arg(long)]
        minutes: Option<u64>,
    },
    /// List activities
    List {
        /// physical, mental, social, creative or health
        #[arg(long)]
        category: Option<String>,
        /// Only user-created activities
        #[arg(long)]
        custom: bool,
        #[arg(long)]
        json: bool,
    },
    /// Record that an activity was done
    Done {
        /// Activity title or id
        activity: String,
    },
    /// Create a custom activity
    Add {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "5")]
        minutes: u32,
        #[arg(long, default_value = "physical")]
        category: String,
    },
    /// Delete a custom activity
    Delete {
        activity: String,
    },
    /// Completion counts
    Stats,
}

fn find<'a>(manager: &'a BreakActivityManager, needle: &str) -> Result<&'a BreakActivity, String> {
    needle
        .parse()
        .ok()
        .and_then(|id| manager.find(id))
        .or_else(|| {
            manager
                .activities()
                .iter()
                .find(|a| a.title.eq_ignore_ascii_case(needle))
        })
        .ok_or_else(|| format!("no activity named '{needle}'"))
}

fn print_activity(manager: &BreakActivityManager, activity: &BreakActivity) {
    println!(
        "{:<24} {:>3} min  {:<9} done {}x  {}",
        activity.title,
        activity.duration_minutes,
        activity.category.to_string(),
        manager.completion_count(activity.id),
        activity.description
    );
}

pub fn run(action: ActivityAction) -> CmdResult {
    let mut activities = BreakActivityManager::load(open_db()?)?;

    match action {
        ActivityAction::Suggest { minutes } => {
            let activity = match minutes {
                Some(m) => activities.suggest_activity(m * 60),
                None => activities.suggest_random_activity(),
            };
            println!("{}: {}", activity.title, activity.description);
        }
        ActivityAction::List {
            category,
            custom,
            json,
        } => {
            let mut listed: Vec<&BreakActivity> = match category {
                Some(c) => activities.by_category(c.parse::<ActivityCategory>()?),
                None => activities.activities().iter().collect(),
            };
            if custom {
                listed.retain(|a| a.is_custom);
            }
            if json {
                print_json(&listed)?;
            } else {
                for activity in listed {
                    print_activity(&activities, activity);
                }
            }
        }
        ActivityAction::Done { activity } => {
            let found = find(&activities, &activity)?;
            let (id, title) = (found.id, found.title.clone());
            let count = activities.mark_completed(id)?;
            println!("{title} done ({count} times)");
        }
        ActivityAction::Add {
            title,
            description,
            minutes,
            category,
        } => {
            let activity = BreakActivity::custom(title, description, minutes, category.parse::<ActivityCategory>()?);
            let id = activity.id;
            activities.add(activity)?;
            println!("added {id}");
        }
        ActivityAction::Delete { activity } => {
            let id = find(&activities, &activity)?.id;
            let removed = activities.delete(id)?;
            println!("deleted {}", removed.title);
        }
        ActivityAction::Stats => {
            println!("Total completed: {}", activities.total_completed());
            if let Some(top) = activities.most_completed() {
                println!("Favourite:       {}", top.title);
            }
            println!(
                "Built-in: {}  Custom: {}",
                activities.built_in_activities().len(),
                activities.custom_activities().len()
            );
        }
    }
    Ok(())
}
