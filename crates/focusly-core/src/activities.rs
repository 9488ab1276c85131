//! Break activity suggestions.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, ValidationError};
use crate::storage::Database;

const CUSTOM_ACTIVITIES_KEY: &str = "custom_activities";
const COMPLETED_ACTIVITIES_KEY: &str = "completed_activities";

/// Suggestions are drawn from this many least-completed candidates.
const SUGGESTION_POOL: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityCategory {
    Physical,
    Mental,
    Social,
    Creative,
    Health,
}

impl ActivityCategory {
    pub const ALL: [ActivityCategory; 5] = [
        ActivityCategory::Physical,
        ActivityCategory::Mental,
        ActivityCategory::Social,
        ActivityCategory::Creative,
        ActivityCategory::Health,
    ];

    pub fn icon(self) -> &'static str {
        match self {
            ActivityCategory::Physical => "figure.walk",
            ActivityCategory::Mental => "brain.head.profile",
            ActivityCategory::Social => "person.2.fill",
            ActivityCategory::Creative => "paintbrush.fill",
            ActivityCategory::Health => "heart.fill",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            ActivityCategory::Physical => "blue",
            ActivityCategory::Mental => "purple",
            ActivityCategory::Social => "green",
            ActivityCategory::Creative => "orange",
            ActivityCategory::Health => "red",
        }
    }
}

impl fmt::Display for ActivityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActivityCategory::Physical => "Physical",
            ActivityCategory::Mental => "Mental",
            ActivityCategory::Social => "Social",
            ActivityCategory::Creative => "Creative",
            ActivityCategory::Health => "Health",
        })
    }
}

impl FromStr for ActivityCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "category".to_string(),
                message: format!("unknown category '{s}'"),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakActivity {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub duration_minutes: u32,
    pub category: ActivityCategory,
    pub icon: String,
    #[serde(default)]
    pub is_custom: bool,
}

impl BreakActivity {
    pub fn custom(
        title: impl Into<String>,
        description: impl Into<String>,
        duration_minutes: u32,
        category: ActivityCategory,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            duration_minutes,
            category,
            icon: category.icon().to_string(),
            is_custom: true,
        }
    }

    /// The twelve activities that always exist.
    pub fn built_in_activities() -> Vec<Self> {
        use ActivityCategory::*;
        let builtin = |id: u128, title: &str, description: &str, minutes, category, icon: &str| Self {
            id: Uuid::from_u128(id),
            title: title.to_string(),
            description: description.to_string(),
            duration_minutes: minutes,
            category,
            icon: icon.to_string(),
            is_custom: false,
        };
        vec![
            builtin(0x1111_1111_1111_1111_1111_1111_1111_1111, "Stretch", "Stand up and stretch your arms, neck, and back", 5, Physical, "figure.flexibility"),
            builtin(0x2222_2222_2222_2222_2222_2222_2222_2222, "Quick Walk", "Take a short walk around your space", 10, Physical, "figure.walk"),
            builtin(0x3333_3333_3333_3333_3333_3333_3333_3333, "Desk Exercises", "Do 10 pushups, squats, or desk yoga", 5, Physical, "dumbbell.fill"),
            builtin(0x4444_4444_4444_4444_4444_4444_4444_4444, "20-20-20 Rule", "Look at something 20 feet away for 20 seconds", 1, Mental, "eye.fill"),
            builtin(0x5555_5555_5555_5555_5555_5555_5555_5555, "Deep Breathing", "Take 5 deep breaths: inhale for 4, hold for 4, exhale for 4", 2, Mental, "wind"),
            builtin(0x6666_6666_6666_6666_6666_6666_6666_6666, "Quick Meditation", "Close your eyes and focus on your breath", 5, Mental, "sparkles"),
            builtin(0x7777_7777_7777_7777_7777_7777_7777_7777, "Hydrate", "Drink a full glass of water", 2, Health, "drop.fill"),
            builtin(0x8888_8888_8888_8888_8888_8888_8888_8888, "Healthy Snack", "Eat some fruit, nuts, or a healthy snack", 5, Health, "leaf.fill"),
            builtin(0x9999_9999_9999_9999_9999_9999_9999_9999, "Quick Chat", "Have a brief conversation with someone", 5, Social, "message.fill"),
            builtin(0xaaaa_aaaa_aaaa_aaaa_aaaa_aaaa_aaaa_aaaa, "Call Someone", "Make a quick call to a friend or family member", 10, Social, "phone.fill"),
            builtin(0xbbbb_bbbb_bbbb_bbbb_bbbb_bbbb_bbbb_bbbb, "Doodle", "Draw or sketch something for fun", 5, Creative, "pencil.and.outline"),
            builtin(0xcccc_cccc_cccc_cccc_cccc_cccc_cccc_cccc, "Listen to Music", "Play your favorite song and enjoy", 5, Creative, "music.note"),
        ]
    }
}

pub struct BreakActivityManager {
    activities: Vec<BreakActivity>,
    completed: HashMap<Uuid, u32>,
    db: Option<Rc<Database>>,
}

impl BreakActivityManager {
    pub fn in_memory() -> Self {
        Self {
            activities: BreakActivity::built_in_activities(),
            completed: HashMap::new(),
            db: None,
        }
    }

    pub fn load(db: Rc<Database>) -> Result<Self> {
        let custom: Vec<BreakActivity> = db
            .kv_get_json(CUSTOM_ACTIVITIES_KEY)?
            .unwrap_or_default();
        let mut activities = BreakActivity::built_in_activities();
        for activity in custom {
            if !activities.iter().any(|a| a.id == activity.id) {
                activities.push(activity);
            }
        }
        let completed = db
            .kv_get_json(COMPLETED_ACTIVITIES_KEY)?
            .unwrap_or_default();
        Ok(Self {
            activities,
            completed,
            db: Some(db),
        })
    }

    pub fn activities(&self) -> &[BreakActivity] {
        &self.activities
    }

    pub fn find(&self, id: Uuid) -> Option<&BreakActivity> {
        self.activities.iter().find(|a| a.id == id)
    }

    pub fn completion_count(&self, id: Uuid) -> u32 {
        self.completed.get(&id).copied().unwrap_or(0)
    }

    pub fn add(&mut self, activity: BreakActivity) -> Result<()> {
        let mut next = self.activities.clone();
        next.push(activity);
        self.save_activities(&next)?;
        self.activities = next;
        Ok(())
    }

    /// Replace a custom activity. Built-ins are refused.
    pub fn update(&mut self, activity: BreakActivity) -> Result<()> {
        let index = self.custom_index(activity.id)?;
        let mut next = self.activities.clone();
        next[index] = activity;
        self.save_activities(&next)?;
        self.activities = next;
        Ok(())
    }

    /// Remove a custom activity. Built-ins are refused.
    pub fn delete(&mut self, id: Uuid) -> Result<BreakActivity> {
        let index = self.custom_index(id)?;
        let mut next = self.activities.clone();
        let removed = next.remove(index);
        self.save_activities(&next)?;
        self.activities = next;
        Ok(removed)
    }

    fn custom_index(&self, id: Uuid) -> Result<usize, ValidationError> {
        let index = self
            .activities
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| ValidationError::NotFound {
                kind: "activity",
                id: id.to_string(),
            })?;
        if !self.activities[index].is_custom {
            return Err(ValidationError::BuiltIn {
                kind: "activity",
                name: self.activities[index].title.clone(),
            });
        }
        Ok(index)
    }

    /// Something that fits in a break of `break_secs`.
    pub fn suggest_activity(&self, break_secs: u64) -> BreakActivity {
        self.suggest_activity_with(break_secs, &mut rand::thread_rng())
    }

    /// Picks randomly among the least-completed activities that fit.
    pub fn suggest_activity_with<R: Rng + ?Sized>(&self, break_secs: u64, rng: &mut R) -> BreakActivity {
        let break_minutes = break_secs / 60;
        let mut suitable: Vec<&BreakActivity> = self
            .activities
            .iter()
            .filter(|a| u64::from(a.duration_minutes) <= break_minutes)
            .collect();
        suitable.sort_by_key(|a| self.completion_count(a.id));
        suitable.truncate(SUGGESTION_POOL);

        match suitable.choose(rng) {
            Some(activity) => (*activity).clone(),
            None => fallback(),
        }
    }

    pub fn suggest_random_activity(&self) -> BreakActivity {
        self.activities
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(fallback)
    }

    pub fn mark_completed(&mut self, id: Uuid) -> Result<u32> {
        let mut next = self.completed.clone();
        let count = next.entry(id).or_insert(0);
        *count += 1;
        let count = *count;
        if let Some(db) = &self.db {
            db.kv_set_json(COMPLETED_ACTIVITIES_KEY, &next)?;
        }
        self.completed = next;
        debug!(%id, count, "break activity completed");
        Ok(count)
    }

    pub fn by_category(&self, category: ActivityCategory) -> Vec<&BreakActivity> {
        self.activities.iter().filter(|a| a.category == category).collect()
    }

    pub fn custom_activities(&self) -> Vec<&BreakActivity> {
        self.activities.iter().filter(|a| a.is_custom).collect()
    }

    pub fn built_in_activities(&self) -> Vec<&BreakActivity> {
        self.activities.iter().filter(|a| !a.is_custom).collect()
    }

    /// Highest completion count; ties go to the earlier activity.
    pub fn most_completed(&self) -> Option<&BreakActivity> {
        let mut best: Option<(&BreakActivity, u32)> = None;
        for activity in &self.activities {
            let count = self.completion_count(activity.id);
            if count > 0 && best.map_or(true, |(_, c)| count > c) {
                best = Some((activity, count));
            }
        }
        best.map(|(activity, _)| activity)
    }

    pub fn total_completed(&self) -> u32 {
        self.completed.values().sum()
    }

    fn save_activities(&self, activities: &[BreakActivity]) -> Result<()> {
        if let Some(db) = &self.db {
            let custom: Vec<&BreakActivity> = activities.iter().filter(|a| a.is_custom).collect();
            db.kv_set_json(CUSTOM_ACTIVITIES_KEY, &custom)?;
        }
        Ok(())
    }
}

fn fallback() -> BreakActivity {
    let mut all = BreakActivity::built_in_activities();
    all.swap_remove(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("health".parse::<ActivityCategory>().unwrap(), ActivityCategory::Health);
        assert_eq!(" Creative ".parse::<ActivityCategory>().unwrap(), ActivityCategory::Creative);
        assert!("napping".parse::<ActivityCategory>().is_err());
    }

    #[test]
    fn twelve_built_ins_across_all_categories() {
        let all = BreakActivity::built_in_activities();
        assert_eq!(all.len(), 12);
        for category in ActivityCategory::ALL {
            assert!(all.iter().any(|a| a.category == category));
        }
        assert_eq!(all[0].title, "Stretch");
    }

    #[test]
    fn suggestion_fits_break() {
        let manager = BreakActivityManager::in_memory();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let pick = manager.suggest_activity_with(120, &mut rng);
            assert!(pick.duration_minutes <= 2, "{} does not fit", pick.title);
        }
    }

    #[test]
    fn suggestion_prefers_least_completed() {
        let mut manager = BreakActivityManager::in_memory();
        // Only three activities fit in two minutes; mark two of them done often.
        for _ in 0..3 {
            manager.mark_completed(Uuid::from_u128(0x4444_4444_4444_4444_4444_4444_4444_4444)).unwrap();
            manager.mark_completed(Uuid::from_u128(0x5555_5555_5555_5555_5555_5555_5555_5555)).unwrap();
        }
        let mut rng = StdRng::seed_from_u64(1);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..100 {
            seen.insert(manager.suggest_activity_with(120, &mut rng).title);
        }
        // All three fit in the pool of five, so all can appear.
        assert!(seen.contains("Hydrate"));
        assert!(seen.len() <= 3);
    }

    #[test]
    fn nothing_fits_falls_back_to_first_built_in() {
        let manager = BreakActivityManager::in_memory();
        let pick = manager.suggest_activity_with(30, &mut StdRng::seed_from_u64(0));
        assert_eq!(pick.title, "Stretch");
    }

    #[test]
    fn completion_statistics() {
        let mut manager = BreakActivityManager::in_memory();
        assert!(manager.most_completed().is_none());
        let doodle = Uuid::from_u128(0xbbbb_bbbb_bbbb_bbbb_bbbb_bbbb_bbbb_bbbb);
        let walk = Uuid::from_u128(0x2222_2222_2222_2222_2222_2222_2222_2222);
        manager.mark_completed(doodle).unwrap();
        manager.mark_completed(walk).unwrap();
        assert_eq!(manager.mark_completed(doodle).unwrap(), 2);
        assert_eq!(manager.most_completed().map(|a| a.id), Some(doodle));
        assert_eq!(manager.total_completed(), 3);
    }

    #[test]
    fn built_ins_are_protected() {
        let mut manager = BreakActivityManager::in_memory();
        let stretch = manager.activities()[0].id;
        assert!(manager.delete(stretch).is_err());
        let mut renamed = manager.activities()[0].clone();
        renamed.title = "Not a stretch".into();
        assert!(manager.update(renamed).is_err());
        assert_eq!(manager.activities()[0].id, stretch);
        assert_ne!(manager.activities()[0].title, "Not a stretch");

        let mine = BreakActivity::custom("Juggle", "Three balls", 3, ActivityCategory::Creative);
        let id = mine.id;
        manager.add(mine).unwrap();
        assert_eq!(manager.custom_activities().len(), 1);
        assert_eq!(manager.by_category(ActivityCategory::Creative).len(), 3);
        manager.delete(id).unwrap();
        assert!(manager.custom_activities().is_empty());
    }

    #[test]
    fn custom_activities_and_counts_persist() {
        let db = Rc::new(Database::open_memory().unwrap());
        let mine = BreakActivity::custom("Juggle", "Three balls", 3, ActivityCategory::Creative);
        {
            let mut manager = BreakActivityManager::load(Rc::clone(&db)).unwrap();
            manager.add(mine.clone()).unwrap();
            manager.mark_completed(mine.id).unwrap();
        }
        let manager = BreakActivityManager::load(db).unwrap();
        assert_eq!(manager.activities().len(), 13);
        assert_eq!(manager.completion_count(mine.id), 1);
    }

    #[test]
    fn updated_custom_activity_survives_reload() {
        let db = Rc::new(Database::open_memory().unwrap());
        let mut mine = BreakActivity::custom("Juggle", "Three balls", 3, ActivityCategory::Creative);
        let mut manager = BreakActivityManager::load(Rc::clone(&db)).unwrap();
        manager.add(mine.clone()).unwrap();
        mine.description = "Four balls".into();
        manager.update(mine.clone()).unwrap();

        let reloaded = BreakActivityManager::load(db).unwrap();
        assert_eq!(reloaded.custom_activities(), vec![&mine]);
        assert_eq!(reloaded.activities(), manager.activities());
    }
}
