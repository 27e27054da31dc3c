//! Root aggregate and compiled defaults.
//!
//! # Responsibility
//! - Define `ProductivityRecord`, the single per-user state tree.
//! - Provide the compiled default record used as the lowest-trust source.
//!
//! # Invariants
//! - The wire format uses the camelCase field names of the persisted record.
//! - `default_record()` is always fully shaped.

use crate::model::habit::Habit;
use crate::model::project::{Project, ProjectStatus, Task};
use crate::model::schedule::Schedule;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Named visual theme identifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    #[serde(rename = "pro-plus-theme")]
    ProPlus,
    #[serde(rename = "crimson-theme")]
    Crimson,
    #[serde(rename = "matrix-theme")]
    Matrix,
    #[serde(rename = "galaxy-theme")]
    Galaxy,
    #[serde(rename = "synthwave-theme")]
    Synthwave,
    #[serde(rename = "deep-sea-theme")]
    DeepSea,
    #[serde(rename = "mobile-theme")]
    Mobile,
    #[serde(rename = "black-hole-theme")]
    BlackHole,
    #[serde(rename = "ocean-waves-theme")]
    OceanWaves,
    #[serde(rename = "rocket-launch-theme")]
    RocketLaunch,
}

impl Theme {
    pub const ALL: [Theme; 10] = [
        Theme::ProPlus,
        Theme::Crimson,
        Theme::Matrix,
        Theme::Galaxy,
        Theme::Synthwave,
        Theme::DeepSea,
        Theme::Mobile,
        Theme::BlackHole,
        Theme::OceanWaves,
        Theme::RocketLaunch,
    ];

    /// Wire identifier, e.g. `pro-plus-theme`.
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::ProPlus => "pro-plus-theme",
            Theme::Crimson => "crimson-theme",
            Theme::Matrix => "matrix-theme",
            Theme::Galaxy => "galaxy-theme",
            Theme::Synthwave => "synthwave-theme",
            Theme::DeepSea => "deep-sea-theme",
            Theme::Mobile => "mobile-theme",
            Theme::BlackHole => "black-hole-theme",
            Theme::OceanWaves => "ocean-waves-theme",
            Theme::RocketLaunch => "rocket-launch-theme",
        }
    }

    /// Parses a wire identifier. Unknown values return `None`.
    pub fn parse(value: &str) -> Option<Theme> {
        let normalized = value.trim();
        Theme::ALL
            .into_iter()
            .find(|theme| theme.as_str() == normalized)
    }
}

/// User preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub theme: Theme,
    /// Whether UI sounds are enabled. Stored under `sounds`.
    #[serde(rename = "sounds")]
    pub sounds_enabled: bool,
    pub user_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::ProPlus,
            sounds_enabled: true,
            user_name: String::new(),
        }
    }
}

/// The single per-user productivity state tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductivityRecord {
    pub settings: Settings,
    pub schedule: Schedule,
    pub habits: Vec<Habit>,
    pub projects: Vec<Project>,
    pub journal: String,
    /// Overwritten with the write time before every remote write.
    pub last_updated: DateTime<Utc>,
}

impl ProductivityRecord {
    pub fn habit(&self, habit_id: &str) -> Option<&Habit> {
        self.habits.iter().find(|habit| habit.id == habit_id)
    }

    pub fn habit_mut(&mut self, habit_id: &str) -> Option<&mut Habit> {
        self.habits.iter_mut().find(|habit| habit.id == habit_id)
    }

    pub fn project(&self, project_id: &str) -> Option<&Project> {
        self.projects.iter().find(|project| project.id == project_id)
    }

    pub fn project_mut(&mut self, project_id: &str) -> Option<&mut Project> {
        self.projects
            .iter_mut()
            .find(|project| project.id == project_id)
    }

    /// Projects that are not archived, in stored order.
    pub fn active_projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.iter().filter(|project| !project.is_archived())
    }
}

/// Builds the compiled default record.
///
/// Sample habits and projects give a first-run user something to look at;
/// `last_updated` is the construction time.
pub fn default_record() -> ProductivityRecord {
    let habits = vec![
        default_habit("habit-1", "Read 10 Pages", 5, 3),
        default_habit("habit-2", "Code for 1 hour", 25, 5),
        default_habit("habit-3", "Meditate 10 mins", 12, 2),
        default_habit("habit-4", "Drink 3L Water", 3, 1),
    ];

    let projects = vec![
        Project {
            id: "proj-1".to_string(),
            name: "Personal Website".to_string(),
            status: ProjectStatus::Active,
            description: "Create a new portfolio using Three.js and modern CSS.".to_string(),
            deadline: NaiveDate::from_ymd_opt(2025, 10, 31),
            tasks: vec![
                default_task("task-1", "Design wireframes", true, 3),
                default_task("task-2", "Develop landing page", false, 2),
            ],
        },
        Project {
            id: "proj-2".to_string(),
            name: "AI Productivity App".to_string(),
            status: ProjectStatus::Active,
            description: "Build a prototype for a voice-controlled dashboard.".to_string(),
            deadline: NaiveDate::from_ymd_opt(2025, 12, 15),
            tasks: vec![
                default_task("task-3", "Setup database schema", true, 3),
                default_task("task-4", "Implement voice commands", false, 2),
                default_task("task-5", "Deploy to test server", false, 1),
            ],
        },
    ];

    ProductivityRecord {
        settings: Settings::default(),
        schedule: Schedule::empty(),
        habits,
        projects,
        journal: String::new(),
        last_updated: Utc::now(),
    }
}

fn default_habit(id: &str, text: &str, streak: u32, priority: i32) -> Habit {
    let mut habit = Habit::with_id(id, text, priority);
    habit.streak = streak;
    habit
}

fn default_task(id: &str, text: &str, done: bool, priority: i32) -> Task {
    Task {
        id: id.to_string(),
        text: text.to_string(),
        done,
        priority,
    }
}

#[cfg(test)]
mod tests {
    use super::{default_record, Theme};

    #[test]
    fn theme_wire_names_round_trip() {
        for theme in Theme::ALL {
            let json = serde_json::to_value(theme).unwrap();
            assert_eq!(json, theme.as_str());
            assert_eq!(Theme::parse(theme.as_str()), Some(theme));
        }
        assert_eq!(Theme::parse("vaporwave-theme"), None);
    }

    #[test]
    fn default_record_uses_wire_field_names() {
        let json = serde_json::to_value(default_record()).unwrap();
        assert_eq!(json["settings"]["theme"], "pro-plus-theme");
        assert_eq!(json["settings"]["sounds"], true);
        assert_eq!(json["settings"]["userName"], "");
        assert!(json["lastUpdated"].is_string());
        assert_eq!(json["habits"].as_array().map(Vec::len), Some(4));
        assert_eq!(json["projects"][0]["deadline"], "2025-10-31");
        assert_eq!(json["projects"][0]["status"], "active");
    }

    #[test]
    fn default_habit_streaks_match_seed_data() {
        let streaks: Vec<u32> = default_record()
            .habits
            .iter()
            .map(|habit| habit.streak)
            .collect();
        assert_eq!(streaks, vec![5, 25, 12, 3]);
    }
}
