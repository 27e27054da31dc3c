//! Project and task domain model.
//!
//! # Responsibility
//! - Define projects with their nested task lists.
//!
//! # Invariants
//! - `ProjectStatus::Archived` is a first-class state, not a deletion marker.
//! - Deleted projects/tasks are removed from their parent sequence.

use crate::model::dates::optional_civil_date;
use crate::model::new_entity_id;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Priority assigned to tasks created without an explicit rank.
pub const DEFAULT_TASK_PRIORITY: i32 = 2;

/// Project lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    Archived,
}

/// A project with an ordered task list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub description: String,
    /// Serialized as `""` when unset.
    #[serde(default, with = "optional_civil_date")]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// Actionable item inside a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default = "default_task_priority")]
    pub priority: i32,
}

fn default_task_priority() -> i32 {
    DEFAULT_TASK_PRIORITY
}

impl Project {
    /// Creates an active project with a fresh id and no tasks.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        deadline: Option<NaiveDate>,
    ) -> Self {
        Self {
            id: new_entity_id("proj"),
            name: name.into(),
            status: ProjectStatus::Active,
            description: description.into(),
            deadline,
            tasks: Vec::new(),
        }
    }

    pub fn is_archived(&self) -> bool {
        self.status == ProjectStatus::Archived
    }

    /// Returns `(done, total)` task counts.
    pub fn progress(&self) -> (usize, usize) {
        let done = self.tasks.iter().filter(|task| task.done).count();
        (done, self.tasks.len())
    }
}

impl Task {
    /// Creates an open task with a fresh id.
    pub fn new(text: impl Into<String>, priority: i32) -> Self {
        Self {
            id: new_entity_id("task"),
            text: text.into(),
            done: false,
            priority,
        }
    }
}
