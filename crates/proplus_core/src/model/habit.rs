//! Habit domain model.
//!
//! # Responsibility
//! - Define the habit record and its date-stamped completion history.
//!
//! # Invariants
//! - `history` holds at most one entry per calendar date.
//! - `streak` is a cache derived from `history`; see `crate::engine::streak`.

use crate::model::dates::civil_date;
use crate::model::new_entity_id;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Priority assigned to habits created without an explicit rank.
pub const DEFAULT_HABIT_PRIORITY: i32 = 3;

/// One tracked habit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: String,
    /// Display label.
    pub text: String,
    /// Higher values sort first.
    #[serde(default)]
    pub priority: i32,
    /// Cached consecutive-day count. Never trusted as ground truth.
    #[serde(default)]
    pub streak: u32,
    #[serde(default)]
    pub history: Vec<HabitEntry>,
}

/// Completion state of a habit on one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitEntry {
    #[serde(with = "civil_date")]
    pub date: NaiveDate,
    pub done: bool,
}

impl Habit {
    /// Creates a habit with a fresh id, zero streak and empty history.
    pub fn new(text: impl Into<String>, priority: i32) -> Self {
        Self::with_id(new_entity_id("habit"), text, priority)
    }

    /// Creates a habit with a caller-provided id.
    ///
    /// Used for compiled defaults and import paths where ids already exist.
    pub fn with_id(id: impl Into<String>, text: impl Into<String>, priority: i32) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            priority,
            streak: 0,
            history: Vec::new(),
        }
    }

    /// Returns the history entry recorded for `date`, if any.
    pub fn entry_on(&self, date: NaiveDate) -> Option<&HabitEntry> {
        self.history.iter().find(|entry| entry.date == date)
    }

    /// Merges entries sharing a date into the first one; the merged entry is
    /// done when any of them was.
    ///
    /// Foreign data can carry duplicates once timestamps are truncated to
    /// calendar dates.
    pub fn collapse_history(&mut self) {
        let mut first_index: HashMap<NaiveDate, usize> = HashMap::new();
        let mut collapsed: Vec<HabitEntry> = Vec::with_capacity(self.history.len());
        for entry in self.history.drain(..) {
            match first_index.get(&entry.date) {
                Some(&index) => collapsed[index].done |= entry.done,
                None => {
                    first_index.insert(entry.date, collapsed.len());
                    collapsed.push(entry);
                }
            }
        }
        self.history = collapsed;
    }
}

impl HabitEntry {
    pub fn new(date: NaiveDate, done: bool) -> Self {
        Self { date, done }
    }
}
