//! Weekly schedule domain model.
//!
//! # Responsibility
//! - Define the fixed seven-day schedule and its event kinds.
//! - Map between `chrono::Weekday` and the lowercase wire keys.
//!
//! # Invariants
//! - A schedule always carries all seven weekdays.
//! - Every `DaySchedule` has all four fields present; absence is repaired by
//!   reconciliation, never represented here.
//! - A gym session with an empty `title` means "no session scheduled".

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// Weekdays in display order, Monday first.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Returns the lowercase wire key for a weekday (`monday`..`sunday`).
pub fn weekday_key(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// Returns the display name for a weekday (`Monday`..`Sunday`).
pub fn weekday_display_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Parses a weekday wire key, case-insensitive and whitespace tolerant.
pub fn parse_weekday_key(value: &str) -> Option<Weekday> {
    let normalized = value.trim().to_ascii_lowercase();
    WEEKDAYS
        .into_iter()
        .find(|day| weekday_key(*day) == normalized)
}

/// The full week, keyed by lowercase weekday name on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub monday: DaySchedule,
    pub tuesday: DaySchedule,
    pub wednesday: DaySchedule,
    pub thursday: DaySchedule,
    pub friday: DaySchedule,
    pub saturday: DaySchedule,
    pub sunday: DaySchedule,
}

impl Schedule {
    /// Builds a week of empty days.
    pub fn empty() -> Self {
        Self {
            monday: DaySchedule::empty(Weekday::Mon),
            tuesday: DaySchedule::empty(Weekday::Tue),
            wednesday: DaySchedule::empty(Weekday::Wed),
            thursday: DaySchedule::empty(Weekday::Thu),
            friday: DaySchedule::empty(Weekday::Fri),
            saturday: DaySchedule::empty(Weekday::Sat),
            sunday: DaySchedule::empty(Weekday::Sun),
        }
    }

    pub fn day(&self, day: Weekday) -> &DaySchedule {
        match day {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }

    pub fn day_mut(&mut self, day: Weekday) -> &mut DaySchedule {
        match day {
            Weekday::Mon => &mut self.monday,
            Weekday::Tue => &mut self.tuesday,
            Weekday::Wed => &mut self.wednesday,
            Weekday::Thu => &mut self.thursday,
            Weekday::Fri => &mut self.friday,
            Weekday::Sat => &mut self.saturday,
            Weekday::Sun => &mut self.sunday,
        }
    }
}

/// Everything planned on one weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySchedule {
    /// Display name, e.g. `Monday`.
    pub day: String,
    pub classes: Vec<ScheduleEvent>,
    pub gym: GymSession,
    pub other_tasks: Vec<ScheduleEvent>,
}

impl DaySchedule {
    pub fn empty(day: Weekday) -> Self {
        Self {
            day: weekday_display_name(day).to_string(),
            classes: Vec::new(),
            gym: GymSession::none(),
            other_tasks: Vec::new(),
        }
    }

    /// Returns `(time, label)` pairs for every scheduled item of the day:
    /// classes, then the gym session when one is set, then other tasks.
    pub fn agenda(&self) -> Vec<(&str, &str)> {
        let mut items: Vec<(&str, &str)> = self
            .classes
            .iter()
            .map(|event| (event.time.as_str(), event.name.as_str()))
            .collect();
        if self.gym.is_scheduled() {
            items.push((self.gym.time.as_str(), self.gym.title.as_str()));
        }
        items.extend(
            self.other_tasks
                .iter()
                .map(|event| (event.time.as_str(), event.name.as_str())),
        );
        items
    }
}

/// A timed entry in `classes` or `otherTasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEvent {
    pub id: String,
    pub name: String,
    /// Formatted `HH:MM - HH:MM`.
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// The single gym slot of a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GymSession {
    pub id: String,
    /// Empty means no session is scheduled.
    pub title: String,
    pub time: String,
    #[serde(default)]
    pub workout: Vec<Exercise>,
}

impl GymSession {
    /// The "no session" sentinel.
    pub fn none() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            time: String::new(),
            workout: Vec::new(),
        }
    }

    pub fn is_scheduled(&self) -> bool {
        !self.title.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub exercise: String,
    pub sets_reps: String,
}
