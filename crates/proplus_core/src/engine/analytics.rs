//! Read-only habit projections for dashboard widgets.

use crate::model::habit::Habit;
use chrono::{Days, NaiveDate};

/// Number of days covered by `weekly_completions`.
pub const WEEK_WINDOW_DAYS: u64 = 7;

/// Counts habits marked done on `date`.
pub fn completions_on(habits: &[Habit], date: NaiveDate) -> usize {
    habits
        .iter()
        .filter(|habit| habit.entry_on(date).is_some_and(|entry| entry.done))
        .count()
}

/// Returns `(date, completed_habits)` for the last seven days, oldest first,
/// ending with `today`.
pub fn weekly_completions(habits: &[Habit], today: NaiveDate) -> Vec<(NaiveDate, usize)> {
    (0..WEEK_WINDOW_DAYS)
        .rev()
        .filter_map(|ago| today.checked_sub_days(Days::new(ago)))
        .map(|date| (date, completions_on(habits, date)))
        .collect()
}

/// Returns habits ordered for display: higher priority first, stable for ties.
pub fn habits_by_priority(habits: &[Habit]) -> Vec<&Habit> {
    let mut ordered: Vec<&Habit> = habits.iter().collect();
    ordered.sort_by(|left, right| right.priority.cmp(&left.priority));
    ordered
}
