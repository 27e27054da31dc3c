//! Habit completion and streak derivation.
//!
//! # Responsibility
//! - Answer "done on date" questions over a habit history.
//! - Upsert today's completion entry.
//! - Derive the consecutive-day streak from history.
//!
//! # Invariants
//! - Functions are pure except `toggle_today`/`toggle_and_recalculate`, which
//!   mutate only the habit passed in.
//! - `recalculate_streak` depends only on the set of distinct done-dates; entry
//!   order, duplicates and the cached `streak` field are ignored.
//! - Day differences use civil dates, so DST transitions and capture
//!   timezones cannot shift a streak.

use crate::model::habit::{Habit, HabitEntry};
use chrono::{Local, NaiveDate};
use std::collections::BTreeSet;

/// Current local civil date.
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

/// Returns whether the habit's entry for `today` is marked done.
///
/// A missing entry counts as not done.
pub fn is_done_today(habit: &Habit, today: NaiveDate) -> bool {
    habit.entry_on(today).is_some_and(|entry| entry.done)
}

/// Flips today's entry, or appends `{today, done: true}` when none exists.
///
/// Returns the resulting done state. Never creates a second entry for the
/// same date. Does not touch the cached streak; see `toggle_and_recalculate`.
pub fn toggle_today(habit: &mut Habit, today: NaiveDate) -> bool {
    match habit.history.iter_mut().find(|entry| entry.date == today) {
        Some(entry) => {
            entry.done = !entry.done;
            entry.done
        }
        None => {
            habit.history.push(HabitEntry::new(today, true));
            true
        }
    }
}

/// Toggles today's entry and refreshes the cached streak.
pub fn toggle_and_recalculate(habit: &mut Habit, today: NaiveDate) -> bool {
    let done = toggle_today(habit, today);
    habit.streak = recalculate_streak(habit, today);
    done
}

/// Recomputes the cached streak of every habit as of `today`.
pub fn refresh_streaks(habits: &mut [Habit], today: NaiveDate) {
    for habit in habits {
        habit.streak = recalculate_streak(habit, today);
    }
}

/// Derives the streak of consecutive done-days ending today or yesterday.
///
/// Returns 0 when nothing is done or the latest done-date is older than
/// yesterday. Done-dates in the future relative to `today` are ignored.
pub fn recalculate_streak(habit: &Habit, today: NaiveDate) -> u32 {
    let done_dates: BTreeSet<NaiveDate> = habit
        .history
        .iter()
        .filter(|entry| entry.done && entry.date <= today)
        .map(|entry| entry.date)
        .collect();

    let mut descending = done_dates.iter().rev();
    let Some(&latest) = descending.next() else {
        return 0;
    };
    if today.signed_duration_since(latest).num_days() > 1 {
        return 0;
    }

    let mut streak = 1;
    let mut previous = latest;
    for &date in descending {
        if previous.signed_duration_since(date).num_days() != 1 {
            break;
        }
        streak += 1;
        previous = date;
    }
    streak
}
