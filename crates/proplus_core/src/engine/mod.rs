//! Habit engine: pure functions over a habit's completion history.
//!
//! # Responsibility
//! - Membership tests ("done today") and date-keyed toggling.
//! - Streak recalculation and read-only completion projections.
//!
//! # Invariants
//! - Nothing here performs I/O or reads global state; "today" is always an
//!   explicit argument except in `today_local`.

pub mod analytics;
pub mod streak;

pub use analytics::{completions_on, habits_by_priority, weekly_completions};
pub use streak::{
    is_done_today, recalculate_streak, refresh_streaks, today_local, toggle_and_recalculate,
    toggle_today,
};
