//! Habit use-case service.
//!
//! # Responsibility
//! - Create, edit, delete and toggle habits on the in-memory record.
//!
//! # Invariants
//! - Every history mutation refreshes the cached streak.
//! - Editing a habit keeps its id, streak and history.
//! - Callers persist through `StateStore::persist` afterwards.

use crate::engine::streak::{is_done_today, toggle_and_recalculate};
use crate::model::habit::{Habit, DEFAULT_HABIT_PRIORITY};
use crate::model::record::ProductivityRecord;
use crate::service::mutation_error::{require_text, MutationError, MutationResult};
use chrono::NaiveDate;
use log::info;

/// Form input for creating or editing a habit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitDraft {
    pub text: String,
    /// Falls back to `DEFAULT_HABIT_PRIORITY` when absent.
    pub priority: Option<i32>,
}

/// Outcome of toggling a habit for today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HabitToggle {
    pub done_today: bool,
    pub streak: u32,
}

/// Habit mutations over one borrowed record.
pub struct HabitService<'a> {
    record: &'a mut ProductivityRecord,
}

impl<'a> HabitService<'a> {
    pub fn new(record: &'a mut ProductivityRecord) -> Self {
        Self { record }
    }

    /// Appends a new habit and returns its id.
    pub fn add_habit(&mut self, draft: &HabitDraft) -> MutationResult<String> {
        let text = require_text(&draft.text, "text")?;
        let habit = Habit::new(text, draft.priority.unwrap_or(DEFAULT_HABIT_PRIORITY));
        let id = habit.id.clone();
        self.record.habits.push(habit);
        info!("event=habit_add module=service status=ok habit_id={id}");
        Ok(id)
    }

    /// Replaces label and priority of an existing habit.
    pub fn update_habit(&mut self, habit_id: &str, draft: &HabitDraft) -> MutationResult<()> {
        let text = require_text(&draft.text, "text")?;
        let habit = self.find_mut(habit_id)?;
        habit.text = text;
        habit.priority = draft.priority.unwrap_or(DEFAULT_HABIT_PRIORITY);
        Ok(())
    }

    /// Removes a habit together with its history.
    pub fn delete_habit(&mut self, habit_id: &str) -> MutationResult<()> {
        let before = self.record.habits.len();
        self.record.habits.retain(|habit| habit.id != habit_id);
        if self.record.habits.len() == before {
            return Err(MutationError::HabitNotFound(habit_id.to_string()));
        }
        info!("event=habit_delete module=service status=ok habit_id={habit_id}");
        Ok(())
    }

    /// Flips today's completion and refreshes the streak.
    pub fn toggle_today(&mut self, habit_id: &str, today: NaiveDate) -> MutationResult<HabitToggle> {
        let habit = self.find_mut(habit_id)?;
        let done_today = toggle_and_recalculate(habit, today);
        info!(
            "event=habit_toggle module=service status=ok habit_id={} done={} streak={}",
            habit_id, done_today, habit.streak
        );
        Ok(HabitToggle {
            done_today,
            streak: habit.streak,
        })
    }

    /// Marks the first habit whose label contains `fragment`
    /// (case-insensitive) as done today. Already-done habits are left as is.
    ///
    /// Returns the matched habit id and the resulting toggle state.
    pub fn complete_matching(
        &mut self,
        fragment: &str,
        today: NaiveDate,
    ) -> MutationResult<(String, HabitToggle)> {
        let needle = require_text(fragment, "habit text")?.to_lowercase();
        let habit = self
            .record
            .habits
            .iter_mut()
            .find(|habit| habit.text.to_lowercase().contains(&needle))
            .ok_or_else(|| MutationError::HabitNotFound(fragment.trim().to_string()))?;

        if !is_done_today(habit, today) {
            toggle_and_recalculate(habit, today);
        }
        Ok((
            habit.id.clone(),
            HabitToggle {
                done_today: true,
                streak: habit.streak,
            },
        ))
    }

    fn find_mut(&mut self, habit_id: &str) -> MutationResult<&mut Habit> {
        self.record
            .habit_mut(habit_id)
            .ok_or_else(|| MutationError::HabitNotFound(habit_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{HabitDraft, HabitService};
    use crate::engine::streak::is_done_today;
    use crate::model::record::default_record;
    use crate::service::mutation_error::MutationError;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()
    }

    #[test]
    fn add_rejects_blank_text_without_mutating() {
        let mut record = default_record();
        let before = record.clone();
        let err = HabitService::new(&mut record)
            .add_habit(&HabitDraft {
                text: "   ".to_string(),
                priority: None,
            })
            .unwrap_err();
        assert_eq!(err, MutationError::EmptyField("text"));
        assert_eq!(record, before);
    }

    #[test]
    fn add_then_update_keeps_history() {
        let mut record = default_record();
        let mut service = HabitService::new(&mut record);
        let id = service
            .add_habit(&HabitDraft {
                text: " Stretch ".to_string(),
                priority: None,
            })
            .unwrap();
        service.toggle_today(&id, today()).unwrap();
        service
            .update_habit(
                &id,
                &HabitDraft {
                    text: "Stretch 5 mins".to_string(),
                    priority: Some(4),
                },
            )
            .unwrap();

        let habit = record.habit(&id).unwrap();
        assert_eq!(habit.text, "Stretch 5 mins");
        assert_eq!(habit.priority, 4);
        assert_eq!(habit.history.len(), 1);
        assert_eq!(habit.streak, 1);
    }

    #[test]
    fn complete_matching_is_idempotent_for_the_day() {
        let mut record = default_record();
        let mut service = HabitService::new(&mut record);
        let (id, first) = service.complete_matching("water", today()).unwrap();
        let (_, second) = service.complete_matching("WATER", today()).unwrap();

        assert_eq!(id, "habit-4");
        assert_eq!(first, second);
        assert!(is_done_today(record.habit("habit-4").unwrap(), today()));
    }

    #[test]
    fn delete_unknown_habit_is_reported() {
        let mut record = default_record();
        let err = HabitService::new(&mut record)
            .delete_habit("habit-404")
            .unwrap_err();
        assert_eq!(err, MutationError::HabitNotFound("habit-404".to_string()));
    }
}
