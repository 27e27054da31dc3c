//! Validation and lookup errors shared by mutation services.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub type MutationResult<T> = Result<T, MutationError>;

/// Error returned by mutation entry points before any change is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    /// A required text field is empty after trimming.
    EmptyField(&'static str),
    /// A clock time is not `HH:MM`.
    InvalidTime(String),
    /// A date is not `YYYY-MM-DD`.
    InvalidDate(String),
    /// Not one of the known theme identifiers.
    UnknownTheme(String),
    /// Not one of `monday`..`sunday`.
    UnknownWeekday(String),
    HabitNotFound(String),
    ProjectNotFound(String),
    TaskNotFound { project_id: String, task_id: String },
    EventNotFound { day: String, event_id: String },
}

impl Display for MutationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "`{field}` must not be empty"),
            Self::InvalidTime(value) => write!(f, "invalid time `{value}`; expected HH:MM"),
            Self::InvalidDate(value) => write!(f, "invalid date `{value}`; expected YYYY-MM-DD"),
            Self::UnknownTheme(value) => write!(f, "unknown theme `{value}`"),
            Self::UnknownWeekday(value) => write!(f, "unknown weekday `{value}`"),
            Self::HabitNotFound(id) => write!(f, "habit not found: {id}"),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::TaskNotFound {
                project_id,
                task_id,
            } => write!(f, "task not found: {task_id} in project {project_id}"),
            Self::EventNotFound { day, event_id } => {
                write!(f, "schedule event not found: {event_id} on {day}")
            }
        }
    }
}

impl Error for MutationError {}

/// Trims `value` and rejects it when empty.
pub(crate) fn require_text(value: &str, field: &'static str) -> MutationResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(MutationError::EmptyField(field));
    }
    Ok(trimmed.to_string())
}
