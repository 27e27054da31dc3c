//! Import-time merge and overwrite of user-supplied records.
//!
//! # Responsibility
//! - Validate an import candidate before any mutation.
//! - Merge new projects/habits by id, or replace the whole record.
//!
//! # Invariants
//! - A candidate must carry `settings`, `projects` and `habits`.
//! - Validation happens up front; a rejected import mutates nothing.
//! - Merge never overwrites an existing project or habit (first-seen-wins,
//!   also among duplicates inside the import itself).
//! - Overwrite keeps nothing of the prior record.
//! - Streaks of imported habits are recomputed from their history.

use crate::engine::streak::{recalculate_streak, refresh_streaks};
use crate::model::habit::Habit;
use crate::model::project::Project;
use crate::model::record::ProductivityRecord;
use crate::reconcile::load::{backfill, ShapeError};
use chrono::NaiveDate;
use log::info;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Top-level sections every import candidate must contain.
pub const REQUIRED_SECTIONS: [&str; 3] = ["settings", "projects", "habits"];

/// How an accepted candidate is applied to the current record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Append unseen projects/habits; adopt journal only if ours is empty.
    Merge,
    /// Replace the current record entirely.
    Overwrite,
}

impl ImportMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Merge => "merge",
            Self::Overwrite => "overwrite",
        }
    }
}

/// Validation error for import candidates.
#[derive(Debug)]
pub enum ImportError {
    /// Input is not valid JSON.
    Parse(serde_json::Error),
    /// JSON root is not an object.
    NotAnObject,
    /// A required top-level section is absent or null.
    MissingSection(&'static str),
    /// A section is present but its entities cannot be decoded.
    InvalidSection {
        section: &'static str,
        source: serde_json::Error,
    },
    /// The candidate cannot be shaped into a full record for overwrite.
    InvalidRecord(ShapeError),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "import file is not valid JSON: {err}"),
            Self::NotAnObject => write!(f, "import file must contain a JSON object"),
            Self::MissingSection(section) => {
                write!(f, "import file is missing required section `{section}`")
            }
            Self::InvalidSection { section, source } => {
                write!(f, "import section `{section}` is invalid: {source}")
            }
            Self::InvalidRecord(err) => write!(f, "import file cannot replace data: {err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::InvalidSection { source, .. } => Some(source),
            Self::InvalidRecord(err) => Some(err),
            Self::NotAnObject | Self::MissingSection(_) => None,
        }
    }
}

/// A validated import file, ready to be applied in either mode.
#[derive(Debug, Clone)]
pub struct ImportCandidate {
    raw: Value,
    projects: Vec<Project>,
    habits: Vec<Habit>,
    journal: Option<String>,
}

/// What an applied import changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub mode: ImportMode,
    pub projects_added: usize,
    pub projects_skipped: usize,
    pub habits_added: usize,
    pub habits_skipped: usize,
    pub journal_adopted: bool,
}

/// Parses and validates import text.
pub fn parse_import(text: &str) -> Result<ImportCandidate, ImportError> {
    let value: Value = serde_json::from_str(text).map_err(ImportError::Parse)?;
    validate_import(value)
}

/// Validates an already parsed import document.
pub fn validate_import(raw: Value) -> Result<ImportCandidate, ImportError> {
    let root = raw.as_object().ok_or(ImportError::NotAnObject)?;
    for section in REQUIRED_SECTIONS {
        if root.get(section).map_or(true, Value::is_null) {
            return Err(ImportError::MissingSection(section));
        }
    }

    let projects = decode_section(root.get("projects"), "projects")?;
    let mut habits: Vec<Habit> = decode_section(root.get("habits"), "habits")?;
    for habit in &mut habits {
        habit.collapse_history();
    }
    let journal = root
        .get("journal")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(ImportCandidate {
        raw,
        projects,
        habits,
        journal,
    })
}

fn decode_section<T: DeserializeOwned>(
    value: Option<&Value>,
    section: &'static str,
) -> Result<T, ImportError> {
    let value = value.cloned().unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|source| ImportError::InvalidSection { section, source })
}

impl ImportCandidate {
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    /// Applies the candidate to `current`.
    ///
    /// Overwrite shapes the full candidate against `defaults` first; if that
    /// fails nothing is changed.
    pub fn apply(
        self,
        current: &mut ProductivityRecord,
        mode: ImportMode,
        defaults: &ProductivityRecord,
        today: NaiveDate,
    ) -> Result<ImportSummary, ImportError> {
        let summary = match mode {
            ImportMode::Merge => self.merge_into(current, today),
            ImportMode::Overwrite => {
                let mut replacement =
                    backfill(&self.raw, defaults).map_err(ImportError::InvalidRecord)?;
                refresh_streaks(&mut replacement.habits, today);
                let summary = ImportSummary {
                    mode,
                    projects_added: replacement.projects.len(),
                    projects_skipped: 0,
                    habits_added: replacement.habits.len(),
                    habits_skipped: 0,
                    journal_adopted: !replacement.journal.is_empty(),
                };
                *current = replacement;
                summary
            }
        };

        info!(
            "event=import_apply module=reconcile status=ok mode={} projects_added={} habits_added={} journal_adopted={}",
            summary.mode.as_str(),
            summary.projects_added,
            summary.habits_added,
            summary.journal_adopted
        );
        Ok(summary)
    }

    fn merge_into(self, current: &mut ProductivityRecord, today: NaiveDate) -> ImportSummary {
        let mut summary = ImportSummary {
            mode: ImportMode::Merge,
            projects_added: 0,
            projects_skipped: 0,
            habits_added: 0,
            habits_skipped: 0,
            journal_adopted: false,
        };

        let mut project_ids: HashSet<String> =
            current.projects.iter().map(|p| p.id.clone()).collect();
        for project in self.projects {
            if project_ids.insert(project.id.clone()) {
                current.projects.push(project);
                summary.projects_added += 1;
            } else {
                summary.projects_skipped += 1;
            }
        }

        let mut habit_ids: HashSet<String> = current.habits.iter().map(|h| h.id.clone()).collect();
        for mut habit in self.habits {
            if habit_ids.insert(habit.id.clone()) {
                habit.streak = recalculate_streak(&habit, today);
                current.habits.push(habit);
                summary.habits_added += 1;
            } else {
                summary.habits_skipped += 1;
            }
        }

        if let Some(journal) = self.journal {
            if current.journal.is_empty() && !journal.is_empty() {
                current.journal = journal;
                summary.journal_adopted = true;
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_import, ImportError};

    #[test]
    fn rejects_candidate_without_required_sections() {
        let err = parse_import(r#"{"settings": {}, "projects": []}"#).unwrap_err();
        assert!(matches!(err, ImportError::MissingSection("habits")));

        let err = parse_import(r#"{"settings": null, "projects": [], "habits": []}"#).unwrap_err();
        assert!(matches!(err, ImportError::MissingSection("settings")));
    }

    #[test]
    fn rejects_non_json_and_non_object() {
        assert!(matches!(
            parse_import("not json").unwrap_err(),
            ImportError::Parse(_)
        ));
        assert!(matches!(
            parse_import("[]").unwrap_err(),
            ImportError::NotAnObject
        ));
    }

    #[test]
    fn rejects_undecodable_entities() {
        let err = parse_import(r#"{"settings": {}, "projects": [{"id": 1}], "habits": []}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            ImportError::InvalidSection {
                section: "projects",
                ..
            }
        ));
        assert!(err.to_string().contains("projects"));
    }
}
