//! Weekly schedule use-case service.
//!
//! # Responsibility
//! - Add, edit and remove classes, other tasks and the gym session of a day.
//! - Import schedule rows from CSV.
//!
//! # Invariants
//! - Event times are stored as `HH:MM - HH:MM`.
//! - Editing an event keeps its id, even when its kind changes.
//! - Removing the gym session restores the empty-title sentinel.
//! - CSV import is all-or-nothing: zero importable rows changes nothing.

use crate::model::new_entity_id;
use crate::model::schedule::{
    parse_weekday_key, weekday_key, DaySchedule, Exercise, GymSession, Schedule, ScheduleEvent,
};
use crate::service::mutation_error::{require_text, MutationError, MutationResult};
use chrono::Weekday;
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

static CLOCK_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("valid clock time regex"));

const CSV_REQUIRED_HEADERS: [&str; 4] = ["day", "start time", "end time", "subject"];

/// Which slot of a day an event lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Class,
    OtherTask,
    Gym,
}

impl EventKind {
    fn id_prefix(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::OtherTask => "otherTask",
            Self::Gym => "gym",
        }
    }

    /// Parses the CSV `Type` column. Empty means `Class`.
    pub fn parse(value: &str) -> Option<EventKind> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "class" => Some(Self::Class),
            "othertask" | "task" => Some(Self::OtherTask),
            "gym" => Some(Self::Gym),
            _ => None,
        }
    }
}

/// Form input for a schedule event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEventDraft {
    pub kind: EventKind,
    pub name: String,
    /// `HH:MM`.
    pub start: String,
    /// `HH:MM`.
    pub end: String,
    /// Only kept for classes.
    pub location: Option<String>,
    /// Only kept for gym sessions; entries with an empty exercise are dropped.
    pub workout: Vec<Exercise>,
}

/// Result of a CSV import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

/// CSV import failure; nothing was changed.
#[derive(Debug)]
pub enum CsvImportError {
    Csv(csv::Error),
    MissingHeaders(Vec<&'static str>),
    NoEvents,
}

impl Display for CsvImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv(err) => write!(f, "unreadable CSV: {err}"),
            Self::MissingHeaders(headers) => write!(
                f,
                "invalid CSV format; missing headers: {}",
                headers.join(", ")
            ),
            Self::NoEvents => write!(f, "no valid events found in the CSV file"),
        }
    }
}

impl Error for CsvImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Csv(err) => Some(err),
            _ => None,
        }
    }
}

impl From<csv::Error> for CsvImportError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

/// Parses a weekday key such as `monday`.
pub fn parse_day(value: &str) -> MutationResult<Weekday> {
    parse_weekday_key(value).ok_or_else(|| MutationError::UnknownWeekday(value.trim().to_string()))
}

/// Schedule mutations over one borrowed schedule.
pub struct ScheduleService<'a> {
    schedule: &'a mut Schedule,
}

impl<'a> ScheduleService<'a> {
    pub fn new(schedule: &'a mut Schedule) -> Self {
        Self { schedule }
    }

    /// Adds an event, or replaces `existing` (kind, id) with the draft.
    ///
    /// Returns the id of the stored event. Validation and lookup happen before
    /// the day is touched.
    pub fn upsert_event(
        &mut self,
        day: Weekday,
        draft: &ScheduleEventDraft,
        existing: Option<(EventKind, &str)>,
    ) -> MutationResult<String> {
        let name = require_text(&draft.name, "name")?;
        let time = format_time_range(&draft.start, &draft.end)?;
        let slot = self.schedule.day_mut(day);

        if let Some((kind, event_id)) = existing {
            if !contains_event(slot, kind, event_id) {
                return Err(MutationError::EventNotFound {
                    day: weekday_key(day).to_string(),
                    event_id: event_id.to_string(),
                });
            }
            remove_from_day(slot, kind, event_id);
        }

        let id = existing
            .map(|(_, event_id)| event_id.to_string())
            .unwrap_or_else(|| new_entity_id(draft.kind.id_prefix()));

        match draft.kind {
            EventKind::Class => slot.classes.push(ScheduleEvent {
                id: id.clone(),
                name,
                time,
                location: draft
                    .location
                    .as_deref()
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(str::to_string),
            }),
            EventKind::OtherTask => slot.other_tasks.push(ScheduleEvent {
                id: id.clone(),
                name,
                time,
                location: None,
            }),
            EventKind::Gym => {
                slot.gym = GymSession {
                    id: id.clone(),
                    title: name,
                    time,
                    workout: draft
                        .workout
                        .iter()
                        .filter(|entry| !entry.exercise.trim().is_empty())
                        .cloned()
                        .collect(),
                }
            }
        }

        info!(
            "event=schedule_upsert module=service status=ok day={} event_id={}",
            weekday_key(day),
            id
        );
        Ok(id)
    }

    /// Removes one event; removing the gym session resets it to the sentinel.
    pub fn remove_event(&mut self, day: Weekday, kind: EventKind, event_id: &str) -> MutationResult<()> {
        let slot = self.schedule.day_mut(day);
        if !contains_event(slot, kind, event_id) {
            return Err(MutationError::EventNotFound {
                day: weekday_key(day).to_string(),
                event_id: event_id.to_string(),
            });
        }
        remove_from_day(slot, kind, event_id);
        Ok(())
    }

    /// Imports rows with headers `Day, Start Time, End Time, Subject` and
    /// optional `Location, Type`.
    ///
    /// Rows naming an unknown day or type are skipped. Gym rows replace the
    /// day's gym session.
    pub fn import_csv(&mut self, text: &str) -> Result<CsvImportSummary, CsvImportError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let columns: HashMap<String, usize> = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(index, header)| (header.trim().to_ascii_lowercase(), index))
            .collect();
        let missing: Vec<&'static str> = CSV_REQUIRED_HEADERS
            .into_iter()
            .filter(|header| !columns.contains_key(*header))
            .collect();
        if !missing.is_empty() {
            return Err(CsvImportError::MissingHeaders(missing));
        }

        let mut staged = self.schedule.clone();
        let mut summary = CsvImportSummary {
            imported: 0,
            skipped: 0,
        };

        for (row_index, row) in reader.records().enumerate() {
            let row = row?;
            let field = |name: &str| column(&columns, &row, name).to_string();

            let (Some(day), Some(kind)) = (
                parse_weekday_key(&field("day")),
                EventKind::parse(&field("type")),
            ) else {
                summary.skipped += 1;
                continue;
            };

            let id = format!("{}-{}", new_entity_id(kind.id_prefix()), row_index);
            let name = field("subject");
            let time = format!("{} - {}", field("start time"), field("end time"));
            let location = Some(field("location")).filter(|value| !value.is_empty());
            let slot = staged.day_mut(day);
            match kind {
                EventKind::Class => slot.classes.push(ScheduleEvent {
                    id,
                    name,
                    time,
                    location,
                }),
                EventKind::OtherTask => slot.other_tasks.push(ScheduleEvent {
                    id,
                    name,
                    time,
                    location,
                }),
                EventKind::Gym => {
                    slot.gym = GymSession {
                        id,
                        title: name,
                        time,
                        workout: Vec::new(),
                    }
                }
            }
            summary.imported += 1;
        }

        if summary.imported == 0 {
            warn!("event=schedule_csv_import module=service status=error error_code=no_events");
            return Err(CsvImportError::NoEvents);
        }

        *self.schedule = staged;
        info!(
            "event=schedule_csv_import module=service status=ok imported={} skipped={}",
            summary.imported, summary.skipped
        );
        Ok(summary)
    }
}

/// Builds `HH:MM - HH:MM` after validating both ends.
pub fn format_time_range(start: &str, end: &str) -> MutationResult<String> {
    let start = validate_clock_time(start)?;
    let end = validate_clock_time(end)?;
    Ok(format!("{start} - {end}"))
}

fn validate_clock_time(value: &str) -> MutationResult<&str> {
    let trimmed = value.trim();
    if CLOCK_TIME_RE.is_match(trimmed) {
        Ok(trimmed)
    } else {
        Err(MutationError::InvalidTime(trimmed.to_string()))
    }
}

fn column<'r>(columns: &HashMap<String, usize>, row: &'r csv::StringRecord, name: &str) -> &'r str {
    columns
        .get(name)
        .and_then(|index| row.get(*index))
        .unwrap_or("")
}

fn contains_event(day: &DaySchedule, kind: EventKind, event_id: &str) -> bool {
    match kind {
        EventKind::Class => day.classes.iter().any(|event| event.id == event_id),
        EventKind::OtherTask => day.other_tasks.iter().any(|event| event.id == event_id),
        EventKind::Gym => day.gym.is_scheduled() && day.gym.id == event_id,
    }
}

fn remove_from_day(day: &mut DaySchedule, kind: EventKind, event_id: &str) {
    match kind {
        EventKind::Class => day.classes.retain(|event| event.id != event_id),
        EventKind::OtherTask => day.other_tasks.retain(|event| event.id != event_id),
        EventKind::Gym => day.gym = GymSession::none(),
    }
}
