//! Load-time reconciliation of remote, local and default records.
//!
//! # Responsibility
//! - Pick the authoritative record from up to three sources ranked
//!   remote > local > defaults.
//! - Backfill missing or malformed shape from the compiled defaults.
//!
//! # Invariants
//! - Top-level fields merge shallowly; `settings` merges per sub-key and
//!   `schedule` per weekday, per day field and per gym field.
//! - JSON `null` means "not set" and never overrides a default.
//! - A scalar override is accepted only when its JSON kind matches the
//!   default's kind; unknown theme identifiers keep the default theme.
//! - Backfilling an already fully shaped record returns it unchanged.
//! - The compiled defaults always yield a record; `reconcile` cannot fail.

use crate::model::record::{ProductivityRecord, Theme};
use log::{info, warn};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Which source the authoritative record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSource {
    Remote,
    Local,
    Defaults,
}

impl RecordSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Local => "local",
            Self::Defaults => "defaults",
        }
    }
}

/// Result of load-time reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub record: ProductivityRecord,
    pub source: RecordSource,
}

/// A snapshot that could not be repaired into a record.
#[derive(Debug)]
pub enum ShapeError {
    /// The snapshot root is not a JSON object.
    NotAnObject,
    /// The merged snapshot still has values of the wrong type.
    Invalid(serde_json::Error),
}

impl Display for ShapeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "snapshot root is not a JSON object"),
            Self::Invalid(err) => write!(f, "snapshot shape is invalid: {err}"),
        }
    }
}

impl Error for ShapeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotAnObject => None,
            Self::Invalid(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for ShapeError {
    fn from(value: serde_json::Error) -> Self {
        Self::Invalid(value)
    }
}

/// Combines the available sources into one authoritative record.
///
/// Remote and local snapshots both go through `backfill`. A snapshot that
/// cannot be repaired is logged and the next-lower-trust source is used.
/// With neither source usable the result is a copy of `defaults`.
pub fn reconcile(
    remote: Option<&Value>,
    local: Option<&Value>,
    defaults: &ProductivityRecord,
) -> Reconciled {
    let candidates = [(remote, RecordSource::Remote), (local, RecordSource::Local)];
    for (snapshot, source) in candidates {
        let Some(snapshot) = snapshot else {
            continue;
        };
        match backfill(snapshot, defaults) {
            Ok(record) => {
                info!(
                    "event=reconcile module=reconcile status=ok source={}",
                    source.as_str()
                );
                return Reconciled { record, source };
            }
            Err(err) => {
                warn!(
                    "event=reconcile module=reconcile status=fallback source={} error={}",
                    source.as_str(),
                    err
                );
            }
        }
    }

    info!("event=reconcile module=reconcile status=ok source=defaults");
    Reconciled {
        record: defaults.clone(),
        source: RecordSource::Defaults,
    }
}

/// Repairs one snapshot against the defaults and decodes it.
///
/// Habit histories come back with at most one entry per date.
pub fn backfill(
    snapshot: &Value,
    defaults: &ProductivityRecord,
) -> Result<ProductivityRecord, ShapeError> {
    let snapshot = snapshot.as_object().ok_or(ShapeError::NotAnObject)?;
    let Value::Object(base) = serde_json::to_value(defaults)? else {
        return Err(ShapeError::NotAnObject);
    };
    let merged = merge_record(base, snapshot);
    let mut record: ProductivityRecord = serde_json::from_value(Value::Object(merged))?;
    for habit in &mut record.habits {
        habit.collapse_history();
    }
    Ok(record)
}

/// Merges a snapshot over the default record's JSON form.
///
/// Top-level fields follow the same kind rule as nested scalars, so one
/// wrong-typed field keeps its default instead of sinking the snapshot.
pub fn merge_record(mut base: Map<String, Value>, snapshot: &Map<String, Value>) -> Map<String, Value> {
    for (key, value) in snapshot {
        if value.is_null() {
            continue;
        }
        match key.as_str() {
            "settings" => merge_nested(&mut base, key, value, merge_settings),
            "schedule" => merge_nested(&mut base, key, value, merge_schedule),
            _ => merge_scalar(&mut base, key, value),
        }
    }
    base
}

fn merge_nested(
    base: &mut Map<String, Value>,
    key: &str,
    value: &Value,
    merge: fn(&mut Map<String, Value>, &Map<String, Value>),
) {
    let Some(overlay) = value.as_object() else {
        return;
    };
    if let Some(Value::Object(target)) = base.get_mut(key) {
        merge(target, overlay);
    }
}

fn merge_settings(target: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, value) in overlay {
        if key == "theme" {
            if value.as_str().and_then(Theme::parse).is_some() {
                target.insert(key.clone(), value.clone());
            }
            continue;
        }
        merge_scalar(target, key, value);
    }
}

fn merge_schedule(target: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (day_key, default_day) in target.iter_mut() {
        let (Value::Object(day), Some(Value::Object(remote_day))) =
            (default_day, overlay.get(day_key))
        else {
            continue;
        };
        merge_day(day, remote_day);
    }
}

fn merge_day(target: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, value) in overlay {
        match key.as_str() {
            "gym" => merge_nested(target, key, value, merge_gym),
            "classes" | "otherTasks" => {
                if value.is_array() {
                    target.insert(key.clone(), value.clone());
                }
            }
            _ => merge_scalar(target, key, value),
        }
    }
}

fn merge_gym(target: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, value) in overlay {
        if key == "workout" {
            if value.is_array() {
                target.insert(key.clone(), value.clone());
            }
            continue;
        }
        merge_scalar(target, key, value);
    }
}

/// Overrides a default scalar when the overlay value has the same JSON kind.
/// Keys unknown to the defaults are carried along untouched.
fn merge_scalar(target: &mut Map<String, Value>, key: &str, value: &Value) {
    let accept = match target.get(key) {
        Some(existing) => same_kind(existing, value),
        None => !value.is_null(),
    };
    if accept {
        target.insert(key.to_string(), value.clone());
    }
}

fn same_kind(left: &Value, right: &Value) -> bool {
    matches!(
        (left, right),
        (Value::Bool(_), Value::Bool(_))
            | (Value::Number(_), Value::Number(_))
            | (Value::String(_), Value::String(_))
            | (Value::Array(_), Value::Array(_))
            | (Value::Object(_), Value::Object(_))
    )
}
