//! Calendar-date wire helpers.
//!
//! # Responsibility
//! - Serialize civil dates as `YYYY-MM-DD`.
//! - Accept foreign values that carry a time component by truncating them to
//!   their calendar date.
//!
//! # Invariants
//! - Parsed values never depend on the timezone of capture.

use chrono::NaiveDate;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a calendar date, tolerating a trailing time component.
///
/// `2026-03-01`, `2026-03-01T23:59:00Z` and `2026-03-01 08:00` all map to
/// March 1st.
pub fn parse_civil_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    let date_part = trimmed.get(..10)?;
    if trimmed.len() > 10 && !matches!(trimmed.as_bytes()[10], b'T' | b't' | b' ') {
        return None;
    }
    NaiveDate::parse_from_str(date_part, DATE_FORMAT).ok()
}

/// Formats a calendar date as `YYYY-MM-DD`.
pub fn format_civil_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Serde adapter for required civil dates.
pub mod civil_date {
    use super::{format_civil_date, parse_civil_date};
    use chrono::NaiveDate;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_civil_date(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_civil_date(&raw)
            .ok_or_else(|| D::Error::custom(format!("invalid calendar date `{raw}`")))
    }
}

/// Serde adapter for optional civil dates stored as `""` when unset.
pub mod optional_civil_date {
    use super::{format_civil_date, parse_civil_date};
    use chrono::NaiveDate;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.serialize_str(&format_civil_date(*date)),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => parse_civil_date(value)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid calendar date `{value}`"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{format_civil_date, parse_civil_date};
    use chrono::NaiveDate;

    #[test]
    fn parse_accepts_plain_and_timestamped_dates() {
        let expected = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(parse_civil_date("2026-03-01"), Some(expected));
        assert_eq!(parse_civil_date("2026-03-01T23:59:00Z"), Some(expected));
        assert_eq!(parse_civil_date(" 2026-03-01 08:00 "), Some(expected));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(parse_civil_date(""), None);
        assert_eq!(parse_civil_date("yesterday"), None);
        assert_eq!(parse_civil_date("2026-13-01"), None);
        assert_eq!(parse_civil_date("2026-03-0112"), None);
    }

    #[test]
    fn format_is_zero_padded() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        assert_eq!(format_civil_date(date), "2026-01-05");
    }
}
