//! Canonical temporal text encodings.
//!
//! Storage engines without native temporal types keep dates as text. This
//! module recognizes the shapes used for that text and converts between them
//! and UTC [`DateTime`] values:
//!
//! | kind       | shape                 |
//! |------------|-----------------------|
//! | `Date`     | `YYYY-MM-DD`          |
//! | `Time`     | `HH:MM:SS`            |
//! | `DateTime` | `YYYY-MM-DD HH:MM:SS` |
//!
//! `DATETIME` and `TIMESTAMP` columns share the same shape and are both
//! reported as [`TemporalKind::DateTime`].

use crate::error::{Error, Result};
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::Regex;
use std::sync::OnceLock;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Recognized temporal text shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalKind {
    Date,
    Time,
    DateTime,
}

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("invalid built-in date regex")
    })
}

fn time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[0-9]{2}:[0-9]{2}:[0-9]{2}$").expect("invalid built-in time regex")
    })
}

fn datetime_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2} [0-9]{2}:[0-9]{2}:[0-9]{2}$")
            .expect("invalid built-in datetime regex")
    })
}

/// Classify `text` by shape only. Never fails and never inspects calendar validity.
pub fn classify(text: &str) -> Option<TemporalKind> {
    if datetime_re().is_match(text) {
        Some(TemporalKind::DateTime)
    } else if date_re().is_match(text) {
        Some(TemporalKind::Date)
    } else if time_re().is_match(text) {
        Some(TemporalKind::Time)
    } else {
        None
    }
}

pub fn is_date(text: &str) -> bool {
    classify(text) == Some(TemporalKind::Date)
}

pub fn is_time(text: &str) -> bool {
    classify(text) == Some(TemporalKind::Time)
}

pub fn is_datetime(text: &str) -> bool {
    classify(text) == Some(TemporalKind::DateTime)
}

/// Parse canonical temporal text as a UTC instant.
///
/// Date-only text is UTC midnight. A bare time of day has no calendar date
/// and is rejected like any unrecognized text.
pub fn parse(text: &str) -> Result<DateTime<Utc>> {
    match classify(text) {
        Some(TemporalKind::DateTime) => NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
            .map(|dt| dt.and_utc())
            .map_err(|e| Error::format(format!("invalid datetime '{text}': {e}"))),
        Some(TemporalKind::Date) => NaiveDate::parse_from_str(text, DATE_FORMAT)
            .map(|d| d.and_time(NaiveTime::MIN).and_utc())
            .map_err(|e| Error::format(format!("invalid date '{text}': {e}"))),
        Some(TemporalKind::Time) => Err(Error::format(format!(
            "time of day '{text}' has no date component"
        ))),
        None => Err(Error::format(format!("unrecognized date format: '{text}'"))),
    }
}

/// Render `dt` as `YYYY-MM-DD HH:MM:SS` in UTC, dropping sub-second precision.
pub fn serialize(dt: &DateTime<Utc>) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

/// Decode a value read from storage: date-shaped text becomes a timestamp.
///
/// Text that only looks like a date (`0000-00-00`) is returned unchanged.
pub fn decode_value(value: Value) -> Result<Value> {
    match value {
        Value::Text(s) => match classify(&s) {
            Some(TemporalKind::Date | TemporalKind::DateTime) => match parse(&s) {
                Ok(dt) => Ok(Value::Timestamp(dt)),
                Err(_) => Ok(Value::Text(s)),
            },
            _ => Ok(Value::Text(s)),
        },
        other => Ok(other),
    }
}

/// Encode a value for binding: timestamps become canonical text.
pub fn encode_value(value: Value) -> Value {
    match value {
        Value::Timestamp(dt) => Value::Text(serialize(&dt)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn classifies_shapes() {
        assert_eq!(classify("2024-01-31"), Some(TemporalKind::Date));
        assert_eq!(classify("23:59:01"), Some(TemporalKind::Time));
        assert_eq!(classify("2024-01-31 23:59:01"), Some(TemporalKind::DateTime));
        assert_eq!(classify("2024-01-31T23:59:01"), None);
        assert_eq!(classify("2024-01-31 23:59:01Z"), None);
        assert_eq!(classify("hello"), None);
        assert_eq!(classify(""), None);
    }

    #[test]
    fn classify_ignores_non_ascii_digits() {
        assert_eq!(classify("٢٠٢٤-01-31"), None);
    }

    #[test]
    fn date_parses_to_utc_midnight() {
        let dt = parse("2023-12-25").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2023, 12, 25, 0, 0, 0).unwrap());
    }

    #[test]
    fn datetime_parses_as_utc() {
        let dt = parse("2023-12-25 13:14:15").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2023, 12, 25, 13, 14, 15).unwrap());
    }

    #[test]
    fn round_trips_canonical_text() {
        for s in [
            "1970-01-01 00:00:00",
            "2000-02-29 12:00:00",
            "2024-12-31 23:59:59",
        ] {
            assert_eq!(serialize(&parse(s).unwrap()), s);
        }
    }

    #[test]
    fn serialize_truncates_sub_seconds() {
        let dt = Utc
            .with_ymd_and_hms(2024, 6, 1, 8, 30, 5)
            .unwrap()
            .with_nanosecond(999_000_000)
            .unwrap();
        assert_eq!(serialize(&dt), "2024-06-01 08:30:05");
    }

    #[test]
    fn rejects_unrecognized_and_impossible_text() {
        assert!(parse("yesterday").unwrap_err().is_format());
        assert!(parse("12:00:00").unwrap_err().is_format());
        assert!(parse("2023-02-30").unwrap_err().is_format());
        assert!(parse("2023-01-01 25:00:00").unwrap_err().is_format());
    }

    #[test]
    fn decode_leaves_non_dates_alone() {
        assert_eq!(
            decode_value(Value::Text("12:00:00".into())).unwrap(),
            Value::Text("12:00:00".into())
        );
        assert_eq!(decode_value(Value::Integer(7)).unwrap(), Value::Integer(7));
        assert!(matches!(
            decode_value(Value::Text("2024-01-01".into())).unwrap(),
            Value::Timestamp(_)
        ));
    }

    #[test]
    fn decode_keeps_impossible_dates_as_text() {
        for raw in ["0000-00-00", "2024-02-30 10:00:00"] {
            assert_eq!(
                decode_value(Value::Text(raw.into())).unwrap(),
                Value::Text(raw.into())
            );
        }
        assert!(parse("0000-00-00").is_err());
    }

    #[test]
    fn encode_renders_timestamps() {
        let dt = Utc.with_ymd_and_hms(2022, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(
            encode_value(Value::Timestamp(dt)),
            Value::Text("2022-03-04 05:06:07".into())
        );
        assert_eq!(encode_value(Value::Bool(true)), Value::Bool(true));
    }
}
