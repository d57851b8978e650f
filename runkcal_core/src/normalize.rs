//! Coercion of raw, untyped input into canonical values.
//!
//! Every function here is total: unrecognised input resolves to a documented
//! default instead of an error. Numeric coercion comes in two flavours:
//! - `to_number` treats anything absent or non-numeric as `0`, for arithmetic inputs
//! - `coalesce_number` falls back to a configured default, for stored settings
//!   where `0` is a legitimate value distinct from "unset"

use crate::{ActivityLevel, Gender};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::borrow::Cow;

/// Naive date-time layouts accepted after the strict date-key and RFC formats
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Naive date layouts interpreted as local midnight
const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Raw date input as it arrives from a form or command line
#[derive(Clone, Debug, PartialEq)]
pub enum DateInput {
    /// Nothing supplied
    Absent,
    /// Already a structured instant
    At(DateTime<Utc>),
    /// Free text to be parsed
    Text(String),
}

impl From<Option<String>> for DateInput {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(text) => DateInput::Text(text),
            None => DateInput::Absent,
        }
    }
}

impl From<DateTime<Utc>> for DateInput {
    fn from(value: DateTime<Utc>) -> Self {
        DateInput::At(value)
    }
}

/// Render a raw scalar as text the way a form field would show it
pub fn to_text(raw: &Value) -> Cow<'_, str> {
    match raw {
        Value::Null => Cow::Borrowed(""),
        Value::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

/// Normalise a gender token
///
/// Case-insensitive. Accepts `male`/`m`/`男性` and `female`/`f`/`女性`;
/// anything else is `Gender::Unknown`.
pub fn normalize_gender(raw: &str) -> Gender {
    match raw.trim().to_lowercase().as_str() {
        "male" | "m" | "男性" => Gender::Male,
        "female" | "f" | "女性" => Gender::Female,
        _ => Gender::Unknown,
    }
}

/// Normalise an activity level token, defaulting to `Medium`
pub fn normalize_activity_level(raw: &str) -> ActivityLevel {
    match raw.trim().to_lowercase().as_str() {
        "low" | "低い" => ActivityLevel::Low,
        "high" | "高い" => ActivityLevel::High,
        "medium" | "標準" => ActivityLevel::Medium,
        other => {
            if !other.is_empty() {
                tracing::debug!("Unrecognised activity level {:?}, using medium", other);
            }
            ActivityLevel::Medium
        }
    }
}

/// Resolve a raw date input to an instant
///
/// - `Absent` or blank text yields `now`
/// - a strict `YYYY-MM-DD` is local midnight in `tz`
/// - other text goes through the general formats (RFC 3339, RFC 2822, naive layouts in `tz`)
/// - anything unparseable falls back to `now` with a warning
pub fn normalize_date(raw: DateInput, tz: Tz, now: DateTime<Utc>) -> DateTime<Utc> {
    let text = match raw {
        DateInput::Absent => return now,
        DateInput::At(instant) => return instant,
        DateInput::Text(text) => text,
    };

    if text.trim().is_empty() {
        return now;
    }

    match parse_date_text(&text, tz) {
        Some(instant) => instant,
        None => {
            tracing::warn!("Unparseable date {:?}, using current time", text);
            now
        }
    }
}

/// Parse free-form date text, interpreting zone-less values in `tz`
pub fn parse_date_text(text: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if is_date_key(text) {
        return NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .and_then(|date| local_midnight(date, tz));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return tz
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc));
        }
    }

    NAIVE_DATE_FORMATS.iter().find_map(|format| {
        NaiveDate::parse_from_str(text, format)
            .ok()
            .and_then(|date| local_midnight(date, tz))
    })
}

/// Start of `date` in `tz`, stepping past a DST gap at midnight
pub fn local_midnight(date: NaiveDate, tz: Tz) -> Option<DateTime<Utc>> {
    let midnight = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Format an instant as a `YYYY-MM-DD` date-key in `tz`
pub fn date_key(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format("%Y-%m-%d").to_string()
}

/// Strict `YYYY-MM-DD` shape check (digits and dashes only)
fn is_date_key(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Parse a raw scalar as a finite number
///
/// Blank strings and null count as zero; non-numeric text, non-finite
/// values and compound values are `None`.
fn parse_number(raw: &Value) -> Option<f64> {
    match raw {
        Value::Null => Some(0.0),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Some(0.0);
            }
            trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
        }
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Coerce a raw scalar to a number, with non-numeric input becoming `0`
pub fn to_number(raw: &Value) -> f64 {
    parse_number(raw).unwrap_or(0.0)
}

/// Coerce a stored setting, falling back when it is unset or unusable
///
/// Absent, null and empty-string values return `fallback`, as does anything
/// that does not parse to a finite number. A stored `0` is kept.
pub fn coalesce_number(raw: Option<&Value>, fallback: f64) -> f64 {
    match raw {
        None | Some(Value::Null) => fallback,
        Some(Value::String(s)) if s.is_empty() => fallback,
        Some(value) => parse_number(value).unwrap_or(fallback),
    }
}

// ============================================================================
// Lenient serde helpers for stored records
// ============================================================================

pub(crate) fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(to_number(&raw))
}

pub(crate) fn lenient_positive<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(Some(to_number(&raw)).filter(|v| *v > 0.0))
}

pub(crate) fn lenient_date<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(parse_stored_date(&raw, Tz::UTC))
}

/// Parse the `date` field of a stored record
///
/// Dates written by runkcal carry an offset; hand-edited ones without a
/// zone are read as local time in `tz`.
pub(crate) fn parse_stored_date(raw: &Value, tz: Tz) -> Option<DateTime<Utc>> {
    let parsed = match raw {
        Value::String(text) => parse_date_text(text, tz),
        _ => None,
    };
    if parsed.is_none() && !raw.is_null() {
        tracing::debug!("Stored record has unparseable date {}", raw);
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_normalize_gender_tokens() {
        assert_eq!(normalize_gender("male"), Gender::Male);
        assert_eq!(normalize_gender("M"), Gender::Male);
        assert_eq!(normalize_gender("男性"), Gender::Male);
        assert_eq!(normalize_gender("FEMALE"), Gender::Female);
        assert_eq!(normalize_gender("f"), Gender::Female);
        assert_eq!(normalize_gender("女性"), Gender::Female);
        assert_eq!(normalize_gender(""), Gender::Unknown);
        assert_eq!(normalize_gender("other"), Gender::Unknown);
    }

    #[test]
    fn test_normalize_activity_level_tokens() {
        assert_eq!(normalize_activity_level("low"), ActivityLevel::Low);
        assert_eq!(normalize_activity_level("HIGH"), ActivityLevel::High);
        assert_eq!(normalize_activity_level("Medium"), ActivityLevel::Medium);
        assert_eq!(normalize_activity_level("低い"), ActivityLevel::Low);
        assert_eq!(normalize_activity_level("標準"), ActivityLevel::Medium);
        assert_eq!(normalize_activity_level("高い"), ActivityLevel::High);
        assert_eq!(normalize_activity_level("extreme"), ActivityLevel::Medium);
        assert_eq!(normalize_activity_level(""), ActivityLevel::Medium);
    }

    #[test]
    fn test_normalize_date_absent_and_blank_use_now() {
        assert_eq!(normalize_date(DateInput::Absent, Tz::UTC, now()), now());
        assert_eq!(
            normalize_date(DateInput::Text("  ".into()), Tz::UTC, now()),
            now()
        );
    }

    #[test]
    fn test_normalize_date_passes_structured_value_through() {
        let instant = Utc.with_ymd_and_hms(2023, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(normalize_date(instant.into(), Tz::UTC, now()), instant);
    }

    #[test]
    fn test_normalize_date_key_is_local_midnight() {
        let tokyo: Tz = "Asia/Tokyo".parse().unwrap();
        let date = normalize_date(DateInput::Text("2024-06-01".into()), tokyo, now());

        // Midnight in Tokyo is 15:00 UTC the previous day
        assert_eq!(date, Utc.with_ymd_and_hms(2024, 5, 31, 15, 0, 0).unwrap());
        assert_eq!(date_key(date, tokyo), "2024-06-01");
    }

    #[test]
    fn test_normalize_date_general_formats() {
        let rfc = normalize_date(
            DateInput::Text("2024-06-01T07:30:00+02:00".into()),
            Tz::UTC,
            now(),
        );
        assert_eq!(rfc, Utc.with_ymd_and_hms(2024, 6, 1, 5, 30, 0).unwrap());

        let naive = normalize_date(
            DateInput::Text("2024/06/02 18:45".into()),
            Tz::UTC,
            now(),
        );
        assert_eq!(naive.hour(), 18);
        assert_eq!(date_key(naive, Tz::UTC), "2024-06-02");

        let unpadded = normalize_date(DateInput::Text("2024-6-3".into()), Tz::UTC, now());
        assert_eq!(date_key(unpadded, Tz::UTC), "2024-06-03");
    }

    #[test]
    fn test_normalize_date_garbage_falls_back_to_now() {
        crate::logging::init_test();
        let date = normalize_date(DateInput::Text("next tuesday".into()), Tz::UTC, now());
        assert_eq!(date, now());

        let impossible = normalize_date(DateInput::Text("2024-02-30".into()), Tz::UTC, now());
        assert_eq!(impossible, now());
    }

    #[test]
    fn test_to_number() {
        assert_eq!(to_number(&json!(42)), 42.0);
        assert_eq!(to_number(&json!("3.5")), 3.5);
        assert_eq!(to_number(&json!(" 7 ")), 7.0);
        assert_eq!(to_number(&json!("")), 0.0);
        assert_eq!(to_number(&json!(null)), 0.0);
        assert_eq!(to_number(&json!(true)), 1.0);
        assert_eq!(to_number(&json!("abc")), 0.0);
        assert_eq!(to_number(&json!("NaN")), 0.0);
        assert_eq!(to_number(&json!([1, 2])), 0.0);
    }

    #[test]
    fn test_coalesce_number_keeps_zero_but_not_blank() {
        assert_eq!(coalesce_number(None, 60.0), 60.0);
        assert_eq!(coalesce_number(Some(&json!(null)), 60.0), 60.0);
        assert_eq!(coalesce_number(Some(&json!("")), 60.0), 60.0);
        assert_eq!(coalesce_number(Some(&json!("abc")), 60.0), 60.0);
        assert_eq!(coalesce_number(Some(&json!(0)), 60.0), 0.0);
        assert_eq!(coalesce_number(Some(&json!("0")), 60.0), 0.0);
        assert_eq!(coalesce_number(Some(&json!("72.5")), 60.0), 72.5);
        assert_eq!(coalesce_number(Some(&json!(-2)), -1.0), -2.0);
    }

    #[test]
    fn test_to_text() {
        assert_eq!(to_text(&json!(null)), "");
        assert_eq!(to_text(&json!("female")), "female");
        assert_eq!(to_text(&json!(30)), "30");
    }
}
