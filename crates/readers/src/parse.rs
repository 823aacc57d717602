//! Payload parsing helpers shared across reader variants
//!
//! Provider feeds are messy: numbers arrive as strings, decimal commas show
//! up in scraped pages, "N/A" stands in for null, and naive timestamps are
//! declared in the station's local timezone. These helpers keep the
//! per-variant modules focused on field mapping.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use domain::units::ConvertError;
use serde_json::Value;

use crate::error::ReadError;

/// Observations older than this are rejected as stale.
pub const MAX_READING_AGE_SECS: i64 = 30 * 60;

/// Pull a required config field or fail with the field's name.
///
/// # Errors
///
/// Returns [`ReadError::MissingField`] when the slot is empty.
pub fn require<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, ReadError> {
    value.as_deref().ok_or(ReadError::MissingField(name))
}

/// Read a JSON value as a float, accepting both numbers and numeric strings.
#[must_use]
pub fn json_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => lenient_float(s),
        _ => None,
    }
}

/// Walk a path of object keys and read the leaf as a float.
#[must_use]
pub fn pick_f64(value: &Value, path: &[&str]) -> Option<f64> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    json_f64(current)
}

/// Parse a float from provider text, tolerating surrounding junk,
/// decimal commas and the usual not-available tokens.
#[must_use]
pub fn lenient_float(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() || is_not_available(raw) {
        return None;
    }
    let mut text = raw.to_string();
    if text.contains(',') {
        // Decimal-comma locale; a dot in the same token is a thousands
        // separator there.
        text = text.replace('.', "").replace(',', ".");
    }
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-' || *c == '+')
        .collect();
    cleaned.parse().ok()
}

/// True for the placeholder tokens providers use instead of null.
#[must_use]
pub fn is_not_available(raw: &str) -> bool {
    matches!(
        raw.to_ascii_lowercase().as_str(),
        "-" | "--" | "---" | "n/a" | "na" | "nan" | "null" | "none"
    )
}

/// Reject observations from the future or older than the staleness cutoff.
///
/// # Errors
///
/// Returns [`ReadError::Parse`] with the offending timestamp.
pub fn ensure_fresh(observed_at: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), ReadError> {
    if observed_at > now {
        return Err(ReadError::parse(format!(
            "observation timestamp {observed_at} is in the future"
        )));
    }
    if (now - observed_at).num_seconds() > MAX_READING_AGE_SECS {
        return Err(ReadError::parse(format!(
            "observation timestamp {observed_at} is older than {} minutes",
            MAX_READING_AGE_SECS / 60
        )));
    }
    Ok(())
}

/// Resolve a naive provider timestamp declared in the station's timezone
/// to UTC. During a DST fold the earlier instant wins.
///
/// # Errors
///
/// Returns [`ReadError::Parse`] for timestamps skipped by a DST gap.
pub fn naive_in_tz(naive: NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>, ReadError> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| ReadError::parse(format!("timestamp {naive} does not exist in {tz}")))
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M",
    "%d/%m/%y %H:%M",
];

/// Parse a naive datetime in any of the formats the providers use.
#[must_use]
pub fn lenient_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Parse a date-only token (used by providers that split date and time).
#[must_use]
pub fn lenient_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d/%m/%y", "%d-%m-%y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// True within the first `window_minutes` after local midnight, when a
/// provider's "today" aggregates may still describe yesterday.
#[must_use]
pub fn within_daily_rollover(local: &DateTime<Tz>, window_minutes: u32) -> bool {
    local.hour() == 0 && local.minute() < window_minutes
}

/// Apply a unit conversion to an optional reading, keeping `None` as-is.
///
/// # Errors
///
/// Propagates the conversion error for present values.
pub fn map_opt(
    value: Option<f64>,
    convert: impl FnOnce(f64) -> Result<f64, ConvertError>,
) -> Result<Option<f64>, ConvertError> {
    value.map(convert).transpose()
}
