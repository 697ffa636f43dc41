//! Argument parsing shared by the transports.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

use crate::error::CalendarError;

/// `YYYY-MM-DD`.
pub fn parse_date(name: &str, value: &str) -> Result<NaiveDate, CalendarError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        CalendarError::InvalidRange(format!("{name} must be YYYY-MM-DD, got '{value}'"))
    })
}

/// Inclusive range; `start <= end` required.
pub fn parse_range(start: &str, end: &str) -> Result<(NaiveDate, NaiveDate), CalendarError> {
    let s = parse_date("start", start)?;
    let e = parse_date("end", end)?;
    if s > e {
        return Err(CalendarError::InvalidRange(format!(
            "start {s} is after end {e}"
        )));
    }
    Ok((s, e))
}

/// Offset-aware timestamp. RFC 3339, with a space allowed in place of `T`.
/// Naive timestamps are rejected rather than guessed.
pub fn parse_instant(value: &str) -> Result<DateTime<FixedOffset>, CalendarError> {
    let v = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(v) {
        return Ok(dt);
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M%:z", "%Y-%m-%dT%H:%M%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(v, fmt) {
            return Ok(dt);
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if NaiveDateTime::parse_from_str(v, fmt).is_ok() {
            return Err(CalendarError::InvalidRange(format!(
                "instant '{value}' has no UTC offset"
            )));
        }
    }
    Err(CalendarError::InvalidRange(format!(
        "instant '{value}' is not an RFC 3339 timestamp"
    )))
}
