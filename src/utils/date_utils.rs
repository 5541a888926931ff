//! Module for converting study dates to POSIX timestamps.

use chrono::{Local, NaiveDate, TimeZone};

use crate::error::{CohortError, Result};

/// Compact date format used by study definitions
pub const COMPACT_DATE_FORMAT: &str = "%Y%m%d";

/// Parse a `YYYYMMDD` date
pub fn parse_yyyymmdd(s: &str) -> Result<NaiveDate> {
    let trimmed = s.trim();
    if trimmed.len() != 8 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(CohortError::InvalidDate {
            input: s.to_string(),
            reason: "expected eight digits (YYYYMMDD)".to_string(),
        });
    }
    NaiveDate::parse_from_str(trimmed, COMPACT_DATE_FORMAT).map_err(|e| CohortError::InvalidDate {
        input: s.to_string(),
        reason: e.to_string(),
    })
}

/// Convert a date to POSIX seconds at local midnight
///
/// When midnight does not exist locally (a DST gap), the earliest valid instant of the
/// day is used.
pub fn local_midnight_unix(date: NaiveDate) -> Result<i64> {
    let invalid = || CohortError::InvalidDate {
        input: date.format(COMPACT_DATE_FORMAT).to_string(),
        reason: "no valid local time on this day".to_string(),
    };

    (0..24)
        .filter_map(|hour| date.and_hms_opt(hour, 0, 0))
        .find_map(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|dt| dt.timestamp())
        .ok_or_else(invalid)
}

/// Convert a `YYYYMMDD` date to POSIX seconds at local midnight
pub fn yyyymmdd_to_unix(s: &str) -> Result<i64> {
    local_midnight_unix(parse_yyyymmdd(s)?)
}
