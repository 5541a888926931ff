//! Stream preparation and value tests

use itertools::Itertools;

use crate::models::SECONDS_PER_DAY;

/// Distinct timestamps of an ascending stream
#[must_use]
pub fn distinct(stream: &[i64]) -> Vec<i64> {
    stream.iter().copied().dedup().collect()
}

/// Collapse runs of repeated occurrences into their earliest event
///
/// An occurrence closer than `interval_days` to the occurrence before it (in the raw
/// stream) belongs to the same run. An interval of zero keeps every occurrence.
#[must_use]
pub fn collapse_repeats(timestamps: &[i64], interval_days: u32) -> Vec<i64> {
    if interval_days == 0 {
        return timestamps.to_vec();
    }
    let interval = i64::from(interval_days) * SECONDS_PER_DAY;

    let mut kept = Vec::with_capacity(timestamps.len());
    let mut previous: Option<i64> = None;
    for &t in timestamps {
        if previous.is_none_or(|p| t - p >= interval) {
            kept.push(t);
        }
        previous = Some(t);
    }
    kept
}

/// Whether any value lies in `[min, max]`
#[must_use]
pub fn match_threshold(values: &[f64], min: f64, max: f64) -> bool {
    values.iter().any(|v| (min..=max).contains(v))
}
