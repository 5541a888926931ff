//! Count matching
//!
//! A count of `k` asks for `k` occurrences of one subject: an anchor occurrence plus
//! `k - 1` further occurrences within the gap of it, in either direction. This is the
//! order-independent test with `k` slots all drawn from the same stream, where the
//! anchor itself is never reused and every further occurrence is a distinct event.
//! Occurrences sharing a timestamp are distinct events.

use crate::algorithm::matching::band::count_in_range;
use crate::models::GapWindow;

/// Occurrences, other than the anchor at `index`, within `gap` of it
fn companions(occurrences: &[i64], index: usize, gap: &GapWindow) -> usize {
    let (min, max) = (gap.min_seconds(), gap.max_seconds());
    if max == 0 {
        return 0;
    }
    let anchor = occurrences[index];
    let outer = count_in_range(
        occurrences,
        anchor.saturating_sub(max),
        anchor.saturating_add(max),
    );
    if min == 0 {
        // The anchor is inside the outer band
        return outer - 1;
    }
    // The anchor is inside the inner band, so it cancels out
    outer - count_in_range(
        occurrences,
        anchor.saturating_sub(min),
        anchor.saturating_add(min),
    )
}

/// Whether the subject occurs at least `k` times with the gap respected
///
/// # Arguments
/// * `occurrences` - Ascending timestamps of the subject, duplicates kept
/// * `k` - Required number of occurrences
/// * `gap` - Allowed distance between the anchor and each further occurrence
#[must_use]
pub fn match_count(occurrences: &[i64], k: usize, gap: &GapWindow) -> bool {
    if occurrences.is_empty() {
        return false;
    }
    if k <= 1 {
        return true;
    }
    if occurrences.len() < k {
        return false;
    }
    (0..occurrences.len()).any(|index| companions(occurrences, index, gap) >= k - 1)
}
