//! Band tests over ascending timestamp slices

use crate::models::GapWindow;

/// Whether `p` lies in the inclusive band `[lo, hi]`
///
/// A zero-width band (`lo == hi`) never matches, so a `[0, 0]` gap admits nothing.
#[must_use]
pub const fn in_band(p: i64, lo: i64, hi: i64) -> bool {
    lo <= p && p <= hi && lo != hi
}

/// Whether `p` lies within `gap` of `anchor` in either direction
///
/// `p` must fall in the outer band `[anchor - max, anchor + max]` and outside the inner
/// band `[anchor - min, anchor + min]`.
#[must_use]
pub const fn in_ring(p: i64, anchor: i64, gap: &GapWindow) -> bool {
    let (min, max) = (gap.min_seconds(), gap.max_seconds());
    in_band(p, anchor.saturating_sub(max), anchor.saturating_add(max))
        && !in_band(p, anchor.saturating_sub(min), anchor.saturating_add(min))
}

/// Number of entries of an ascending slice in `[lo, hi]`
#[must_use]
pub fn count_in_range(sorted: &[i64], lo: i64, hi: i64) -> usize {
    if lo > hi {
        return 0;
    }
    sorted.partition_point(|&t| t <= hi) - sorted.partition_point(|&t| t < lo)
}

/// Smallest entry of an ascending slice within `gap` after `prev`
///
/// The entry must lie in the outer band `[prev, prev + max]` and outside the inner band
/// `[prev, prev + min]`. With a zero minimum the inner band is zero-width, so `prev`
/// itself qualifies.
#[must_use]
pub fn first_after(sorted: &[i64], prev: i64, gap: &GapWindow) -> Option<i64> {
    let (min, max) = (gap.min_seconds(), gap.max_seconds());
    let hi = prev.saturating_add(max);
    let lo = if min == 0 {
        prev
    } else {
        prev.saturating_add(min).saturating_add(1)
    };
    if max == 0 || lo > hi {
        return None;
    }
    sorted
        .get(sorted.partition_point(|&t| t < lo))
        .copied()
        .filter(|&p| p <= hi)
}

/// Whether an ascending slice holds an entry within `gap` of `anchor`
#[must_use]
pub fn any_in_ring(sorted: &[i64], anchor: i64, gap: &GapWindow) -> bool {
    let (min, max) = (gap.min_seconds(), gap.max_seconds());
    if max == 0 {
        return false;
    }
    let (outer_lo, outer_hi) = (anchor.saturating_sub(max), anchor.saturating_add(max));
    if min == 0 {
        return count_in_range(sorted, outer_lo, outer_hi) > 0;
    }
    let (inner_lo, inner_hi) = (anchor.saturating_sub(min), anchor.saturating_add(min));
    count_in_range(sorted, outer_lo, inner_lo.saturating_sub(1)) > 0
        || count_in_range(sorted, inner_hi.saturating_add(1), outer_hi) > 0
}
