//! Order-matters matching
//!
//! Slots are chained from an anchor: each slot must hold an event within the gap after
//! the event chosen for the previous slot, more than the minimum and at most the maximum
//! past it. The earliest qualifying event is always chosen, and the first anchor that
//! completes the chain decides the match.

use crate::algorithm::matching::band::first_after;
use crate::models::GapWindow;

/// Whether the slots can be chained in order within `gap`
///
/// # Arguments
/// * `slots` - Ascending timestamp slices; slot 0 supplies the anchors
/// * `gap` - Allowed distance between consecutive chained events
///
/// # Returns
/// `true` if some anchor of slot 0 reaches every later slot. No slots, or any empty
/// slot, is no match.
#[must_use]
pub fn match_ordered(slots: &[&[i64]], gap: &GapWindow) -> bool {
    let Some((anchors, rest)) = slots.split_first() else {
        return false;
    };
    if rest.iter().any(|slot| slot.is_empty()) {
        return false;
    }

    anchors.iter().any(|&anchor| {
        let mut prev = anchor;
        rest.iter().all(|slot| match first_after(slot, prev, gap) {
            Some(p) => {
                prev = p;
                true
            }
            None => false,
        })
    })
}
