//! Order-independent matching
//!
//! One slot is chosen as the anchor slot: the one with the fewest distinct timestamps,
//! the lowest index on ties. An anchor matches when every other slot has an event within
//! the gap of it, before or after. Non-anchor slots are compared with the anchor only,
//! never with each other.
//!
//! No built-in constraint kind dispatches here: `Count` reduces to the same ring test
//! over a single stream in `count`. This is the entry point for callers composing their
//! own order-independent patterns over several code groups.

use itertools::Itertools;

use crate::algorithm::matching::band::any_in_ring;
use crate::models::GapWindow;

/// Index of the slot with the fewest distinct timestamps
fn anchor_slot(slots: &[&[i64]]) -> Option<usize> {
    slots
        .iter()
        .enumerate()
        .min_by_key(|(_, slot)| slot.iter().dedup().count())
        .map(|(index, _)| index)
}

/// Whether some anchor has every other slot within `gap`, in either direction
///
/// No slots, or any empty slot, is no match.
#[must_use]
pub fn match_unordered(slots: &[&[i64]], gap: &GapWindow) -> bool {
    if slots.iter().any(|slot| slot.is_empty()) {
        return false;
    }
    let Some(anchor_index) = anchor_slot(slots) else {
        return false;
    };

    slots[anchor_index].iter().dedup().any(|&anchor| {
        slots
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != anchor_index)
            .all(|(_, slot)| any_in_ring(slot, anchor, gap))
    })
}
