//! Temporal matching engine
//!
//! Pure functions deciding whether one patient's timestamp streams satisfy a temporal
//! pattern. Every input slice is ascending POSIX seconds; gaps are whole days. Nothing
//! here keeps state between calls, so patients can be evaluated in any order and in
//! parallel.

pub mod band;
pub mod count;
pub mod evaluate;
pub mod ordered;
pub mod stream;
pub mod unordered;

pub use band::in_band;
pub use count::match_count;
pub use evaluate::{EventStreams, evaluate};
pub use ordered::match_ordered;
pub use stream::{collapse_repeats, distinct, match_threshold};
pub use unordered::match_unordered;
