//! Cohort construction: patient grouping, set algebra and the cohort builder

pub mod algebra;
pub mod builder;
pub mod grouping;

pub use algebra::{CohortSet, compose, intersect, intersect_within, subtract, union};
pub use builder::{CohortBuilder, VariableResult};
pub use grouping::{PatientGrouper, PatientTimeline};
