//! A Rust library for building clinical research cohorts from patient event histories.
//!
//! Variables describe code sets and temporal constraints, the matching engine tests each
//! patient's timeline against them, and set algebra combines the per-criterion patient
//! sets into the final cohort.

pub mod algorithm;
pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod store;
pub mod utils;

// Re-export the most common types for easier use
// Core types
pub use config::{EngineConfig, StoreConfig};
pub use error::{CohortError, Result};
pub use models::{
    Category, ClinicalCohort, ClinicalVariable, Constraint, ConstraintKind, ConstraintSpec,
    EventRecord, GapWindow, StudyWindow, VariableRole,
};

// Cohort construction
pub use algorithm::cohort::{CohortBuilder, CohortSet, VariableResult};
pub use algorithm::matching::{match_count, match_ordered, match_unordered};

// Retrieval
pub use filter::{Expr, LiteralValue, Query};
pub use store::{BatchEventSource, EventSource, ParquetEventStore};

// Arrow types
pub use arrow::record_batch::RecordBatch;
