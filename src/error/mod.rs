//! Error handling for cohort construction.

use std::io;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use thiserror::Error;

/// Specialized error type for variable definition, retrieval and cohort building
#[derive(Debug, Error)]
pub enum CohortError {
    /// A subvariable name is registered twice on the same variable
    #[error("Subvariable '{name}' is already defined on variable '{variable}'")]
    DuplicateName { variable: String, name: String },

    /// A constraint references a subvariable that has not been registered
    #[error("Variable '{variable}' has no subvariable named '{name}'")]
    UnknownSubvariable { variable: String, name: String },

    /// `finalize` was called twice, or the variable was modified after finalizing
    #[error("Variable '{0}' is already finalized")]
    AlreadyFinalized(String),

    /// A variable reached the cohort builder without being finalized
    #[error("Variable '{0}' must be finalized before it can be evaluated")]
    NotFinalized(String),

    /// Minimum gap exceeds maximum gap
    #[error("Invalid gap bounds: min {min_days} days > max {max_days} days")]
    InvalidGapBounds { min_days: u32, max_days: u32 },

    /// Threshold minimum exceeds maximum (or is not a number)
    #[error("Invalid threshold bounds: [{min}, {max}]")]
    InvalidThresholdBounds { min: f64, max: f64 },

    /// Count constraint asking for zero occurrences
    #[error("Count constraint needs at least one occurrence, got {0}")]
    InvalidOccurrenceCount(usize),

    /// The set algebra was asked to intersect zero inclusion sets
    #[error("No inclusion criteria supplied; refusing to build an unrestricted cohort")]
    NoInclusionCriteria,

    /// A `YYYYMMDD` date could not be converted
    #[error("Invalid date '{input}': {reason}")]
    InvalidDate { input: String, reason: String },

    /// Study window ends before it starts
    #[error("Invalid study window: start {start} is after end {end}")]
    InvalidStudyWindow { start: i64, end: i64 },

    /// A patient-ordered source returned a patient id out of order
    #[error("Event source is not ordered by patient: '{0}' arrived after a greater patient id")]
    UnsortedSource(String),

    /// Query construction or evaluation failed
    #[error("Query error: {0}")]
    Query(String),

    /// Error opening or reading a file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error processing Parquet data
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Error in an Arrow compute kernel
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Error converting between record batches and event rows
    #[error("Conversion error: {0}")]
    Conversion(#[from] serde_arrow::Error),

    /// Error reading a cohort definition
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A worker task or thread pool failed
    #[error("Task error: {0}")]
    Task(String),
}

impl CohortError {
    /// Create a query error
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query(message.into())
    }
}

/// Result type for cohort operations
pub type Result<T> = std::result::Result<T, CohortError>;
