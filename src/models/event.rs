//! Event records and the study window

use serde::{Deserialize, Serialize};

use crate::error::{CohortError, Result};
use crate::models::category::Category;
use crate::utils::date_utils::yyyymmdd_to_unix;

/// A single clinical event of one patient
///
/// Identity is `(patient_id, timestamp, code)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub patient_id: String,
    /// POSIX seconds
    pub timestamp: i64,
    pub code: String,
    pub category: Category,
    /// Numeric payload of lab and vital events
    pub value: Option<f64>,
}

impl EventRecord {
    pub fn new(
        patient_id: impl Into<String>,
        timestamp: i64,
        code: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            timestamp,
            code: code.into(),
            category,
            value: None,
        }
    }

    /// Attach a numeric value
    #[must_use]
    pub const fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    /// Whether two records denote the same event
    #[must_use]
    pub fn same_event(&self, other: &Self) -> bool {
        self.patient_id == other.patient_id
            && self.timestamp == other.timestamp
            && self.code == other.code
    }
}

/// Inclusive range of POSIX seconds a study looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StudyWindow {
    start: i64,
    end: i64,
}

impl StudyWindow {
    /// Create a study window
    pub fn new(start: i64, end: i64) -> Result<Self> {
        if start > end {
            return Err(CohortError::InvalidStudyWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Create a study window from `YYYYMMDD` dates, at local midnight
    pub fn from_yyyymmdd(start: &str, end: &str) -> Result<Self> {
        Self::new(yyyymmdd_to_unix(start)?, yyyymmdd_to_unix(end)?)
    }

    /// A window covering every representable timestamp
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            start: i64::MIN,
            end: i64::MAX,
        }
    }

    #[must_use]
    pub const fn start(&self) -> i64 {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> i64 {
        self.end
    }

    #[must_use]
    pub const fn contains(&self, timestamp: i64) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }
}
