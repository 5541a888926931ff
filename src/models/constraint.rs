//! Constraint definitions
//!
//! Callers describe constraints symbolically with [`ConstraintSpec`], naming the
//! subvariables they apply to. A [`ClinicalVariable`](super::ClinicalVariable) resolves a
//! spec into a [`Constraint`], which carries snapshots of the referenced code groups and
//! validated parameters. Resolved constraints are never modified afterwards.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

use crate::error::{CohortError, Result};
use crate::models::category::Category;

/// Seconds in one day; gap parameters are whole days, timestamps are POSIX seconds
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Ordered set of clinical codes
pub type CodeSet = BTreeSet<String>;

/// Codes of one category, resolved from a subvariable
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CodeGroup {
    /// Category the codes belong to
    pub category: Category,
    /// The codes
    pub codes: CodeSet,
}

impl CodeGroup {
    /// Create a code group
    pub fn new<I, S>(category: Category, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            category,
            codes: codes.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether an event of `category` with `code` belongs to this group
    #[must_use]
    pub fn contains(&self, category: Category, code: &str) -> bool {
        self.category == category && self.codes.contains(code)
    }
}

/// Day-based gap bounds, `min_days <= max_days`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GapWindow {
    min_days: u32,
    max_days: u32,
}

impl GapWindow {
    /// Create a gap window
    pub fn new(min_days: u32, max_days: u32) -> Result<Self> {
        if min_days > max_days {
            return Err(CohortError::InvalidGapBounds { min_days, max_days });
        }
        Ok(Self { min_days, max_days })
    }

    /// The zero-width window used by implicit `Count{1, 0, 0}` constraints
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            min_days: 0,
            max_days: 0,
        }
    }

    #[must_use]
    pub const fn min_days(&self) -> u32 {
        self.min_days
    }

    #[must_use]
    pub const fn max_days(&self) -> u32 {
        self.max_days
    }

    /// Minimum gap in seconds
    #[must_use]
    pub const fn min_seconds(&self) -> i64 {
        self.min_days as i64 * SECONDS_PER_DAY
    }

    /// Maximum gap in seconds
    #[must_use]
    pub const fn max_seconds(&self) -> i64 {
        self.max_days as i64 * SECONDS_PER_DAY
    }

    /// Whether `other` is at least as permissive: smaller or equal minimum, larger or equal maximum
    #[must_use]
    pub const fn is_within(&self, other: &Self) -> bool {
        other.min_days <= self.min_days && other.max_days >= self.max_days
    }
}

impl fmt::Display for GapWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}] days", self.min_days, self.max_days)
    }
}

/// Subject must occur at least `occurrences` times, further occurrences within `gap` of an anchor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountConstraint {
    pub occurrences: usize,
    pub gap: GapWindow,
    pub subject: CodeGroup,
}

/// A dependent event must follow a dependee anchor within `gap`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeConstraint {
    pub gap: GapWindow,
    pub dependent: CodeGroup,
    pub dependee: CodeGroup,
}

/// A numeric value of the subject must fall within `[min, max]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdConstraint {
    pub min: f64,
    pub max: f64,
    pub subject: CodeGroup,
}

/// Repeated occurrences of the subject closer than `interval_days` count as one event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OnlyOneConstraint {
    pub interval_days: u32,
    pub subject: CodeGroup,
}

impl CountConstraint {
    /// Create a count constraint
    pub fn new(occurrences: usize, gap: GapWindow, subject: CodeGroup) -> Result<Self> {
        if occurrences == 0 {
            return Err(CohortError::InvalidOccurrenceCount(occurrences));
        }
        Ok(Self {
            occurrences,
            gap,
            subject,
        })
    }

    /// The implicit "seen at least once" constraint
    #[must_use]
    pub fn presence(subject: CodeGroup) -> Self {
        Self {
            occurrences: 1,
            gap: GapWindow::zero(),
            subject,
        }
    }
}

impl ThresholdConstraint {
    /// Create a threshold constraint
    pub fn new(min: f64, max: f64, subject: CodeGroup) -> Result<Self> {
        if min.is_nan() || max.is_nan() || min > max {
            return Err(CohortError::InvalidThresholdBounds { min, max });
        }
        Ok(Self { min, max, subject })
    }
}

/// Kind of a constraint; key of a variable's constraint map
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Count,
    Time,
    Threshold,
    OnlyOne,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Count => "count",
            Self::Time => "time",
            Self::Threshold => "threshold",
            Self::OnlyOne => "only_one",
        })
    }
}

/// A resolved constraint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Constraint {
    Count(CountConstraint),
    Time(TimeConstraint),
    Threshold(ThresholdConstraint),
    OnlyOne(OnlyOneConstraint),
}

impl Constraint {
    #[must_use]
    pub const fn kind(&self) -> ConstraintKind {
        match self {
            Self::Count(_) => ConstraintKind::Count,
            Self::Time(_) => ConstraintKind::Time,
            Self::Threshold(_) => ConstraintKind::Threshold,
            Self::OnlyOne(_) => ConstraintKind::OnlyOne,
        }
    }

    /// Code groups this constraint targets (subject, or dependent and dependee)
    #[must_use]
    pub fn targets(&self) -> SmallVec<[&CodeGroup; 2]> {
        match self {
            Self::Count(c) => smallvec![&c.subject],
            Self::Time(c) => smallvec![&c.dependent, &c.dependee],
            Self::Threshold(c) => smallvec![&c.subject],
            Self::OnlyOne(c) => smallvec![&c.subject],
        }
    }

    /// Whether this constraint targets `group`
    #[must_use]
    pub fn targets_group(&self, group: &CodeGroup) -> bool {
        self.targets().into_iter().any(|target| target == group)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(c) => write!(
                f,
                "count(k={}, gap={}, {} {} codes)",
                c.occurrences,
                c.gap,
                c.subject.codes.len(),
                c.subject.category
            ),
            Self::Time(c) => write!(
                f,
                "time(gap={}, {} {} codes after {} {} codes)",
                c.gap,
                c.dependent.codes.len(),
                c.dependent.category,
                c.dependee.codes.len(),
                c.dependee.category
            ),
            Self::Threshold(c) => write!(
                f,
                "threshold([{}, {}], {} {} codes)",
                c.min,
                c.max,
                c.subject.codes.len(),
                c.subject.category
            ),
            Self::OnlyOne(c) => write!(
                f,
                "only_one({} days, {} {} codes)",
                c.interval_days,
                c.subject.codes.len(),
                c.subject.category
            ),
        }
    }
}

/// Symbolic constraint description, naming subvariables of the owning variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConstraintSpec {
    Count {
        occurrences: usize,
        min_gap_days: u32,
        max_gap_days: u32,
        subject: String,
    },
    Time {
        min_gap_days: u32,
        max_gap_days: u32,
        dependent: String,
        dependee: String,
    },
    Threshold {
        min: f64,
        max: f64,
        subject: String,
    },
    OnlyOne {
        interval_days: u32,
        subject: String,
    },
}

impl ConstraintSpec {
    pub fn count(
        occurrences: usize,
        min_gap_days: u32,
        max_gap_days: u32,
        subject: impl Into<String>,
    ) -> Self {
        Self::Count {
            occurrences,
            min_gap_days,
            max_gap_days,
            subject: subject.into(),
        }
    }

    pub fn time(
        min_gap_days: u32,
        max_gap_days: u32,
        dependent: impl Into<String>,
        dependee: impl Into<String>,
    ) -> Self {
        Self::Time {
            min_gap_days,
            max_gap_days,
            dependent: dependent.into(),
            dependee: dependee.into(),
        }
    }

    pub fn threshold(min: f64, max: f64, subject: impl Into<String>) -> Self {
        Self::Threshold {
            min,
            max,
            subject: subject.into(),
        }
    }

    pub fn only_one(interval_days: u32, subject: impl Into<String>) -> Self {
        Self::OnlyOne {
            interval_days,
            subject: subject.into(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ConstraintKind {
        match self {
            Self::Count { .. } => ConstraintKind::Count,
            Self::Time { .. } => ConstraintKind::Time,
            Self::Threshold { .. } => ConstraintKind::Threshold,
            Self::OnlyOne { .. } => ConstraintKind::OnlyOne,
        }
    }
}
