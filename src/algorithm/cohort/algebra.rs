//! Set algebra over patient-id sets
//!
//! Criteria of one variable are alternatives (union), inclusion variables are all
//! required (intersection) and exclusion variables are removed (difference). Every
//! [`CohortSet`] is sorted and free of duplicates.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::{CohortError, Result};

/// Ordered set of patient ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CohortSet(BTreeSet<String>);

impl CohortSet {
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Add a patient; returns false if already present
    pub fn insert(&mut self, patient_id: impl Into<String>) -> bool {
        self.0.insert(patient_id.into())
    }

    #[must_use]
    pub fn contains(&self, patient_id: &str) -> bool {
        self.0.contains(patient_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Patient ids in ascending order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Whether every patient of `self` is in `other`
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.0.is_subset(&other.0)
    }

    /// The sorted patient ids
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.0.into_iter().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for CohortSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl IntoIterator for CohortSet {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Patients in any of the sets
#[must_use]
pub fn union(sets: &[CohortSet]) -> CohortSet {
    CohortSet(sets.iter().flat_map(|s| s.0.iter().cloned()).collect())
}

/// Patients in every one of the sets
///
/// # Errors
/// `NoInclusionCriteria` when `sets` is empty; an empty conjunction is never read as
/// "every patient".
pub fn intersect(sets: &[CohortSet]) -> Result<CohortSet> {
    let Some(smallest) = sets.iter().min_by_key(|s| s.len()) else {
        return Err(CohortError::NoInclusionCriteria);
    };
    Ok(CohortSet(
        smallest
            .0
            .iter()
            .filter(|id| sets.iter().all(|s| s.0.contains(*id)))
            .cloned()
            .collect(),
    ))
}

/// Patients of `population` present in every one of the sets
///
/// With no sets, the whole population is returned.
#[must_use]
pub fn intersect_within(population: &CohortSet, sets: &[CohortSet]) -> CohortSet {
    CohortSet(
        population
            .0
            .iter()
            .filter(|id| sets.iter().all(|s| s.0.contains(*id)))
            .cloned()
            .collect(),
    )
}

/// Patients of `base` in none of the exclusion sets
#[must_use]
pub fn subtract(base: &CohortSet, exclusions: &[CohortSet]) -> CohortSet {
    CohortSet(
        base.0
            .iter()
            .filter(|id| !exclusions.iter().any(|s| s.0.contains(*id)))
            .cloned()
            .collect(),
    )
}

/// The final cohort: every inclusion set, minus any exclusion set
pub fn compose(inclusion: &[CohortSet], exclusion: &[CohortSet]) -> Result<CohortSet> {
    let included = intersect(inclusion)?;
    Ok(subtract(&included, &[union(exclusion)]))
}
