//! Clinical variables
//!
//! A [`ClinicalVariable`] groups named subvariables (code sets of one category) and the
//! constraints a patient's timeline must satisfy for the variable to hold. Constraints
//! of one variable are alternatives: a patient satisfies the variable when any of its
//! criteria matches.

use std::collections::BTreeMap;

use itertools::Itertools;
use serde::Serialize;

use crate::error::{CohortError, Result};
use crate::models::category::Category;
use crate::models::constraint::{
    CodeGroup, CodeSet, Constraint, ConstraintKind, ConstraintSpec, CountConstraint, GapWindow,
    OnlyOneConstraint, ThresholdConstraint, TimeConstraint,
};

/// A named set of codes of one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subvariable {
    pub name: String,
    pub category: Category,
    pub codes: CodeSet,
}

impl Subvariable {
    /// Snapshot of this subvariable as a code group
    #[must_use]
    pub fn code_group(&self) -> CodeGroup {
        CodeGroup {
            category: self.category,
            codes: self.codes.clone(),
        }
    }
}

/// A clinical variable made of subvariables and constraints
#[derive(Debug, Clone, Serialize)]
pub struct ClinicalVariable {
    name: String,
    subvariables: Vec<Subvariable>,
    constraints: BTreeMap<ConstraintKind, Vec<Constraint>>,
    finalized: bool,
}

impl ClinicalVariable {
    /// Create an empty variable
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subvariables: Vec::new(),
            constraints: BTreeMap::new(),
            finalized: false,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn subvariables(&self) -> &[Subvariable] {
        &self.subvariables
    }

    #[must_use]
    pub const fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Add a subvariable
    ///
    /// # Errors
    /// `DuplicateName` if a subvariable with this name exists, `AlreadyFinalized` after
    /// [`finalize`](Self::finalize).
    pub fn add_subvariable<I, S>(
        &mut self,
        name: impl Into<String>,
        category: Category,
        codes: I,
    ) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ensure_open()?;
        let name = name.into();
        if self.subvariable(&name).is_some() {
            return Err(CohortError::DuplicateName {
                variable: self.name.clone(),
                name,
            });
        }
        self.subvariables.push(Subvariable {
            name,
            category,
            codes: codes.into_iter().map(Into::into).collect(),
        });
        Ok(())
    }

    /// Look up a subvariable by name
    #[must_use]
    pub fn subvariable(&self, name: &str) -> Option<&Subvariable> {
        self.subvariables.iter().find(|s| s.name == name)
    }

    /// Look up the first subvariable holding exactly `codes`
    #[must_use]
    pub fn subvariable_for_codes(&self, codes: &CodeSet) -> Option<&Subvariable> {
        self.subvariables.iter().find(|s| &s.codes == codes)
    }

    fn group(&self, name: &str) -> Result<CodeGroup> {
        self.subvariable(name)
            .map(Subvariable::code_group)
            .ok_or_else(|| CohortError::UnknownSubvariable {
                variable: self.name.clone(),
                name: name.to_string(),
            })
    }

    /// Resolve a symbolic constraint against the current subvariables
    ///
    /// The returned constraint holds copies of the referenced code sets; later changes to
    /// the variable do not affect it. The spec is left untouched.
    pub fn resolve(&self, spec: &ConstraintSpec) -> Result<Constraint> {
        let constraint = match spec {
            ConstraintSpec::Count {
                occurrences,
                min_gap_days,
                max_gap_days,
                subject,
            } => Constraint::Count(CountConstraint::new(
                *occurrences,
                GapWindow::new(*min_gap_days, *max_gap_days)?,
                self.group(subject)?,
            )?),
            ConstraintSpec::Time {
                min_gap_days,
                max_gap_days,
                dependent,
                dependee,
            } => Constraint::Time(TimeConstraint {
                gap: GapWindow::new(*min_gap_days, *max_gap_days)?,
                dependent: self.group(dependent)?,
                dependee: self.group(dependee)?,
            }),
            ConstraintSpec::Threshold { min, max, subject } => Constraint::Threshold(
                ThresholdConstraint::new(*min, *max, self.group(subject)?)?,
            ),
            ConstraintSpec::OnlyOne {
                interval_days,
                subject,
            } => Constraint::OnlyOne(OnlyOneConstraint {
                interval_days: *interval_days,
                subject: self.group(subject)?,
            }),
        };
        Ok(constraint)
    }

    /// Resolve a constraint and store it under its kind
    pub fn add_constraint(&mut self, spec: &ConstraintSpec) -> Result<&Constraint> {
        self.ensure_open()?;
        let constraint = self.resolve(spec)?;
        let kind = constraint.kind();
        log::debug!("Variable '{}': adding {constraint}", self.name);
        let bucket = self.constraints.entry(kind).or_default();
        bucket.push(constraint);
        Ok(&bucket[bucket.len() - 1])
    }

    /// Add the implicit `Count{1, 0, 0}` for every code group no constraint targets
    ///
    /// Must run once, after all constraints are added.
    ///
    /// # Errors
    /// `AlreadyFinalized` on a second call.
    pub fn finalize(&mut self) -> Result<()> {
        self.ensure_open()?;

        let unconstrained = self
            .subvariables
            .iter()
            .map(Subvariable::code_group)
            .unique()
            .filter(|group| !self.constraints().any(|c| c.targets_group(group)))
            .collect_vec();

        if !unconstrained.is_empty() {
            log::debug!(
                "Variable '{}': adding {} implicit presence constraint(s)",
                self.name,
                unconstrained.len()
            );
        }

        let counts = self.constraints.entry(ConstraintKind::Count).or_default();
        counts.extend(
            unconstrained
                .into_iter()
                .map(|group| Constraint::Count(CountConstraint::presence(group))),
        );
        self.finalized = true;
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.finalized {
            return Err(CohortError::AlreadyFinalized(self.name.clone()));
        }
        Ok(())
    }

    /// All constraints, ordered by kind then insertion
    pub fn constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.values().flatten()
    }

    /// Constraints of one kind
    #[must_use]
    pub fn constraints_of(&self, kind: ConstraintKind) -> &[Constraint] {
        self.constraints.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// `OnlyOne` constraints, applied to streams before any criterion reads them
    #[must_use]
    pub fn collapse_rules(&self) -> Vec<&OnlyOneConstraint> {
        self.constraints_of(ConstraintKind::OnlyOne)
            .iter()
            .filter_map(|c| match c {
                Constraint::OnlyOne(rule) => Some(rule),
                _ => None,
            })
            .collect()
    }

    /// Constraints that each contribute a patient set
    ///
    /// Every count, time and threshold constraint, plus `OnlyOne` constraints whose
    /// subject no other constraint reads (evaluated as presence).
    #[must_use]
    pub fn criteria(&self) -> Vec<&Constraint> {
        let readers = self
            .constraints()
            .filter(|c| c.kind() != ConstraintKind::OnlyOne)
            .collect_vec();

        let standalone = self
            .constraints_of(ConstraintKind::OnlyOne)
            .iter()
            .filter(|rule| {
                let Constraint::OnlyOne(rule) = rule else {
                    return false;
                };
                !readers.iter().any(|c| c.targets_group(&rule.subject))
            });

        readers.iter().copied().chain(standalone).collect()
    }

    /// Distinct code groups referenced by any constraint
    #[must_use]
    pub fn code_groups(&self) -> Vec<&CodeGroup> {
        self.constraints()
            .flat_map(Constraint::targets)
            .unique()
            .collect()
    }

    /// The variable as a JSON value
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
