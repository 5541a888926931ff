//! Cohort definitions
//!
//! A [`ClinicalCohort`] holds the study period and the clinical variables of a study,
//! each with the role it plays. Definitions can be written in code or loaded from JSON:
//!
//! ```json
//! {
//!   "name": "seltorexant",
//!   "study_window": ["20150101", "20201231"],
//!   "variables": [
//!     {
//!       "name": "ssri_snri",
//!       "role": "inclusion",
//!       "subvariables": [{"name": "ssri", "category": "drug", "codes": ["sertraline"]}],
//!       "constraints": [{"kind": "count", "occurrences": 2, "min_gap_days": 42, "max_gap_days": 730, "subject": "ssri"}]
//!     }
//!   ]
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CohortError, Result};
use crate::models::category::Category;
use crate::models::constraint::ConstraintSpec;
use crate::models::event::StudyWindow;
use crate::models::variable::ClinicalVariable;

/// Role a variable plays in a study
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableRole {
    /// Patients must satisfy the variable
    Inclusion,
    /// Patients satisfying the variable are removed
    Exclusion,
    /// Carried for analysis; does not shape the cohort
    Exposure,
    /// Carried for analysis; does not shape the cohort
    Outcome,
    /// Carried for analysis; does not shape the cohort
    Covariate,
}

impl VariableRole {
    /// Whether the role takes part in cohort construction
    #[must_use]
    pub const fn shapes_cohort(self) -> bool {
        matches!(self, Self::Inclusion | Self::Exclusion)
    }
}

impl fmt::Display for VariableRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Inclusion => "inclusion",
            Self::Exclusion => "exclusion",
            Self::Exposure => "exposure",
            Self::Outcome => "outcome",
            Self::Covariate => "covariate",
        })
    }
}

/// A variable together with its role in the study
#[derive(Debug, Clone)]
pub struct StudyVariable {
    pub variable: ClinicalVariable,
    pub role: VariableRole,
}

/// Variables and study period of a research cohort
#[derive(Debug, Clone)]
pub struct ClinicalCohort {
    name: String,
    study_period: (String, String),
    variables: Vec<StudyVariable>,
}

impl ClinicalCohort {
    /// Create a cohort over a study period given as `YYYYMMDD` dates
    pub fn new(name: impl Into<String>, start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            study_period: (start.into(), end.into()),
            variables: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The study period as given
    #[must_use]
    pub fn study_period(&self) -> (&str, &str) {
        (&self.study_period.0, &self.study_period.1)
    }

    /// Convert the study period to a window of POSIX seconds
    pub fn study_window(&self) -> Result<StudyWindow> {
        StudyWindow::from_yyyymmdd(&self.study_period.0, &self.study_period.1)
    }

    /// Add a variable with its role
    pub fn add_variable(&mut self, variable: ClinicalVariable, role: VariableRole) {
        self.variables.push(StudyVariable { variable, role });
    }

    #[must_use]
    pub fn variables(&self) -> &[StudyVariable] {
        &self.variables
    }

    /// Variables with the given role
    pub fn variables_with_role(&self, role: VariableRole) -> impl Iterator<Item = &ClinicalVariable> {
        self.variables
            .iter()
            .filter(move |v| v.role == role)
            .map(|v| &v.variable)
    }

    /// Load a definition from JSON, finalizing every variable
    pub fn from_json(json: &str) -> Result<Self> {
        let definition: CohortDefinition = serde_json::from_str(json)?;
        definition.into_cohort()
    }
}

/// Serialized form of a cohort definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortDefinition {
    pub name: String,
    /// `[start, end]` as `YYYYMMDD`
    pub study_window: (String, String),
    pub variables: Vec<VariableDefinition>,
}

/// Serialized form of one variable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableDefinition {
    pub name: String,
    pub role: VariableRole,
    pub subvariables: Vec<SubvariableDefinition>,
    #[serde(default)]
    pub constraints: Vec<ConstraintSpec>,
}

/// Serialized form of one subvariable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubvariableDefinition {
    pub name: String,
    pub category: Category,
    pub codes: Vec<String>,
}

impl VariableDefinition {
    /// Build and finalize the variable
    pub fn into_variable(self) -> Result<ClinicalVariable> {
        let mut variable = ClinicalVariable::new(self.name);
        for sub in self.subvariables {
            variable.add_subvariable(sub.name, sub.category, sub.codes)?;
        }
        for spec in &self.constraints {
            variable.add_constraint(spec)?;
        }
        variable.finalize()?;
        Ok(variable)
    }
}

impl CohortDefinition {
    /// Build the cohort, validating the study period and every variable
    pub fn into_cohort(self) -> Result<ClinicalCohort> {
        let mut cohort = ClinicalCohort::new(self.name, self.study_window.0, self.study_window.1);
        // Fail early on a bad study period
        cohort.study_window()?;
        for definition in self.variables {
            let role = definition.role;
            cohort.add_variable(definition.into_variable()?, role);
        }
        if cohort.variables_with_role(VariableRole::Inclusion).next().is_none() {
            return Err(CohortError::NoInclusionCriteria);
        }
        Ok(cohort)
    }
}
