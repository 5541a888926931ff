//! Data model: event categories, clinical variables, constraints, events and cohort
//! definitions.

pub mod category;
pub mod cohort;
pub mod constraint;
pub mod event;
pub mod variable;

pub use category::Category;
pub use cohort::{ClinicalCohort, CohortDefinition, StudyVariable, VariableRole};
pub use constraint::{
    CodeGroup, CodeSet, Constraint, ConstraintKind, ConstraintSpec, CountConstraint, GapWindow,
    OnlyOneConstraint, SECONDS_PER_DAY, ThresholdConstraint, TimeConstraint,
};
pub use event::{EventRecord, StudyWindow};
pub use variable::{ClinicalVariable, Subvariable};
