//! Retrieval queries for clinical variables
//!
//! Every query has the shape `OR(code predicates) AND timestamp window`. The event store
//! keeps one column per category; [`category_to_field`] names it.

use itertools::Itertools;

use crate::error::{CohortError, Result};
use crate::filter::expr::{Expr, LiteralValue};
use crate::filter::Query;
use crate::models::{Category, ClinicalVariable, CodeSet, StudyWindow};

/// Column holding the POSIX-second timestamp of an event
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Column holding the patient id
pub const PATIENT_ID_FIELD: &str = "patient_id";

/// Column holding the numeric payload of lab and vital events
pub const VALUE_FIELD: &str = "value";

/// Name of the event column holding codes of `category`
#[must_use]
pub const fn category_to_field(category: Category) -> &'static str {
    match category {
        Category::Drug => "meds_drugs",
        Category::Dx => "diagnosis_code",
        Category::Proc => "procedure_code",
        Category::Lab => "lab_name",
        Category::Vital => "vital_name",
    }
}

/// `field(category) IN codes`
#[must_use]
pub fn code_predicate(codes: &CodeSet, category: Category) -> Expr {
    Expr::In(
        category_to_field(category).to_string(),
        codes.iter().map(|c| LiteralValue::from(c.as_str())).collect(),
    )
}

/// `timestamp >= start AND timestamp <= end`
#[must_use]
pub fn window_predicate(window: &StudyWindow) -> Expr {
    Expr::And(vec![
        Expr::GtEq(TIMESTAMP_FIELD.to_string(), LiteralValue::Int(window.start())),
        Expr::LtEq(TIMESTAMP_FIELD.to_string(), LiteralValue::Int(window.end())),
    ])
}

/// Query for one code set within the study window
#[must_use]
pub fn build_query(codes: &CodeSet, category: Category, window: &StudyWindow) -> Query {
    Expr::And(vec![code_predicate(codes, category), window_predicate(window)])
}

/// OR together any number of code predicates and restrict them to the window
///
/// # Errors
/// Returns a `Query` error when `leaves` is empty.
pub fn combine(leaves: Vec<Expr>, window: &StudyWindow) -> Result<Query> {
    if leaves.is_empty() {
        return Err(CohortError::query("Cannot combine an empty list of predicates"));
    }
    Ok(Expr::And(vec![Expr::Or(leaves), window_predicate(window)]))
}

/// The single retrieval query covering every code group of a variable
pub fn query_for_variable(variable: &ClinicalVariable, window: &StudyWindow) -> Result<Query> {
    let leaves = variable
        .code_groups()
        .into_iter()
        .map(|group| code_predicate(&group.codes, group.category))
        .collect_vec();
    combine(leaves, window).map_err(|_| {
        CohortError::query(format!(
            "Variable '{}' has no constraints to retrieve events for",
            variable.name()
        ))
    })
}

/// Columns an event source must read to answer queries
#[must_use]
pub fn event_projection() -> Vec<&'static str> {
    let mut columns = vec![PATIENT_ID_FIELD, TIMESTAMP_FIELD];
    columns.extend(Category::ALL.iter().map(|c| category_to_field(*c)));
    columns.push(VALUE_FIELD);
    columns
}
