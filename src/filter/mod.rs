//! Filtering capabilities for event data
//!
//! This module provides the expression-based filter handed to event sources, and the
//! query builder that turns clinical variables into those expressions.

pub mod builder;
pub mod expr;

pub use builder::{
    build_query, category_to_field, code_predicate, combine, event_projection,
    query_for_variable, window_predicate,
};
pub use expr::{Expr, LiteralValue, filter_batch};

/// A retrieval query over the event store
pub type Query = Expr;
