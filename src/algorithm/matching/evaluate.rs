//! Constraint evaluation against one patient's events

use crate::algorithm::matching::count::match_count;
use crate::algorithm::matching::ordered::match_ordered;
use crate::algorithm::matching::stream::{collapse_repeats, distinct, match_threshold};
use crate::models::{CodeGroup, Constraint, OnlyOneConstraint};

/// Per-group views of one patient's events
pub trait EventStreams {
    /// Ascending timestamps of the events in `group`, duplicates kept
    fn stream(&self, group: &CodeGroup) -> Vec<i64>;

    /// Numeric values of the events in `group`
    fn values(&self, group: &CodeGroup) -> Vec<f64>;
}

/// The stream of `group` after every collapse rule targeting it
fn collapsed_stream<T: EventStreams + ?Sized>(
    timeline: &T,
    group: &CodeGroup,
    rules: &[&OnlyOneConstraint],
) -> Vec<i64> {
    rules
        .iter()
        .filter(|rule| &rule.subject == group)
        .fold(timeline.stream(group), |stream, rule| {
            collapse_repeats(&stream, rule.interval_days)
        })
}

/// Whether a patient satisfies a constraint
///
/// # Arguments
/// * `constraint` - The criterion to test
/// * `timeline` - The patient's events
/// * `rules` - Collapse rules of the owning variable, applied to streams first
#[must_use]
pub fn evaluate<T: EventStreams + ?Sized>(
    constraint: &Constraint,
    timeline: &T,
    rules: &[&OnlyOneConstraint],
) -> bool {
    match constraint {
        Constraint::Count(count) => match_count(
            &collapsed_stream(timeline, &count.subject, rules),
            count.occurrences,
            &count.gap,
        ),
        Constraint::Time(time) => {
            let dependee = distinct(&collapsed_stream(timeline, &time.dependee, rules));
            let dependent = distinct(&collapsed_stream(timeline, &time.dependent, rules));
            match_ordered(&[&dependee, &dependent], &time.gap)
        }
        Constraint::Threshold(threshold) => match_threshold(
            &timeline.values(&threshold.subject),
            threshold.min,
            threshold.max,
        ),
        Constraint::OnlyOne(rule) => !collapsed_stream(timeline, &rule.subject, rules).is_empty(),
    }
}
