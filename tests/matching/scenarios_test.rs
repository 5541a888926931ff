use cohort_builder::algorithm::cohort::PatientTimeline;
use cohort_builder::algorithm::matching::{
    EventStreams, evaluate, in_band, match_count, match_ordered, match_unordered,
};
use cohort_builder::models::CodeGroup;
use cohort_builder::{Category, ClinicalVariable, ConstraintSpec, EventRecord, GapWindow};

use crate::utils::{DAY, days};

fn timeline(events: &[(i64, Category, &str)]) -> PatientTimeline {
    PatientTimeline::new(
        "p1",
        events
            .iter()
            .map(|&(day, category, code)| EventRecord::new("p1", day * DAY, code, category))
            .collect(),
    )
}

/// Evaluate every criterion of a finalized variable against a timeline
fn satisfies(variable: &ClinicalVariable, timeline: &PatientTimeline) -> bool {
    let rules = variable.collapse_rules();
    variable
        .criteria()
        .into_iter()
        .any(|c| evaluate(c, timeline, &rules))
}

#[test]
fn test_order_matters_scenario() {
    let d1 = days(&[0, 20]);
    let m1 = days(&[25]);
    assert!(match_ordered(&[&d1, &m1], &GapWindow::new(10, 40).unwrap()));
    assert!(!match_ordered(&[&d1, &m1], &GapWindow::new(30, 40).unwrap()));
}

#[test]
fn test_count_scenario() {
    let gap = GapWindow::new(0, 365).unwrap();
    assert!(match_count(&days(&[0, 100, 200]), 2, &gap));
    assert!(!match_count(&days(&[0]), 2, &gap));
}

#[test]
fn test_degenerate_band_matches_nothing() {
    for p in [-DAY, 0, DAY] {
        assert!(!in_band(p, 0, 0));
    }
    let stream = days(&[0, 0, 1]);
    assert!(!match_ordered(&[&stream, &stream], &GapWindow::zero()));
    assert!(!match_unordered(&[&stream, &stream], &GapWindow::zero()));
}

#[test]
fn test_time_constraint_through_variable() {
    let mut var = ClinicalVariable::new("treated_t2d");
    var.add_subvariable("t2d", Category::Dx, ["E11"]).unwrap();
    var.add_subvariable("metformin", Category::Drug, ["metformin"])
        .unwrap();
    var.add_constraint(&ConstraintSpec::time(10, 40, "metformin", "t2d"))
        .unwrap();
    var.finalize().unwrap();

    let treated = timeline(&[
        (0, Category::Dx, "E11"),
        (20, Category::Dx, "E11"),
        (25, Category::Drug, "metformin"),
    ]);
    assert!(satisfies(&var, &treated));

    // A prescription exactly on the minimum gap is too close
    let on_minimum = timeline(&[(0, Category::Dx, "E11"), (10, Category::Drug, "metformin")]);
    assert!(!satisfies(&var, &on_minimum));

    // Same codes in another category never match
    let wrong_category = timeline(&[(0, Category::Dx, "E11"), (25, Category::Proc, "metformin")]);
    assert!(!satisfies(&var, &wrong_category));
}

#[test]
fn test_only_one_collapses_before_count() {
    let mut var = ClinicalVariable::new("ssri_snri");
    var.add_subvariable("ssri", Category::Drug, ["sertraline", "citalopram"])
        .unwrap();
    var.add_constraint(&ConstraintSpec::count(2, 42, 730, "ssri"))
        .unwrap();
    var.add_constraint(&ConstraintSpec::only_one(30, "ssri"))
        .unwrap();
    var.finalize().unwrap();

    // Monthly refills from day 0 to day 90 collapse into one event
    let refills = timeline(&[
        (0, Category::Drug, "sertraline"),
        (28, Category::Drug, "sertraline"),
        (56, Category::Drug, "citalopram"),
        (84, Category::Drug, "sertraline"),
    ]);
    assert!(!satisfies(&var, &refills));

    // A second course after a pause is a separate event
    let two_courses = timeline(&[
        (0, Category::Drug, "sertraline"),
        (28, Category::Drug, "sertraline"),
        (200, Category::Drug, "sertraline"),
    ]);
    assert!(satisfies(&var, &two_courses));
}

#[test]
fn test_threshold_constraint() {
    let mut var = ClinicalVariable::new("poor_control");
    var.add_subvariable("hba1c", Category::Lab, ["hba1c"]).unwrap();
    var.add_constraint(&ConstraintSpec::threshold(8.0, 20.0, "hba1c"))
        .unwrap();
    var.finalize().unwrap();

    let measured = |value: f64| {
        PatientTimeline::new(
            "p1",
            vec![EventRecord::new("p1", 0, "hba1c", Category::Lab).with_value(value)],
        )
    };
    assert!(satisfies(&var, &measured(9.1)));
    assert!(!satisfies(&var, &measured(6.2)));
}

#[test]
fn test_duplicate_records_are_one_event() {
    let t = timeline(&[(5, Category::Dx, "E11"), (5, Category::Dx, "E11")]);
    let group = CodeGroup::new(Category::Dx, ["E11"]);
    assert_eq!(t.stream(&group), vec![5 * DAY]);
}
