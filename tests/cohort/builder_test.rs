use std::sync::Arc;

use cohort_builder::store::EventRow;
use cohort_builder::{
    BatchEventSource, Category, ClinicalCohort, ClinicalVariable, CohortBuilder, CohortError,
    EngineConfig, StudyWindow, VariableRole,
};

use crate::utils::{
    STUDY_END, STUDY_START, depression_rows, ketamine, row, treated_depression,
};

fn builder(rows: &[EventRow], sorted: bool, config: EngineConfig) -> CohortBuilder {
    let source = BatchEventSource::from_rows(rows, 2).unwrap().with_sorted(sorted);
    CohortBuilder::new(Arc::new(source), config).unwrap()
}

fn depression_cohort(min_days: u32, max_days: u32) -> ClinicalCohort {
    let mut cohort = ClinicalCohort::new("depression", STUDY_START, STUDY_END);
    cohort.add_variable(treated_depression(min_days, max_days), VariableRole::Inclusion);
    cohort.add_variable(ketamine(), VariableRole::Exclusion);
    cohort
}

fn ids(patients: cohort_builder::CohortSet) -> Vec<String> {
    patients.into_vec()
}

#[test]
fn test_build_applies_inclusion_and_exclusion() {
    let builder = builder(&depression_rows(), false, EngineConfig::default());
    assert_eq!(ids(builder.build(&depression_cohort(10, 40)).unwrap()), vec!["p1"]);
    assert_eq!(
        ids(builder.build(&depression_cohort(0, 60)).unwrap()),
        vec!["p1", "p2"]
    );
}

#[test]
fn test_sorted_and_hash_grouping_agree() {
    let configs = [
        EngineConfig::default(),
        EngineConfig {
            parallel: false,
            chunk_size: 1,
            ..EngineConfig::default()
        },
        EngineConfig {
            num_threads: Some(2),
            chunk_size: 2,
            ..EngineConfig::default()
        },
    ];
    let cohort = depression_cohort(0, 60);
    for config in configs {
        for sorted in [false, true] {
            let builder = builder(&depression_rows(), sorted, config.clone());
            assert_eq!(ids(builder.build(&cohort).unwrap()), vec!["p1", "p2"]);
        }
    }
}

#[test]
fn test_variable_result_per_criterion() {
    let mut var = ClinicalVariable::new("depression_or_ssri");
    var.add_subvariable("mdd", Category::Dx, ["F32", "F33"])
        .unwrap();
    var.add_subvariable("ssri", Category::Drug, ["sertraline"])
        .unwrap();
    var.finalize().unwrap();

    let builder = builder(&depression_rows(), false, EngineConfig::default());
    let result = builder
        .evaluate_variable(&var, &StudyWindow::from_yyyymmdd(STUDY_START, STUDY_END).unwrap())
        .unwrap();

    assert_eq!(result.name, "depression_or_ssri");
    assert_eq!(result.per_constraint.len(), 2);
    assert_eq!(ids(result.per_constraint[0].clone()), vec!["p1", "p2", "p3"]);
    assert_eq!(ids(result.per_constraint[1].clone()), vec!["p1", "p2", "p3", "p4"]);
    // p5's diagnosis lies before the study period
    assert_eq!(ids(result.patients), vec!["p1", "p2", "p3", "p4"]);
}

#[test]
fn test_unsorted_source_fails_in_sorted_mode() {
    let rows = vec![
        row("p1", 0, Category::Dx, "F32"),
        row("p2", 10, Category::Dx, "F32"),
        row("p1", 25, Category::Drug, "sertraline"),
    ];
    let builder = builder(&rows, true, EngineConfig::default());
    assert!(matches!(
        builder.build(&depression_cohort(0, 60)),
        Err(CohortError::UnsortedSource(id)) if id == "p1"
    ));
}

#[test]
fn test_build_rejects_invalid_cohorts() {
    let builder = builder(&depression_rows(), false, EngineConfig::default());

    let mut unfinalized = ClinicalCohort::new("draft", STUDY_START, STUDY_END);
    let mut var = ClinicalVariable::new("mdd");
    var.add_subvariable("mdd", Category::Dx, ["F32"]).unwrap();
    unfinalized.add_variable(var, VariableRole::Inclusion);
    assert!(matches!(
        builder.build(&unfinalized),
        Err(CohortError::NotFinalized(_))
    ));

    let mut bad_dates = ClinicalCohort::new("depression", "2015-01-01", STUDY_END);
    bad_dates.add_variable(treated_depression(0, 60), VariableRole::Inclusion);
    assert!(matches!(
        builder.build(&bad_dates),
        Err(CohortError::InvalidDate { .. })
    ));

    let mut exclusion_only = ClinicalCohort::new("exclusion_only", STUDY_START, STUDY_END);
    exclusion_only.add_variable(ketamine(), VariableRole::Exclusion);
    assert!(matches!(
        builder.build(&exclusion_only),
        Err(CohortError::NoInclusionCriteria)
    ));
}

#[test]
fn test_analysis_roles_do_not_shape_cohort() {
    let mut cohort = depression_cohort(0, 60);
    cohort.add_variable(ketamine(), VariableRole::Outcome);
    let builder = builder(&depression_rows(), false, EngineConfig::default());
    assert_eq!(ids(builder.build(&cohort).unwrap()), vec!["p1", "p2"]);
}

#[tokio::test]
async fn test_build_async_matches_build() {
    let builder = builder(&depression_rows(), true, EngineConfig::default());
    for (min, max) in [(10, 40), (0, 60), (200, 300)] {
        let cohort = depression_cohort(min, max);
        let expected = builder.build(&cohort).unwrap();
        assert_eq!(builder.build_async(&cohort).await.unwrap(), expected);
    }
}

#[test]
fn test_build_from_json_definition() {
    let json = format!(
        r#"{{
            "name": "depression",
            "study_window": ["{STUDY_START}", "{STUDY_END}"],
            "variables": [
                {{
                    "name": "treated_depression",
                    "role": "inclusion",
                    "subvariables": [
                        {{"name": "mdd", "category": "dx", "codes": ["F32", "F33"]}},
                        {{"name": "ssri", "category": "drug", "codes": ["sertraline"]}}
                    ],
                    "constraints": [
                        {{"kind": "time", "min_gap_days": 0, "max_gap_days": 60, "dependent": "ssri", "dependee": "mdd"}}
                    ]
                }},
                {{
                    "name": "ketamine",
                    "role": "exclusion",
                    "subvariables": [{{"name": "ketamine", "category": "drug", "codes": ["ketamine"]}}]
                }}
            ]
        }}"#
    );
    let cohort = ClinicalCohort::from_json(&json).unwrap();
    let builder = builder(&depression_rows(), false, EngineConfig::default());
    assert_eq!(ids(builder.build(&cohort).unwrap()), vec!["p1", "p2"]);
}
