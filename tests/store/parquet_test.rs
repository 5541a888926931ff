use std::sync::Arc;

use cohort_builder::filter::{Expr, LiteralValue, event_projection, query_for_variable};
use cohort_builder::store::EventSource;
use cohort_builder::{
    Category, ClinicalCohort, CohortBuilder, EngineConfig, EventRecord, ParquetEventStore, Result,
    StoreConfig, StudyWindow, VariableRole,
};

use crate::utils::{
    STUDY_END, STUDY_START, depression_rows, ketamine, study_day, treated_depression, write_rows,
};

fn sorted(mut records: Vec<EventRecord>) -> Vec<EventRecord> {
    records.sort_by(|a, b| {
        (&a.patient_id, a.timestamp, &a.code).cmp(&(&b.patient_id, b.timestamp, &b.code))
    });
    records
}

#[test]
fn test_round_trip_through_store() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_rows(dir.path(), &depression_rows(), 4)?;

    let store = ParquetEventStore::new(StoreConfig::new(dir.path()).with_batch_size(3))?;
    assert_eq!(store.files().len(), 3);

    let query = Expr::Eq("patient_id".to_string(), LiteralValue::from("p3"));
    let records: Vec<EventRecord> = store
        .fetch(&query, &event_projection())?
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .flatten()
        .collect();

    assert_eq!(
        records,
        vec![
            EventRecord::new("p3", study_day(100), "F32", Category::Dx),
            EventRecord::new("p3", study_day(110), "sertraline", Category::Drug),
            EventRecord::new("p3", study_day(130), "ketamine", Category::Drug),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_fetch_async_matches_fetch() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_rows(dir.path(), &depression_rows(), 2)?;
    let store = ParquetEventStore::new(StoreConfig::new(dir.path()))?;

    let window = StudyWindow::from_yyyymmdd(STUDY_START, STUDY_END)?;
    let query = query_for_variable(&treated_depression(0, 60), &window)?;

    let lazy: Vec<EventRecord> = store
        .fetch(&query, &event_projection())?
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .flatten()
        .collect();
    let eager = store.fetch_async(&query, &event_projection()).await?;

    assert_eq!(lazy.len(), 8);
    assert_eq!(sorted(lazy), sorted(eager));
    Ok(())
}

#[tokio::test]
async fn test_build_over_parquet_store() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_rows(dir.path(), &depression_rows(), 3)?;

    let mut cohort = ClinicalCohort::new("depression", STUDY_START, STUDY_END);
    cohort.add_variable(treated_depression(0, 60), VariableRole::Inclusion);
    cohort.add_variable(ketamine(), VariableRole::Exclusion);

    for sorted_by_patient in [false, true] {
        let config = StoreConfig::new(dir.path()).sorted_by_patient(sorted_by_patient);
        let store = ParquetEventStore::new(config)?;
        let builder = CohortBuilder::new(Arc::new(store), EngineConfig::default())?;

        let patients = builder.build_async(&cohort).await?;
        assert_eq!(patients.into_vec(), vec!["p1", "p2"]);
    }
    Ok(())
}
