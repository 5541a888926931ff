use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, bail};
use cohort_builder::{ClinicalCohort, CohortBuilder, EngineConfig, ParquetEventStore, StoreConfig};
use log::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let (Some(definition_path), Some(event_dir)) = (args.next(), args.next()) else {
        bail!("usage: cohort-builder <definition.json> <event-dir>");
    };

    let definition = std::fs::read_to_string(&definition_path)
        .with_context(|| format!("Failed to read cohort definition {definition_path}"))?;
    let cohort = ClinicalCohort::from_json(&definition)
        .with_context(|| format!("Invalid cohort definition {definition_path}"))?;

    let store_config = StoreConfig::new(PathBuf::from(&event_dir)).with_env_overrides();
    info!("{store_config}");
    let store = ParquetEventStore::new(store_config)
        .with_context(|| format!("Failed to open event store {event_dir}"))?;

    let config = EngineConfig {
        show_progress: true,
        ..EngineConfig::default()
    };
    let builder = CohortBuilder::new(Arc::new(store), config)?;

    let start = Instant::now();
    let patients = builder
        .build_async(&cohort)
        .await
        .with_context(|| format!("Failed to build cohort '{}'", cohort.name()))?;
    info!(
        "Cohort '{}' built with {} patients in {:?}",
        cohort.name(),
        patients.len(),
        start.elapsed()
    );

    for patient_id in patients.iter() {
        println!("{patient_id}");
    }

    Ok(())
}
