//! Cohort builder
//!
//! Drives one build: a retrieval query per variable, streaming grouping of the returned
//! records into patient timelines, parallel evaluation of completed timelines against
//! every criterion, and the final set composition.

use std::sync::Arc;
use std::time::Instant;

use futures::future::try_join_all;
use rayon::prelude::*;
use smallvec::SmallVec;

use crate::algorithm::cohort::algebra::{CohortSet, compose, union};
use crate::algorithm::cohort::grouping::{PatientGrouper, PatientTimeline};
use crate::algorithm::matching::evaluate;
use crate::config::EngineConfig;
use crate::error::{CohortError, Result};
use crate::filter::{event_projection, query_for_variable};
use crate::models::{
    ClinicalCohort, ClinicalVariable, Constraint, OnlyOneConstraint, StudyWindow, VariableRole,
};
use crate::store::EventSource;
use crate::utils::logging::{
    create_hidden_progress_bar, create_patient_progress_bar, finish_progress_bar,
    log_operation_complete, log_operation_start, log_warning,
};

/// Outcome of evaluating one variable
#[derive(Debug, Clone)]
pub struct VariableResult {
    /// Name of the variable
    pub name: String,
    /// Patients matching each criterion, in [`ClinicalVariable::criteria`] order
    pub per_constraint: Vec<CohortSet>,
    /// Patients matching any criterion
    pub patients: CohortSet,
}

/// Builds cohorts from an event source
#[derive(Clone)]
pub struct CohortBuilder {
    source: Arc<dyn EventSource>,
    config: EngineConfig,
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl CohortBuilder {
    /// Create a builder
    ///
    /// # Errors
    /// Returns an error if a dedicated thread pool is requested and cannot be created
    pub fn new(source: Arc<dyn EventSource>, config: EngineConfig) -> Result<Self> {
        let pool = config
            .num_threads
            .map(|threads| {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map(Arc::new)
                    .map_err(|e| CohortError::Task(e.to_string()))
            })
            .transpose()?;
        Ok(Self {
            source,
            config,
            pool,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Find the patients satisfying a variable within the study window
    ///
    /// # Errors
    /// `NotFinalized` for a variable that was not finalized; any retrieval error.
    pub fn evaluate_variable(
        &self,
        variable: &ClinicalVariable,
        window: &StudyWindow,
    ) -> Result<VariableResult> {
        if !variable.is_finalized() {
            return Err(CohortError::NotFinalized(variable.name().to_string()));
        }

        let start = Instant::now();
        log_operation_start("Evaluating variable", variable.name());

        let criteria = variable.criteria();
        let rules = variable.collapse_rules();
        let mut per_constraint = vec![CohortSet::new(); criteria.len()];

        if criteria.is_empty() {
            log_warning("Variable has no criteria and matches no patient", Some(variable.name()));
            return Ok(VariableResult {
                name: variable.name().to_string(),
                per_constraint,
                patients: CohortSet::new(),
            });
        }

        let query = query_for_variable(variable, window)?;
        log::debug!("Variable '{}': {} criteria, query {query}", variable.name(), criteria.len());

        let chunk_size = self.config.chunk_size.max(1);
        let mut grouper = PatientGrouper::new(*window, self.source.sorted_by_patient());
        let pb = if self.config.show_progress {
            create_patient_progress_bar(Some(variable.name()))
        } else {
            create_hidden_progress_bar()
        };

        let mut completed: Vec<PatientTimeline> = Vec::new();
        let mut evaluated = 0;
        for page in self.source.fetch(&query, &event_projection())? {
            completed.extend(grouper.push(page?)?);
            if completed.len() >= chunk_size {
                self.record_chunk(&completed, &criteria, &rules, &mut per_constraint);
                pb.inc(completed.len() as u64);
                evaluated += completed.len();
                completed.clear();
            }
        }

        completed.extend(grouper.finish());
        for chunk in completed.chunks(chunk_size) {
            self.record_chunk(chunk, &criteria, &rules, &mut per_constraint);
            pb.inc(chunk.len() as u64);
        }
        evaluated += completed.len();
        finish_progress_bar(&pb, Some(&format!("{} done", variable.name())));

        let patients = union(&per_constraint);
        log::debug!(
            "Variable '{}': {} of {evaluated} patients with events matched",
            variable.name(),
            patients.len()
        );
        log_operation_complete("matched", variable.name(), patients.len(), Some(start.elapsed()));

        Ok(VariableResult {
            name: variable.name().to_string(),
            per_constraint,
            patients,
        })
    }

    /// Evaluate a chunk of timelines and add the matches to the per-criterion sets
    fn record_chunk(
        &self,
        timelines: &[PatientTimeline],
        criteria: &[&Constraint],
        rules: &[&OnlyOneConstraint],
        per_constraint: &mut [CohortSet],
    ) {
        for (timeline, matches) in timelines.iter().zip(self.evaluate_chunk(timelines, criteria, rules)) {
            for (set, matched) in per_constraint.iter_mut().zip(matches) {
                if matched {
                    set.insert(timeline.patient_id());
                }
            }
        }
    }

    fn evaluate_chunk(
        &self,
        timelines: &[PatientTimeline],
        criteria: &[&Constraint],
        rules: &[&OnlyOneConstraint],
    ) -> Vec<SmallVec<[bool; 8]>> {
        let evaluate_one = |timeline: &PatientTimeline| -> SmallVec<[bool; 8]> {
            criteria
                .iter()
                .map(|constraint| evaluate(constraint, timeline, rules))
                .collect()
        };

        if !self.config.parallel {
            return timelines.iter().map(evaluate_one).collect();
        }

        let run = || -> Vec<SmallVec<[bool; 8]>> { timelines.par_iter().map(evaluate_one).collect() };
        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }

    /// Validate the cohort before any retrieval
    fn prepare(&self, cohort: &ClinicalCohort) -> Result<StudyWindow> {
        log::info!("Building cohort '{}'", cohort.name());
        log::info!("{}", self.config);

        let window = cohort.study_window()?;
        for entry in cohort.variables() {
            if !entry.variable.is_finalized() {
                return Err(CohortError::NotFinalized(entry.variable.name().to_string()));
            }
            if !entry.role.shapes_cohort() {
                log_warning(
                    &format!("Skipping {} variable during cohort construction", entry.role),
                    Some(entry.variable.name()),
                );
            }
        }
        Ok(window)
    }

    fn finish(cohort: &ClinicalCohort, results: Vec<(VariableRole, VariableResult)>) -> Result<CohortSet> {
        let (inclusion, exclusion): (Vec<_>, Vec<_>) = results
            .into_iter()
            .partition(|(role, _)| *role == VariableRole::Inclusion);
        let inclusion: Vec<CohortSet> = inclusion.into_iter().map(|(_, r)| r.patients).collect();
        let exclusion: Vec<CohortSet> = exclusion.into_iter().map(|(_, r)| r.patients).collect();

        let patients = compose(&inclusion, &exclusion)?;
        log::info!(
            "Cohort '{}': {} patients ({} inclusion, {} exclusion variables)",
            cohort.name(),
            patients.len(),
            inclusion.len(),
            exclusion.len()
        );
        Ok(patients)
    }

    /// Build the cohort, evaluating variables one after another
    ///
    /// # Errors
    /// Fails on an invalid study period, an unfinalized variable, a cohort without
    /// inclusion variables, or any retrieval error. No partial cohort is returned.
    pub fn build(&self, cohort: &ClinicalCohort) -> Result<CohortSet> {
        let window = self.prepare(cohort)?;
        let results = cohort
            .variables()
            .iter()
            .filter(|entry| entry.role.shapes_cohort())
            .map(|entry| Ok((entry.role, self.evaluate_variable(&entry.variable, &window)?)))
            .collect::<Result<Vec<_>>>()?;
        Self::finish(cohort, results)
    }

    /// Build the cohort, evaluating variables concurrently on the blocking pool
    pub async fn build_async(&self, cohort: &ClinicalCohort) -> Result<CohortSet> {
        let window = self.prepare(cohort)?;
        let tasks = cohort
            .variables()
            .iter()
            .filter(|entry| entry.role.shapes_cohort())
            .map(|entry| {
                let builder = self.clone();
                let variable = entry.variable.clone();
                let role = entry.role;
                async move {
                    let result = tokio::task::spawn_blocking(move || {
                        builder.evaluate_variable(&variable, &window)
                    })
                    .await
                    .map_err(|e| CohortError::Task(e.to_string()))??;
                    Ok::<_, CohortError>((role, result))
                }
            });
        let results = try_join_all(tasks).await?;
        Self::finish(cohort, results)
    }
}
