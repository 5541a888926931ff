//! Grouping of event records into per-patient timelines
//!
//! Records arrive in pages from an event source. When the source is ordered by patient
//! id, a timeline is complete as soon as the next patient starts, and only the patient
//! being assembled is held in memory. Otherwise records are folded into a hash map and
//! every timeline is released at the end.

use rustc_hash::FxHashMap;

use crate::algorithm::matching::EventStreams;
use crate::error::{CohortError, Result};
use crate::models::{CodeGroup, EventRecord, StudyWindow};

/// All in-window events of one patient, ascending by timestamp
#[derive(Debug, Clone)]
pub struct PatientTimeline {
    patient_id: String,
    events: Vec<EventRecord>,
}

impl PatientTimeline {
    /// Build a timeline, sorting events and dropping repeated records of the same event
    pub fn new(patient_id: impl Into<String>, mut events: Vec<EventRecord>) -> Self {
        events.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.code.cmp(&b.code)));
        events.dedup_by(|a, b| a.same_event(b));
        Self {
            patient_id: patient_id.into(),
            events,
        }
    }

    #[must_use]
    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    #[must_use]
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn in_group<'a>(&'a self, group: &'a CodeGroup) -> impl Iterator<Item = &'a EventRecord> {
        self.events
            .iter()
            .filter(move |e| group.contains(e.category, &e.code))
    }
}

impl EventStreams for PatientTimeline {
    fn stream(&self, group: &CodeGroup) -> Vec<i64> {
        self.in_group(group).map(|e| e.timestamp).collect()
    }

    fn values(&self, group: &CodeGroup) -> Vec<f64> {
        self.in_group(group).filter_map(|e| e.value).collect()
    }
}

/// Streaming group-by-patient over pages of records
#[derive(Debug)]
pub struct PatientGrouper {
    window: StudyWindow,
    sorted: bool,
    current: Option<(String, Vec<EventRecord>)>,
    pending: FxHashMap<String, Vec<EventRecord>>,
}

impl PatientGrouper {
    /// Create a grouper
    ///
    /// # Arguments
    /// * `window` - Records outside the window are dropped
    /// * `sorted` - Whether pages arrive in ascending patient id order
    #[must_use]
    pub fn new(window: StudyWindow, sorted: bool) -> Self {
        Self {
            window,
            sorted,
            current: None,
            pending: FxHashMap::default(),
        }
    }

    /// Consume one page, returning the timelines it completed
    ///
    /// # Errors
    /// In sorted mode, `UnsortedSource` when a patient id arrives after a greater one,
    /// which includes a patient reappearing after release.
    pub fn push(&mut self, page: Vec<EventRecord>) -> Result<Vec<PatientTimeline>> {
        let records = page.into_iter().filter(|r| self.window.contains(r.timestamp));

        if !self.sorted {
            for record in records {
                self.pending
                    .entry(record.patient_id.clone())
                    .or_default()
                    .push(record);
            }
            return Ok(Vec::new());
        }

        let mut completed = Vec::new();
        for record in records {
            match &mut self.current {
                Some((id, events)) if *id == record.patient_id => events.push(record),
                Some((id, _)) if record.patient_id < *id => {
                    return Err(CohortError::UnsortedSource(record.patient_id));
                }
                _ => {
                    let next = (record.patient_id.clone(), vec![record]);
                    if let Some((id, events)) = self.current.replace(next) {
                        completed.push(PatientTimeline::new(id, events));
                    }
                }
            }
        }
        Ok(completed)
    }

    /// Release every timeline still held
    #[must_use]
    pub fn finish(self) -> Vec<PatientTimeline> {
        let mut timelines: Vec<_> = self
            .pending
            .into_iter()
            .chain(self.current)
            .map(|(id, events)| PatientTimeline::new(id, events))
            .collect();
        timelines.sort_by(|a, b| a.patient_id.cmp(&b.patient_id));
        timelines
    }
}
