//! In-memory event source over Arrow record batches

use arrow::record_batch::RecordBatch;
use itertools::Itertools;

use crate::error::Result;
use crate::filter::{Query, filter_batch};
use crate::store::conversion::{EventRow, events_to_batch, records_from_batch};
use crate::store::{EventPages, EventSource};

/// Serves events from record batches held in memory
///
/// Every batch that still has rows after filtering becomes one page.
#[derive(Debug, Clone, Default)]
pub struct BatchEventSource {
    batches: Vec<RecordBatch>,
    sorted: bool,
}

impl BatchEventSource {
    /// Create a source over record batches of the event table
    #[must_use]
    pub const fn new(batches: Vec<RecordBatch>) -> Self {
        Self {
            batches,
            sorted: false,
        }
    }

    /// Create a source over event rows, split into batches of `batch_size` rows
    pub fn from_rows(rows: &[EventRow], batch_size: usize) -> Result<Self> {
        let batches = rows
            .chunks(batch_size.max(1))
            .map(events_to_batch)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(batches))
    }

    /// Declare the batches as ordered by patient id
    #[must_use]
    pub const fn with_sorted(mut self, sorted: bool) -> Self {
        self.sorted = sorted;
        self
    }

    /// Number of batches held
    #[must_use]
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

/// Keep only the projected columns that exist in the batch
fn project(batch: &RecordBatch, projection: &[String]) -> Result<RecordBatch> {
    let schema = batch.schema();
    let indices = projection
        .iter()
        .filter_map(|name| schema.index_of(name).ok())
        .sorted()
        .collect_vec();
    Ok(batch.project(&indices)?)
}

impl EventSource for BatchEventSource {
    fn fetch<'a>(&'a self, query: &Query, projection: &[&str]) -> Result<EventPages<'a>> {
        let query = query.clone();
        let projection = projection.iter().map(ToString::to_string).collect_vec();

        let pages = self
            .batches
            .iter()
            .map(move |batch| {
                let filtered = filter_batch(batch, &query)?;
                records_from_batch(&project(&filtered, &projection)?)
            })
            .filter(|page| !matches!(page, Ok(records) if records.is_empty()));

        Ok(Box::new(pages))
    }

    fn sorted_by_patient(&self) -> bool {
        self.sorted
    }
}
