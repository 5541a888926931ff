//! Event sources
//!
//! The cohort builder retrieves events through the [`EventSource`] trait. A source
//! answers a [`Query`] with pages of [`EventRecord`]s; pages are pulled lazily so a
//! large store never has to be materialized at once.

pub mod batch;
pub mod conversion;
pub mod parquet;

use crate::error::Result;
use crate::filter::Query;
use crate::models::EventRecord;

pub use batch::BatchEventSource;
pub use conversion::{EventRow, event_schema, events_to_batch, records_from_batch};
pub use parquet::{ParquetEventStore, write_event_file};

/// Lazily produced pages of event records
pub type EventPages<'a> = Box<dyn Iterator<Item = Result<Vec<EventRecord>>> + Send + 'a>;

/// A store of clinical events that can be queried
pub trait EventSource: Send + Sync {
    /// Retrieve the events matching `query`
    ///
    /// # Arguments
    /// * `query` - Row filter to apply
    /// * `projection` - Columns to read; columns the query needs are always read
    ///
    /// # Returns
    /// An iterator over pages of matching records
    fn fetch<'a>(&'a self, query: &Query, projection: &[&str]) -> Result<EventPages<'a>>;

    /// Whether pages arrive in ascending patient id order
    ///
    /// When true, a patient's events are contiguous across pages and the builder can
    /// release each patient as soon as the next one starts.
    fn sorted_by_patient(&self) -> bool {
        false
    }
}
