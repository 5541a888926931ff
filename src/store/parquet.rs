//! Parquet-backed event store
//!
//! Reads every `*.parquet` file of a directory, in path order, with column projection,
//! a configurable batch size and the query applied to each batch.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use itertools::{Either, Itertools};
use parquet::arrow::ArrowWriter;
use parquet::arrow::ProjectionMask;
use parquet::arrow::arrow_reader::{ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder};

use crate::config::StoreConfig;
use crate::error::{CohortError, Result};
use crate::filter::{Query, filter_batch};
use crate::models::EventRecord;
use crate::store::conversion::{EventRow, events_to_batch, records_from_batch};
use crate::store::{EventPages, EventSource};
use crate::utils::logging::{log_operation_complete, log_operation_start, log_warning};

/// Event store over a directory of Parquet files
#[derive(Debug, Clone)]
pub struct ParquetEventStore {
    config: StoreConfig,
    files: Vec<PathBuf>,
}

impl ParquetEventStore {
    /// Open the store, listing the Parquet files of `config.data_dir`
    ///
    /// # Errors
    /// Returns an error if the directory does not exist or cannot be read
    pub fn new(config: StoreConfig) -> Result<Self> {
        let files = find_parquet_files(&config.data_dir)?;
        log::debug!("Opened event store with {}", config);
        Ok(Self { config, files })
    }

    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The Parquet files served, in read order
    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    fn columns_for(query: &Query, projection: &[&str]) -> Vec<String> {
        let mut columns = query.required_columns();
        columns.extend(projection.iter().map(ToString::to_string));
        columns.into_iter().sorted().collect()
    }

    /// Retrieve all matching events, reading files concurrently
    ///
    /// A standalone loader for callers that want every matching record in memory at
    /// once; the cohort builder streams pages through [`EventSource::fetch`] instead.
    /// Files are decoded on tokio's blocking pool, at most one per CPU at a time.
    /// Records are returned grouped by file in completion order.
    ///
    /// # Errors
    /// Returns an error if a file cannot be read or decoded, or a read task panics
    pub async fn fetch_async(&self, query: &Query, projection: &[&str]) -> Result<Vec<EventRecord>> {
        let start = Instant::now();
        let target = self.config.data_dir.display().to_string();
        log_operation_start("Loading events asynchronously from", &target);

        let columns = Arc::new(Self::columns_for(query, projection));
        let query = Arc::new(query.clone());
        let batch_size = self.config.batch_size;

        let results = stream::iter(self.files.clone())
            .map(|path| {
                let columns = Arc::clone(&columns);
                let query = Arc::clone(&query);
                async move {
                    tokio::task::spawn_blocking(move || {
                        read_pages(&path, &query, &columns, batch_size)?
                            .collect::<Result<Vec<_>>>()
                    })
                    .await
                    .map_err(|e| CohortError::Task(e.to_string()))?
                }
            })
            .buffer_unordered(num_cpus::get())
            .collect::<Vec<_>>()
            .await;

        let records = results
            .into_iter()
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .flatten()
            .collect_vec();

        log_operation_complete("loaded", &target, records.len(), Some(start.elapsed()));
        Ok(records)
    }
}

impl EventSource for ParquetEventStore {
    fn fetch<'a>(&'a self, query: &Query, projection: &[&str]) -> Result<EventPages<'a>> {
        let columns = Self::columns_for(query, projection);
        let query = query.clone();
        let batch_size = self.config.batch_size;

        let pages = self.files.iter().flat_map(move |path| {
            match read_pages(path, &query, &columns, batch_size) {
                Ok(pages) => Either::Left(pages),
                Err(e) => Either::Right(std::iter::once(Err(e))),
            }
        });

        Ok(Box::new(pages))
    }

    fn sorted_by_patient(&self) -> bool {
        self.config.sorted_by_patient
    }
}

/// List the Parquet files of a directory, sorted by path
fn find_parquet_files(dir: &Path) -> Result<Vec<PathBuf>> {
    log_operation_start("Searching for parquet files in", &dir.display().to_string());
    if !dir.is_dir() {
        return Err(CohortError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Directory does not exist: {}", dir.display()),
        )));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "parquet") {
            files.push(path);
        }
    }
    files.sort();

    if files.is_empty() {
        log_warning("No Parquet files found in directory", Some(&dir.display().to_string()));
    } else {
        log_operation_complete("found", &dir.display().to_string(), files.len(), None);
    }
    Ok(files)
}

/// Open a lazy reader over one file, projected to the columns it has
fn open_reader(path: &Path, columns: &[String], batch_size: usize) -> Result<ParquetRecordBatchReader> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?.with_batch_size(batch_size);

    let file_schema = Arc::clone(builder.schema());
    let indices = columns
        .iter()
        .filter_map(|name| file_schema.index_of(name).ok())
        .sorted()
        .collect_vec();
    let mask = ProjectionMask::roots(builder.parquet_schema(), indices);

    Ok(builder.with_projection(mask).build()?)
}

/// Pages of matching records from one file
fn read_pages(
    path: &Path,
    query: &Query,
    columns: &[String],
    batch_size: usize,
) -> Result<impl Iterator<Item = Result<Vec<EventRecord>>> + Send + use<>> {
    let reader = open_reader(path, columns, batch_size)?;
    let query = query.clone();
    log::debug!("Reading events from {}", path.display());

    Ok(reader
        .map(move |batch| {
            let filtered = filter_batch(&batch?, &query)?;
            records_from_batch(&filtered)
        })
        .filter(|page| !matches!(page, Ok(records) if records.is_empty())))
}

/// Write event rows to a Parquet file with the event table schema
pub fn write_event_file(path: &Path, rows: &[EventRow]) -> Result<()> {
    let batch = events_to_batch(rows)?;
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}
