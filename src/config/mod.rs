//! Configuration for cohort evaluation and event retrieval.

use std::fmt;
use std::path::PathBuf;

/// Default number of rows per Parquet record batch
pub const DEFAULT_BATCH_SIZE: usize = 16384;

/// Default number of completed patient timelines evaluated per parallel chunk
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Configuration for the cohort builder
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Evaluate patients in parallel with rayon
    pub parallel: bool,
    /// Size of a dedicated thread pool; `None` uses the global rayon pool
    pub num_threads: Option<usize>,
    /// Number of completed timelines buffered before a parallel evaluation pass
    pub chunk_size: usize,
    /// Show a progress bar while evaluating patients
    pub show_progress: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            num_threads: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            show_progress: false,
        }
    }
}

impl fmt::Display for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Engine Configuration:")?;
        writeln!(f, "  Parallel: {}", self.parallel)?;
        if let Some(threads) = self.num_threads {
            writeln!(f, "  Threads: {threads}")?;
        }
        writeln!(f, "  Chunk Size: {}", self.chunk_size)?;
        writeln!(f, "  Show Progress: {}", self.show_progress)?;
        Ok(())
    }
}

/// Configuration handed to the Parquet event store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding the event Parquet files
    pub data_dir: PathBuf,
    /// Rows per record batch when reading
    pub batch_size: usize,
    /// Whether the files are in ascending patient id order (enables streaming evaluation)
    pub sorted_by_patient: bool,
}

impl StoreConfig {
    /// Create a store configuration for a data directory
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            sorted_by_patient: false,
        }
    }

    /// Set the batch size
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Declare the files as in ascending patient id order
    #[must_use]
    pub const fn sorted_by_patient(mut self, sorted: bool) -> Self {
        self.sorted_by_patient = sorted;
        self
    }

    /// Apply overrides from the environment (`PARQUET_BATCH_SIZE`)
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(batch_size) = std::env::var("PARQUET_BATCH_SIZE")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
        {
            self.batch_size = batch_size;
        }
        self
    }
}

impl fmt::Display for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Store Configuration:")?;
        writeln!(f, "  Data Directory: {}", self.data_dir.display())?;
        writeln!(f, "  Batch Size: {}", self.batch_size)?;
        writeln!(f, "  Sorted By Patient: {}", self.sorted_by_patient)?;
        Ok(())
    }
}
