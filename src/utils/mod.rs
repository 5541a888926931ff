//! Shared utilities: dates, logging and progress reporting

pub mod date_utils;
pub mod logging;

pub use date_utils::{parse_yyyymmdd, yyyymmdd_to_unix};
pub use logging::{log_operation_complete, log_operation_start, log_warning};
