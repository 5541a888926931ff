//! Logging utilities
//!
//! This module provides standardized logging functions for cohort operations.

use std::time::Duration;

/// Log an operation start with consistent format
///
/// # Arguments
/// * `operation` - Description of the operation
/// * `target` - What the operation works on (variable, cohort or directory)
pub fn log_operation_start(operation: &str, target: &str) {
    log::info!("{operation} {target}");
}

/// Log an operation completion with consistent format
///
/// # Arguments
/// * `operation` - Description of the operation
/// * `target` - What the operation worked on
/// * `items` - Number of items produced
/// * `elapsed` - Optional elapsed time
pub fn log_operation_complete(operation: &str, target: &str, items: usize, elapsed: Option<Duration>) {
    if let Some(duration) = elapsed {
        log::info!("Successfully {operation} {items} items for {target} in {duration:?}");
    } else {
        log::info!("Successfully {operation} {items} items for {target}");
    }
}

/// Log a warning with consistent format
///
/// # Arguments
/// * `message` - Warning message
/// * `target` - Optional name the warning relates to
pub fn log_warning(message: &str, target: Option<&str>) {
    if let Some(target) = target {
        log::warn!("{message}: {target}");
    } else {
        log::warn!("{message}");
    }
}
