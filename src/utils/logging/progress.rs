//! Progress reporting utilities for long-running evaluations
//!
//! This module provides standardized progress reporting using the indicatif crate.

use indicatif::{ProgressBar, ProgressStyle};

/// Default style for a progress bar over patients
pub const DEFAULT_MAIN_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] {pos} patients ({per_sec}) {msg}";

/// Create a progress bar counting evaluated patients
///
/// The total is unknown while records are still streaming in, so the bar counts up.
#[must_use]
pub fn create_patient_progress_bar(description: Option<&str>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template(DEFAULT_MAIN_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );

    if let Some(desc) = description {
        pb.set_message(desc.to_string());
    }

    pb
}

/// A progress bar that draws nothing, used when progress display is off
#[must_use]
pub fn create_hidden_progress_bar() -> ProgressBar {
    ProgressBar::hidden()
}

/// Finish a progress bar with a completion message
///
/// # Arguments
/// * `pb` - The `ProgressBar` to finish
/// * `message` - Optional completion message
pub fn finish_progress_bar(pb: &ProgressBar, message: Option<&str>) {
    if let Some(msg) = message {
        pb.finish_with_message(msg.to_string());
    } else {
        pb.finish();
    }
}
