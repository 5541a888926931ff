use std::path::Path;

use cohort_builder::store::{EventRow, write_event_file};
use cohort_builder::utils::yyyymmdd_to_unix;
use cohort_builder::{Category, ClinicalVariable, ConstraintSpec, Result};

/// Seconds in a day
pub const DAY: i64 = 86_400;

/// First day of the test study period
pub const STUDY_START: &str = "20150101";

/// Last day of the test study period
pub const STUDY_END: &str = "20201231";

/// POSIX seconds of `days` after the start of the study period
#[must_use]
pub fn study_day(days: i64) -> i64 {
    yyyymmdd_to_unix(STUDY_START).unwrap() + days * DAY
}

/// Timestamps at the given day offsets from zero
#[must_use]
pub fn days(offsets: &[i64]) -> Vec<i64> {
    offsets.iter().map(|d| d * DAY).collect()
}

/// An event row on a day of the study period
#[must_use]
pub fn row(patient: &str, day: i64, category: Category, code: &str) -> EventRow {
    EventRow::new(patient, study_day(day), category, code)
}

/// Event rows for a small depression study
///
/// * `p1` - two diagnoses, then an SSRI 25 days after the first
/// * `p2` - a diagnosis and an SSRI 50 days later
/// * `p3` - a diagnosis, an SSRI 10 days later, and ketamine
/// * `p4` - only an SSRI
/// * `p5` - a diagnosis before the study period
#[must_use]
pub fn depression_rows() -> Vec<EventRow> {
    vec![
        row("p1", 0, Category::Dx, "F32"),
        row("p1", 20, Category::Dx, "F32"),
        row("p1", 25, Category::Drug, "sertraline"),
        row("p2", 10, Category::Dx, "F33"),
        row("p2", 60, Category::Drug, "sertraline"),
        row("p3", 100, Category::Dx, "F32"),
        row("p3", 110, Category::Drug, "sertraline"),
        row("p3", 130, Category::Drug, "ketamine"),
        row("p4", 5, Category::Drug, "sertraline"),
        row("p5", -400, Category::Dx, "F32"),
    ]
}

/// Depression followed by an SSRI within `[min_days, max_days]`
#[must_use]
pub fn treated_depression(min_days: u32, max_days: u32) -> ClinicalVariable {
    let mut var = ClinicalVariable::new("treated_depression");
    var.add_subvariable("mdd", Category::Dx, ["F32", "F33"])
        .unwrap();
    var.add_subvariable("ssri", Category::Drug, ["sertraline"])
        .unwrap();
    var.add_constraint(&ConstraintSpec::time(min_days, max_days, "ssri", "mdd"))
        .unwrap();
    var.finalize().unwrap();
    var
}

/// Any ketamine prescription
#[must_use]
pub fn ketamine() -> ClinicalVariable {
    let mut var = ClinicalVariable::new("ketamine");
    var.add_subvariable("ketamine", Category::Drug, ["ketamine"])
        .unwrap();
    var.finalize().unwrap();
    var
}

/// Write rows to `dir`, split over files of `per_file` rows
pub fn write_rows(dir: &Path, rows: &[EventRow], per_file: usize) -> Result<()> {
    for (i, chunk) in rows.chunks(per_file).enumerate() {
        write_event_file(&dir.join(format!("events_{i:03}.parquet")), chunk)?;
    }
    Ok(())
}
