//! Conversion between Arrow record batches and event records
//!
//! The event table keeps one nullable column per category. A row produces one
//! [`EventRecord`] for each category column that holds a code.

use std::sync::Arc;

use arrow::datatypes::{DataType, Field, FieldRef, Schema};
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Category, EventRecord};

/// One row of the event table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventRow {
    pub patient_id: String,
    pub timestamp: i64,
    #[serde(default)]
    pub diagnosis_code: Option<String>,
    #[serde(default)]
    pub meds_drugs: Option<String>,
    #[serde(default)]
    pub procedure_code: Option<String>,
    #[serde(default)]
    pub lab_name: Option<String>,
    #[serde(default)]
    pub vital_name: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
}

impl EventRow {
    /// A row carrying a single code of `category`
    pub fn new(
        patient_id: impl Into<String>,
        timestamp: i64,
        category: Category,
        code: impl Into<String>,
    ) -> Self {
        let mut row = Self {
            patient_id: patient_id.into(),
            timestamp,
            ..Self::default()
        };
        *row.field_mut(category) = Some(code.into());
        row
    }

    /// Attach a numeric value
    #[must_use]
    pub const fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    fn field(&self, category: Category) -> Option<&String> {
        match category {
            Category::Drug => self.meds_drugs.as_ref(),
            Category::Dx => self.diagnosis_code.as_ref(),
            Category::Proc => self.procedure_code.as_ref(),
            Category::Lab => self.lab_name.as_ref(),
            Category::Vital => self.vital_name.as_ref(),
        }
    }

    fn field_mut(&mut self, category: Category) -> &mut Option<String> {
        match category {
            Category::Drug => &mut self.meds_drugs,
            Category::Dx => &mut self.diagnosis_code,
            Category::Proc => &mut self.procedure_code,
            Category::Lab => &mut self.lab_name,
            Category::Vital => &mut self.vital_name,
        }
    }

    /// Split the row into one record per non-null category column
    pub fn records(&self) -> impl Iterator<Item = EventRecord> + '_ {
        Category::ALL.iter().filter_map(move |&category| {
            self.field(category).map(|code| EventRecord {
                patient_id: self.patient_id.clone(),
                timestamp: self.timestamp,
                code: code.clone(),
                category,
                value: self.value,
            })
        })
    }
}

/// Arrow schema of the event table
#[must_use]
pub fn event_schema() -> Schema {
    Schema::new(vec![
        Field::new("patient_id", DataType::Utf8, false),
        Field::new("timestamp", DataType::Int64, false),
        Field::new("diagnosis_code", DataType::Utf8, true),
        Field::new("meds_drugs", DataType::Utf8, true),
        Field::new("procedure_code", DataType::Utf8, true),
        Field::new("lab_name", DataType::Utf8, true),
        Field::new("vital_name", DataType::Utf8, true),
        Field::new("value", DataType::Float64, true),
    ])
}

/// Convert event rows to a record batch with [`event_schema`]
pub fn events_to_batch(rows: &[EventRow]) -> Result<RecordBatch> {
    let fields: Vec<FieldRef> = event_schema().fields().iter().map(Arc::clone).collect();
    Ok(serde_arrow::to_record_batch(&fields, &rows)?)
}

/// Convert a record batch of the event table to event records
///
/// Columns missing from the batch read as null.
pub fn records_from_batch(batch: &RecordBatch) -> Result<Vec<EventRecord>> {
    if batch.num_rows() == 0 {
        return Ok(Vec::new());
    }
    let rows: Vec<EventRow> = serde_arrow::from_record_batch(batch)?;
    Ok(rows.iter().flat_map(EventRow::records).collect())
}
