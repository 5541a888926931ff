//! Clinical event categories

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CohortError;

/// Category of a clinical event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Medication orders and administrations
    Drug,
    /// Diagnosis codes
    Dx,
    /// Procedure codes
    Proc,
    /// Laboratory results
    Lab,
    /// Vital signs
    Vital,
}

impl Category {
    /// All categories, in field order of the event table
    pub const ALL: [Self; 5] = [Self::Dx, Self::Drug, Self::Proc, Self::Lab, Self::Vital];

    /// Short lower-case name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Drug => "drug",
            Self::Dx => "dx",
            Self::Proc => "proc",
            Self::Lab => "lab",
            Self::Vital => "vital",
        }
    }

    /// Whether events of this category carry a numeric value
    #[must_use]
    pub const fn is_measurement(self) -> bool {
        matches!(self, Self::Lab | Self::Vital)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CohortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drug" | "medication" => Ok(Self::Drug),
            "dx" | "diagnosis" => Ok(Self::Dx),
            "proc" | "procedure" => Ok(Self::Proc),
            "lab" => Ok(Self::Lab),
            "vital" => Ok(Self::Vital),
            other => Err(CohortError::query(format!("Unknown event category '{other}'"))),
        }
    }
}
