//! Patient and clinical summary models extracted from a diagnostic report.

use serde::{Deserialize, Serialize};

/// Canonical value for any field the report does not mention.
pub const NOT_MENTIONED: &str = "Not mentioned";

/// Demographic details pulled from the report header.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatientDetails {
    pub name: String,
    pub age: String,
    pub gender: String,
}

impl PatientDetails {
    /// Details with every field set to `missing`.
    pub fn unknown(missing: &str) -> Self {
        Self {
            name: missing.to_string(),
            age: missing.to_string(),
            gender: missing.to_string(),
        }
    }
}

impl Default for PatientDetails {
    fn default() -> Self {
        Self::unknown(NOT_MENTIONED)
    }
}

/// Free-text clinical sections of the report.
///
/// `key_findings` and `risk_factors` are only filled by the structured
/// extraction pass; pattern extraction leaves them at the sentinel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClinicalSummary {
    pub chief_complaint: String,
    pub final_diagnosis: String,
    pub ecg_findings: String,
    pub key_findings: String,
    pub risk_factors: String,
    /// Leading slice of the raw report text.
    pub clinical_summary: String,
}

impl ClinicalSummary {
    pub fn unknown(missing: &str) -> Self {
        Self {
            chief_complaint: missing.to_string(),
            final_diagnosis: missing.to_string(),
            ecg_findings: missing.to_string(),
            key_findings: missing.to_string(),
            risk_factors: missing.to_string(),
            clinical_summary: String::new(),
        }
    }
}

impl Default for ClinicalSummary {
    fn default() -> Self {
        Self::unknown(NOT_MENTIONED)
    }
}
