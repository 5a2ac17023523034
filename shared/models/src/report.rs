//! Result of reading one diagnostic report.

use serde::{Deserialize, Serialize};

use crate::hospital::HospitalInfo;
use crate::patient::{ClinicalSummary, PatientDetails};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportExtraction {
    /// Trimmed text of all pages, joined with newlines.
    pub text: String,
    pub patient: PatientDetails,
    pub summary: ClinicalSummary,
    pub hospital: HospitalInfo,
    pub page_count: usize,
    pub pages_with_text: usize,
}

impl ReportExtraction {
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}
