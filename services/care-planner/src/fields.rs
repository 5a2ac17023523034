//! Field Extraction
//!
//! Pulls patient and clinical fields out of report text with ordered,
//! case-insensitive patterns. Every field resolves to either the first
//! non-empty capture or that field's sentinel, so extraction never fails.

use careplan_models::{ClinicalSummary, PatientDetails, NOT_MENTIONED};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

/// Free-text sections run until a blank line or the end of the report.
const FREE_TEXT_TAIL: &str = r"\s*[:\-]?\s*(.*?)(?:\n\s*\n|$)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportField {
    PatientName,
    Age,
    Gender,
    ChiefComplaint,
    FinalDiagnosis,
    EcgFindings,
}

impl ReportField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportField::PatientName => "patient_name",
            ReportField::Age => "age",
            ReportField::Gender => "gender",
            ReportField::ChiefComplaint => "chief_complaint",
            ReportField::FinalDiagnosis => "final_diagnosis",
            ReportField::EcgFindings => "ecg_findings",
        }
    }
}

fn free_text(label: &str) -> String {
    format!(r"(?is){}{}", label, FREE_TEXT_TAIL)
}

fn compile(patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("field pattern compiles"))
        .collect()
}

static FIELD_PATTERNS: LazyLock<Vec<(ReportField, Vec<Regex>)>> = LazyLock::new(|| {
    vec![
        (
            ReportField::PatientName,
            compile(&[
                r"(?i)\bPatient\s+Name\s*[:\-]?\s*([A-Za-z ]+)".to_string(),
                r"(?i)\bPatient\s*[:\-]\s*([A-Za-z ]+)".to_string(),
                r"(?i)\bName\s*[:\-]\s*([A-Za-z ]+)".to_string(),
            ]),
        ),
        (
            ReportField::Age,
            compile(&[r"(?i)\bAge\s*[:\-]?\s*(\d{1,3})\b".to_string()]),
        ),
        (
            ReportField::Gender,
            compile(&[
                r"(?i)(?:Gender|Sex)\s*[:\-]?\s*(Male|Female|Other)\b".to_string(),
                r"(?i)\b(Male|Female)\b".to_string(),
            ]),
        ),
        (
            ReportField::ChiefComplaint,
            compile(&[free_text(r"\b(?:Chief|Presenting)\s+Complaint\b")]),
        ),
        (
            ReportField::FinalDiagnosis,
            compile(&[
                free_text(r"\bFinal\s+Diagnosis\b"),
                free_text(r"\bImpression\b"),
                free_text(r"\bDiagnosis\b"),
                free_text(r"\bConclusion\b"),
            ]),
        ),
        (
            ReportField::EcgFindings,
            compile(&[free_text(r"\bECG(?:\s+Findings|\s+Interpretation)?\b")]),
        ),
    ]
});

struct FieldRule {
    patterns: Vec<Regex>,
    sentinel: String,
}

impl FieldRule {
    fn capture(&self, text: &str) -> Option<String> {
        self.patterns.iter().find_map(|pattern| {
            pattern.captures_iter(text).find_map(|caps| {
                caps.get(1)
                    .map(|m| m.as_str().trim())
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
            })
        })
    }
}

/// Pattern-based report field extractor
pub struct FieldExtractor {
    rules: HashMap<ReportField, FieldRule>,
    summary_max_chars: usize,
}

impl FieldExtractor {
    pub fn new() -> Self {
        let rules = FIELD_PATTERNS
            .iter()
            .map(|(field, patterns)| {
                let rule = FieldRule {
                    patterns: patterns.clone(),
                    sentinel: NOT_MENTIONED.to_string(),
                };
                (*field, rule)
            })
            .collect();

        Self {
            rules,
            summary_max_chars: 2000,
        }
    }

    /// Use `sentinel` for every field.
    pub fn with_missing_value(mut self, sentinel: &str) -> Self {
        for rule in self.rules.values_mut() {
            rule.sentinel = sentinel.to_string();
        }
        self
    }

    pub fn with_sentinel(mut self, field: ReportField, sentinel: &str) -> Self {
        if let Some(rule) = self.rules.get_mut(&field) {
            rule.sentinel = sentinel.to_string();
        }
        self
    }

    pub fn with_summary_max_chars(mut self, max_chars: usize) -> Self {
        self.summary_max_chars = max_chars;
        self
    }

    pub fn sentinel(&self, field: ReportField) -> &str {
        self.rules
            .get(&field)
            .map(|rule| rule.sentinel.as_str())
            .unwrap_or(NOT_MENTIONED)
    }

    pub fn is_missing(&self, field: ReportField, value: &str) -> bool {
        value.trim().is_empty() || value.eq_ignore_ascii_case(self.sentinel(field))
    }

    pub fn extract_field(&self, field: ReportField, text: &str) -> String {
        let captured = self.rules.get(&field).and_then(|rule| rule.capture(text));
        match captured {
            Some(value) if field == ReportField::Gender => capitalize(&value),
            Some(value) => value,
            None => {
                debug!(field = field.as_str(), "Field not found in report");
                self.sentinel(field).to_string()
            }
        }
    }

    pub fn extract_patient(&self, text: &str) -> PatientDetails {
        PatientDetails {
            name: self.extract_field(ReportField::PatientName, text),
            age: self.extract_field(ReportField::Age, text),
            gender: self.extract_field(ReportField::Gender, text),
        }
    }

    /// `key_findings` and `risk_factors` have no patterns and stay at the
    /// final diagnosis sentinel.
    pub fn extract_summary(&self, text: &str) -> ClinicalSummary {
        let missing = self.sentinel(ReportField::FinalDiagnosis).to_string();
        ClinicalSummary {
            chief_complaint: self.extract_field(ReportField::ChiefComplaint, text),
            final_diagnosis: self.extract_field(ReportField::FinalDiagnosis, text),
            ecg_findings: self.extract_field(ReportField::EcgFindings, text),
            key_findings: missing.clone(),
            risk_factors: missing,
            clinical_summary: text.chars().take(self.summary_max_chars).collect(),
        }
    }
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn capitalize(value: &str) -> String {
    let lower = value.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const REPORT: &str = "CITY DIAGNOSTICS\n\
        Patient Name: Ravi Kumar\n\
        Age: 54   Sex: MALE\n\n\
        Chief Complaint: Severe chest pain radiating\nto the left arm\n\n\
        ECG Findings: ST elevation in leads II, III, aVF\n\n\
        Final Diagnosis: Acute Inferior Wall STEMI\n\n\
        Advice: admit to CCU";

    #[test]
    fn test_extracts_patient_details() {
        let extractor = FieldExtractor::new();
        let patient = extractor.extract_patient(REPORT);
        assert_eq!(patient.name, "Ravi Kumar");
        assert_eq!(patient.age, "54");
        assert_eq!(patient.gender, "Male");
    }

    #[test]
    fn test_free_text_spans_lines_until_blank_line() {
        let extractor = FieldExtractor::new();
        let summary = extractor.extract_summary(REPORT);
        assert_eq!(summary.chief_complaint, "Severe chest pain radiating\nto the left arm");
        assert_eq!(summary.ecg_findings, "ST elevation in leads II, III, aVF");
        assert_eq!(summary.final_diagnosis, "Acute Inferior Wall STEMI");
        assert_eq!(summary.key_findings, NOT_MENTIONED);
    }

    #[test]
    fn test_free_text_runs_to_end_of_text() {
        let extractor = FieldExtractor::new();
        let text = "Chief Complaint: headache\n\nFinal Diagnosis: Hypertension";
        assert_eq!(extractor.extract_field(ReportField::ChiefComplaint, text), "headache");
        assert_eq!(extractor.extract_field(ReportField::FinalDiagnosis, text), "Hypertension");
    }

    #[test]
    fn test_diagnosis_candidate_order() {
        let extractor = FieldExtractor::new();
        let text = "Impression: Viral fever\n\nConclusion: Rest advised";
        assert_eq!(extractor.extract_field(ReportField::FinalDiagnosis, text), "Viral fever");

        let text = "Conclusion: Normal study";
        assert_eq!(extractor.extract_field(ReportField::FinalDiagnosis, text), "Normal study");

        let text = "Diagnosis: Asthma\n\nFinal Diagnosis: COPD";
        assert_eq!(extractor.extract_field(ReportField::FinalDiagnosis, text), "COPD");
    }

    #[test]
    fn test_empty_capture_falls_through() {
        let extractor = FieldExtractor::new();
        let text = "Diagnosis:";
        assert_eq!(extractor.extract_field(ReportField::FinalDiagnosis, text), NOT_MENTIONED);

        let text = "Impression: Pneumonia\n\nFinal Diagnosis:";
        assert_eq!(extractor.extract_field(ReportField::FinalDiagnosis, text), "Pneumonia");
    }

    #[test]
    fn test_missing_fields_use_sentinels() {
        let extractor = FieldExtractor::new()
            .with_missing_value("Unknown")
            .with_sentinel(ReportField::EcgFindings, "Not recorded");
        let text = "Routine laboratory panel without remarks";

        let patient = extractor.extract_patient(text);
        assert_eq!(patient.name, "Unknown");
        assert_eq!(patient.age, "Unknown");
        assert_eq!(extractor.extract_field(ReportField::EcgFindings, text), "Not recorded");
        assert!(extractor.is_missing(ReportField::Age, "unknown"));
    }

    #[test]
    fn test_age_requires_word_boundary() {
        let extractor = FieldExtractor::new();
        assert_eq!(extractor.extract_field(ReportField::Age, "Page: 3"), NOT_MENTIONED);
        assert_eq!(extractor.extract_field(ReportField::Age, "AGE 7"), "7");
        assert_eq!(extractor.extract_field(ReportField::Age, "Age: 1234"), NOT_MENTIONED);
    }

    #[test]
    fn test_gender_fallback_and_normalisation() {
        let extractor = FieldExtractor::new();
        assert_eq!(extractor.extract_field(ReportField::Gender, "a 40 year old FEMALE"), "Female");
        assert_eq!(extractor.extract_field(ReportField::Gender, "Gender - other"), "Other");
        assert_eq!(extractor.extract_field(ReportField::Gender, "Females only ward"), NOT_MENTIONED);
    }

    #[test]
    fn test_name_fallback_pattern() {
        let extractor = FieldExtractor::new();
        assert_eq!(
            extractor.extract_field(ReportField::PatientName, "Name: Asha Rao\nAge: 31"),
            "Asha Rao"
        );
    }

    #[test]
    fn test_summary_truncated_by_chars() {
        let extractor = FieldExtractor::new().with_summary_max_chars(5);
        let summary = extractor.extract_summary("₹₹₹₹₹₹₹₹");
        assert_eq!(summary.clinical_summary, "₹₹₹₹₹");
    }

    #[test]
    fn test_section_headings_are_not_names() {
        let extractor = FieldExtractor::new();
        let text = "PATIENT DETAILS\nName: Asha Rao\nAge: 31";
        assert_eq!(extractor.extract_field(ReportField::PatientName, text), "Asha Rao");
        assert_eq!(extractor.extract_field(ReportField::PatientName, "Patient: Ravi Kumar"), "Ravi Kumar");
        assert_eq!(extractor.extract_field(ReportField::PatientName, "Patient was stable"), NOT_MENTIONED);
    }

    #[test]
    fn test_prose_other_is_not_a_gender() {
        let extractor = FieldExtractor::new();
        assert_eq!(extractor.extract_field(ReportField::Gender, "No other complaints"), NOT_MENTIONED);
        assert_eq!(extractor.extract_field(ReportField::Gender, "Sex: Other"), "Other");
    }

    const FIELDS: [ReportField; 6] = [
        ReportField::PatientName,
        ReportField::Age,
        ReportField::Gender,
        ReportField::ChiefComplaint,
        ReportField::FinalDiagnosis,
        ReportField::EcgFindings,
    ];

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Every field is either the sentinel or a trimmed, non-empty capture.
        #[test]
        fn property_fields_are_capture_or_sentinel(text in "\\PC{0,200}") {
            let extractor = FieldExtractor::new();
            for field in FIELDS {
                let value = extractor.extract_field(field, &text);
                if value == NOT_MENTIONED {
                    continue;
                }
                prop_assert!(!value.is_empty());
                prop_assert_eq!(value.trim(), value.as_str());
                match field {
                    ReportField::Gender => prop_assert!(["Male", "Female", "Other"].contains(&value.as_str())),
                    ReportField::Age => prop_assert!(value.chars().count() <= 3 && value.chars().all(char::is_numeric)),
                    _ => prop_assert!(text.contains(value.as_str())),
                }
            }
        }

        /// Labelled fields embedded in noise are still found.
        #[test]
        fn property_labelled_fields_found(
            prefix in "[0-9#/ ]{0,30}",
            name in "[A-Z][a-z]{2,10} [A-Z][a-z]{2,10}",
            age in 1u32..120,
        ) {
            let text = format!("{}\nPatient Name: {}\nAge: {}\n", prefix, name, age);
            let extractor = FieldExtractor::new();
            prop_assert_eq!(extractor.extract_field(ReportField::PatientName, &text), name);
            prop_assert_eq!(extractor.extract_field(ReportField::Age, &text), age.to_string());
        }
    }
}
