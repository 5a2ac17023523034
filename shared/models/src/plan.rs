//! Treatment plan models.

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::hospital::{HospitalListing, HospitalType};

/// Named group of ordered instructions, e.g. "Medications".
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct TreatmentSection {
    #[validate(length(min = 1, max = 200, message = "Section name is required"))]
    pub name: String,
    pub steps: Vec<String>,
}

impl TreatmentSection {
    pub fn new<S: Into<String>>(name: impl Into<String>, steps: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            steps: steps.into_iter().map(Into::into).collect(),
        }
    }
}

/// One named cost category with a human-readable amount.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CostLine {
    pub category: String,
    pub amount: String,
}

impl CostLine {
    pub fn new(category: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            amount: amount.into(),
        }
    }
}

/// Integer rupee range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CostRange {
    pub min: u64,
    pub max: u64,
}

impl CostRange {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// Scale both bounds, truncating toward zero.
    pub fn scaled(&self, multiplier: f64) -> Self {
        Self {
            min: (self.min as f64 * multiplier) as u64,
            max: (self.max as f64 * multiplier) as u64,
        }
    }
}

impl fmt::Display for CostRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} – {}", format_inr(self.min), format_inr(self.max))
    }
}

/// Format an amount as rupees with comma thousands grouping: `₹160,000`.
pub fn format_inr(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("₹{}", grouped)
}

/// Tier-adjusted estimate for the hospital named in the report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HospitalCostEstimate {
    pub hospital_name: String,
    pub hospital_type: HospitalType,
    pub min: u64,
    pub max: u64,
    /// Display form, e.g. `₹160,000 – ₹640,000`.
    pub range: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostEstimate {
    pub items: Vec<CostLine>,
    pub notes: String,
    pub hospital_estimate: HospitalCostEstimate,
}

impl CostEstimate {
    pub fn amount(&self, category: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|line| line.category == category)
            .map(|line| line.amount.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Urgency {
    Emergency,
    High,
    Moderate,
    Routine,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Urgency::Emergency => "Emergency",
            Urgency::High => "High",
            Urgency::Moderate => "Moderate",
            Urgency::Routine => "Routine",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppointmentRecommendation {
    pub urgency: Urgency,
    pub specialist: String,
    pub recommended_timeline: String,
    pub follow_up_frequency: String,
}

/// Where the treatment sections of a plan came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlanSource {
    /// Per-disease template table.
    RuleTemplate,
    /// Text-generation service output.
    Generated,
    /// Static table used after a generation failure.
    Fallback,
}

impl PlanSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanSource::RuleTemplate => "rule_template",
            PlanSource::Generated => "generated",
            PlanSource::Fallback => "fallback",
        }
    }
}

/// Complete care plan for one report.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct Plan {
    #[validate(length(min = 1, message = "Identified problem is required"))]
    pub identified_problem: String,
    #[validate(length(min = 1, message = "At least one treatment section is required"))]
    #[validate]
    pub treatment_sections: Vec<TreatmentSection>,
    pub estimated_cost: CostEstimate,
    pub appointment: AppointmentRecommendation,
    pub source: PlanSource,
    /// Number of knowledge-store documents that informed the plan.
    #[serde(default)]
    pub context_documents: usize,
    #[serde(default)]
    pub hospital_options: Vec<HospitalListing>,
}

impl Plan {
    pub fn section(&self, name: &str) -> Option<&TreatmentSection> {
        self.treatment_sections.iter().find(|s| s.name == name)
    }
}
