//! Hospital identity and registry models.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pricing tier of the treating hospital.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HospitalType {
    #[serde(rename = "Government")]
    Government,
    #[serde(rename = "Mid-range Private")]
    MidRangePrivate,
    #[serde(rename = "Premium Private")]
    PremiumPrivate,
}

impl HospitalType {
    /// Multiplier applied to the severity base cost range.
    pub fn cost_multiplier(&self) -> f64 {
        match self {
            HospitalType::Government => 0.6,
            HospitalType::MidRangePrivate => 1.0,
            HospitalType::PremiumPrivate => 1.6,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HospitalType::Government => "Government",
            HospitalType::MidRangePrivate => "Mid-range Private",
            HospitalType::PremiumPrivate => "Premium Private",
        }
    }
}

impl Default for HospitalType {
    fn default() -> Self {
        HospitalType::MidRangePrivate
    }
}

impl fmt::Display for HospitalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Hospital named or implied by the report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HospitalInfo {
    pub name: String,
    pub hospital_type: HospitalType,
}

impl HospitalInfo {
    pub const DEFAULT_NAME: &'static str = "General Hospital";

    pub fn new(name: impl Into<String>, hospital_type: HospitalType) -> Self {
        Self {
            name: name.into(),
            hospital_type,
        }
    }
}

impl Default for HospitalInfo {
    fn default() -> Self {
        Self::new(Self::DEFAULT_NAME, HospitalType::MidRangePrivate)
    }
}

/// Registry entry for a hospital patients can be referred to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HospitalListing {
    pub key: String,
    pub display_name: String,
    pub tier: String,
    pub cost_multiplier: f64,
    pub opd_fee: String,
    pub google_maps: String,
    pub booking_websites: Vec<String>,
}
