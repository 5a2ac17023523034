//! Hospital detection and registry
//!
//! Identifies the treating hospital from report text and looks up referral
//! hospitals per city.

use careplan_models::{HospitalInfo, HospitalListing, HospitalType};
use std::collections::HashMap;

use crate::rules::RuleTable;

fn detection_table() -> RuleTable<HospitalInfo> {
    RuleTable::new(HospitalInfo::default())
        .rule(
            "apollo",
            &["apollo"],
            HospitalInfo::new("Apollo Hospitals, Bannerghatta Road", HospitalType::PremiumPrivate),
        )
        .rule(
            "manipal",
            &["manipal"],
            HospitalInfo::new("Manipal Hospital, Old Airport Road", HospitalType::MidRangePrivate),
        )
        .rule(
            "government",
            &["government", "medical college", "district hospital"],
            HospitalInfo::new("Government Medical College Hospital", HospitalType::Government),
        )
}

/// Detects the hospital named in a report by vocabulary scan.
#[derive(Debug, Clone)]
pub struct HospitalDetector {
    table: RuleTable<HospitalInfo>,
}

impl HospitalDetector {
    pub fn new() -> Self {
        Self {
            table: detection_table(),
        }
    }

    pub fn detect(&self, text: &str) -> HospitalInfo {
        self.table.resolve(text).clone()
    }
}

impl Default for HospitalDetector {
    fn default() -> Self {
        Self::new()
    }
}

fn listing(
    key: &str,
    display_name: &str,
    tier: &str,
    cost_multiplier: f64,
    opd_fee: &str,
    google_maps: &str,
    booking_websites: &[&str],
) -> HospitalListing {
    HospitalListing {
        key: key.to_string(),
        display_name: display_name.to_string(),
        tier: tier.to_string(),
        cost_multiplier,
        opd_fee: opd_fee.to_string(),
        google_maps: google_maps.to_string(),
        booking_websites: booking_websites.iter().map(|s| s.to_string()).collect(),
    }
}

/// Referral hospitals keyed by lowercase city name. Listing order is kept.
#[derive(Debug, Clone, Default)]
pub struct HospitalRegistry {
    cities: HashMap<String, Vec<HospitalListing>>,
}

impl HospitalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        Self::new().with_city(
            "bangalore",
            vec![
                listing(
                    "apollo",
                    "Apollo Hospitals, Bangalore",
                    "premium",
                    1.25,
                    "₹800 – ₹1,200",
                    "https://www.google.com/maps/search/Apollo+Hospitals+Bangalore",
                    &[
                        "https://www.apollohospitals.com/book-appointment/",
                        "https://www.practo.com/apollo-hospitals-bangalore",
                        "https://www.mfine.co/apollo-hospitals",
                    ],
                ),
                listing(
                    "fortis",
                    "Fortis Hospital, Bangalore",
                    "premium",
                    1.15,
                    "₹700 – ₹1,000",
                    "https://www.google.com/maps/search/Fortis+Hospital+Bangalore",
                    &[
                        "https://www.fortishealthcare.com/book-an-appointment",
                        "https://www.practo.com/fortis-hospital-bangalore",
                    ],
                ),
                listing(
                    "manipal",
                    "Manipal Hospital, Bangalore",
                    "standard",
                    1.0,
                    "₹500 – ₹800",
                    "https://www.google.com/maps/search/Manipal+Hospital+Bangalore",
                    &[
                        "https://www.manipalhospitals.com/book-an-appointment/",
                        "https://www.practo.com/manipal-hospitals-bangalore",
                    ],
                ),
                listing(
                    "narayana",
                    "Narayana Health, Bangalore",
                    "standard",
                    0.9,
                    "₹400 – ₹700",
                    "https://www.google.com/maps/search/Narayana+Health+Bangalore",
                    &[
                        "https://www.narayanahealth.org/book-an-appointment",
                        "https://www.practo.com/narayana-health-bangalore",
                    ],
                ),
            ],
        )
    }

    pub fn with_city(mut self, city: &str, hospitals: Vec<HospitalListing>) -> Self {
        self.cities.insert(city.trim().to_lowercase(), hospitals);
        self
    }

    fn hospitals(&self, city: &str) -> &[HospitalListing] {
        self.cities
            .get(&city.trim().to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First listing whose key appears in the hospital name.
    pub fn find(&self, city: &str, hospital_name: &str) -> Option<&HospitalListing> {
        let name = hospital_name.trim().to_lowercase();
        if name.is_empty() || city.trim().is_empty() {
            return None;
        }
        self.hospitals(city)
            .iter()
            .find(|hospital| name.contains(&hospital.key))
    }

    pub fn fallbacks(&self, city: &str, limit: usize) -> Vec<HospitalListing> {
        self.hospitals(city).iter().take(limit).cloned().collect()
    }
}
