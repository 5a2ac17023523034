//! Rule Tables
//!
//! Keyword rule tables that map a problem description to fixed clinical
//! outputs. Each table is an ordered list of rules plus a fallback; the first
//! rule with a keyword contained in the lowercased text wins.
//!
//! Priority everywhere is emergency cardiac, then diabetes, then
//! hypertension, then the generic fallback.

use careplan_models::{
    AppointmentRecommendation, ClinicalSummary, CostEstimate, CostLine, CostRange,
    HospitalCostEstimate, HospitalInfo, TreatmentSection, Urgency,
};

#[derive(Debug, Clone)]
pub struct KeywordRule<T> {
    pub label: &'static str,
    pub keywords: Vec<&'static str>,
    pub outcome: T,
}

impl<T> KeywordRule<T> {
    /// `lowered` must already be lowercase.
    pub fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|keyword| lowered.contains(keyword))
    }
}

/// Ordered first-match-wins rule table
#[derive(Debug, Clone)]
pub struct RuleTable<T> {
    rules: Vec<KeywordRule<T>>,
    fallback: T,
}

impl<T> RuleTable<T> {
    pub fn new(fallback: T) -> Self {
        Self {
            rules: Vec::new(),
            fallback,
        }
    }

    pub fn rule(mut self, label: &'static str, keywords: &[&'static str], outcome: T) -> Self {
        self.rules.push(KeywordRule {
            label,
            keywords: keywords.to_vec(),
            outcome,
        });
        self
    }

    pub fn matching_rule(&self, text: &str) -> Option<&KeywordRule<T>> {
        let lowered = text.to_lowercase();
        self.rules.iter().find(|rule| rule.matches(&lowered))
    }

    pub fn resolve(&self, text: &str) -> &T {
        self.matching_rule(text)
            .map(|rule| &rule.outcome)
            .unwrap_or(&self.fallback)
    }
}

/// Cost categories for one class of condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostCategories {
    pub items: Vec<CostLine>,
    pub notes: String,
}

impl CostCategories {
    fn new(items: &[(&str, &str)], notes: &str) -> Self {
        Self {
            items: items
                .iter()
                .map(|(category, amount)| CostLine::new(*category, *amount))
                .collect(),
            notes: notes.to_string(),
        }
    }
}

fn appointment(urgency: Urgency, specialist: &str, timeline: &str, follow_up: &str) -> AppointmentRecommendation {
    AppointmentRecommendation {
        urgency,
        specialist: specialist.to_string(),
        recommended_timeline: timeline.to_string(),
        follow_up_frequency: follow_up.to_string(),
    }
}

fn sections(groups: &[(&str, &[&str])]) -> Vec<TreatmentSection> {
    groups
        .iter()
        .map(|(name, steps)| TreatmentSection::new(*name, steps.iter().copied()))
        .collect()
}

fn cost_table() -> RuleTable<CostCategories> {
    RuleTable::new(CostCategories::new(
        &[
            ("consultation", "₹500 – ₹1,000"),
            ("investigations", "₹1,000 – ₹2,500"),
            ("medications", "Depends on confirmed diagnosis"),
            ("follow_up_cost", "₹500 – ₹1,000 per visit"),
        ],
        "Accurate cost will be determined after clinical evaluation.",
    ))
    .rule(
        "cardiac",
        &["stemi", "myocardial", "heart attack", "acute coronary"],
        CostCategories::new(
            &[
                ("emergency_care", "₹20,000 – ₹60,000"),
                ("procedures", "₹1,50,000 – ₹3,00,000 (angioplasty if required)"),
                ("icu_charges", "₹10,000 – ₹25,000 per day"),
                ("medications", "₹2,000 – ₹4,000 per month"),
                ("follow_up_cost", "₹1,000 – ₹2,000 per visit"),
            ],
            "Final cost varies by hospital and intervention type.",
        ),
    )
    .rule(
        "diabetes",
        &["diabetes", "hyperglycemia"],
        CostCategories::new(
            &[
                ("consultation", "₹800 – ₹1,500"),
                ("investigations", "₹1,500 – ₹3,000"),
                ("medications", "₹500 – ₹1,200 per month"),
                ("follow_up_cost", "₹500 – ₹1,000 per visit"),
            ],
            "Costs depend on oral therapy versus insulin requirement.",
        ),
    )
    .rule(
        "hypertension",
        &["hypertension", "high blood pressure"],
        CostCategories::new(
            &[
                ("consultation", "₹700 – ₹1,200"),
                ("investigations", "₹1,000 – ₹2,000"),
                ("medications", "₹400 – ₹1,000 per month"),
                ("follow_up_cost", "₹500 – ₹1,000 per visit"),
            ],
            "Lifestyle modification can reduce long-term costs.",
        ),
    )
}

fn appointment_table() -> RuleTable<AppointmentRecommendation> {
    RuleTable::new(appointment(
        Urgency::Routine,
        "General Physician",
        "Within 3–5 days",
        "As advised after evaluation",
    ))
    .rule(
        "cardiac",
        &["stemi", "myocardial", "heart attack"],
        appointment(
            Urgency::Emergency,
            "Cardiologist",
            "Immediate (Emergency admission)",
            "As per cardiology protocol",
        ),
    )
    .rule(
        "diabetes",
        &["diabetes", "hyperglycemia"],
        appointment(
            Urgency::High,
            "Endocrinologist / General Physician",
            "Within 7 days",
            "Every 3 months (or as advised)",
        ),
    )
    .rule(
        "hypertension",
        &["hypertension", "blood pressure"],
        appointment(
            Urgency::Moderate,
            "General Physician / Cardiologist",
            "Within 5–7 days",
            "Every 1–3 months",
        ),
    )
}

fn treatment_table() -> RuleTable<Vec<TreatmentSection>> {
    RuleTable::new(sections(&[
        (
            "Immediate Care",
            &[
                "Conduct comprehensive clinical evaluation",
                "Review all available diagnostic investigations",
            ],
        ),
        ("Medications", &["Prescribe medications based on physician assessment"]),
        (
            "Lifestyle And Diet",
            &["Balanced diet", "Adequate hydration", "Avoid tobacco and alcohol"],
        ),
        (
            "Monitoring",
            &[
                "Monitor vital signs regularly",
                "Repeat investigations as clinically indicated",
            ],
        ),
        (
            "Follow Up",
            &[
                "Follow-up with general physician",
                "Refer to specialist if symptoms persist",
            ],
        ),
    ]))
    .rule(
        "cardiac",
        &["myocardial", "stemi", "heart"],
        sections(&[
            (
                "Immediate Care",
                &[
                    "Urgent hospital admission",
                    "Continuous cardiac monitoring",
                    "Administer oxygen if hypoxic",
                ],
            ),
            (
                "Medications",
                &[
                    "Antiplatelet therapy (Aspirin, Clopidogrel)",
                    "High-intensity statins",
                    "Beta-blockers and ACE inhibitors if indicated",
                ],
            ),
            (
                "Lifestyle And Diet",
                &[
                    "Smoking cessation",
                    "Low-fat, low-salt cardiac diet",
                    "Enroll in cardiac rehabilitation",
                ],
            ),
            (
                "Monitoring",
                &[
                    "Serial ECG monitoring",
                    "Cardiac biomarkers (Troponin levels)",
                    "Blood pressure and heart rate monitoring",
                ],
            ),
            (
                "Follow Up",
                &[
                    "Cardiology follow-up within 7 days",
                    "Long-term cardiovascular risk management",
                ],
            ),
        ]),
    )
    .rule(
        "diabetes",
        &["diabetes"],
        sections(&[
            (
                "Immediate Care",
                &[
                    "Assess fasting and postprandial blood glucose levels",
                    "Evaluate hydration status and electrolyte balance",
                    "Educate patient on symptoms of hyperglycemia and hypoglycemia",
                ],
            ),
            (
                "Medications",
                &[
                    "Initiate oral hypoglycemic agents such as Metformin",
                    "Consider insulin therapy if glycemic control is inadequate",
                    "Adjust medication based on HbA1c values",
                ],
            ),
            (
                "Lifestyle And Diet",
                &[
                    "Low glycemic index diet",
                    "Avoid refined sugars and processed foods",
                    "Regular physical activity (30 minutes/day)",
                    "Weight management counseling",
                ],
            ),
            (
                "Monitoring",
                &[
                    "Daily blood glucose monitoring",
                    "HbA1c every 3 months",
                    "Monitor for diabetic complications",
                ],
            ),
            (
                "Follow Up",
                &[
                    "Initial follow-up within 1–2 weeks",
                    "Routine review every 3 months",
                ],
            ),
        ]),
    )
    .rule(
        "hypertension",
        &["hypertension", "high blood pressure"],
        sections(&[
            (
                "Immediate Care",
                &[
                    "Confirm diagnosis with repeated blood pressure measurements",
                    "Assess for end-organ damage",
                ],
            ),
            (
                "Medications",
                &[
                    "Initiate antihypertensive therapy (ACE inhibitors or ARBs)",
                    "Add calcium channel blockers or diuretics if required",
                ],
            ),
            (
                "Lifestyle And Diet",
                &[
                    "Low-sodium DASH diet",
                    "Weight reduction if overweight",
                    "Regular aerobic exercise",
                ],
            ),
            (
                "Monitoring",
                &[
                    "Home blood pressure monitoring",
                    "Renal function and electrolyte monitoring",
                ],
            ),
            (
                "Follow Up",
                &[
                    "Follow-up in 2–4 weeks",
                    "Monthly monitoring until blood pressure is controlled",
                ],
            ),
        ]),
    )
}

fn severity_table() -> RuleTable<CostRange> {
    RuleTable::new(CostRange::new(5_000, 15_000))
        .rule(
            "severe",
            &["stemi", "heart", "cardiac", "myocardial", "stroke", "cancer", "icu", "sepsis"],
            CostRange::new(100_000, 400_000),
        )
        .rule(
            "moderate",
            &["pneumonia", "infection", "diabetes", "hypertension", "asthma", "copd"],
            CostRange::new(20_000, 80_000),
        )
}

fn problem_table() -> RuleTable<&'static str> {
    RuleTable::new("General Medical Condition")
        .rule(
            "cardiac",
            &["st elevation", "stemi", "myocardial"],
            "Acute Myocardial Infarction",
        )
        .rule("diabetes", &["glucose", "diabetes"], "Diabetes Mellitus")
        .rule("hypertension", &["blood pressure", "hypertension"], "Hypertension")
        .rule("infection", &["infection", "fever"], "Suspected Infection")
}

/// Treatment sections used when plan generation fails.
pub fn fallback_sections() -> Vec<TreatmentSection> {
    sections(&[
        (
            "Immediate Management",
            &[
                "Stabilize patient condition",
                "Monitor vital signs",
                "Manage symptoms as per standard clinical guidelines",
            ],
        ),
        (
            "Medications",
            &[
                "Initiate guideline-based medications",
                "Adjust dosage based on patient response",
            ],
        ),
        (
            "Monitoring and Investigations",
            &[
                "Repeat necessary laboratory investigations",
                "Monitor disease progression",
            ],
        ),
        (
            "Recovery and Rehabilitation",
            &[
                "Encourage gradual return to activity",
                "Provide lifestyle modification counseling",
            ],
        ),
        (
            "Discharge and Follow-up",
            &[
                "Discharge once clinically stable",
                "Schedule follow-up appointments",
            ],
        ),
    ])
}

/// All clinical rule tables
#[derive(Debug, Clone)]
pub struct ClinicalRules {
    costs: RuleTable<CostCategories>,
    appointments: RuleTable<AppointmentRecommendation>,
    treatments: RuleTable<Vec<TreatmentSection>>,
    severity: RuleTable<CostRange>,
    problems: RuleTable<&'static str>,
}

impl ClinicalRules {
    pub fn new() -> Self {
        Self {
            costs: cost_table(),
            appointments: appointment_table(),
            treatments: treatment_table(),
            severity: severity_table(),
            problems: problem_table(),
        }
    }

    pub fn cost_categories(&self, problem: &str) -> &CostCategories {
        self.costs.resolve(problem)
    }

    pub fn recommend_appointment(&self, problem: &str) -> AppointmentRecommendation {
        self.appointments.resolve(problem).clone()
    }

    pub fn treatment_template(&self, problem: &str) -> Vec<TreatmentSection> {
        self.treatments.resolve(problem).clone()
    }

    pub fn severity_range(&self, problem: &str) -> CostRange {
        *self.severity.resolve(problem)
    }

    /// Severity base range scaled by the hospital tier.
    pub fn hospital_estimate(&self, problem: &str, hospital: &HospitalInfo) -> HospitalCostEstimate {
        let range = self
            .severity_range(problem)
            .scaled(hospital.hospital_type.cost_multiplier());
        HospitalCostEstimate {
            hospital_name: hospital.name.clone(),
            hospital_type: hospital.hospital_type,
            min: range.min,
            max: range.max,
            range: range.to_string(),
        }
    }

    pub fn estimate_cost(&self, problem: &str, hospital: &HospitalInfo) -> CostEstimate {
        let categories = self.cost_categories(problem);
        CostEstimate {
            items: categories.items.clone(),
            notes: categories.notes.clone(),
            hospital_estimate: self.hospital_estimate(problem, hospital),
        }
    }

    /// The explicit diagnosis when present, otherwise a guess from the
    /// summary text.
    pub fn infer_problem(&self, summary: &ClinicalSummary, missing: &str) -> String {
        let diagnosis = summary.final_diagnosis.trim();
        if !diagnosis.is_empty() && !diagnosis.eq_ignore_ascii_case(missing) {
            return diagnosis.to_string();
        }
        self.problems.resolve(&summary.clinical_summary).to_string()
    }
}

impl Default for ClinicalRules {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use careplan_models::{HospitalType, NOT_MENTIONED};
    use proptest::prelude::*;

    fn summary(diagnosis: &str, text: &str) -> ClinicalSummary {
        ClinicalSummary {
            final_diagnosis: diagnosis.to_string(),
            clinical_summary: text.to_string(),
            ..ClinicalSummary::default()
        }
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let table = RuleTable::new("none").rule("a", &["alpha"], "A").rule("b", &["beta", "alpha"], "B");
        assert_eq!(*table.resolve("ALPHA and beta"), "A");
        assert_eq!(*table.resolve("beta"), "B");
        assert_eq!(*table.resolve("gamma"), "none");
        assert_eq!(table.matching_rule("Beta").map(|r| r.label), Some("b"));
        assert!(table.matching_rule("gamma").is_none());
    }

    #[test]
    fn test_cardiac_outranks_diabetes() {
        let rules = ClinicalRules::new();
        let problem = "Type 2 diabetes with STEMI";
        assert_eq!(rules.recommend_appointment(problem).urgency, Urgency::Emergency);
        assert_eq!(rules.cost_categories(problem).items[0].category, "emergency_care");
        assert_eq!(rules.treatment_template(problem)[0].steps[0], "Urgent hospital admission");
    }

    #[test]
    fn test_hypertension_appointment() {
        let rules = ClinicalRules::new();
        let appointment = rules.recommend_appointment("Hypertension");
        assert_eq!(appointment.urgency, Urgency::Moderate);
        assert_eq!(appointment.specialist, "General Physician / Cardiologist");
        assert_eq!(appointment.recommended_timeline, "Within 5–7 days");
    }

    #[test]
    fn test_fallback_outputs() {
        let rules = ClinicalRules::new();
        let appointment = rules.recommend_appointment("Migraine");
        assert_eq!(appointment.urgency, Urgency::Routine);
        assert_eq!(appointment.specialist, "General Physician");

        let costs = rules.cost_categories("Migraine");
        assert_eq!(costs.items.len(), 4);
        assert_eq!(costs.notes, "Accurate cost will be determined after clinical evaluation.");
        assert_eq!(rules.severity_range("Migraine"), CostRange::new(5_000, 15_000));
    }

    #[test]
    fn test_myocardial_premium_estimate() {
        let rules = ClinicalRules::new();
        let hospital = HospitalInfo::new("Apollo Hospitals, Bannerghatta Road", HospitalType::PremiumPrivate);
        let estimate = rules.hospital_estimate("Acute Myocardial Infarction", &hospital);
        assert_eq!(estimate.min, 160_000);
        assert_eq!(estimate.max, 640_000);
        assert_eq!(estimate.range, "₹160,000 – ₹640,000");
    }

    #[test]
    fn test_tier_multipliers() {
        let rules = ClinicalRules::new();
        let government = HospitalInfo::new("District Hospital", HospitalType::Government);
        let estimate = rules.hospital_estimate("Pneumonia", &government);
        assert_eq!((estimate.min, estimate.max), (12_000, 48_000));

        let mid = HospitalInfo::default();
        let estimate = rules.hospital_estimate("Sprain", &mid);
        assert_eq!(estimate.range, "₹5,000 – ₹15,000");
    }

    #[test]
    fn test_estimate_cost_combines_tables() {
        let rules = ClinicalRules::new();
        let estimate = rules.estimate_cost("Diabetes Mellitus", &HospitalInfo::default());
        assert_eq!(estimate.amount("consultation"), Some("₹800 – ₹1,500"));
        assert_eq!(estimate.hospital_estimate.range, "₹20,000 – ₹80,000");
    }

    #[test]
    fn test_infer_problem() {
        let rules = ClinicalRules::new();
        assert_eq!(rules.infer_problem(&summary("Asthma", ""), NOT_MENTIONED), "Asthma");
        assert_eq!(
            rules.infer_problem(&summary(NOT_MENTIONED, "Fasting glucose 180 mg/dL"), NOT_MENTIONED),
            "Diabetes Mellitus"
        );
        assert_eq!(
            rules.infer_problem(&summary("not mentioned", "ST elevation noted, glucose normal"), NOT_MENTIONED),
            "Acute Myocardial Infarction"
        );
        assert_eq!(
            rules.infer_problem(&summary("Unknown", "High fever for 3 days"), "Unknown"),
            "Suspected Infection"
        );
        assert_eq!(
            rules.infer_problem(&summary("", "Routine check"), NOT_MENTIONED),
            "General Medical Condition"
        );
    }

    #[test]
    fn test_fallback_sections_shape() {
        let sections = fallback_sections();
        let names: Vec<&str> = sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Immediate Management",
                "Medications",
                "Monitoring and Investigations",
                "Recovery and Rehabilitation",
                "Discharge and Follow-up",
            ]
        );
        assert!(sections.iter().all(|s| !s.steps.is_empty()));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Every table yields an outcome and the same text always gives the same one.
        #[test]
        fn property_tables_total_and_deterministic(problem in "\\PC{0,60}") {
            let rules = ClinicalRules::new();
            prop_assert_eq!(rules.recommend_appointment(&problem), rules.recommend_appointment(&problem));
            prop_assert_eq!(rules.treatment_template(&problem), rules.treatment_template(&problem));
            prop_assert_eq!(rules.severity_range(&problem), rules.severity_range(&problem));
            prop_assert!(!rules.cost_categories(&problem).items.is_empty());
            prop_assert_eq!(rules.treatment_template(&problem).len(), 5);
        }

        /// Matching ignores case.
        #[test]
        fn property_case_insensitive(problem in "[a-zA-Z ]{0,40}") {
            let rules = ClinicalRules::new();
            prop_assert_eq!(
                rules.recommend_appointment(&problem.to_uppercase()),
                rules.recommend_appointment(&problem.to_lowercase())
            );
        }
    }
}
