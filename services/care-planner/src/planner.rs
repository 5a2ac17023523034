//! Plan Assembler
//!
//! Combines treatment sections, cost estimate, appointment recommendation and
//! hospital options into one [`Plan`]. Always produces a plan: generation
//! failures degrade to the static fallback sections.

use careplan_models::{HospitalInfo, HospitalListing, PatientDetails, Plan, PlanSource, TreatmentSection};
use careplan_utils::PlannerConfig;
use std::sync::Arc;
use tracing::{info, warn};

use crate::hospital::HospitalRegistry;
use crate::llm_client::{GenerationOutcome, TextGenerator};
use crate::prompts::PromptTemplates;
use crate::rules::{fallback_sections, ClinicalRules};

pub const GENERATED_SECTION: &str = "AI Generated Plan";
pub const CONTEXT_SECTION: &str = "Clinical Context Considered";

const CONTEXT_NOTES: [&str; 2] = [
    "Treatment plan informed by similar historical cases",
    "Relevant clinical guidelines reviewed",
];

/// Inputs for one plan.
#[derive(Debug, Clone, Copy)]
pub struct PlanRequest<'a> {
    pub patient: &'a PatientDetails,
    pub problem: &'a str,
    pub hospital: &'a HospitalInfo,
    pub context: &'a [String],
    /// Falls back to the configured default city.
    pub city: Option<&'a str>,
}

pub struct CarePlanner {
    rules: ClinicalRules,
    registry: HospitalRegistry,
    prompts: Arc<PromptTemplates>,
    generator: Arc<dyn TextGenerator>,
    config: PlannerConfig,
}

impl CarePlanner {
    pub fn new(prompts: Arc<PromptTemplates>, generator: Arc<dyn TextGenerator>, config: PlannerConfig) -> Self {
        Self {
            rules: ClinicalRules::new(),
            registry: HospitalRegistry::builtin(),
            prompts,
            generator,
            config,
        }
    }

    pub fn rules(&self) -> &ClinicalRules {
        &self.rules
    }

    pub async fn assemble(&self, request: PlanRequest<'_>) -> Plan {
        let (mut treatment_sections, source) = self.treatment_sections(&request).await;

        if !request.context.is_empty() {
            treatment_sections.push(TreatmentSection::new(CONTEXT_SECTION, CONTEXT_NOTES));
        }

        let plan = Plan {
            identified_problem: request.problem.to_string(),
            treatment_sections,
            estimated_cost: self.rules.estimate_cost(request.problem, request.hospital),
            appointment: self.rules.recommend_appointment(request.problem),
            source,
            context_documents: request.context.len(),
            hospital_options: self.hospital_options(request.hospital, request.city),
        };

        info!(
            problem = %plan.identified_problem,
            source = source.as_str(),
            sections = plan.treatment_sections.len(),
            context_documents = plan.context_documents,
            "Care plan assembled"
        );
        plan
    }

    async fn treatment_sections(&self, request: &PlanRequest<'_>) -> (Vec<TreatmentSection>, PlanSource) {
        if !self.generator.is_enabled() {
            return (self.rules.treatment_template(request.problem), PlanSource::RuleTemplate);
        }

        let prompt = match self.prompts.render_treatment(request.patient, request.problem, request.context) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(error = %e, "Treatment prompt rendering failed, using fallback plan");
                return (fallback_sections(), PlanSource::Fallback);
            }
        };

        match self.generator.generate(&prompt).await {
            GenerationOutcome::Success(text) => {
                let steps: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
                if steps.is_empty() {
                    warn!("Generated plan was blank, using fallback plan");
                    return (fallback_sections(), PlanSource::Fallback);
                }
                (vec![TreatmentSection::new(GENERATED_SECTION, steps)], PlanSource::Generated)
            }
            GenerationOutcome::Failure(reason) => {
                warn!(reason = %reason, "Plan generation failed, using fallback plan");
                (fallback_sections(), PlanSource::Fallback)
            }
        }
    }

    /// The detected hospital when the registry knows it, otherwise the first
    /// few listings for the city.
    pub fn hospital_options(&self, hospital: &HospitalInfo, city: Option<&str>) -> Vec<HospitalListing> {
        let city = city
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(&self.config.default_city);

        match self.registry.find(city, &hospital.name) {
            Some(listing) => vec![listing.clone()],
            None => self.registry.fallbacks(city, self.config.hospital_suggestions),
        }
    }
}
