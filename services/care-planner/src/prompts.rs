//! Prompt Templates
//!
//! Handlebars templates for text-generation requests. Output is plain text,
//! so HTML escaping is disabled.

use careplan_models::PatientDetails;
use careplan_utils::{CarePlanError, CarePlanResult};
use handlebars::Handlebars;
use serde_json::json;

const TREATMENT_PLAN: &str = "treatment_plan";
const STRUCTURED_EXTRACTION: &str = "structured_extraction";

const TREATMENT_PLAN_TEMPLATE: &str = r#"You are a senior clinical assistant.

Patient details:
Name: {{patient.name}}
Age: {{patient.age}}
Gender: {{patient.gender}}

Diagnosis:
{{problem}}
{{#if context}}

Similar stored reports:
{{#each context}}- {{this}}
{{/each}}{{/if}}

Generate a structured treatment plan with:
- Immediate Management
- Medications
- Monitoring and Investigations
- Recovery and Rehabilitation
- Discharge and Follow-up

Use concise bullet points.
"#;

const STRUCTURED_EXTRACTION_TEMPLATE: &str = r#"You are a senior medical data extraction expert.

Your task:
Extract the following information ONLY from the report text.
If something is not explicitly present, return "{{missing}}".

Return STRICT JSON ONLY. No explanations.

Fields to extract:
- patient_name
- age
- gender
- chief_complaint
- key_findings
- risk_factors
- final_diagnosis

IMPORTANT RULES:
- Read carefully like a doctor
- Do NOT hallucinate
- If partially available, summarize briefly
- Output must be valid JSON

================= REPORT TEXT =================
{{report}}
================= END =================

JSON OUTPUT FORMAT:
{
  "patient_name": "",
  "age": "",
  "gender": "",
  "chief_complaint": "",
  "key_findings": "",
  "risk_factors": "",
  "final_diagnosis": ""
}
"#;

/// Registered prompt templates
pub struct PromptTemplates {
    handlebars: Handlebars<'static>,
}

impl PromptTemplates {
    pub fn new() -> CarePlanResult<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);

        for (name, template) in [
            (TREATMENT_PLAN, TREATMENT_PLAN_TEMPLATE),
            (STRUCTURED_EXTRACTION, STRUCTURED_EXTRACTION_TEMPLATE),
        ] {
            handlebars.register_template_string(name, template).map_err(|e| {
                CarePlanError::configuration(format!("Invalid prompt template '{}': {}", name, e))
            })?;
        }

        Ok(Self { handlebars })
    }

    /// Prompt asking for a free-text treatment plan.
    pub fn render_treatment(
        &self,
        patient: &PatientDetails,
        problem: &str,
        context: &[String],
    ) -> CarePlanResult<String> {
        let data = json!({
            "patient": patient,
            "problem": problem,
            "context": context,
        });
        self.handlebars
            .render(TREATMENT_PLAN, &data)
            .map_err(|e| CarePlanError::internal(format!("Failed to render treatment prompt: {}", e)))
    }

    /// Prompt asking for the report fields as strict JSON.
    pub fn render_extraction(&self, report: &str, missing: &str) -> CarePlanResult<String> {
        let data = json!({
            "report": report,
            "missing": missing,
        });
        self.handlebars
            .render(STRUCTURED_EXTRACTION, &data)
            .map_err(|e| CarePlanError::internal(format!("Failed to render extraction prompt: {}", e)))
    }
}
