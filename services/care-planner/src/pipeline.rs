//! Report Pipeline
//!
//! Upload → text extraction → field extraction → retrieval → plan.
//! The knowledge store is injected and shared with the HTTP layer.

use careplan_knowledge::KnowledgeStore;
use careplan_models::{ReportExtraction, Plan};
use careplan_utils::{validate_pdf_upload, AppConfig, CarePlanError, CarePlanResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::fields::{FieldExtractor, ReportField};
use crate::hospital::HospitalDetector;
use crate::llm_client::{parse_structured_fields, GenerationOutcome, StructuredFields, TextGenerator};
use crate::metrics::Metrics;
use crate::pdf_processor::{PdfContent, PdfProcessor};
use crate::planner::{CarePlanner, PlanRequest};
use crate::prompts::PromptTemplates;

/// Limits and switches for one pipeline instance.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub min_text_chars: usize,
    pub max_upload_bytes: usize,
    pub top_k: usize,
    pub structured_extraction: bool,
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            min_text_chars: config.extraction.min_text_chars,
            max_upload_bytes: config.server.max_request_size,
            top_k: config.knowledge.top_k,
            structured_extraction: config.llm.structured_extraction,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Everything produced for one analysed report.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub report_id: Uuid,
    /// SHA-256 of the uploaded bytes, hex encoded.
    pub fingerprint: String,
    pub extraction: ReportExtraction,
    pub plan: Plan,
    /// Prior reports that matched the identified problem.
    pub context: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

pub struct ReportPipeline {
    fields: FieldExtractor,
    hospitals: HospitalDetector,
    knowledge: Arc<dyn KnowledgeStore>,
    planner: CarePlanner,
    generator: Arc<dyn TextGenerator>,
    prompts: Arc<PromptTemplates>,
    metrics: Metrics,
    settings: PipelineSettings,
}

impl ReportPipeline {
    pub fn new(
        config: &AppConfig,
        knowledge: Arc<dyn KnowledgeStore>,
        generator: Arc<dyn TextGenerator>,
        metrics: Metrics,
    ) -> CarePlanResult<Self> {
        let prompts = Arc::new(PromptTemplates::new()?);
        let fields = FieldExtractor::new()
            .with_missing_value(&config.extraction.missing_value)
            .with_summary_max_chars(config.extraction.summary_max_chars);
        let planner = CarePlanner::new(prompts.clone(), generator.clone(), config.planner.clone());

        Ok(Self {
            fields,
            hospitals: HospitalDetector::new(),
            knowledge,
            planner,
            generator,
            prompts,
            metrics,
            settings: PipelineSettings::from_config(config),
        })
    }

    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn knowledge(&self) -> &Arc<dyn KnowledgeStore> {
        &self.knowledge
    }

    pub fn planner(&self) -> &CarePlanner {
        &self.planner
    }

    /// Analyse one uploaded report and assemble its care plan.
    pub async fn analyze(&self, data: Vec<u8>, city: Option<&str>) -> CarePlanResult<AnalysisOutcome> {
        let report_id = Uuid::new_v4();
        match self.run(report_id, data, city).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                warn!(report_id = %report_id, code = e.error_code(), error = %e, "Report rejected");
                self.metrics.record_rejection(&e);
                Err(e)
            }
        }
    }

    async fn run(&self, report_id: Uuid, data: Vec<u8>, city: Option<&str>) -> CarePlanResult<AnalysisOutcome> {
        validate_pdf_upload(&data, self.settings.max_upload_bytes)?;
        let fingerprint = hex::encode(Sha256::digest(&data));

        let content = tokio::task::spawn_blocking(move || PdfProcessor::new().extract(&data))
            .await
            .map_err(|e| CarePlanError::internal(format!("PDF extraction task failed: {}", e)))??;

        let mut extraction = self.extract_content(content)?;
        if self.settings.structured_extraction && self.generator.is_enabled() {
            self.apply_structured_extraction(&mut extraction).await;
        }

        let problem = self
            .planner
            .rules()
            .infer_problem(&extraction.summary, self.fields.sentinel(ReportField::FinalDiagnosis));

        // The report joins the store before retrieval, so it is its own context.
        self.knowledge.add(&extraction.text);
        self.metrics.set_knowledge_documents(self.knowledge.len());
        let context = self.knowledge.query(&problem, self.settings.top_k);

        let plan = self
            .planner
            .assemble(PlanRequest {
                patient: &extraction.patient,
                problem: &problem,
                hospital: &extraction.hospital,
                context: &context,
                city,
            })
            .await;
        self.metrics.record_plan(plan.source);

        info!(
            report_id = %report_id,
            pages = extraction.page_count,
            chars = extraction.char_count(),
            problem = %problem,
            context_documents = context.len(),
            "Report analysed"
        );

        Ok(AnalysisOutcome {
            report_id,
            fingerprint,
            extraction,
            plan,
            context,
            analyzed_at: Utc::now(),
        })
    }

    /// Apply the text threshold, then pattern extraction.
    pub fn extract_content(&self, content: PdfContent) -> CarePlanResult<ReportExtraction> {
        let chars = content.char_count();
        if chars < self.settings.min_text_chars {
            return Err(CarePlanError::insufficient_text(chars, self.settings.min_text_chars));
        }
        let pages_with_text = content.pages_with_text();
        Ok(self.extract_from_text(content.text, content.page_count, pages_with_text))
    }

    /// Pattern extraction over already-extracted text. Never fails.
    pub fn extract_from_text(&self, text: String, page_count: usize, pages_with_text: usize) -> ReportExtraction {
        let patient = self.fields.extract_patient(&text);
        let summary = self.fields.extract_summary(&text);
        let hospital = self.hospitals.detect(&text);

        ReportExtraction {
            text,
            patient,
            summary,
            hospital,
            page_count,
            pages_with_text,
        }
    }

    async fn apply_structured_extraction(&self, extraction: &mut ReportExtraction) {
        let missing = self.fields.sentinel(ReportField::FinalDiagnosis).to_string();
        let prompt = match self.prompts.render_extraction(&extraction.text, &missing) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(error = %e, "Extraction prompt rendering failed");
                return;
            }
        };

        match self.generator.generate(&prompt).await {
            GenerationOutcome::Success(response) => match parse_structured_fields(&response, &missing) {
                Some(structured) => self.merge_structured(extraction, structured),
                None => debug!("Structured extraction returned no usable JSON"),
            },
            GenerationOutcome::Failure(reason) => debug!(reason = %reason, "Structured extraction skipped"),
        }
    }

    /// Fill only fields pattern extraction left at the sentinel.
    fn merge_structured(&self, extraction: &mut ReportExtraction, structured: StructuredFields) {
        let patient = &mut extraction.patient;
        let summary = &mut extraction.summary;
        let targets = [
            (ReportField::PatientName, &mut patient.name, structured.patient_name),
            (ReportField::Age, &mut patient.age, structured.age),
            (ReportField::Gender, &mut patient.gender, structured.gender),
            (ReportField::ChiefComplaint, &mut summary.chief_complaint, structured.chief_complaint),
            (ReportField::FinalDiagnosis, &mut summary.final_diagnosis, structured.final_diagnosis),
            (ReportField::FinalDiagnosis, &mut summary.key_findings, structured.key_findings),
            (ReportField::FinalDiagnosis, &mut summary.risk_factors, structured.risk_factors),
        ];

        let mut filled = 0;
        for (field, current, candidate) in targets {
            if self.fields.is_missing(field, current) && !self.fields.is_missing(field, &candidate) {
                *current = candidate;
                filled += 1;
            }
        }
        debug!(filled, "Structured extraction merged");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use careplan_knowledge::InMemoryKnowledgeStore;
    use careplan_models::PlanSource;
    use careplan_utils::LlmConfig;

    use crate::llm_client::DisabledGenerator;

    struct FixedGenerator(GenerationOutcome);

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        async fn generate(&self, _prompt: &str) -> GenerationOutcome {
            self.0.clone()
        }
    }

    const REPORT: &str = "APOLLO HOSPITALS\n\
        Patient Name: Meera Iyer\n\
        Age: 47 Gender: Female\n\
        Chief Complaint: headache and dizziness for two weeks\n\n\
        Final Diagnosis: Hypertension";

    fn pipeline(config: &AppConfig, generator: Arc<dyn TextGenerator>) -> ReportPipeline {
        let store: Arc<dyn KnowledgeStore> = Arc::new(InMemoryKnowledgeStore::new());
        ReportPipeline::new(config, store, generator, Metrics::new("test").unwrap()).unwrap()
    }

    fn content(text: &str) -> PdfContent {
        PdfContent {
            text: text.to_string(),
            pages: Vec::new(),
            page_count: 1,
        }
    }

    #[test]
    fn test_threshold_rejects_short_text() {
        let pipeline = pipeline(&AppConfig::default(), Arc::new(DisabledGenerator));
        let error = pipeline.extract_content(content("Scan page 1")).unwrap_err();
        assert_eq!(error, CarePlanError::insufficient_text(11, 100));
    }

    #[test]
    fn test_extracts_fields_above_threshold() {
        let pipeline = pipeline(&AppConfig::default(), Arc::new(DisabledGenerator));
        let extraction = pipeline.extract_content(content(REPORT)).unwrap();

        assert_eq!(extraction.patient.name, "Meera Iyer");
        assert_eq!(extraction.patient.gender, "Female");
        assert_eq!(extraction.summary.final_diagnosis, "Hypertension");
        assert_eq!(extraction.summary.chief_complaint, "headache and dizziness for two weeks");
        assert_eq!(extraction.hospital.name, "Apollo Hospitals, Bannerghatta Road");
    }

    #[tokio::test]
    async fn test_structured_extraction_fills_missing_fields_only() {
        let mut config = AppConfig::default();
        config.llm = LlmConfig {
            enabled: true,
            structured_extraction: true,
            ..LlmConfig::default()
        };
        let response = r#"{"patient_name": "Someone Else", "key_findings": "BP 170/100",
            "risk_factors": "", "final_diagnosis": "Essential hypertension"}"#;
        let pipeline = pipeline(&config, Arc::new(FixedGenerator(GenerationOutcome::Success(response.to_string()))));

        let mut extraction = pipeline.extract_content(content(REPORT)).unwrap();
        pipeline.apply_structured_extraction(&mut extraction).await;

        assert_eq!(extraction.patient.name, "Meera Iyer");
        assert_eq!(extraction.summary.final_diagnosis, "Hypertension");
        assert_eq!(extraction.summary.key_findings, "BP 170/100");
        assert_eq!(extraction.summary.risk_factors, "Not mentioned");
    }

    #[tokio::test]
    async fn test_invalid_upload_is_rejected() {
        let pipeline = pipeline(&AppConfig::default(), Arc::new(DisabledGenerator));
        let error = pipeline.analyze(b"plain text".to_vec(), None).await.unwrap_err();
        assert_eq!(error.error_code(), "UNREADABLE_DOCUMENT");

        let error = pipeline.analyze(Vec::new(), None).await.unwrap_err();
        assert_eq!(error.error_code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_failed_generation_still_plans() {
        let mut config = AppConfig::default();
        config.llm.enabled = true;
        let pipeline = pipeline(&config, Arc::new(FixedGenerator(GenerationOutcome::Failure("timeout".to_string()))));

        let extraction = pipeline.extract_from_text(REPORT.to_string(), 1, 1);
        let plan = pipeline
            .planner()
            .assemble(PlanRequest {
                patient: &extraction.patient,
                problem: &extraction.summary.final_diagnosis,
                hospital: &extraction.hospital,
                context: &[],
                city: None,
            })
            .await;
        assert_eq!(plan.source, PlanSource::Fallback);
        assert_eq!(plan.hospital_options[0].key, "apollo");
    }
}
