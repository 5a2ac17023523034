//! Report Analysis Handler
//!
//! Accepts a diagnostic report upload and returns the extracted fields and
//! care plan.

use axum::{
    extract::{Multipart, Query, State},
    response::Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use careplan_models::{ClinicalSummary, HospitalInfo, PatientDetails, Plan};
use careplan_utils::{validate_file_type, CarePlanError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{join_error, ApiError};
use crate::app::AppState;
use crate::pdf_builder::render_plan_pdf;

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeParams {
    #[serde(default)]
    pub include_pdf: bool,
}

/// Report analysis response
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub report_id: Uuid,
    pub fingerprint: String,
    pub analyzed_at: DateTime<Utc>,
    pub extraction: ExtractionSummary,
    pub plan: Plan,
    /// Leading characters of each matched stored report.
    pub context: Vec<String>,
    /// Rendered plan, base64 encoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_pdf: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExtractionSummary {
    pub patient: PatientDetails,
    pub summary: ClinicalSummary,
    pub hospital: HospitalInfo,
    pub page_count: usize,
    pub pages_with_text: usize,
    pub char_count: usize,
}

/// Analyse an uploaded report
///
/// POST /api/v1/reports/analyze
pub async fn analyze_report(
    State(state): State<AppState>,
    Query(params): Query<AnalyzeParams>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let mut data = None;
    let mut city = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| CarePlanError::validation("file", format!("Failed to read upload: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                if let Some(file_name) = field.file_name() {
                    validate_file_type(file_name, &["pdf"])?;
                }
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| CarePlanError::validation("file", format!("Failed to read file data: {}", e)))?;
                data = Some(bytes.to_vec());
            }
            Some("city") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| CarePlanError::validation("city", format!("Failed to read city: {}", e)))?;
                city = Some(text);
            }
            _ => {}
        }
    }

    let data = data.ok_or_else(|| CarePlanError::validation("file", "No file provided"))?;
    let outcome = state.pipeline.analyze(data, city.as_deref()).await?;

    let plan_pdf = if params.include_pdf {
        let plan = outcome.plan.clone();
        let bytes = tokio::task::spawn_blocking(move || render_plan_pdf(&plan))
            .await
            .map_err(join_error)??;
        Some(BASE64.encode(bytes))
    } else {
        None
    };

    let preview_chars = state.config.knowledge.preview_chars;
    let extraction = &outcome.extraction;

    Ok(Json(AnalyzeResponse {
        report_id: outcome.report_id,
        fingerprint: outcome.fingerprint,
        analyzed_at: outcome.analyzed_at,
        extraction: ExtractionSummary {
            patient: extraction.patient.clone(),
            summary: extraction.summary.clone(),
            hospital: extraction.hospital.clone(),
            page_count: extraction.page_count,
            pages_with_text: extraction.pages_with_text,
            char_count: extraction.char_count(),
        },
        plan: outcome.plan,
        context: outcome
            .context
            .iter()
            .map(|doc| doc.chars().take(preview_chars).collect())
            .collect(),
        plan_pdf,
    }))
}
