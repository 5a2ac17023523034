use axum::{
    http::header,
    response::{IntoResponse, Json},
};
use careplan_models::Plan;
use careplan_utils::validate_model;
use tracing::info;

use super::{join_error, ApiError};
use crate::pdf_builder::render_plan_pdf;

/// Render a plan as a PDF document
///
/// POST /api/v1/plans/render
pub async fn render_plan(Json(plan): Json<Plan>) -> Result<impl IntoResponse, ApiError> {
    validate_model(&plan)?;

    let sections = plan.treatment_sections.len();
    let bytes = tokio::task::spawn_blocking(move || render_plan_pdf(&plan))
        .await
        .map_err(join_error)??;
    info!(sections, bytes = bytes.len(), "Plan rendered");

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"treatment_plan.pdf\""),
        ],
        bytes,
    ))
}
