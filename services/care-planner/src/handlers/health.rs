use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Json},
};
use careplan_utils::CarePlanError;
use serde_json::{json, Value};

use super::ApiError;
use crate::app::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "care-planner",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "knowledge_documents": state.knowledge.len(),
    }))
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    if !state.config.monitoring.metrics_enabled {
        return Err(CarePlanError::not_found("metrics").into());
    }
    let body = state.metrics.encode()?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}
