//! Knowledge Store Handlers
//!
//! Seed and search the shared store of prior reports.

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use careplan_utils::{validate_model, validate_non_blank};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use validator::Validate;

use super::ApiError;
use crate::app::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct AddDocumentRequest {
    #[validate(length(min = 1, message = "Document text is required"))]
    pub text: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct KnowledgeQueryRequest {
    #[validate(length(min = 1, message = "Query text is required"))]
    pub text: String,
    #[validate(range(min = 1, max = 20, message = "top_k must be between 1 and 20"))]
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct KnowledgeQueryResponse {
    pub documents: Vec<String>,
}

/// POST /api/v1/knowledge/documents
pub async fn add_document(
    State(state): State<AppState>,
    Json(request): Json<AddDocumentRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    validate_model(&request)?;
    validate_non_blank("text", &request.text)?;

    state.knowledge.add(&request.text);
    let documents = state.knowledge.len();
    state.metrics.set_knowledge_documents(documents);
    info!(documents, "Knowledge document added");

    Ok((StatusCode::CREATED, Json(json!({ "documents": documents }))))
}

/// POST /api/v1/knowledge/query
pub async fn query_knowledge(
    State(state): State<AppState>,
    Json(request): Json<KnowledgeQueryRequest>,
) -> Result<Json<KnowledgeQueryResponse>, ApiError> {
    validate_model(&request)?;

    let top_k = request.top_k.unwrap_or(state.config.knowledge.top_k);
    let documents = state.knowledge.query(&request.text, top_k);
    Ok(Json(KnowledgeQueryResponse { documents }))
}

/// GET /api/v1/knowledge/stats
pub async fn knowledge_stats(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "documents": state.knowledge.len(),
        "max_documents": state.config.knowledge.max_documents,
    }))
}
