use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message shown when a report has too little embedded text to read.
pub const SCANNED_REPORT_MESSAGE: &str = "This appears to be a scanned PDF. Please upload a text-based (digitally generated) diagnostic report.";

#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum CarePlanError {
    #[error("Unreadable document: {message}")]
    UnreadableDocument { message: String },

    #[error("{}", SCANNED_REPORT_MESSAGE)]
    InsufficientText { extracted_chars: usize, min_chars: usize },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Rendering error: {message}")]
    Rendering { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl CarePlanError {
    pub fn unreadable_document(message: impl Into<String>) -> Self {
        Self::UnreadableDocument {
            message: message.into(),
        }
    }

    pub fn insufficient_text(extracted_chars: usize, min_chars: usize) -> Self {
        Self::InsufficientText {
            extracted_chars,
            min_chars,
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn rendering(message: impl Into<String>) -> Self {
        Self::Rendering {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnreadableDocument { .. } => "UNREADABLE_DOCUMENT",
            Self::InsufficientText { .. } => "INSUFFICIENT_TEXT",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Rendering { .. } => "RENDERING_ERROR",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Internal { .. } => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::UnreadableDocument { .. } => 422,
            Self::InsufficientText { .. } => 422,
            Self::Validation { .. } => 400,
            Self::Rendering { .. } => 500,
            Self::Configuration { .. } => 500,
            Self::NotFound { .. } => 404,
            Self::Internal { .. } => 500,
        }
    }

    /// Machine-readable context attached to the HTTP error body.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::InsufficientText {
                extracted_chars,
                min_chars,
            } => Some(serde_json::json!({
                "extracted_chars": extracted_chars,
                "min_chars": min_chars,
            })),
            Self::Validation { field, .. } => Some(serde_json::json!({ "field": field })),
            _ => None,
        }
    }
}

pub type CarePlanResult<T> = Result<T, CarePlanError>;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl From<CarePlanError> for ErrorResponse {
    fn from(error: CarePlanError) -> Self {
        Self {
            error: error.to_string(),
            code: error.error_code().to_string(),
            message: error.to_string(),
            details: error.details(),
        }
    }
}

impl From<serde_json::Error> for CarePlanError {
    fn from(error: serde_json::Error) -> Self {
        Self::validation("JSON", error.to_string())
    }
}

impl From<config::ConfigError> for CarePlanError {
    fn from(error: config::ConfigError) -> Self {
        Self::configuration(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_text_message() {
        let error = CarePlanError::insufficient_text(12, 100);
        assert_eq!(error.to_string(), SCANNED_REPORT_MESSAGE);
        assert_eq!(error.error_code(), "INSUFFICIENT_TEXT");
        assert_eq!(error.http_status_code(), 422);

        let response = ErrorResponse::from(error);
        let details = response.details.unwrap();
        assert_eq!(details["extracted_chars"], 12);
        assert_eq!(details["min_chars"], 100);
    }

    #[test]
    fn test_unreadable_is_distinct_from_insufficient() {
        let unreadable = CarePlanError::unreadable_document("not a PDF");
        assert_eq!(unreadable.error_code(), "UNREADABLE_DOCUMENT");
        assert_ne!(
            unreadable.error_code(),
            CarePlanError::insufficient_text(0, 100).error_code()
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(CarePlanError::validation("top_k", "too large").http_status_code(), 400);
        assert_eq!(CarePlanError::not_found("route").http_status_code(), 404);
        assert_eq!(CarePlanError::rendering("font").http_status_code(), 500);
    }

    #[test]
    fn test_every_error_maps_to_client_or_server_status() {
        let errors = [
            CarePlanError::unreadable_document("truncated xref"),
            CarePlanError::insufficient_text(0, 100),
            CarePlanError::validation("file", "No file provided"),
            CarePlanError::rendering("font"),
            CarePlanError::configuration("bad port"),
            CarePlanError::not_found("metrics"),
            CarePlanError::internal("join"),
        ];
        let codes: std::collections::HashSet<_> = errors.iter().map(|e| e.error_code()).collect();
        assert_eq!(codes.len(), errors.len());
        for error in &errors {
            assert!(matches!(error.http_status_code(), 400..=499 | 500));
        }
    }
}
