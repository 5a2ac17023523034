pub mod health;
pub mod knowledge;
pub mod plans;
pub mod reports;

pub use health::*;
pub use knowledge::*;
pub use plans::*;
pub use reports::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use careplan_utils::{CarePlanError, ErrorResponse};
use tracing::{error, warn};

/// HTTP form of [`CarePlanError`].
#[derive(Debug)]
pub struct ApiError(pub CarePlanError);

impl From<CarePlanError> for ApiError {
    fn from(error: CarePlanError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!(code = self.0.error_code(), error = %self.0, "Request failed");
        } else {
            warn!(code = self.0.error_code(), error = %self.0, "Request rejected");
        }

        (status, Json(ErrorResponse::from(self.0))).into_response()
    }
}

fn join_error(e: tokio::task::JoinError) -> ApiError {
    ApiError(CarePlanError::internal(format!("Background task failed: {}", e)))
}
