use analytics::AnalyticsError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Bad input from the caller. The message is returned as is.
    #[error("{0}")]
    Validation(String),
    /// The dataset a route needs was not loaded at startup.
    #[error("{0}")]
    DataUnavailable(String),
    #[error("Analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::DataUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Analytics(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "ValidationError",
            AppError::DataUnavailable(_) => "DataUnavailableError",
            AppError::Analytics(_) => "CalculationError",
            AppError::Internal(_) => "InternalServerError",
        }
    }
}

/// Converts our custom `AppError` into the JSON error envelope.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_type = self.error_type();
        let error_message = match self {
            AppError::Validation(message) | AppError::DataUnavailable(message) => {
                tracing::warn!(status = status.as_u16(), %message, "Request rejected.");
                message
            }
            AppError::Analytics(analytics_err) => {
                tracing::error!(error = ?analytics_err, "Analytics error.");
                "Failed to calculate the requested statistics.".to_string()
            }
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error.");
                "An internal server error occurred while processing your request.".to_string()
            }
        };

        let body = Json(json!({
            "error": error_message,
            "error_type": error_type,
            "status_code": status.as_u16(),
        }));
        (status, body).into_response()
    }
}
