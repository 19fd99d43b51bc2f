//! Error handling for the stock service
//!
//! A failed ledger read aborts the whole request; no partial balances are
//! ever returned.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::ValidationError;
use thiserror::Error;

use crate::repository::RepositoryError;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Ledger read failures
    #[error("Ledger read failed: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Ledger read timed out after {} ms", .0.as_millis())]
    FetchTimeout(Duration),

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    fn status_and_detail(&self) -> (StatusCode, ErrorDetail) {
        match self {
            AppError::Repository(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail {
                    code: "FETCH_FAILURE".to_string(),
                    message: "Stock ledger could not be read".to_string(),
                    field: None,
                },
            ),
            AppError::FetchTimeout(limit) => (
                StatusCode::GATEWAY_TIMEOUT,
                ErrorDetail {
                    code: "FETCH_TIMEOUT".to_string(),
                    message: format!("Stock ledger read exceeded {} ms", limit.as_millis()),
                    field: None,
                },
            ),
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message: format!("{} not found", resource),
                    field: None,
                },
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = self.status_and_detail();

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for services and handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_failures_map_to_unavailable() {
        let err = AppError::Repository(RepositoryError::Decode("bad row".to_string()));
        let (status, _) = err.status_and_detail();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let err = AppError::Repository(RepositoryError::LockPoisoned);
        let (status, detail) = err.status_and_detail();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(detail.code, "FETCH_FAILURE");

        let (status, detail) = AppError::FetchTimeout(Duration::from_secs(5)).status_and_detail();
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(detail.code, "FETCH_TIMEOUT");
    }

    #[test]
    fn test_sub_second_timeout_keeps_its_precision() {
        let err = AppError::FetchTimeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "Ledger read timed out after 250 ms");

        let (_, detail) = err.status_and_detail();
        assert_eq!(detail.message, "Stock ledger read exceeded 250 ms");
    }

    #[test]
    fn test_validation_error_conversion() {
        let err: AppError = ValidationError::NegativeQuantity { field: "required" }.into();
        let (status, detail) = err.status_and_detail();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(detail.field.as_deref(), Some("required"));
        assert_eq!(detail.message, "required cannot be negative");
    }
}
