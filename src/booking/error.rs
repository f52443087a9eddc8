use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::error::ErrorResponse;

/// Message shown for both kinds of booking conflict
pub const NO_PRACTITIONER_MESSAGE: &str =
    "No practitioner is available for that date, time and branch";

/// Error types for booking operations
///
/// Every variant aborts the whole booking; a non-2xx response always means
/// no appointment was created.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Branch not found: {0}")]
    BranchNotFound(Uuid),

    #[error("Practitioner not found: {0}")]
    PractitionerNotFound(Uuid),

    #[error("No available practitioner")]
    NoAvailablePractitioner,

    #[error("Practitioner {0} was claimed by a concurrent booking")]
    ConcurrentBookingLost(Uuid),

    #[error("Appointment not found")]
    NotFound,

    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl BookingError {
    /// Conflict-class errors the caller may retry
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            BookingError::NoAvailablePractitioner | BookingError::ConcurrentBookingLost(_)
        )
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            BookingError::ValidationError(_) => StatusCode::BAD_REQUEST,
            BookingError::BranchNotFound(_) => StatusCode::NOT_FOUND,
            BookingError::PractitionerNotFound(_) => StatusCode::NOT_FOUND,
            BookingError::NoAvailablePractitioner => StatusCode::CONFLICT,
            BookingError::ConcurrentBookingLost(_) => StatusCode::CONFLICT,
            BookingError::NotFound => StatusCode::NOT_FOUND,
            BookingError::InvalidTransition(_) => StatusCode::BAD_REQUEST,
            BookingError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn to_error_response(&self) -> ErrorResponse {
        match self {
            BookingError::ValidationError(msg) => {
                tracing::debug!("Booking validation error: {}", msg);
                ErrorResponse::new("VALIDATION_ERROR", msg.clone())
            }
            BookingError::BranchNotFound(id) => {
                ErrorResponse::new("NOT_FOUND", format!("Branch with id {} not found", id))
            }
            BookingError::PractitionerNotFound(id) => {
                ErrorResponse::new("NOT_FOUND", format!("Practitioner with id {} not found", id))
            }
            BookingError::NoAvailablePractitioner => {
                ErrorResponse::new("NO_PRACTITIONER_AVAILABLE", NO_PRACTITIONER_MESSAGE)
                    .with_details(json!({ "reason": "no_available_practitioner", "retryable": true }))
            }
            BookingError::ConcurrentBookingLost(_) => {
                ErrorResponse::new("NO_PRACTITIONER_AVAILABLE", NO_PRACTITIONER_MESSAGE)
                    .with_details(json!({ "reason": "concurrent_booking_lost", "retryable": true }))
            }
            BookingError::NotFound => ErrorResponse::new("NOT_FOUND", "Appointment not found"),
            BookingError::InvalidTransition(msg) => {
                ErrorResponse::new("INVALID_TRANSITION", msg.clone())
            }
            BookingError::StorageError(msg) => {
                // Full error stays in the logs only
                tracing::error!("Booking storage error: {}", msg);
                ErrorResponse::new("DATABASE_ERROR", "A database error occurred")
            }
        }
    }
}

impl From<sqlx::Error> for BookingError {
    fn from(err: sqlx::Error) -> Self {
        BookingError::StorageError(err.to_string())
    }
}

// Extractor failures are malformed input, reported in the common envelope

impl From<JsonRejection> for BookingError {
    fn from(rejection: JsonRejection) -> Self {
        BookingError::ValidationError(rejection.body_text())
    }
}

impl From<QueryRejection> for BookingError {
    fn from(rejection: QueryRejection) -> Self {
        BookingError::ValidationError(rejection.body_text())
    }
}

impl From<PathRejection> for BookingError {
    fn from(rejection: PathRejection) -> Self {
        BookingError::ValidationError(rejection.body_text())
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self.to_error_response())).into_response()
    }
}
