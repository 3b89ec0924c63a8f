use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::models::registration::TimeSlot;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("location unavailable: {0}")]
    LocationUnavailable(String),

    #[error("{message}")]
    GeofenceRejected { distance_m: f64, message: String },

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("already registered for the {slot} slot this shift (queue {queue_number})")]
    DuplicateRegistration { queue_number: String, slot: TimeSlot },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("illegal status transition: {0}")]
    InvalidTransition(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code, also used as the metrics outcome label.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::LocationUnavailable(_) => "location_unavailable",
            AppError::GeofenceRejected { .. } => "geofence_rejected",
            AppError::AuthenticationRequired(_) => "authentication_required",
            AppError::DuplicateRegistration { .. } => "duplicate_registration",
            AppError::NotFound(_) => "not_found",
            AppError::InvalidTransition(_) => "invalid_transition",
            AppError::Unauthorized => "unauthorized",
            AppError::Storage(_) => "storage",
            AppError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) | AppError::LocationUnavailable(_) => StatusCode::BAD_REQUEST,
            AppError::GeofenceRejected { .. } => StatusCode::FORBIDDEN,
            AppError::AuthenticationRequired(_) | AppError::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            AppError::DuplicateRegistration { .. } | AppError::InvalidTransition(_) => {
                StatusCode::CONFLICT
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Storage(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let mut body = json!({
            "error": self.to_string(),
            "code": self.code(),
        });

        match &self {
            AppError::DuplicateRegistration { queue_number, .. } => {
                body["queue_number"] = json!(queue_number);
            }
            AppError::GeofenceRejected { distance_m, .. } => {
                body["distance_m"] = json!(distance_m);
            }
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}
