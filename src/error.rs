use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

pub const HANDOVER_REQUIRES_APPROVED_LEAVE: &str = "handover only allowed for approved leave";
pub const EMPLOYEE_ON_LEAVE: &str = "employee on leave during this period";
pub const EMPLOYEE_ALREADY_BOOKED: &str = "employee already has a handover during this period";
pub const ADMIN_HANDOVER_IMMUTABLE: &str = "cannot modify admin-initiated handover";

/// Failure kinds of the handover workflow. Each carries the reason shown to the caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandoverError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    /// A collaborator (database, lookup service) could not be reached.
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, HandoverError>;

impl HandoverError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        HandoverError::InvalidInput(reason.into())
    }

    pub fn not_found(reason: impl Into<String>) -> Self {
        HandoverError::NotFound(reason.into())
    }

    pub fn invalid_state(reason: impl Into<String>) -> Self {
        HandoverError::InvalidState(reason.into())
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        HandoverError::Conflict(reason.into())
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        HandoverError::Forbidden(reason.into())
    }
}

impl From<sqlx::Error> for HandoverError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!(error = %e, "Database call failed");
        HandoverError::Unavailable(e.to_string())
    }
}

impl ResponseError for HandoverError {
    fn status_code(&self) -> StatusCode {
        match self {
            HandoverError::InvalidInput(_) | HandoverError::InvalidState(_) => {
                StatusCode::BAD_REQUEST
            }
            HandoverError::NotFound(_) => StatusCode::NOT_FOUND,
            HandoverError::Conflict(_) => StatusCode::CONFLICT,
            HandoverError::Forbidden(_) => StatusCode::FORBIDDEN,
            HandoverError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            HandoverError::Unavailable(_) => {
                "Service temporarily unavailable, try again later".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({ "message": message }))
    }
}
