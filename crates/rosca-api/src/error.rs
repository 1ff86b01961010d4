//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps domain errors from rosca-ledger, rosca-kyc, and rosca-core onto HTTP
//! status codes by their [`ErrorClass`]:
//!
//! | Class | Status |
//! |-------|--------|
//! | Malformed | 422 |
//! | PolicyFailure | 403 |
//! | StateConflict | 409 |
//! | NotFound | 404 |
//! | Fatal | 500 |
//!
//! Domain refusals keep their own machine-readable code (`ALREADY_MEMBER`,
//! `WRONG_PERIOD`, ...). Internal error details are never returned.
//!
//! The attestation submission endpoint does not use this type; it answers
//! with its own wire shapes (see [`crate::routes::verify`]).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rosca_core::{ErrorClass, ValidationError};
use rosca_kyc::RegistryError;
use rosca_ledger::LedgerError;
use rosca_state::CircleError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "ALREADY_MEMBER").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict with current resource state (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A domain operation was refused with its own code.
    #[error("{message}")]
    Refused {
        status: StatusCode,
        code: &'static str,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Refused { status, code, .. } => (*status, code),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

fn status_for(class: ErrorClass) -> StatusCode {
    match class {
        ErrorClass::Malformed => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorClass::PolicyFailure => StatusCode::FORBIDDEN,
        ErrorClass::StateConflict => StatusCode::CONFLICT,
        ErrorClass::NotFound => StatusCode::NOT_FOUND,
        ErrorClass::Fatal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let internal = status.is_server_error();
        let message = if internal {
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };
        if internal {
            tracing::error!(error = %self, "internal server error");
        }

        let details = match self {
            Self::Refused { details, .. } if !internal => details,
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Convert rosca-core validation errors to API errors.
impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Convert ledger errors by class, keeping the domain code.
impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let details = match &err {
            LedgerError::Circle(CircleError::Ineligible { reason, .. }) => {
                serde_json::to_value(reason).ok()
            }
            _ => None,
        };
        Self::Refused {
            status: status_for(err.class()),
            code: err.code(),
            message: err.to_string(),
            details,
        }
    }
}

/// Convert registry errors to API errors.
impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err.class() {
            ErrorClass::NotFound => Self::NotFound(err.to_string()),
            _ => Self::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use rosca_core::{CircleId, SubjectId};
    use rosca_kyc::IneligibleReason;

    #[test]
    fn not_found_status_code() {
        let err = AppError::NotFound("missing circle".to_string());
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "NOT_FOUND");
    }

    #[test]
    fn validation_status_code() {
        let err = AppError::Validation("bad field".to_string());
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(code, "VALIDATION_ERROR");
    }

    #[test]
    fn ledger_errors_map_by_class() {
        let subject = SubjectId::new("alice").unwrap();
        let cases = [
            (
                LedgerError::CircleNotFound(CircleId::new(9)),
                StatusCode::NOT_FOUND,
                "CIRCLE_NOT_FOUND",
            ),
            (
                LedgerError::Circle(CircleError::AlreadyMember(subject.clone())),
                StatusCode::CONFLICT,
                "ALREADY_MEMBER",
            ),
            (
                LedgerError::Circle(CircleError::Ineligible {
                    subject: subject.clone(),
                    reason: IneligibleReason::NotVerified,
                }),
                StatusCode::FORBIDDEN,
                "INELIGIBLE",
            ),
            (
                LedgerError::InvalidPolicy(rosca_state::PolicyError::AmountNotPositive),
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_POLICY",
            ),
        ];
        for (err, expected_status, expected_code) in cases {
            let (status, code) = AppError::from(err).status_and_code();
            assert_eq!(status, expected_status);
            assert_eq!(code, expected_code);
        }
    }

    async fn response_parts(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn into_response_not_found() {
        let (status, body) = response_parts(AppError::NotFound("circle 123".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error.code, "NOT_FOUND");
        assert!(body.error.message.contains("circle 123"));
        assert!(body.error.details.is_none());
    }

    #[tokio::test]
    async fn ineligible_carries_reason_details() {
        let err = AppError::from(LedgerError::Circle(CircleError::Ineligible {
            subject: SubjectId::new("bob").unwrap(),
            reason: IneligibleReason::NotVerified,
        }));
        let (status, body) = response_parts(err).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body.error.code, "INELIGIBLE");
        assert_eq!(body.error.details.unwrap()["code"], "NOT_VERIFIED");
    }

    #[tokio::test]
    async fn into_response_internal_hides_details() {
        let (status, body) = response_parts(AppError::Internal("lock poisoned".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.code, "INTERNAL_ERROR");
        assert!(!body.error.message.contains("lock poisoned"));
        assert_eq!(body.error.message, "An internal error occurred");
    }

    #[tokio::test]
    async fn fatal_refusal_hides_details() {
        let err = AppError::Refused {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "PAYOUT_OVERFLOW",
            message: "overflow".into(),
            details: Some(serde_json::json!({"x": 1})),
        };
        let (status, body) = response_parts(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.code, "PAYOUT_OVERFLOW");
        assert_eq!(body.error.message, "An internal error occurred");
        assert!(body.error.details.is_none());
    }
}
