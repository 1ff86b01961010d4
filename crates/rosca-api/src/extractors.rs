//! # Request Body Extraction
//!
//! Handlers take `Result<Json<T>, JsonRejection>` so that body problems are
//! reported in the API's error envelope instead of axum's plain-text
//! rejection. DTOs add field rules through [`Validate`].

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

/// Field-level rules checked after deserialization.
pub trait Validate {
    /// `Err` carries a message naming the offending field.
    fn validate(&self) -> Result<(), String>;
}

/// Fail with `"<field> must not be empty"` when `value` is blank.
pub fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{field} must not be empty"))
    } else {
        Ok(())
    }
}

/// Unwrap a JSON body. Any rejection (wrong content type, bad syntax,
/// missing or mistyped field) becomes [`AppError::BadRequest`].
pub fn extract_json<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!(status = %rejection.status(), "request body rejected");
            Err(AppError::BadRequest(rejection.body_text()))
        }
    }
}

/// [`extract_json`] followed by [`Validate::validate`]; rule failures are
/// [`AppError::Validation`] (422).
pub fn extract_validated_json<T: Validate>(
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(body)?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}
