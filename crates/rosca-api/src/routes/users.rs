//! # User Queries API
//!
//! Read-only views keyed by subject: circle membership, verification status,
//! and standalone eligibility checks against arbitrary criteria.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use rosca_core::{CircleId, CountryCode, SubjectId, Timestamp};
use rosca_kyc::{EligibilityCriteria, IneligibleReason, VerificationSummary};
use rosca_state::policy::{MAX_AGE, MIN_AGE};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::state::AppState;

/// Eligibility query parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityQuery {
    /// Required nationality.
    pub country: String,
    /// Minimum age, inclusive. Defaults to 18.
    pub min_age: Option<u8>,
    /// Maximum age, inclusive. Defaults to 100.
    pub max_age: Option<u8>,
}

/// Circles a subject belongs to.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserCirclesResponse {
    #[schema(value_type = String)]
    pub subject_id: SubjectId,
    /// Circle ids in join order.
    #[schema(value_type = Vec<u64>)]
    pub circle_ids: Vec<CircleId>,
}

/// Whether a subject has a recorded verification.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserVerifiedResponse {
    #[schema(value_type = String)]
    pub subject_id: SubjectId,
    pub is_verified: bool,
}

/// Flat verification details of a subject.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerificationDetailsResponse {
    pub is_verified: bool,
    #[schema(value_type = Option<String>)]
    pub nationality: Option<CountryCode>,
    pub age_at_verification: Option<u8>,
    #[schema(value_type = Option<String>)]
    pub verification_timestamp: Option<Timestamp>,
    pub is_human: bool,
    #[serde(rename = "passedOFACCheck")]
    pub passed_ofac_check: bool,
}

impl From<VerificationSummary> for VerificationDetailsResponse {
    fn from(s: VerificationSummary) -> Self {
        Self {
            is_verified: s.is_verified,
            nationality: s.nationality,
            age_at_verification: s.age_at_verification,
            verification_timestamp: s.verification_timestamp,
            is_human: s.is_human,
            passed_ofac_check: s.passed_ofac_check,
        }
    }
}

/// Eligibility verdict.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityResponse {
    pub eligible: bool,
    /// `"eligible"` or the first failing check, in words.
    pub reason: String,
    /// Structured form of the failing check.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub detail: Option<IneligibleReason>,
}

/// Build the users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/users/{subject}/circles", get(user_circles))
        .route("/v1/users/{subject}/verified", get(is_verified))
        .route("/v1/users/{subject}/verification", get(verification_details))
        .route("/v1/users/{subject}/eligibility", get(eligibility))
}

/// GET /v1/users/{subject}/circles — Circles the subject has joined.
#[utoipa::path(
    get,
    path = "/v1/users/{subject}/circles",
    params(("subject" = String, Path, description = "Subject id")),
    responses(
        (status = 200, description = "Circle ids", body = UserCirclesResponse),
        (status = 422, description = "Invalid subject id", body = crate::error::ErrorBody),
    ),
    tag = "users"
)]
pub(crate) async fn user_circles(
    State(state): State<AppState>,
    Path(subject): Path<String>,
) -> Result<Json<UserCirclesResponse>, AppError> {
    let subject = SubjectId::new(&subject)?;
    let circle_ids = state.ledger.get_user_circles(&subject);
    Ok(Json(UserCirclesResponse {
        subject_id: subject,
        circle_ids,
    }))
}

/// GET /v1/users/{subject}/verified — Whether a verification is on record.
#[utoipa::path(
    get,
    path = "/v1/users/{subject}/verified",
    params(("subject" = String, Path, description = "Subject id")),
    responses((status = 200, description = "Verification flag", body = UserVerifiedResponse)),
    tag = "users"
)]
pub(crate) async fn is_verified(
    State(state): State<AppState>,
    Path(subject): Path<String>,
) -> Result<Json<UserVerifiedResponse>, AppError> {
    let subject = SubjectId::new(&subject)?;
    let is_verified = state.registry.summary(&subject).is_verified;
    Ok(Json(UserVerifiedResponse {
        subject_id: subject,
        is_verified,
    }))
}

/// GET /v1/users/{subject}/verification — Verification details.
#[utoipa::path(
    get,
    path = "/v1/users/{subject}/verification",
    params(("subject" = String, Path, description = "Subject id")),
    responses((status = 200, description = "Verification details", body = VerificationDetailsResponse)),
    tag = "users"
)]
pub(crate) async fn verification_details(
    State(state): State<AppState>,
    Path(subject): Path<String>,
) -> Result<Json<VerificationDetailsResponse>, AppError> {
    let subject = SubjectId::new(&subject)?;
    Ok(Json(state.registry.summary(&subject).into()))
}

/// GET /v1/users/{subject}/eligibility — Evaluate against ad-hoc criteria.
#[utoipa::path(
    get,
    path = "/v1/users/{subject}/eligibility",
    params(
        ("subject" = String, Path, description = "Subject id"),
        ("country" = String, Query, description = "Required nationality"),
        ("minAge" = Option<u8>, Query, description = "Minimum age, inclusive"),
        ("maxAge" = Option<u8>, Query, description = "Maximum age, inclusive"),
    ),
    responses(
        (status = 200, description = "Eligibility verdict", body = EligibilityResponse),
        (status = 422, description = "Invalid subject or criteria", body = crate::error::ErrorBody),
    ),
    tag = "users"
)]
pub(crate) async fn eligibility(
    State(state): State<AppState>,
    Path(subject): Path<String>,
    Query(query): Query<EligibilityQuery>,
) -> Result<Json<EligibilityResponse>, AppError> {
    let subject = SubjectId::new(&subject)?;
    let criteria = EligibilityCriteria {
        country: CountryCode::new(&query.country)?,
        min_age: query.min_age.unwrap_or(MIN_AGE),
        max_age: query.max_age.unwrap_or(MAX_AGE),
    };
    if criteria.min_age > criteria.max_age {
        return Err(AppError::Validation(format!(
            "minAge {} exceeds maxAge {}",
            criteria.min_age, criteria.max_age
        )));
    }
    let verdict = state.ledger.evaluator().evaluate(&subject, &criteria);
    Ok(Json(EligibilityResponse {
        eligible: verdict.eligible,
        reason: verdict.reason_text(),
        detail: verdict.reason,
    }))
}
