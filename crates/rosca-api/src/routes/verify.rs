//! # Attestation Submission Boundary
//!
//! `POST /api/verify` accepts an attestation package and answers with one of
//! four wire shapes:
//!
//! | Outcome | Status | `error_code` |
//! |---------|--------|--------------|
//! | verified | 200 | — (`status: "success"`) |
//! | policy or proof failure | 200 | `VERIFICATION_FAILED` |
//! | missing fields, non-object body | 400 | `MISSING_FIELDS` |
//! | other malformed input | 400 | `UNKNOWN_ERROR` |
//! | unparseable body, fatal fault | 500 | `UNKNOWN_ERROR` |
//!
//! A verified result is recorded in the registry before responding, so the
//! subject can join circles immediately afterwards.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use rosca_attest::{AttestationError, RawAttestationRequest};
use rosca_core::{ErrorClass, Timestamp};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use utoipa::ToSchema;

use crate::state::AppState;

const REQUIRED_MESSAGE: &str =
    "Proof, publicSignals, attestationId and userContextData are required";

/// Attestation package as submitted. Documentation only: the handler reads
/// the raw body so that absent, `null`, and empty fields are all reported.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    /// Document type: 1 passport, 2 EU ID card, 3 Aadhaar.
    pub attestation_id: serde_json::Value,
    /// Proof blob, hex.
    pub proof: String,
    /// Public-signal vector.
    pub public_signals: Vec<String>,
    /// Context data, hex.
    pub user_context_data: String,
}

/// Body of every `/api/verify` response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    /// `"success"` or `"error"`.
    pub status: String,
    /// Whether the subject is now verified.
    pub result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Disclosed attributes of a verified subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_subject: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(rename = "error_code", skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Verdict breakdown or the missing field names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl VerifyResponse {
    fn error(code: &str) -> Self {
        Self {
            status: "error".to_string(),
            result: false,
            message: None,
            credential_subject: None,
            timestamp: None,
            reason: None,
            error_code: Some(code.to_string()),
            details: None,
        }
    }
}

/// Build the verification router. The CORS layer answers preflight requests
/// for browser callers.
pub fn router() -> Router<AppState> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);
    Router::new()
        .route("/api/verify", post(verify))
        .layer(cors)
}

/// POST /api/verify — Verify an attestation package.
#[utoipa::path(
    post,
    path = "/api/verify",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Verified, or a verification-failed verdict", body = VerifyResponse),
        (status = 400, description = "Missing or malformed fields", body = VerifyResponse),
        (status = 500, description = "Unexpected fault", body = VerifyResponse),
    ),
    tag = "verification"
)]
pub(crate) async fn verify(State(state): State<AppState>, body: Bytes) -> Response {
    let value: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "verification body is not valid JSON");
            return unknown_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };
    // A non-object body carries none of the fields.
    let raw = if value.is_object() {
        match serde_json::from_value::<RawAttestationRequest>(value) {
            Ok(raw) => raw,
            Err(e) => return unknown_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        }
    } else {
        RawAttestationRequest::default()
    };

    tracing::info!(
        attestation_id = present(&raw.attestation_id),
        proof = present(&raw.proof),
        public_signals = present(&raw.public_signals),
        user_context_data = present(&raw.user_context_data),
        "verification request received"
    );

    let result = match state.verifier.verify(&raw) {
        Ok(result) => result,
        Err(e) => return attestation_error(e),
    };

    if !result.is_valid {
        count("rejected");
        let mut response = VerifyResponse::error("VERIFICATION_FAILED");
        response.reason = Some("Verification failed".to_string());
        response.details = serde_json::to_value(&result.details).ok();
        return (StatusCode::OK, Json(response)).into_response();
    }

    let subject = result.subject_id.clone();
    if let Err(e) = state.registry.record(&subject, result.clone()) {
        tracing::error!(subject = %subject, error = %e, "verified result could not be recorded");
        count("error");
        return unknown_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "verification could not be recorded".to_string(),
        );
    }

    count("accepted");
    let mut credential = serde_json::to_value(&result.disclosed).unwrap_or_default();
    if let Some(map) = credential.as_object_mut() {
        map.insert("subjectId".to_string(), subject.as_str().into());
        map.insert("documentType".to_string(), result.document_type.to_string().into());
    }
    let response = VerifyResponse {
        status: "success".to_string(),
        result: true,
        message: Some("Identity verification successful".to_string()),
        credential_subject: Some(credential),
        timestamp: Some(Timestamp::now().to_iso8601()),
        reason: None,
        error_code: None,
        details: None,
    };
    (StatusCode::OK, Json(response)).into_response()
}

fn attestation_error(err: AttestationError) -> Response {
    if let AttestationError::MalformedRequest { missing } = &err {
        tracing::info!(missing = ?missing, "verification request missing fields");
        count("missing_fields");
        let mut response = VerifyResponse::error("MISSING_FIELDS");
        response.message = Some(REQUIRED_MESSAGE.to_string());
        response.details = Some(serde_json::json!({ "missing": missing }));
        return (StatusCode::BAD_REQUEST, Json(response)).into_response();
    }
    match err.class() {
        ErrorClass::Fatal => {
            tracing::error!(error = %err, "verification fault");
            count("error");
            unknown_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "verification could not be completed".to_string(),
            )
        }
        _ => {
            tracing::warn!(error = %err, "malformed attestation package");
            count("malformed");
            unknown_error(StatusCode::BAD_REQUEST, err.to_string())
        }
    }
}

fn unknown_error(status: StatusCode, reason: String) -> Response {
    let mut response = VerifyResponse::error("UNKNOWN_ERROR");
    response.reason = Some(reason);
    (status, Json(response)).into_response()
}

fn present(field: &Option<serde_json::Value>) -> &'static str {
    if field.is_some() {
        "present"
    } else {
        "missing"
    }
}

fn count(outcome: &'static str) {
    metrics::counter!("rosca_verifications_total", "outcome" => outcome).increment(1);
}
