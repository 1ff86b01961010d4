//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "ROSCA API",
        version = "0.1.0",
        description = "Savings circles gated by privacy-preserving identity verification: attestation submission, circle lifecycle, and user eligibility.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        // Verification
        crate::routes::verify::verify,
        // Circles
        crate::routes::circles::create_circle,
        crate::routes::circles::list_circles,
        crate::routes::circles::count_circles,
        crate::routes::circles::get_circle,
        crate::routes::circles::get_summary,
        crate::routes::circles::join_circle,
        crate::routes::circles::record_contribution,
        crate::routes::circles::advance_period,
        crate::routes::circles::cancel_circle,
        crate::routes::circles::list_payouts,
        // Users
        crate::routes::users::user_circles,
        crate::routes::users::is_verified,
        crate::routes::users::verification_details,
        crate::routes::users::eligibility,
    ),
    components(schemas(
        // Error types
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        // Verification DTOs
        crate::routes::verify::VerifyRequest,
        crate::routes::verify::VerifyResponse,
        // Circle DTOs
        crate::routes::circles::CreateCircleRequest,
        crate::routes::circles::JoinCircleRequest,
        crate::routes::circles::ContributionRequest,
        crate::routes::circles::CancelCircleRequest,
        crate::routes::circles::CircleResponse,
        crate::routes::circles::CircleSummaryResponse,
        crate::routes::circles::CircleIdsResponse,
        crate::routes::circles::CircleCountResponse,
        crate::routes::circles::JoinCircleResponse,
        crate::routes::circles::ContributionResponse,
        crate::routes::circles::PayoutResponse,
        crate::routes::circles::SettledPayoutResponse,
        // User DTOs
        crate::routes::users::UserCirclesResponse,
        crate::routes::users::UserVerifiedResponse,
        crate::routes::users::VerificationDetailsResponse,
        crate::routes::users::EligibilityResponse,
    )),
    tags(
        (name = "verification", description = "Attestation submission boundary"),
        (name = "circles", description = "Circle lifecycle and payouts"),
        (name = "users", description = "Verification status and eligibility by subject"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json — Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
