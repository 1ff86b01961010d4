//! # Circle Operations API
//!
//! Creation, admission, contributions, rotation, and cancellation of savings
//! circles, plus the read-only views. Every mutation goes through the ledger,
//! which serializes operations on the same circle.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use rosca_core::{Amount, CircleId, CountryCode, SubjectId, Timestamp};
use rosca_ledger::SettledPayout;
use rosca_state::{
    Circle, CirclePhase, CirclePolicyDraft, CircleSummary, PayoutOrdering, PayoutRecord,
    PhaseTransition,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, require_text, Validate};
use crate::state::AppState;

// -- Request DTOs -------------------------------------------------------------

/// Create circle request.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCircleRequest {
    /// Contribution per member per period, decimal with up to 6 fractional digits.
    pub monthly_amount: String,
    /// Member cap (2-100); the circle activates when reached.
    pub max_members: u32,
    /// Number of periods (1-60, at least `maxMembers`).
    pub duration_periods: u32,
    /// Required nationality, ISO 3166 alpha-3.
    pub country_code: String,
    /// Minimum age, inclusive (at least 18).
    pub min_age: u8,
    /// Maximum age, inclusive (at most 100).
    pub max_age: u8,
}

impl Validate for CreateCircleRequest {
    fn validate(&self) -> Result<(), String> {
        require_text("monthlyAmount", &self.monthly_amount)?;
        require_text("countryCode", &self.country_code)
    }
}

impl CreateCircleRequest {
    fn into_draft(self) -> Result<CirclePolicyDraft, AppError> {
        let monthly_amount = Amount::parse(self.monthly_amount.trim())
            .map_err(|e| AppError::Validation(format!("monthlyAmount: {e}")))?;
        Ok(CirclePolicyDraft {
            monthly_amount,
            max_members: self.max_members,
            duration_periods: self.duration_periods,
            country_code: CountryCode::new(&self.country_code)?,
            min_age: self.min_age,
            max_age: self.max_age,
        })
    }
}

/// Join request.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinCircleRequest {
    /// Verified subject asking to join.
    pub subject_id: String,
}

impl Validate for JoinCircleRequest {
    fn validate(&self) -> Result<(), String> {
        require_text("subjectId", &self.subject_id)
    }
}

/// Contribution request.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContributionRequest {
    /// Contributing member.
    pub subject_id: String,
    /// Period the contribution is for; must be the current period.
    pub period_index: u32,
}

impl Validate for ContributionRequest {
    fn validate(&self) -> Result<(), String> {
        require_text("subjectId", &self.subject_id)
    }
}

/// Cancellation request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CancelCircleRequest {
    /// Why the circle is being cancelled.
    pub reason: String,
}

impl Validate for CancelCircleRequest {
    fn validate(&self) -> Result<(), String> {
        require_text("reason", &self.reason)
    }
}

/// Circle listing filter.
#[derive(Debug, Deserialize)]
pub struct ListCirclesQuery {
    /// Only circles requiring this nationality.
    pub country: Option<String>,
}

/// Payout listing filter.
#[derive(Debug, Deserialize)]
pub struct ListPayoutsQuery {
    /// Only payouts of this circle.
    pub circle: Option<u64>,
}

// -- Response DTOs ------------------------------------------------------------

/// Full circle snapshot.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CircleResponse {
    #[schema(value_type = u64)]
    pub id: CircleId,
    #[schema(value_type = String)]
    pub monthly_amount: Amount,
    pub max_members: u32,
    pub duration_periods: u32,
    #[schema(value_type = String)]
    pub country_code: CountryCode,
    pub min_age: u8,
    pub max_age: u8,
    /// `join-order` or `seeded`.
    #[schema(value_type = String)]
    pub payout_ordering: PayoutOrdering,
    /// Members in join order.
    #[schema(value_type = Vec<String>)]
    pub members: Vec<SubjectId>,
    #[schema(value_type = Vec<String>)]
    pub contributions_this_period: Vec<SubjectId>,
    pub current_period_index: u32,
    /// Fixed at activation; empty while open.
    #[schema(value_type = Vec<String>)]
    pub payout_order: Vec<SubjectId>,
    #[schema(value_type = String)]
    pub phase: CirclePhase,
    #[schema(value_type = String)]
    pub created_at: Timestamp,
    #[schema(value_type = Vec<Object>)]
    pub transitions: Vec<PhaseTransition>,
    #[schema(value_type = Vec<Object>)]
    pub payouts: Vec<PayoutRecord>,
}

impl From<Circle> for CircleResponse {
    fn from(circle: Circle) -> Self {
        let policy = circle.policy();
        Self {
            id: circle.id(),
            monthly_amount: policy.monthly_amount(),
            max_members: policy.max_members(),
            duration_periods: policy.duration_periods(),
            country_code: policy.country_code().clone(),
            min_age: policy.min_age(),
            max_age: policy.max_age(),
            payout_ordering: circle.ordering(),
            members: circle.members().to_vec(),
            contributions_this_period: circle.contributions().iter().cloned().collect(),
            current_period_index: circle.current_period(),
            payout_order: circle.payout_order().to_vec(),
            phase: circle.phase(),
            created_at: circle.created_at(),
            transitions: circle.transitions().to_vec(),
            payouts: circle.payouts().to_vec(),
        }
    }
}

/// Compact circle view.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CircleSummaryResponse {
    #[schema(value_type = u64)]
    pub id: CircleId,
    #[schema(value_type = String)]
    pub monthly_amount: Amount,
    pub max_members: u32,
    pub current_members: usize,
    #[schema(value_type = String)]
    pub country_code: CountryCode,
    pub min_age: u8,
    pub max_age: u8,
    /// Neither completed nor cancelled.
    pub is_active: bool,
    #[schema(value_type = String)]
    pub phase: CirclePhase,
}

impl From<CircleSummary> for CircleSummaryResponse {
    fn from(s: CircleSummary) -> Self {
        Self {
            id: s.id,
            monthly_amount: s.monthly_amount,
            max_members: s.max_members,
            current_members: s.current_members,
            country_code: s.country_code,
            min_age: s.min_age,
            max_age: s.max_age,
            is_active: s.is_active,
            phase: s.phase,
        }
    }
}

/// A list of circle ids.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CircleIdsResponse {
    #[schema(value_type = Vec<u64>)]
    pub circle_ids: Vec<CircleId>,
}

/// Number of circles ever created.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CircleCountResponse {
    pub total: usize,
}

/// Outcome of a join.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinCircleResponse {
    #[schema(value_type = u64)]
    pub circle_id: CircleId,
    #[schema(value_type = String)]
    pub subject_id: SubjectId,
    /// Zero-based join position.
    pub position: usize,
    /// This join filled the circle.
    pub activated: bool,
}

/// Outcome of a contribution.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContributionResponse {
    #[schema(value_type = u64)]
    pub circle_id: CircleId,
    pub period_index: u32,
    /// Members yet to contribute this period.
    pub remaining: usize,
    /// This contribution completed the period.
    pub period_complete: bool,
}

/// A committed payout.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayoutResponse {
    #[schema(value_type = u64)]
    pub circle_id: CircleId,
    pub period_index: u32,
    #[schema(value_type = String)]
    pub recipient: SubjectId,
    #[schema(value_type = String)]
    pub amount: Amount,
    #[schema(value_type = String)]
    pub at: Timestamp,
}

/// A payout accepted by the settlement log.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettledPayoutResponse {
    #[schema(value_type = u64)]
    pub circle_id: CircleId,
    pub period_index: u32,
    #[schema(value_type = String)]
    pub recipient: SubjectId,
    #[schema(value_type = String)]
    pub amount: Amount,
    pub completes_circle: bool,
    #[schema(value_type = String)]
    pub settled_at: Timestamp,
}

impl From<SettledPayout> for SettledPayoutResponse {
    fn from(p: SettledPayout) -> Self {
        Self {
            circle_id: p.instruction.circle_id,
            period_index: p.instruction.period_index,
            recipient: p.instruction.recipient,
            amount: p.instruction.amount,
            completes_circle: p.instruction.completes_circle,
            settled_at: p.settled_at,
        }
    }
}

// -- Router -------------------------------------------------------------------

/// Build the circles router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/circles", post(create_circle).get(list_circles))
        .route("/v1/circles/count", get(count_circles))
        .route("/v1/circles/{id}", get(get_circle))
        .route("/v1/circles/{id}/summary", get(get_summary))
        .route("/v1/circles/{id}/join", post(join_circle))
        .route("/v1/circles/{id}/contributions", post(record_contribution))
        .route("/v1/circles/{id}/advance", post(advance_period))
        .route("/v1/circles/{id}/cancel", post(cancel_circle))
        .route("/v1/payouts", get(list_payouts))
}

// -- Handlers -----------------------------------------------------------------

/// POST /v1/circles — Create a circle.
#[utoipa::path(
    post,
    path = "/v1/circles",
    request_body = CreateCircleRequest,
    responses(
        (status = 201, description = "Circle created", body = CircleResponse),
        (status = 422, description = "Invalid policy", body = crate::error::ErrorBody),
    ),
    tag = "circles"
)]
pub(crate) async fn create_circle(
    State(state): State<AppState>,
    body: Result<Json<CreateCircleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CircleResponse>), AppError> {
    let draft = extract_validated_json(body)?.into_draft()?;
    let id = state.ledger.create_circle(draft)?;
    let circle = state.ledger.get_circle(id)?;
    Ok((StatusCode::CREATED, Json(circle.into())))
}

/// GET /v1/circles — List circle ids, optionally by country.
#[utoipa::path(
    get,
    path = "/v1/circles",
    params(("country" = Option<String>, Query, description = "ISO 3166 alpha-3 filter")),
    responses(
        (status = 200, description = "Circle ids in creation order", body = CircleIdsResponse),
        (status = 422, description = "Invalid country code", body = crate::error::ErrorBody),
    ),
    tag = "circles"
)]
pub(crate) async fn list_circles(
    State(state): State<AppState>,
    Query(query): Query<ListCirclesQuery>,
) -> Result<Json<CircleIdsResponse>, AppError> {
    let circle_ids = match query.country {
        Some(country) => state
            .ledger
            .list_circles_by_country(&CountryCode::new(&country)?),
        None => state.ledger.circle_ids(),
    };
    Ok(Json(CircleIdsResponse { circle_ids }))
}

/// GET /v1/circles/count — Number of circles created.
#[utoipa::path(
    get,
    path = "/v1/circles/count",
    responses((status = 200, description = "Circle count", body = CircleCountResponse)),
    tag = "circles"
)]
pub(crate) async fn count_circles(State(state): State<AppState>) -> Json<CircleCountResponse> {
    Json(CircleCountResponse {
        total: state.ledger.total_circles(),
    })
}

/// GET /v1/circles/{id} — Circle snapshot.
#[utoipa::path(
    get,
    path = "/v1/circles/{id}",
    params(("id" = u64, Path, description = "Circle id")),
    responses(
        (status = 200, description = "Circle found", body = CircleResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "circles"
)]
pub(crate) async fn get_circle(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<CircleResponse>, AppError> {
    let circle = state.ledger.get_circle(CircleId::new(id))?;
    Ok(Json(circle.into()))
}

/// GET /v1/circles/{id}/summary — Compact circle view.
#[utoipa::path(
    get,
    path = "/v1/circles/{id}/summary",
    params(("id" = u64, Path, description = "Circle id")),
    responses(
        (status = 200, description = "Circle summary", body = CircleSummaryResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "circles"
)]
pub(crate) async fn get_summary(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<CircleSummaryResponse>, AppError> {
    let summary = state.ledger.summary(CircleId::new(id))?;
    Ok(Json(summary.into()))
}

/// POST /v1/circles/{id}/join — Admit a verified, eligible subject.
#[utoipa::path(
    post,
    path = "/v1/circles/{id}/join",
    params(("id" = u64, Path, description = "Circle id")),
    request_body = JoinCircleRequest,
    responses(
        (status = 200, description = "Joined", body = JoinCircleResponse),
        (status = 403, description = "Subject not eligible", body = crate::error::ErrorBody),
        (status = 404, description = "Circle not found", body = crate::error::ErrorBody),
        (status = 409, description = "Circle not open or already a member", body = crate::error::ErrorBody),
    ),
    tag = "circles"
)]
pub(crate) async fn join_circle(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    body: Result<Json<JoinCircleRequest>, JsonRejection>,
) -> Result<Json<JoinCircleResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let subject = SubjectId::new(&req.subject_id)?;
    let circle_id = CircleId::new(id);
    let receipt = state.ledger.join_circle(circle_id, &subject)?;
    Ok(Json(JoinCircleResponse {
        circle_id,
        subject_id: subject,
        position: receipt.position,
        activated: receipt.activated,
    }))
}

/// POST /v1/circles/{id}/contributions — Record a member's contribution.
#[utoipa::path(
    post,
    path = "/v1/circles/{id}/contributions",
    params(("id" = u64, Path, description = "Circle id")),
    request_body = ContributionRequest,
    responses(
        (status = 200, description = "Contribution recorded", body = ContributionResponse),
        (status = 404, description = "Circle not found", body = crate::error::ErrorBody),
        (status = 409, description = "Wrong period, not a member, or duplicate", body = crate::error::ErrorBody),
    ),
    tag = "circles"
)]
pub(crate) async fn record_contribution(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    body: Result<Json<ContributionRequest>, JsonRejection>,
) -> Result<Json<ContributionResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let subject = SubjectId::new(&req.subject_id)?;
    let circle_id = CircleId::new(id);
    let receipt = state
        .ledger
        .record_contribution(circle_id, &subject, req.period_index)?;
    Ok(Json(ContributionResponse {
        circle_id,
        period_index: receipt.period_index,
        remaining: receipt.remaining,
        period_complete: receipt.period_complete,
    }))
}

/// POST /v1/circles/{id}/advance — Pay the current recipient and advance.
#[utoipa::path(
    post,
    path = "/v1/circles/{id}/advance",
    params(("id" = u64, Path, description = "Circle id")),
    responses(
        (status = 200, description = "Payout executed", body = PayoutResponse),
        (status = 404, description = "Circle not found", body = crate::error::ErrorBody),
        (status = 409, description = "Period not ready or settlement failed", body = crate::error::ErrorBody),
    ),
    tag = "circles"
)]
pub(crate) async fn advance_period(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<PayoutResponse>, AppError> {
    let circle_id = CircleId::new(id);
    let record = state.scheduler.advance_period(circle_id)?;
    Ok(Json(PayoutResponse {
        circle_id,
        period_index: record.period_index,
        recipient: record.recipient,
        amount: record.amount,
        at: record.at,
    }))
}

/// POST /v1/circles/{id}/cancel — Cancel a circle before any payout.
#[utoipa::path(
    post,
    path = "/v1/circles/{id}/cancel",
    params(("id" = u64, Path, description = "Circle id")),
    request_body = CancelCircleRequest,
    responses(
        (status = 200, description = "Circle cancelled", body = CircleResponse),
        (status = 404, description = "Circle not found", body = crate::error::ErrorBody),
        (status = 409, description = "Payouts already made or circle finished", body = crate::error::ErrorBody),
    ),
    tag = "circles"
)]
pub(crate) async fn cancel_circle(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    body: Result<Json<CancelCircleRequest>, JsonRejection>,
) -> Result<Json<CircleResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let circle_id = CircleId::new(id);
    state.ledger.cancel_circle(circle_id, req.reason.trim())?;
    let circle = state.ledger.get_circle(circle_id)?;
    Ok(Json(circle.into()))
}

/// GET /v1/payouts — Settled payouts, oldest first.
#[utoipa::path(
    get,
    path = "/v1/payouts",
    params(("circle" = Option<u64>, Query, description = "Circle id filter")),
    responses((status = 200, description = "Settled payouts", body = Vec<SettledPayoutResponse>)),
    tag = "circles"
)]
pub(crate) async fn list_payouts(
    State(state): State<AppState>,
    Query(query): Query<ListPayoutsQuery>,
) -> Json<Vec<SettledPayoutResponse>> {
    let entries = match query.circle {
        Some(id) => state.payouts.for_circle(CircleId::new(id)),
        None => state.payouts.entries(),
    };
    Json(entries.into_iter().map(Into::into).collect())
}
