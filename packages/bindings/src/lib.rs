use chrono::{DateTime, Utc};
use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use draw_servicing_core::assistant::aggregate;
use draw_servicing_core::assistant::{AssistantFunctionCatalog, ModelDecision};
use draw_servicing_core::ports::{
    DrawRiskRow, DrawStatusRow, InspectionRow, ProjectLoanRow, QuerySnapshot,
};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Risk
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RiskScoreRequest {
    #[serde(flatten)]
    input: draw_servicing_core::risk::draw_score::DrawRiskInput,
    #[serde(default)]
    policy: Option<draw_servicing_core::risk::draw_score::RiskPolicy>,
    #[serde(default)]
    as_of: Option<DateTime<Utc>>,
}

#[napi]
pub fn compute_risk_score(input_json: String) -> NapiResult<String> {
    let request: RiskScoreRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = draw_servicing_core::risk::draw_score::assess_draw_risk(
        &request.input,
        &request.policy.unwrap_or_default(),
        request.as_of.unwrap_or_else(Utc::now),
    );
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Amortization
// ---------------------------------------------------------------------------

#[napi]
pub fn generate_amortization_schedule(input_json: String) -> NapiResult<String> {
    let input: draw_servicing_core::amortization::schedule::LoanTerms =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = draw_servicing_core::amortization::schedule::build_amortization_schedule(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct ApplyPaymentRequest {
    outstanding_balance: draw_servicing_core::Money,
    monthly_rate: draw_servicing_core::Rate,
    payment_amount: draw_servicing_core::Money,
}

#[napi]
pub fn apply_payment(input_json: String) -> NapiResult<String> {
    let request: ApplyPaymentRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = draw_servicing_core::amortization::payment::build_payment_application(
        request.outstanding_balance,
        request.monthly_rate,
        request.payment_amount,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Assistant
// ---------------------------------------------------------------------------

/// Model-facing declarations of the standard catalog.
#[napi]
pub fn assistant_catalog() -> NapiResult<String> {
    let catalog = AssistantFunctionCatalog::standard();
    serde_json::to_string(&serde_json::json!({
        "version": catalog.version,
        "functions": catalog.to_tool_schema(),
    }))
    .map_err(to_napi_error)
}

#[derive(Deserialize)]
struct DispatchRequest {
    decision: ModelDecision,
    /// Rows the query port answers from.
    #[serde(default)]
    fixtures: QuerySnapshot,
    #[serde(default)]
    as_of: Option<DateTime<Utc>>,
}

/// Route a model decision through the standard catalog against the
/// supplied rows. Returns the tagged outcome (`direct_reply` or `dispatched`).
#[napi]
pub fn dispatch(input_json: String) -> NapiResult<String> {
    let request: DispatchRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let outcome = draw_servicing_core::assistant::dispatch_at(
        &request.decision,
        &AssistantFunctionCatalog::standard(),
        &request.fixtures,
        request.as_of.unwrap_or_else(Utc::now),
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&outcome).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct ProjectStatusRequest {
    #[serde(default)]
    loan: Option<ProjectLoanRow>,
    #[serde(default)]
    draws: Vec<DrawStatusRow>,
}

#[napi]
pub fn project_status_aggregate(input_json: String) -> NapiResult<String> {
    let request: ProjectStatusRequest =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = aggregate::project_status_aggregate(request.loan.as_ref(), &request.draws);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct ProjectRiskRequest {
    #[serde(default)]
    draws: Vec<DrawRiskRow>,
    #[serde(default)]
    inspections: Vec<InspectionRow>,
    #[serde(default)]
    as_of: Option<DateTime<Utc>>,
}

#[napi]
pub fn project_risk_aggregate(input_json: String) -> NapiResult<String> {
    let request: ProjectRiskRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = aggregate::project_risk_aggregate(
        &request.draws,
        &request.inspections,
        request.as_of.unwrap_or_else(Utc::now),
    );
    serde_json::to_string(&output).map_err(to_napi_error)
}
