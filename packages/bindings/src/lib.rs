use napi::Result as NapiResult;
use napi_derive::napi;
use serde_json::Value;

use leasing_core::{
    build_quote, compute_payoff_for_terms, compute_rpmn, generate_schedule, payment_summary,
    solve_missing_detailed, LoanTerms, PayoffRequest, QuoteRequest, RpmnInput, SolveRequest,
};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Amortization
// ---------------------------------------------------------------------------

#[napi(js_name = "generateSchedule")]
pub fn generate_schedule_json(input_json: String) -> NapiResult<String> {
    let terms: LoanTerms = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let schedule = generate_schedule(&terms).map_err(to_napi_error)?;
    serde_json::to_string(&schedule).map_err(to_napi_error)
}

#[napi(js_name = "paymentSummary")]
pub fn payment_summary_json(input_json: String) -> NapiResult<String> {
    let terms: LoanTerms = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let summary = payment_summary(&terms).map_err(to_napi_error)?;
    serde_json::to_string(&summary).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Solvers
// ---------------------------------------------------------------------------

#[napi]
pub fn solve_missing(input_json: String) -> NapiResult<String> {
    let request: SolveRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let outcome =
        solve_missing_detailed(&request.terms, request.missing).map_err(to_napi_error)?;
    serde_json::to_string(&outcome).map_err(to_napi_error)
}

/// Accepts either contract terms or raw RPMN cash flows.
#[napi(js_name = "computeRpmn")]
pub fn compute_rpmn_json(input_json: String) -> NapiResult<String> {
    let value: Value = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let input = if value.get("scheduled_payment").is_some() {
        serde_json::from_value::<RpmnInput>(value).map_err(to_napi_error)?
    } else {
        let terms: LoanTerms = serde_json::from_value(value).map_err(to_napi_error)?;
        RpmnInput::from_terms(&terms).map_err(to_napi_error)?
    };
    let result = compute_rpmn(&input).map_err(to_napi_error)?;
    serde_json::to_string(&result).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Early repayment and quotes
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_payoff(input_json: String) -> NapiResult<String> {
    let request: PayoffRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let result = compute_payoff_for_terms(&request).map_err(to_napi_error)?;
    serde_json::to_string(&result).map_err(to_napi_error)
}

#[napi(js_name = "buildQuote")]
pub fn build_leasing_quote(input_json: String) -> NapiResult<String> {
    let request: QuoteRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = build_quote(&request).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
