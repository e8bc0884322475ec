use napi::Result as NapiResult;
use napi_derive::napi;

use pv_finance_core::solar::{self, PlantEvaluationInput, PricingAppraisalInput, PricingCeilingInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Schedule and evaluation
// ---------------------------------------------------------------------------

/// `{ plant, config? }` in, the bare cash-flow schedule out.
#[napi]
pub fn simulate_cash_flows(input_json: String) -> NapiResult<String> {
    let input: PlantEvaluationInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let schedule = solar::simulate(&input.plant, &input.config).map_err(to_napi_error)?;
    serde_json::to_string(&schedule).map_err(to_napi_error)
}

#[napi]
pub fn evaluate_plant(input_json: String) -> NapiResult<String> {
    let input: PlantEvaluationInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = solar::evaluate_plant(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Pricing
// ---------------------------------------------------------------------------

#[napi]
pub fn pricing_ceiling(input_json: String) -> NapiResult<String> {
    let input: PricingCeilingInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = solar::pricing_ceiling(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn appraise_pricing_ceiling(input_json: String) -> NapiResult<String> {
    let input: PricingAppraisalInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = solar::appraise_pricing_ceiling(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Scheme comparison
// ---------------------------------------------------------------------------

#[napi]
pub fn compare_schemes(input_json: String) -> NapiResult<String> {
    let input: solar::portfolio::PortfolioInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = solar::portfolio::compare_schemes(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
