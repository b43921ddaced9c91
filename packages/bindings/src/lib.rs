use napi::Result as NapiResult;
use napi_derive::napi;
use serde::{de::DeserializeOwned, Serialize};

use fin_suite_core::personal_finance::{budget, recurring, summary};
use fin_suite_core::ratios::analysis;
use fin_suite_core::time_value;
use fin_suite_core::valuation::{cost_of_capital, dcf, npv, payback};
use fin_suite_core::FinSuiteResult;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parse `input_json`, run `calculate`, and serialise the envelope back.
fn json_call<I, O>(
    input_json: &str,
    calculate: impl FnOnce(&I) -> FinSuiteResult<O>,
) -> NapiResult<String>
where
    I: DeserializeOwned,
    O: Serialize,
{
    let input: I = serde_json::from_str(input_json).map_err(to_napi_error)?;
    let output = calculate(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Time value and valuation
// ---------------------------------------------------------------------------

#[napi]
pub fn present_value(input_json: String) -> NapiResult<String> {
    json_call(&input_json, time_value::calculate_present_value)
}

#[napi]
pub fn npv_analysis(input_json: String) -> NapiResult<String> {
    json_call(&input_json, npv::calculate_npv)
}

#[napi]
pub fn payback_analysis(input_json: String) -> NapiResult<String> {
    json_call(&input_json, payback::calculate_payback)
}

#[napi]
pub fn cost_of_capital(input_json: String) -> NapiResult<String> {
    json_call(&input_json, cost_of_capital::calculate_cost_of_capital)
}

#[napi]
pub fn dcf_projection(input_json: String) -> NapiResult<String> {
    json_call(&input_json, dcf::calculate_dcf)
}

// ---------------------------------------------------------------------------
// Ratios
// ---------------------------------------------------------------------------

#[napi]
pub fn financial_ratios(input_json: String) -> NapiResult<String> {
    json_call(&input_json, analysis::calculate_ratios)
}

// ---------------------------------------------------------------------------
// Personal finance
// ---------------------------------------------------------------------------

#[napi]
pub fn expand_recurring(input_json: String) -> NapiResult<String> {
    json_call(&input_json, recurring::calculate_recurring)
}

#[napi]
pub fn transaction_summary(input_json: String) -> NapiResult<String> {
    json_call(&input_json, summary::calculate_summary)
}

#[napi]
pub fn budget_progress(input_json: String) -> NapiResult<String> {
    json_call(&input_json, budget::calculate_budget)
}
