use napi::Result as NapiResult;
use napi_derive::napi;
use serde::de::DeserializeOwned;
use serde::Serialize;

use personal_finance_core::comparison::{portfolio, rent_vs_buy, tax_harvesting};
use personal_finance_core::loans::emi;
use personal_finance_core::savings::{compound, recurring};
use personal_finance_core::PersonalFinanceResult;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parse the JSON input, run the kernel and serialise its envelope.
fn run_json<I, O>(
    input_json: &str,
    kernel: impl FnOnce(&I) -> PersonalFinanceResult<O>,
) -> NapiResult<String>
where
    I: DeserializeOwned,
    O: Serialize,
{
    let input: I = serde_json::from_str(input_json).map_err(to_napi_error)?;
    let output = kernel(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Loans
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_emi(input_json: String) -> NapiResult<String> {
    run_json(&input_json, emi::calculate_emi)
}

#[napi]
pub fn build_amortization(input_json: String) -> NapiResult<String> {
    run_json(&input_json, emi::build_amortization)
}

// ---------------------------------------------------------------------------
// Savings
// ---------------------------------------------------------------------------

#[napi]
pub fn project_lump_sum(input_json: String) -> NapiResult<String> {
    run_json(&input_json, compound::project_lump_sum)
}

#[napi]
pub fn project_recurring(input_json: String) -> NapiResult<String> {
    run_json(&input_json, recurring::project_recurring)
}

#[napi]
pub fn plan_goal(input_json: String) -> NapiResult<String> {
    run_json(&input_json, recurring::plan_goal)
}

// ---------------------------------------------------------------------------
// Comparisons
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_tax_harvest(input_json: String) -> NapiResult<String> {
    run_json(&input_json, tax_harvesting::analyze_tax_harvest)
}

#[napi]
pub fn compare_rent_vs_buy(input_json: String) -> NapiResult<String> {
    run_json(&input_json, rent_vs_buy::compare_rent_vs_buy)
}

#[napi]
pub fn analyze_portfolio(input_json: String) -> NapiResult<String> {
    run_json(&input_json, portfolio::analyze_portfolio)
}
