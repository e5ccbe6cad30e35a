use napi::Result as NapiResult;
use napi_derive::napi;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parse a JSON request, run a computation and serialise its envelope.
fn call_json<I, O, E>(input_json: &str, f: impl FnOnce(&I) -> Result<O, E>) -> NapiResult<String>
where
    I: DeserializeOwned,
    O: Serialize,
    E: std::fmt::Display,
{
    let input: I = serde_json::from_str(input_json).map_err(to_napi_error)?;
    let output = f(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Proforma
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_proforma(input_json: String) -> NapiResult<String> {
    call_json(&input_json, proforma_core::proforma::run_proforma)
}

#[napi]
pub fn financing_cost(input_json: String) -> NapiResult<String> {
    call_json(&input_json, proforma_core::proforma::financing::run_financing)
}

// ---------------------------------------------------------------------------
// Absorption
// ---------------------------------------------------------------------------

#[napi]
pub fn absorption_schedule(input_json: String) -> NapiResult<String> {
    call_json(&input_json, proforma_core::absorption::run_absorption)
}

#[napi]
pub fn burn_schedule(input_json: String) -> NapiResult<String> {
    call_json(&input_json, proforma_core::burn_schedule::run_burn_schedule)
}

// ---------------------------------------------------------------------------
// Cash flows
// ---------------------------------------------------------------------------

#[napi]
pub fn monthly_irr(input_json: String) -> NapiResult<String> {
    call_json(&input_json, proforma_core::cash_flow::run_irr)
}

#[napi]
pub fn peak_capital(input_json: String) -> NapiResult<String> {
    call_json(&input_json, proforma_core::cash_flow::run_peak_capital)
}

#[napi]
pub fn analyze_timeline(input_json: String) -> NapiResult<String> {
    call_json(&input_json, proforma_core::timeline::run_timeline)
}
