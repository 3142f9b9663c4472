use napi::Result as NapiResult;
use napi_derive::napi;

use proforma_core::financing::construction::{self, ConstructionLoanInput};
use proforma_core::financing::stabilized::{self, StabilizedDebtInput};
use proforma_core::proforma::{self, ProFormaInput};
use proforma_core::returns::exit::{self, ExitSensitivityInput};
use proforma_core::returns::waterfall::{self, WaterfallInput};
use proforma_core::revenue::ramp::{self, RampInput};
use proforma_core::scenarios::{self, ScenarioSurfaceInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Pro-forma
// ---------------------------------------------------------------------------

#[napi]
pub fn build_pro_forma(input_json: String) -> NapiResult<String> {
    let input: ProFormaInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = proforma::build_pro_forma(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn scenario_surface(input_json: String) -> NapiResult<String> {
    let input: ScenarioSurfaceInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = scenarios::calculate_scenario_surface(&input);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn revenue_ramp(input_json: String) -> NapiResult<String> {
    let input: RampInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = ramp::calculate_ramp(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Financing
// ---------------------------------------------------------------------------

#[napi]
pub fn construction_loan(input_json: String) -> NapiResult<String> {
    let input: ConstructionLoanInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = construction::calculate_construction_loan(&input);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn stabilized_debt(input_json: String) -> NapiResult<String> {
    let input: StabilizedDebtInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = stabilized::calculate_stabilized_debt(&input);
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Returns
// ---------------------------------------------------------------------------

#[napi]
pub fn exit_table(input_json: String) -> NapiResult<String> {
    let input: ExitSensitivityInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = exit::calculate_exit_sensitivity(&input);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn refinance_waterfall(input_json: String) -> NapiResult<String> {
    let input: WaterfallInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = waterfall::calculate_refinance_waterfall(&input);
    serde_json::to_string(&output).map_err(to_napi_error)
}
