use clap::Args;
use serde_json::Value;

use proforma_core::proforma::{self, ProFormaInput};
use proforma_core::scenarios::{self, ScenarioSurfaceInput};
use proforma_core::Scenario;

use crate::input;

/// Arguments for the full pro-forma
#[derive(Args)]
pub struct ProFormaArgs {
    /// Path to a JSON or YAML project file
    #[arg(long)]
    pub input: Option<String>,

    /// Force every row to one scenario (wc, default, bc)
    #[arg(long, value_parser = parse_scenario)]
    pub scenario: Option<Scenario>,

    /// Projection horizon in months
    #[arg(long)]
    pub horizon: Option<u32>,
}

/// Arguments for the WC / base / BC surface
#[derive(Args)]
pub struct ScenariosArgs {
    /// Path to a JSON or YAML project file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_pro_forma(args: ProFormaArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut pf_input: ProFormaInput = input::load(args.input.as_deref(), "the pro-forma")?;
    if let Some(scenario) = args.scenario {
        pf_input.overrides.scenario = Some(scenario);
    }
    if let Some(horizon) = args.horizon {
        pf_input.assumptions.horizon_months = horizon;
    }
    let result = proforma::build_pro_forma(&pf_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_scenarios(args: ScenariosArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let surface_input: ScenarioSurfaceInput =
        input::load(args.input.as_deref(), "the scenario surface")?;
    let result = scenarios::calculate_scenario_surface(&surface_input);
    Ok(serde_json::to_value(result)?)
}

fn parse_scenario(raw: &str) -> Result<Scenario, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "wc" | "worst" => Ok(Scenario::Wc),
        "default" | "base" => Ok(Scenario::Default),
        "bc" | "best" => Ok(Scenario::Bc),
        other => Err(format!("unknown scenario '{other}' (expected wc, default or bc)")),
    }
}
