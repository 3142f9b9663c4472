use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use proforma_core::expenses::carrying::{self, CarryingInput};
use proforma_core::proforma::ProFormaInput;
use proforma_core::revenue::{self, ramp::{self, RampInput}};
use proforma_core::DEFAULT_HORIZON_MONTHS;

use crate::input;

/// Arguments for rent-roll pricing
#[derive(Args)]
pub struct RevenueArgs {
    /// Path to a JSON or YAML project file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a single lease-up ramp
#[derive(Args)]
pub struct RampArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Stabilized monthly revenue
    #[arg(long)]
    pub monthly: Option<Decimal>,

    /// First month the row can earn
    #[arg(long, default_value_t = 0)]
    pub start_month: u32,

    /// Leasing-start month offset
    #[arg(long)]
    pub leasing_start: Option<u32>,

    /// Stabilization month offset
    #[arg(long)]
    pub stabilized: Option<u32>,

    /// Months to project
    #[arg(long, default_value_t = DEFAULT_HORIZON_MONTHS)]
    pub horizon: u32,
}

/// Arguments for carrying-cost layout
#[derive(Args)]
pub struct CarryingArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_revenue(args: RevenueArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let pf_input: ProFormaInput = input::load(args.input.as_deref(), "revenue")?;
    let result = revenue::calculate_revenue(&pf_input.project, &pf_input.overrides);
    Ok(serde_json::to_value(result)?)
}

pub fn run_ramp(args: RampArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let ramp_input: RampInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        RampInput {
            stabilized_monthly: args
                .monthly
                .ok_or("--monthly is required (or provide --input)")?,
            start_month: args.start_month,
            leasing_start: args.leasing_start,
            stabilized_offset: args.stabilized,
            horizon_months: args.horizon,
        }
    };
    let result = ramp::calculate_ramp(&ramp_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_carrying(args: CarryingArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let carrying_input: CarryingInput = input::load(args.input.as_deref(), "carrying costs")?;
    let result = carrying::calculate_carrying_costs(&carrying_input)?;
    Ok(serde_json::to_value(result)?)
}
