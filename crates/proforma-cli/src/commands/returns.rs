use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use proforma_core::returns::exit::{self, ExitSensitivityInput};
use proforma_core::returns::waterfall::{self, WaterfallInput};

use crate::input;

/// Arguments for the exit cap-rate table
#[derive(Args)]
pub struct ExitTableArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Stabilized annual NOI
    #[arg(long)]
    pub noi: Option<Decimal>,

    /// Selling costs in percent of sale price
    #[arg(long, default_value = "5")]
    pub sales_cost_pct: Decimal,

    /// Construction loan repaid from the sale
    #[arg(long, default_value = "0")]
    pub construction_loan: Decimal,

    /// Partner equity returned from the sale
    #[arg(long, default_value = "0")]
    pub gp_equity: Decimal,

    /// Comma-separated cap rates in percent (defaults to 7.5 down to 5)
    #[arg(long, value_delimiter = ',')]
    pub cap_rates: Vec<Decimal>,
}

/// Arguments for the refinance waterfall
#[derive(Args)]
pub struct WaterfallArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_exit_table(args: ExitTableArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let exit_input: ExitSensitivityInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        ExitSensitivityInput {
            noi: args.noi.ok_or("--noi is required (or provide --input)")?,
            sales_cost_pct: args.sales_cost_pct,
            construction_loan_amount: args.construction_loan,
            gp_equity: args.gp_equity,
            cap_rates: if args.cap_rates.is_empty() {
                exit::default_exit_cap_rates()
            } else {
                args.cap_rates
            },
        }
    };
    let result = exit::calculate_exit_sensitivity(&exit_input);
    Ok(serde_json::to_value(result)?)
}

pub fn run_waterfall(args: WaterfallArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let wf_input: WaterfallInput = input::load(args.input.as_deref(), "the refinance waterfall")?;
    let result = waterfall::calculate_refinance_waterfall(&wf_input);
    Ok(serde_json::to_value(result)?)
}
