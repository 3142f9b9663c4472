use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use proforma_core::financing::construction::{
    self, ConstructionLoanInput, LTC_WARNING_THRESHOLD,
};
use proforma_core::financing::stabilized::{self, StabilizedDebtInput};

use crate::input;

/// Arguments for construction loan sizing
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ConstructionLoanArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Land / building purchase price
    #[arg(long)]
    pub purchase_price: Option<Decimal>,

    /// Hard plus soft development costs
    #[arg(long)]
    pub development_costs: Option<Decimal>,

    /// Total partner equity
    #[arg(long)]
    pub gp_equity: Option<Decimal>,

    /// Construction-phase property tax over the build
    #[arg(long, default_value = "0")]
    pub construction_tax: Decimal,

    /// Annual construction rate in percent (7 = 7%)
    #[arg(long, default_value = "7")]
    pub rate: Decimal,

    /// Construction period in months
    #[arg(long, default_value_t = 24)]
    pub months: u32,
}

/// Arguments for permanent loan debt service
#[derive(Args)]
pub struct DebtServiceArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Construction loan being taken out
    #[arg(long)]
    pub construction_loan: Option<Decimal>,

    /// Cash-out added on refinance
    #[arg(long, default_value = "0")]
    pub refinance: Decimal,

    /// Annual rate in percent (6.5 = 6.5%)
    #[arg(long, default_value = "6.5")]
    pub rate: Decimal,

    /// Amortisation in years
    #[arg(long, default_value_t = 30)]
    pub years: u32,

    /// Stabilized annual revenue
    #[arg(long)]
    pub annual_revenue: Option<Decimal>,

    /// Annual operating expenses
    #[arg(long, default_value = "0")]
    pub annual_expenses: Decimal,
}

pub fn run_construction_loan(
    args: ConstructionLoanArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let loan_input: ConstructionLoanInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        ConstructionLoanInput {
            purchase_price: args
                .purchase_price
                .ok_or("--purchase-price is required (or provide --input)")?,
            development_costs: args
                .development_costs
                .ok_or("--development-costs is required (or provide --input)")?,
            gp_equity: args
                .gp_equity
                .ok_or("--gp-equity is required (or provide --input)")?,
            construction_period_tax: args.construction_tax,
            annual_rate_pct: args.rate,
            construction_period_months: args.months,
            ltc_warning_threshold: LTC_WARNING_THRESHOLD,
        }
    };
    let result = construction::calculate_construction_loan(&loan_input);
    Ok(serde_json::to_value(result)?)
}

pub fn run_debt_service(args: DebtServiceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let debt_input: StabilizedDebtInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        StabilizedDebtInput {
            construction_loan_amount: args
                .construction_loan
                .ok_or("--construction-loan is required (or provide --input)")?,
            refinance_amount: args.refinance,
            annual_rate_pct: args.rate,
            amortization_years: args.years,
            annual_revenue: args
                .annual_revenue
                .ok_or("--annual-revenue is required (or provide --input)")?,
            annual_expenses: args.annual_expenses,
        }
    };
    let result = stabilized::calculate_stabilized_debt(&debt_input);
    Ok(serde_json::to_value(result)?)
}
