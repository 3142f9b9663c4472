use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Instant;

use crate::coerce;
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Rate};

/// Loan-to-cost above which a sizing is flagged.
pub const LTC_WARNING_THRESHOLD: Rate = dec!(0.75);

fn default_ltc_threshold() -> Rate {
    LTC_WARNING_THRESHOLD
}

/// Threshold field: blank falls back to the standard threshold.
pub fn de_ltc_threshold<'de, D: Deserializer<'de>>(d: D) -> Result<Rate, D::Error> {
    Ok(coerce::opt_amount(&serde_json::Value::deserialize(d)?).unwrap_or(LTC_WARNING_THRESHOLD))
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Inputs for sizing the construction loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructionLoanInput {
    #[serde(default, deserialize_with = "coerce::de_amount")]
    pub purchase_price: Money,
    /// Hard plus soft costs
    #[serde(default, deserialize_with = "coerce::de_amount")]
    pub development_costs: Money,
    /// Total partner equity
    #[serde(default, deserialize_with = "coerce::de_amount")]
    pub gp_equity: Money,
    /// Construction-phase property tax accrued over the build
    #[serde(default, deserialize_with = "coerce::de_amount")]
    pub construction_period_tax: Money,
    /// Annual construction interest rate in percent (6 = 6%)
    #[serde(default, deserialize_with = "coerce::de_amount")]
    pub annual_rate_pct: Percent,
    #[serde(default, deserialize_with = "coerce::de_month")]
    pub construction_period_months: u32,
    #[serde(default = "default_ltc_threshold", deserialize_with = "de_ltc_threshold")]
    pub ltc_warning_threshold: Rate,
}

/// Sized construction loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionLoan {
    /// Purchase + development - equity + construction tax
    pub loan_base: Money,
    /// Simple interest over the construction window
    pub interest_accrued: Money,
    /// Loan base plus capitalised interest, floored at zero
    pub construction_loan_amount: Money,
    /// Loan / (loan + equity)
    pub loan_to_cost_ratio: Rate,
    pub exceeds_ltc_threshold: bool,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Size the construction loan with capitalised simple interest.
///
/// The loan is never negative; loan-to-cost is zero when loan and equity
/// are both zero.
pub fn size_construction_loan(input: &ConstructionLoanInput) -> ConstructionLoan {
    let loan_base = input.purchase_price + input.development_costs - input.gp_equity
        + input.construction_period_tax;

    let interest_accrued = accrued_interest(
        loan_base,
        input.annual_rate_pct,
        input.construction_period_months,
    )
    .unwrap_or(Decimal::ZERO);

    let construction_loan_amount = (loan_base + interest_accrued).max(Decimal::ZERO);

    let denominator = construction_loan_amount + input.gp_equity;
    let loan_to_cost_ratio = if denominator.is_zero() {
        Decimal::ZERO
    } else {
        construction_loan_amount / denominator
    };

    ConstructionLoan {
        loan_base,
        interest_accrued,
        construction_loan_amount,
        loan_to_cost_ratio,
        exceeds_ltc_threshold: loan_to_cost_ratio > input.ltc_warning_threshold,
    }
}

/// Simple interest on `loan_base` over the construction window; `None`
/// when it exceeds `Decimal` range.
pub fn accrued_interest(loan_base: Money, annual_rate_pct: Percent, months: u32) -> Option<Money> {
    loan_base
        .checked_mul(annual_rate_pct / dec!(100))?
        .checked_mul(Decimal::from(months) / dec!(12))
}

/// Flag a loan-to-cost above the threshold. Never an error.
pub fn ltc_warning(loan: &ConstructionLoan, threshold: Rate) -> Option<String> {
    loan.exceeds_ltc_threshold.then(|| {
        format!(
            "Loan-to-cost of {:.1}% exceeds {:.0}% — equity may be insufficient for lenders",
            loan.loan_to_cost_ratio * dec!(100),
            threshold * dec!(100)
        )
    })
}

/// Size the construction loan and wrap it in the standard envelope.
pub fn calculate_construction_loan(
    input: &ConstructionLoanInput,
) -> ComputationOutput<ConstructionLoan> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let loan = size_construction_loan(input);
    warnings.extend(ltc_warning(&loan, input.ltc_warning_threshold));
    if loan.loan_base < Decimal::ZERO {
        warnings.push("Equity exceeds total cost — no construction debt required".into());
    }
    if accrued_interest(loan.loan_base, input.annual_rate_pct, input.construction_period_months)
        .is_none()
    {
        warnings.push("Construction interest overflows; no interest capitalised".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Construction Loan Sizing (capitalised simple interest)",
        input,
        warnings,
        elapsed,
        loan,
    )
}
