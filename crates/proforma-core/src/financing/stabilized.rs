use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::coerce;
use crate::time_value;
use crate::types::{with_metadata, ComputationOutput, Money, Percent};

/// Debt coverage below which a lender covenant is at risk.
pub const DCR_WARNING_THRESHOLD: Decimal = dec!(1.20);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Inputs for the permanent (post-construction) loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StabilizedDebtInput {
    #[serde(default, deserialize_with = "coerce::de_amount")]
    pub construction_loan_amount: Money,
    /// Cash-out added on refinance
    #[serde(default, deserialize_with = "coerce::de_amount")]
    pub refinance_amount: Money,
    /// Annual rate in percent (6.5 = 6.5%)
    #[serde(default, deserialize_with = "coerce::de_amount")]
    pub annual_rate_pct: Percent,
    #[serde(default, deserialize_with = "coerce::de_month")]
    pub amortization_years: u32,
    /// Stabilized annual revenue
    #[serde(default, deserialize_with = "coerce::de_amount")]
    pub annual_revenue: Money,
    /// Selected annual operating expenses
    #[serde(default, deserialize_with = "coerce::de_amount")]
    pub annual_expenses: Money,
}

/// Debt service on one principal amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtService {
    pub principal: Money,
    pub monthly_payment: Money,
    pub annual_debt_service: Money,
    /// NOI / annual debt service; `None` without debt service
    pub dcr: Option<Decimal>,
    /// NOI - annual debt service
    pub available_cash: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilizedDebtAnalysis {
    pub noi: Money,
    pub refinance_amount: Money,
    /// Construction loan plus cash-out
    pub after_refinance: DebtService,
    /// Construction loan alone
    pub before_refinance: DebtService,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Level monthly payment for an annual percentage rate and a term in years.
pub fn monthly_debt_service(principal: Money, annual_rate_pct: Percent, term_years: u32) -> Money {
    time_value::level_payment(
        principal,
        time_value::monthly_rate_from_annual_pct(annual_rate_pct),
        term_years.saturating_mul(12),
    )
}

/// Debt coverage ratio, undefined when there is no debt service (or so
/// little that the ratio leaves `Decimal` range).
pub fn debt_coverage_ratio(noi: Money, annual_debt_service: Money) -> Option<Decimal> {
    noi.checked_div(annual_debt_service)
}

fn debt_service(principal: Money, noi: Money, input: &StabilizedDebtInput) -> DebtService {
    let monthly_payment = monthly_debt_service(principal, input.annual_rate_pct, input.amortization_years);
    let annual_debt_service = monthly_payment * dec!(12);
    DebtService {
        principal,
        monthly_payment,
        annual_debt_service,
        dcr: debt_coverage_ratio(noi, annual_debt_service),
        available_cash: noi - annual_debt_service,
    }
}

/// NOI, debt service and cash available before and after a cash-out refinance.
pub fn analyze_stabilized_debt(input: &StabilizedDebtInput) -> StabilizedDebtAnalysis {
    let noi = input.annual_revenue - input.annual_expenses;
    let refinanced = input.construction_loan_amount + input.refinance_amount;

    StabilizedDebtAnalysis {
        noi,
        refinance_amount: input.refinance_amount,
        after_refinance: debt_service(refinanced, noi, input),
        before_refinance: debt_service(input.construction_loan_amount, noi, input),
    }
}

/// Coverage warnings for an analysed loan.
pub fn coverage_warnings(analysis: &StabilizedDebtAnalysis) -> Vec<String> {
    let mut warnings = Vec::new();
    if analysis.noi < Decimal::ZERO {
        warnings.push("Stabilized NOI is negative — expenses exceed revenue".into());
    }
    if let Some(dcr) = analysis.after_refinance.dcr {
        if dcr < DCR_WARNING_THRESHOLD {
            warnings.push(format!(
                "DSCR of {dcr:.2}x after refinance is below 1.20x — lender covenant risk"
            ));
        }
    }
    if analysis.after_refinance.available_cash < Decimal::ZERO {
        warnings.push("Debt service after refinance exceeds NOI".into());
    }
    warnings
}

/// Analyse the stabilized loan and wrap it in the standard envelope.
pub fn calculate_stabilized_debt(
    input: &StabilizedDebtInput,
) -> ComputationOutput<StabilizedDebtAnalysis> {
    let start = Instant::now();
    let analysis = analyze_stabilized_debt(input);
    let warnings = coverage_warnings(&analysis);

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Stabilized Debt Service (level-payment amortisation) and Refinance",
        input,
        warnings,
        elapsed,
        analysis,
    )
}
