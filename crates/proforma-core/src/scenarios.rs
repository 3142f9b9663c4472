use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::assumptions::FinancingAssumptions;
use crate::coerce;
use crate::project::{ProjectDetail, ScenarioOverrides};
use crate::proforma::stabilized_stage;
use crate::types::{with_metadata, ComputationOutput, Money, Rate, Scenario};

/// Stabilized underwriting with every line forced to one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub scenario: Scenario,
    pub label: String,
    pub monthly_revenue: Money,
    pub annual_revenue: Money,
    pub annual_expenses: Money,
    pub noi: Money,
    pub development_costs: Money,
    pub total_project_cost: Money,
    pub construction_loan_amount: Money,
    /// On the refinanced loan
    pub annual_debt_service: Money,
    pub dcr: Option<Decimal>,
    pub yield_on_cost: Option<Rate>,
    pub available_cash_after_refi: Money,
}

/// Input for the scenario surface on its own.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioSurfaceInput {
    pub project: ProjectDetail,
    #[serde(default, deserialize_with = "coerce::de_or_default")]
    pub assumptions: FinancingAssumptions,
    #[serde(default, deserialize_with = "coerce::de_or_default")]
    pub overrides: ScenarioOverrides,
}

/// Worst case, base and best case side by side.
///
/// Each pass keeps the caller's WC/BC values but ignores their per-row
/// selections, so rows without an override price at base in every column.
pub fn scenario_surface(
    project: &ProjectDetail,
    assumptions: &FinancingAssumptions,
    overrides: &ScenarioOverrides,
) -> Vec<ScenarioSummary> {
    Scenario::ALL
        .iter()
        .map(|scenario| {
            let stage = stabilized_stage(project, assumptions, &overrides.forcing(*scenario));
            let refinanced = &stage.stabilized.after_refinance;
            ScenarioSummary {
                scenario: *scenario,
                label: scenario.label().to_string(),
                monthly_revenue: stage.revenue.total_monthly,
                annual_revenue: stage.revenue.total_annual,
                annual_expenses: stage.carrying.operating_annual,
                noi: stage.stabilized.noi,
                development_costs: stage.development.development_costs,
                total_project_cost: stage.development.total_project_cost,
                construction_loan_amount: stage.construction_loan.construction_loan_amount,
                annual_debt_service: refinanced.annual_debt_service,
                dcr: refinanced.dcr,
                yield_on_cost: stage.yield_on_cost(),
                available_cash_after_refi: refinanced.available_cash,
            }
        })
        .collect()
}

pub fn calculate_scenario_surface(
    input: &ScenarioSurfaceInput,
) -> ComputationOutput<Vec<ScenarioSummary>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    let surface = scenario_surface(&input.project, &input.assumptions, &input.overrides);
    if let (Some(wc), Some(bc)) = (surface.first(), surface.last()) {
        if wc.noi > bc.noi {
            warnings.push(format!(
                "Worst-case NOI ({}) exceeds best-case NOI ({}); check WC/BC overrides",
                wc.noi.round_dp(2),
                bc.noi.round_dp(2)
            ));
        }
    }

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Scenario Surface (WC / base / BC stabilized underwriting)",
        &input.assumptions,
        warnings,
        elapsed,
        surface,
    )
}
