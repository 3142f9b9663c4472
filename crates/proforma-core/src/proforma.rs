use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::assumptions::FinancingAssumptions;
use crate::coerce;
use crate::calendar::{self, LeaseUpOffsets};
use crate::expenses::carrying::{self, CarryingSummary};
use crate::expenses::development::{self, DevelopmentBudget};
use crate::financing::construction::{self, ConstructionLoan, ConstructionLoanInput};
use crate::financing::stabilized::{self, StabilizedDebtAnalysis, StabilizedDebtInput};
use crate::project::{ProjectDetail, ScenarioOverrides};
use crate::projection::{self, CashFlowProjection, ProjectionFinancing};
use crate::returns::exit::{self, ExitScenarioRow, ExitSensitivityInput};
use crate::returns::waterfall::{self, RefinanceWaterfall, WaterfallInput};
use crate::revenue::{self, RevenueSummary};
use crate::scenarios::{self, ScenarioSummary};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::ProFormaResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Everything needed to build a pro-forma.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProFormaInput {
    pub project: ProjectDetail,
    #[serde(default, deserialize_with = "coerce::de_or_default")]
    pub assumptions: FinancingAssumptions,
    #[serde(default, deserialize_with = "coerce::de_or_default")]
    pub overrides: ScenarioOverrides,
}

/// Headline returns of the deal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentMetrics {
    pub annual_revenue: Money,
    pub annual_expenses: Money,
    pub noi: Money,
    /// NOI / total project cost
    pub yield_on_cost: Option<Rate>,
    /// DCR on the refinanced loan
    pub dcr: Option<Decimal>,
    pub loan_to_cost: Rate,
    pub total_project_cost: Money,
    pub total_equity: Money,
    pub equity_irr: Option<Rate>,
    pub equity_multiple: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProFormaOutput {
    pub lease_up: LeaseUpOffsets,
    pub revenue: RevenueSummary,
    pub carrying: CarryingSummary,
    pub development: DevelopmentBudget,
    pub construction_period_tax: Money,
    pub construction_loan: ConstructionLoan,
    pub stabilized: StabilizedDebtAnalysis,
    pub metrics: InvestmentMetrics,
    pub projection: CashFlowProjection,
    pub scenarios: Vec<ScenarioSummary>,
    pub exit_table: Vec<ExitScenarioRow>,
    pub waterfall: RefinanceWaterfall,
}

/// Stabilized figures for one set of overrides, before any monthly layout.
#[derive(Debug, Clone)]
pub(crate) struct StabilizedStage {
    pub revenue: RevenueSummary,
    pub carrying: CarryingSummary,
    pub development: DevelopmentBudget,
    pub construction_period_tax: Money,
    pub total_equity: Money,
    pub construction_loan: ConstructionLoan,
    pub stabilized: StabilizedDebtAnalysis,
}

impl StabilizedStage {
    pub fn yield_on_cost(&self) -> Option<Rate> {
        let cost = self.development.total_project_cost;
        (!cost.is_zero()).then(|| self.stabilized.noi / cost)
    }
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Revenue, expenses, budget and both loans for one set of overrides.
pub(crate) fn stabilized_stage(
    project: &ProjectDetail,
    assumptions: &FinancingAssumptions,
    overrides: &ScenarioOverrides,
) -> StabilizedStage {
    let revenue = revenue::summarize_revenue(project, overrides);
    let carrying = carrying::summarize_carrying_costs(&project.carrying_costs, overrides);
    let development = development::development_budget(project, overrides);
    let construction_period_tax =
        carrying::construction_period_tax(&carrying, assumptions.construction_period_months);
    let total_equity = project.total_equity();

    let construction_loan = construction::size_construction_loan(&ConstructionLoanInput {
        purchase_price: development.purchase_price,
        development_costs: development.development_costs,
        gp_equity: total_equity,
        construction_period_tax,
        annual_rate_pct: assumptions.construction_rate_pct,
        construction_period_months: assumptions.construction_period_months,
        ltc_warning_threshold: assumptions.ltc_warning_threshold,
    });

    let stabilized = stabilized::analyze_stabilized_debt(&StabilizedDebtInput {
        construction_loan_amount: construction_loan.construction_loan_amount,
        refinance_amount: assumptions.refinance_amount,
        annual_rate_pct: assumptions.stabilized_rate_pct,
        amortization_years: assumptions.amortization_years,
        annual_revenue: revenue.total_annual,
        annual_expenses: carrying.operating_annual,
    });

    StabilizedStage {
        revenue,
        carrying,
        development,
        construction_period_tax,
        total_equity,
        construction_loan,
        stabilized,
    }
}

/// Build the full pro-forma: stabilized metrics, monthly projection,
/// scenario surface, exit table and refinance waterfall.
///
/// Only an unusable horizon is an error; every business-level problem is
/// reported as a warning on the envelope.
pub fn build_pro_forma(input: &ProFormaInput) -> ProFormaResult<ComputationOutput<ProFormaOutput>> {
    let start = Instant::now();
    let assumptions = &input.assumptions;
    assumptions.validate()?;

    let project = &input.project;
    let horizon = assumptions.horizon_months;
    let mut warnings: Vec<String> = Vec::new();

    let lease_up = project.lease_up(&mut warnings);
    // a bad closing date was already reported by lease_up
    let closing = project.closing_date(&mut Vec::new());
    let stage = stabilized_stage(project, assumptions, &input.overrides);
    debug!(
        monthly_revenue = %stage.revenue.total_monthly,
        operating_annual = %stage.carrying.operating_annual,
        development_costs = %stage.development.development_costs,
        "stabilized stage priced"
    );

    warnings.extend(construction::ltc_warning(
        &stage.construction_loan,
        assumptions.ltc_warning_threshold,
    ));
    warnings.extend(stabilized::coverage_warnings(&stage.stabilized));
    debug!(
        loan = %stage.construction_loan.construction_loan_amount,
        noi = %stage.stabilized.noi,
        "financing sized"
    );

    // Monthly layout
    let revenue_series = revenue::ramp_revenue(&stage.revenue, &lease_up, horizon);
    let carrying_series = carrying::carrying_monthly_series(
        &stage.carrying,
        assumptions.construction_period_months,
        horizon,
    );
    if assumptions.construction_period_months >= horizon {
        warnings.push(format!(
            "Construction period of {} months covers the whole {horizon}-month horizon",
            assumptions.construction_period_months
        ));
    }
    let projection = projection::build_cash_flow_projection(
        calendar::cashflow_months(closing, horizon),
        &revenue_series,
        &carrying_series,
        &ProjectionFinancing {
            construction_months: assumptions.construction_period_months,
            construction_loan_amount: stage.construction_loan.construction_loan_amount,
            permanent_principal: stage.stabilized.after_refinance.principal,
            refinance_amount: assumptions.refinance_amount,
            stabilized_rate_pct: assumptions.stabilized_rate_pct,
            amortization_years: assumptions.amortization_years,
            terminal_cap_rate_pct: assumptions.terminal_cap_rate_pct,
            sales_cost_pct: assumptions.sales_cost_pct,
        },
        &project.gp_contributions,
        &mut warnings,
    );
    debug!(months = projection.months.len(), "cash flow projected");

    let scenarios = scenarios::scenario_surface(project, assumptions, &input.overrides);

    let exit_table = exit::exit_sensitivity(&ExitSensitivityInput {
        noi: stage.stabilized.noi,
        sales_cost_pct: assumptions.sales_cost_pct,
        construction_loan_amount: stage.construction_loan.construction_loan_amount,
        gp_equity: stage.total_equity,
        cap_rates: assumptions.exit_cap_rates.clone(),
    });

    let waterfall = waterfall::refinance_waterfall(&WaterfallInput {
        contributions: project.gp_contributions.clone(),
        refinance_amount: assumptions.refinance_amount,
        available_cash_before_refi: stage.stabilized.before_refinance.available_cash,
        available_cash_after_refi: stage.stabilized.after_refinance.available_cash,
    });
    warnings.extend(waterfall::holding_warnings(&waterfall));

    let metrics = InvestmentMetrics {
        annual_revenue: stage.revenue.total_annual,
        annual_expenses: stage.carrying.operating_annual,
        noi: stage.stabilized.noi,
        yield_on_cost: stage.yield_on_cost(),
        dcr: stage.stabilized.after_refinance.dcr,
        loan_to_cost: stage.construction_loan.loan_to_cost_ratio,
        total_project_cost: stage.development.total_project_cost,
        total_equity: stage.total_equity,
        equity_irr: projection.equity_irr,
        equity_multiple: projection.equity_multiple,
    };

    for w in &warnings {
        warn!("{w}");
    }

    let output = ProFormaOutput {
        lease_up,
        revenue: stage.revenue,
        carrying: stage.carrying,
        development: stage.development,
        construction_period_tax: stage.construction_period_tax,
        construction_loan: stage.construction_loan,
        stabilized: stage.stabilized,
        metrics,
        projection,
        scenarios,
        exit_table,
        waterfall,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Development Pro-Forma (scenario-selected stabilized underwriting)",
        &serde_json::json!({
            "horizon_months": horizon,
            "construction_period_months": assumptions.construction_period_months,
            "construction_rate_pct": assumptions.construction_rate_pct.to_string(),
            "stabilized_rate_pct": assumptions.stabilized_rate_pct.to_string(),
            "amortization_years": assumptions.amortization_years,
            "refinance_amount": assumptions.refinance_amount.to_string(),
            "scenario": input.overrides.scenario,
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::GeneralInfo;
    use crate::revenue::line::RevenueLineRow;
    use crate::returns::waterfall::GpContributionRow;
    use rust_decimal_macros::dec;

    fn input() -> ProFormaInput {
        ProFormaInput {
            project: ProjectDetail {
                general: GeneralInfo {
                    purchase_price_usd: dec!(1000000),
                    leasing_start_month: Some(24),
                    stabilized_month: Some(36),
                    ..Default::default()
                },
                revenue: vec![RevenueLineRow {
                    id: "a".into(),
                    unit_count: dec!(20),
                    vacancy_pct: Some(dec!(5)),
                    rent_budget: Some(dec!(2000)),
                    ..Default::default()
                }],
                hard_costs: vec![crate::expenses::development::HardCostRow {
                    id: "h".into(),
                    label: None,
                    amount_usd: dec!(2000000),
                }],
                gp_contributions: vec![GpContributionRow {
                    id: "g".into(),
                    partner: "Sponsor".into(),
                    amount_usd: dec!(800000),
                    holding_pct: dec!(100),
                    contribution_month: 0,
                }],
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_build_pro_forma_shapes() {
        let out = build_pro_forma(&input()).unwrap();
        let r = &out.result;
        assert_eq!(r.projection.months.len(), 60);
        assert_eq!(r.scenarios.len(), 3);
        assert_eq!(r.exit_table.len(), 6);
        assert_eq!(r.revenue.total_monthly, dec!(38000));
        assert_eq!(r.metrics.annual_revenue, dec!(456000));
        assert_eq!(r.metrics.total_equity, dec!(800000));
        assert_eq!(r.metrics.total_project_cost, dec!(3000000));
    }

    #[test]
    fn test_construction_loan_from_budget() {
        let out = build_pro_forma(&input()).unwrap();
        // (1,000,000 + 2,000,000 - 800,000) * (1 + 7% * 2)
        assert_eq!(
            out.result.construction_loan.construction_loan_amount,
            dec!(2508000)
        );
    }

    #[test]
    fn test_revenue_ramps_in_projection() {
        let out = build_pro_forma(&input()).unwrap();
        let months = &out.result.projection.months;
        assert_eq!(months[23].total_revenue, Decimal::ZERO);
        assert_eq!(months[36].total_revenue, dec!(38000));
        assert!(months[30].total_revenue > Decimal::ZERO);
        assert!(months[30].total_revenue < dec!(38000));
    }

    #[test]
    fn test_bad_horizon_is_error() {
        let mut i = input();
        i.assumptions.horizon_months = 0;
        assert!(build_pro_forma(&i).is_err());
    }

    #[test]
    fn test_minimal_json_input() {
        let i: ProFormaInput = serde_json::from_value(serde_json::json!({
            "project": { "general": { "purchase_price_usd": "$500,000" } }
        }))
        .unwrap();
        let out = build_pro_forma(&i).unwrap();
        assert_eq!(out.result.development.total_project_cost, dec!(500000));
    }
}
