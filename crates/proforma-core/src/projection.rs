use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calendar::CashflowMonth;
use crate::expenses::carrying::CarryingSeries;
use crate::returns::exit::capitalized_value;
use crate::returns::waterfall::GpContributionRow;
use crate::revenue::RevenueSeries;
use crate::time_value;
use crate::types::{Money, Percent, Rate};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Financing facts the projection needs, already sized upstream.
#[derive(Debug, Clone)]
pub struct ProjectionFinancing {
    pub construction_months: u32,
    pub construction_loan_amount: Money,
    /// Construction loan plus cash-out
    pub permanent_principal: Money,
    pub refinance_amount: Money,
    pub stabilized_rate_pct: Percent,
    pub amortization_years: u32,
    /// Exit cap rate for a sale in the final month, percent
    pub terminal_cap_rate_pct: Option<Percent>,
    pub sales_cost_pct: Percent,
}

/// One month of the pro-forma.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionMonth {
    #[serde(flatten)]
    pub month: CashflowMonth,
    pub apartment_revenue: Money,
    pub retail_revenue: Money,
    pub parking_revenue: Money,
    pub total_revenue: Money,
    pub operating_expenses: Money,
    pub noi: Money,
    /// Construction-phase carry, funded by the construction loan
    pub construction_carry: Money,
    pub debt_service: Money,
    pub interest: Money,
    pub loan_balance: Money,
    pub refinance_proceeds: Money,
    pub equity_contributions: Money,
    /// Sale price net of selling costs (final month only)
    pub sale_proceeds: Money,
    pub loan_payoff: Money,
    pub cash_flow_to_equity: Money,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectionTotals {
    pub revenue: Money,
    pub operating_expenses: Money,
    pub noi: Money,
    pub construction_carry: Money,
    pub debt_service: Money,
    pub refinance_proceeds: Money,
    pub equity_contributions: Money,
    pub sale_proceeds: Money,
    pub cash_flow_to_equity: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowProjection {
    pub months: Vec<ProjectionMonth>,
    pub totals: ProjectionTotals,
    /// Annualised IRR of cash flow to equity
    pub equity_irr: Option<Rate>,
    /// Distributions over contributions
    pub equity_multiple: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Lay revenue, expenses, debt and partner flows out month by month.
///
/// No debt service is paid during construction (interest is capitalised
/// into the sized loan). At conversion the permanent loan funds, the
/// cash-out is received, and level payments start the same month.
pub fn build_cash_flow_projection(
    calendar: Vec<CashflowMonth>,
    revenue: &RevenueSeries,
    carrying: &CarryingSeries,
    financing: &ProjectionFinancing,
    contributions: &[GpContributionRow],
    warnings: &mut Vec<String>,
) -> CashFlowProjection {
    let horizon = calendar.len() as u32;
    let conversion = financing.construction_months;
    let monthly_rate = time_value::monthly_rate_from_annual_pct(financing.stabilized_rate_pct);
    let term_months = financing.amortization_years.saturating_mul(12);
    let payments_in_horizon = horizon.saturating_sub(conversion);
    let schedule = time_value::amortization_schedule(
        financing.permanent_principal,
        monthly_rate,
        term_months,
        payments_in_horizon,
    );

    let mut contributed = vec![Decimal::ZERO; horizon as usize];
    for row in contributions {
        if let Some(slot) = contributed.get_mut(row.contribution_month as usize) {
            *slot += row.amount_usd;
        } else {
            warnings.push(format!(
                "Contribution '{}' in month {} falls outside the projection horizon",
                row.id, row.contribution_month
            ));
        }
    }

    let mut months = Vec::with_capacity(horizon as usize);
    let mut totals = ProjectionTotals::default();

    for (i, month) in calendar.into_iter().enumerate() {
        let index = i as u32;
        let total_revenue = revenue.total[i];
        let operating_expenses = carrying.operating[i];
        let noi = total_revenue - operating_expenses;

        let (debt_service, interest, loan_balance) = if index < conversion {
            (Decimal::ZERO, Decimal::ZERO, financing.construction_loan_amount)
        } else {
            schedule
                .get((index - conversion) as usize)
                .map(|row| (row.payment, row.interest, row.balance))
                .unwrap_or_default()
        };

        let refinance_proceeds = if index == conversion {
            financing.refinance_amount
        } else {
            Decimal::ZERO
        };

        let (sale_proceeds, loan_payoff) = if index + 1 == horizon {
            terminal_sale(noi, horizon, financing, warnings)
        } else {
            (Decimal::ZERO, Decimal::ZERO)
        };

        let equity_contributions = contributed[i];
        let cash_flow_to_equity = noi - debt_service + refinance_proceeds + sale_proceeds
            - loan_payoff
            - equity_contributions;

        totals.revenue += total_revenue;
        totals.operating_expenses += operating_expenses;
        totals.noi += noi;
        totals.construction_carry += carrying.construction[i];
        totals.debt_service += debt_service;
        totals.refinance_proceeds += refinance_proceeds;
        totals.equity_contributions += equity_contributions;
        totals.sale_proceeds += sale_proceeds;
        totals.cash_flow_to_equity += cash_flow_to_equity;

        months.push(ProjectionMonth {
            month,
            apartment_revenue: revenue.apartment[i],
            retail_revenue: revenue.retail[i],
            parking_revenue: revenue.parking[i],
            total_revenue,
            operating_expenses,
            noi,
            construction_carry: carrying.construction[i],
            debt_service,
            interest,
            loan_balance,
            refinance_proceeds,
            equity_contributions,
            sale_proceeds,
            loan_payoff,
            cash_flow_to_equity,
        });
    }

    let flows: Vec<Money> = months.iter().map(|m| m.cash_flow_to_equity).collect();
    let equity_irr = match time_value::irr(&flows, dec!(0.01)) {
        Ok(monthly) => Some(time_value::annualize_monthly_rate(monthly)),
        Err(e) => {
            warnings.push(format!("Equity IRR unavailable: {e}"));
            None
        }
    };

    let distributions: Money = flows.iter().filter(|f| **f > Decimal::ZERO).copied().sum();
    let invested: Money = flows
        .iter()
        .filter(|f| **f < Decimal::ZERO)
        .map(|f| -*f)
        .sum();
    let equity_multiple = distributions.checked_div(invested);

    CashFlowProjection {
        months,
        totals,
        equity_irr,
        equity_multiple,
    }
}

/// Net sale proceeds and loan payoff for a sale in the final month.
///
/// The payoff is whatever is still owed once the horizon's payments are
/// made: the construction loan if conversion never happens, else the
/// permanent loan's remaining balance.
fn terminal_sale(
    noi: Money,
    horizon: u32,
    financing: &ProjectionFinancing,
    warnings: &mut Vec<String>,
) -> (Money, Money) {
    let Some(cap) = financing.terminal_cap_rate_pct.filter(|c| *c > Decimal::ZERO) else {
        return (Decimal::ZERO, Decimal::ZERO);
    };
    let Some(sale_price) = capitalized_value(noi * dec!(12), cap) else {
        warnings.push(format!("Terminal sale at a {cap}% cap rate overflows; no sale modelled"));
        return (Decimal::ZERO, Decimal::ZERO);
    };
    let net = sale_price
        .checked_mul(Decimal::ONE - financing.sales_cost_pct / dec!(100))
        .unwrap_or(Decimal::ZERO);

    let payoff = if horizon <= financing.construction_months {
        financing.construction_loan_amount
    } else {
        time_value::remaining_balance(
            financing.permanent_principal,
            time_value::monthly_rate_from_annual_pct(financing.stabilized_rate_pct),
            financing.amortization_years.saturating_mul(12),
            horizon - financing.construction_months,
        )
    };
    (net, payoff)
}
