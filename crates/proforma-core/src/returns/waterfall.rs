use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::coerce;
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Rate};

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// One partner's capital contribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GpContributionRow {
    #[serde(default, deserialize_with = "coerce::de_id")]
    pub id: String,
    /// "LP" for limited partners; any other value names a general partner
    #[serde(default, deserialize_with = "coerce::de_text")]
    pub partner: String,
    #[serde(default, deserialize_with = "coerce::de_amount")]
    pub amount_usd: Money,
    /// Ownership share in percent
    #[serde(default, deserialize_with = "coerce::de_amount")]
    pub holding_pct: Percent,
    /// Month (0-based) the capital goes in
    #[serde(default, deserialize_with = "coerce::de_month")]
    pub contribution_month: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartnerClass {
    General,
    Limited,
}

impl GpContributionRow {
    pub fn partner_class(&self) -> PartnerClass {
        if self.partner.trim().eq_ignore_ascii_case("LP") {
            PartnerClass::Limited
        } else {
            PartnerClass::General
        }
    }
}

/// Input for splitting a cash-out refinance across partners.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterfallInput {
    #[serde(default, deserialize_with = "coerce::de_or_default")]
    pub contributions: Vec<GpContributionRow>,
    /// Cash-out refinance proceeds to distribute
    #[serde(default, deserialize_with = "coerce::de_amount")]
    pub refinance_amount: Money,
    /// Annual cash after debt service on the pre-refinance loan
    #[serde(default, deserialize_with = "coerce::de_amount")]
    pub available_cash_before_refi: Money,
    /// Annual cash after debt service on the refinanced loan
    #[serde(default, deserialize_with = "coerce::de_amount")]
    pub available_cash_after_refi: Money,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerDistribution {
    pub row_id: String,
    pub partner: String,
    pub class: PartnerClass,
    pub contribution: Money,
    pub holding_pct: Percent,
    /// Share of the refinance proceeds
    pub refinance_distribution: Money,
    /// Capital still in the deal after the refinance
    pub residual_cash_in: Money,
    pub annual_cash_before_refi: Money,
    pub annual_cash_after_refi: Money,
    /// Cash-on-cash before refinance
    pub coc_before: Rate,
    /// Cash-on-cash on residual capital after refinance
    pub coc_after: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinanceWaterfall {
    pub partners: Vec<PartnerDistribution>,
    pub refinance_amount: Money,
    pub lp_holding_pct: Percent,
    pub gp_holding_pct: Percent,
    pub lp_pool: Money,
    pub gp_pool: Money,
    pub lp_distributed: Money,
    pub gp_distributed: Money,
    pub total_distributed: Money,
    /// Refinance proceeds left unallocated (holdings under 100%)
    pub undistributed: Money,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Split a cash-out refinance between limited and general partners.
///
/// LPs are paid strictly pro rata: `R * holding / 100`. The GP pool
/// (`R * ΣGP holding / 100`) equalises residual capital instead: each GP
/// is paid down toward a common ratio of residual cash-in to holding, so the
/// GPs with the most capital in relative to their share are repaid first.
pub fn refinance_waterfall(input: &WaterfallInput) -> RefinanceWaterfall {
    let r = input.refinance_amount;
    let rows = &input.contributions;

    let holding_of = |class: PartnerClass| -> Percent {
        rows.iter()
            .filter(|row| row.partner_class() == class)
            .map(|row| row.holding_pct)
            .sum()
    };
    let lp_holding_pct = holding_of(PartnerClass::Limited);
    let gp_holding_pct = holding_of(PartnerClass::General);
    let lp_pool = r * lp_holding_pct / dec!(100);
    let gp_pool = r * gp_holding_pct / dec!(100);

    let gp_rows: Vec<&GpContributionRow> = rows
        .iter()
        .filter(|row| row.partner_class() == PartnerClass::General)
        .collect();
    let gp_payouts = equalize_gp_pool(&gp_rows, gp_pool);
    let mut gp_payout_iter = gp_payouts.into_iter();

    let partners: Vec<PartnerDistribution> = rows
        .iter()
        .map(|row| {
            let class = row.partner_class();
            let refinance_distribution = match class {
                PartnerClass::Limited => r * row.holding_pct / dec!(100),
                PartnerClass::General => gp_payout_iter.next().unwrap_or(Decimal::ZERO),
            };
            partner_distribution(row, class, refinance_distribution, input)
        })
        .collect();

    let distributed_for = |class: PartnerClass| -> Money {
        partners
            .iter()
            .filter(|p| p.class == class)
            .map(|p| p.refinance_distribution)
            .sum()
    };
    let lp_distributed = distributed_for(PartnerClass::Limited);
    let gp_distributed = distributed_for(PartnerClass::General);
    let total_distributed = lp_distributed + gp_distributed;

    RefinanceWaterfall {
        refinance_amount: r,
        lp_holding_pct,
        gp_holding_pct,
        lp_pool,
        gp_pool,
        lp_distributed,
        gp_distributed,
        total_distributed,
        undistributed: r - total_distributed,
        partners,
    }
}

/// Pay the GP pool down toward equal residual cash-in per point of holding.
///
/// Target residual for GP `i` is `(Σc - pool) * h_i / Σh` over the GPs
/// still being paid. A GP already below its target receives nothing and is
/// dropped, which raises the common level for the rest; repeat until every
/// remaining GP sits at or above its target. Payouts then sum to the pool.
fn equalize_gp_pool(gps: &[&GpContributionRow], pool: Money) -> Vec<Money> {
    let mut payouts = vec![Decimal::ZERO; gps.len()];
    if pool <= Decimal::ZERO {
        return payouts;
    }

    let mut active = vec![true; gps.len()];
    loop {
        let (contrib_sum, pct_sum) = gps
            .iter()
            .zip(&active)
            .filter(|(_, on)| **on)
            .fold((Decimal::ZERO, Decimal::ZERO), |(c, h), (row, _)| {
                (c + row.amount_usd, h + row.holding_pct)
            });
        if pct_sum <= Decimal::ZERO {
            return vec![Decimal::ZERO; gps.len()];
        }
        let residual_total = contrib_sum - pool;

        let mut dropped = false;
        for (i, row) in gps.iter().enumerate() {
            if !active[i] {
                continue;
            }
            let target = residual_total * row.holding_pct / pct_sum;
            if row.amount_usd < target {
                active[i] = false;
                dropped = true;
            }
        }

        if !dropped {
            for (i, row) in gps.iter().enumerate() {
                if active[i] {
                    let target = residual_total * row.holding_pct / pct_sum;
                    payouts[i] = (row.amount_usd - target).max(Decimal::ZERO);
                }
            }
            return payouts;
        }
    }
}

fn partner_distribution(
    row: &GpContributionRow,
    class: PartnerClass,
    refinance_distribution: Money,
    input: &WaterfallInput,
) -> PartnerDistribution {
    let share = row.holding_pct / dec!(100);
    let annual_cash_before_refi = input.available_cash_before_refi * share;
    let annual_cash_after_refi = input.available_cash_after_refi * share;
    let residual_cash_in = row.amount_usd - refinance_distribution;

    PartnerDistribution {
        row_id: row.id.clone(),
        partner: row.partner.clone(),
        class,
        contribution: row.amount_usd,
        holding_pct: row.holding_pct,
        refinance_distribution,
        residual_cash_in,
        annual_cash_before_refi,
        annual_cash_after_refi,
        coc_before: safe_ratio(annual_cash_before_refi, row.amount_usd),
        coc_after: safe_ratio(annual_cash_after_refi, residual_cash_in),
    }
}

fn safe_ratio(numerator: Money, divisor: Money) -> Rate {
    if divisor <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        numerator.checked_div(divisor).unwrap_or(Decimal::ZERO)
    }
}

/// Holding-percentage sanity warnings.
pub fn holding_warnings(waterfall: &RefinanceWaterfall) -> Vec<String> {
    let mut warnings = Vec::new();
    let total = waterfall.lp_holding_pct + waterfall.gp_holding_pct;
    if total > dec!(100) {
        warnings.push(format!(
            "Holding percentages sum to {total}% — refinance distributions exceed proceeds"
        ));
    } else if total < dec!(100) && !waterfall.partners.is_empty() {
        warnings.push(format!(
            "Holding percentages sum to {total}% — {} of refinance proceeds undistributed",
            waterfall.undistributed.round_dp(2)
        ));
    }
    warnings
}

/// Run the refinance waterfall and wrap it in the standard envelope.
pub fn calculate_refinance_waterfall(
    input: &WaterfallInput,
) -> ComputationOutput<RefinanceWaterfall> {
    let start = Instant::now();
    let waterfall = refinance_waterfall(input);
    let warnings = holding_warnings(&waterfall);

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Refinance Waterfall (LP pro rata, GP equalised residual capital)",
        input,
        warnings,
        elapsed,
        waterfall,
    )
}
