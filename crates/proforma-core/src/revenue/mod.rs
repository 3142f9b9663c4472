pub mod line;
pub mod ramp;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::calendar::LeaseUpOffsets;
use crate::project::{ProjectDetail, ScenarioOverrides};
use crate::types::{with_metadata, ComputationOutput, Money};

use line::{compute_revenue_line, RevenueKind, RevenueLine};

/// Stabilized revenue of every rent-roll row, with per-kind totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueSummary {
    pub lines: Vec<RevenueLine>,
    pub apartment_monthly: Money,
    pub retail_monthly: Money,
    pub parking_monthly: Money,
    pub total_monthly: Money,
    pub total_annual: Money,
}

/// Ramped monthly revenue over the projection horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueSeries {
    pub apartment: Vec<Money>,
    pub retail: Vec<Money>,
    pub parking: Vec<Money>,
    pub total: Vec<Money>,
}

/// Price every apartment, retail and parking row under its scenario.
pub fn summarize_revenue(project: &ProjectDetail, overrides: &ScenarioOverrides) -> RevenueSummary {
    let rolls = [
        (RevenueKind::Apartment, &project.revenue),
        (RevenueKind::Retail, &project.retail_revenue),
        (RevenueKind::Parking, &project.parking_revenue),
    ];

    let lines: Vec<RevenueLine> = rolls
        .iter()
        .flat_map(|(kind, rows)| {
            rows.iter().map(move |row| {
                let over = overrides.revenue_for(&row.id);
                compute_revenue_line(*kind, row, over.as_ref())
            })
        })
        .collect();

    let total_for = |kind: RevenueKind| -> Money {
        lines
            .iter()
            .filter(|l| l.kind == kind)
            .map(|l| l.monthly)
            .sum()
    };
    let apartment_monthly = total_for(RevenueKind::Apartment);
    let retail_monthly = total_for(RevenueKind::Retail);
    let parking_monthly = total_for(RevenueKind::Parking);
    let total_monthly = apartment_monthly + retail_monthly + parking_monthly;

    RevenueSummary {
        lines,
        apartment_monthly,
        retail_monthly,
        parking_monthly,
        total_monthly,
        total_annual: total_monthly * dec!(12),
    }
}

/// Apply each row's lease-up ramp and add the rows up per month.
pub fn ramp_revenue(summary: &RevenueSummary, lease_up: &LeaseUpOffsets, horizon: u32) -> RevenueSeries {
    let zeros = || vec![Decimal::ZERO; horizon as usize];
    let mut series = RevenueSeries {
        apartment: zeros(),
        retail: zeros(),
        parking: zeros(),
        total: zeros(),
    };

    for line in &summary.lines {
        let values = ramp::build_ramped_revenue_values(
            line.monthly,
            line.start_month,
            lease_up.leasing_start,
            lease_up.stabilized,
            horizon,
        );
        let bucket = match line.kind {
            RevenueKind::Apartment => &mut series.apartment,
            RevenueKind::Retail => &mut series.retail,
            RevenueKind::Parking => &mut series.parking,
        };
        for (i, v) in values.iter().enumerate() {
            bucket[i] += *v;
            series.total[i] += *v;
        }
    }

    series
}

/// Price the rent rolls and flag rows that can never earn.
pub fn calculate_revenue(
    project: &ProjectDetail,
    overrides: &ScenarioOverrides,
) -> ComputationOutput<RevenueSummary> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    let summary = summarize_revenue(project, overrides);
    for line in &summary.lines {
        if line.rent.is_zero() && !line.units.is_zero() {
            warnings.push(format!("Row '{}' has units but no rent", line.row_id));
        }
        if line.occupancy.is_zero() && !line.units.is_zero() {
            warnings.push(format!("Row '{}' is fully vacant", line.row_id));
        }
    }

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Stabilized Revenue (units x rent x occupancy)",
        overrides,
        warnings,
        elapsed,
        summary,
    )
}
