use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::assumptions::validate_horizon;
use crate::coerce;
use crate::types::{with_metadata, ComputationOutput, Money, DEFAULT_HORIZON_MONTHS};
use crate::ProFormaResult;

fn default_horizon() -> u32 {
    DEFAULT_HORIZON_MONTHS
}

/// One row's ramp, as entered on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RampInput {
    #[serde(default, deserialize_with = "coerce::de_amount")]
    pub stabilized_monthly: Money,
    #[serde(default, deserialize_with = "coerce::de_month")]
    pub start_month: u32,
    #[serde(default, deserialize_with = "coerce::de_opt_month")]
    pub leasing_start: Option<u32>,
    #[serde(default, deserialize_with = "coerce::de_opt_month")]
    pub stabilized_offset: Option<u32>,
    #[serde(default = "default_horizon", deserialize_with = "coerce::de_horizon")]
    pub horizon_months: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RampPoint {
    pub month: u32,
    pub revenue: Money,
    /// Share of the stabilized figure earned this month
    pub ramp_pct: Decimal,
}

/// Spread a stabilized monthly figure across the projection horizon.
///
/// * before `max(start_month, leasing_start)` the row earns nothing;
/// * from leasing start to stabilization revenue ramps linearly, the ramp
///   fraction being months elapsed since leasing start over the lease-up
///   length;
/// * from stabilization onwards the full monthly figure is earned.
///
/// With either offset unknown the series is flat from `start_month`.
pub fn build_ramped_revenue_values(
    stabilized_monthly: Money,
    start_month: u32,
    leasing_start: Option<u32>,
    stabilized_offset: Option<u32>,
    horizon: u32,
) -> Vec<Money> {
    let (leasing, stabilized) = match (leasing_start, stabilized_offset) {
        (Some(l), Some(s)) => (l, s),
        _ => {
            return (0..horizon)
                .map(|i| {
                    if i < start_month {
                        Decimal::ZERO
                    } else {
                        stabilized_monthly
                    }
                })
                .collect();
        }
    };

    let earning_from = start_month.max(leasing);
    let lease_up = stabilized.saturating_sub(leasing);

    (0..horizon)
        .map(|i| {
            if i < earning_from {
                Decimal::ZERO
            } else if i >= stabilized || lease_up == 0 {
                stabilized_monthly
            } else {
                stabilized_monthly * Decimal::from(i - leasing) / Decimal::from(lease_up)
            }
        })
        .collect()
}

/// Ramp one row across its horizon. The horizon must be `1..=600` months.
pub fn calculate_ramp(input: &RampInput) -> ProFormaResult<ComputationOutput<Vec<RampPoint>>> {
    validate_horizon(input.horizon_months)?;
    let start = Instant::now();
    let mut warnings = Vec::new();

    if let (Some(l), Some(s)) = (input.leasing_start, input.stabilized_offset) {
        if s < l {
            warnings.push(format!(
                "Stabilization month {s} precedes leasing start {l}; revenue is full from leasing start"
            ));
        }
    }
    if input.leasing_start.is_none() || input.stabilized_offset.is_none() {
        warnings.push("Lease-up window unknown; revenue is flat from the start month".into());
    }

    let points = build_ramped_revenue_values(
        input.stabilized_monthly,
        input.start_month,
        input.leasing_start,
        input.stabilized_offset,
        input.horizon_months,
    )
    .into_iter()
    .enumerate()
    .map(|(i, revenue)| RampPoint {
        month: i as u32,
        ramp_pct: if input.stabilized_monthly.is_zero() {
            Decimal::ZERO
        } else {
            revenue / input.stabilized_monthly * Decimal::ONE_HUNDRED
        },
        revenue,
    })
    .collect();

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Lease-up Revenue Ramp (linear from leasing start to stabilization)",
        input,
        warnings,
        elapsed,
        points,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProFormaError;
    use rust_decimal_macros::dec;

    #[test]
    fn test_flat_without_lease_up_dates() {
        let values = build_ramped_revenue_values(dec!(1000), 3, None, Some(10), 6);
        assert_eq!(
            values,
            vec![
                Decimal::ZERO,
                Decimal::ZERO,
                Decimal::ZERO,
                dec!(1000),
                dec!(1000),
                dec!(1000)
            ]
        );
    }

    #[test]
    fn test_linear_ramp() {
        // Leasing at month 2, stabilized at month 6: 4-month lease-up
        let values = build_ramped_revenue_values(dec!(1000), 0, Some(2), Some(6), 8);
        assert_eq!(values[0], Decimal::ZERO);
        assert_eq!(values[1], Decimal::ZERO);
        assert_eq!(values[2], Decimal::ZERO);
        assert_eq!(values[3], dec!(250));
        assert_eq!(values[4], dec!(500));
        assert_eq!(values[5], dec!(750));
        assert_eq!(values[6], dec!(1000));
        assert_eq!(values[7], dec!(1000));
    }

    #[test]
    fn test_late_start_joins_ramp_midway() {
        let values = build_ramped_revenue_values(dec!(1000), 4, Some(2), Some(6), 8);
        assert_eq!(values[3], Decimal::ZERO);
        assert_eq!(values[4], dec!(500));
        assert_eq!(values[6], dec!(1000));
    }

    #[test]
    fn test_start_after_stabilization() {
        let values = build_ramped_revenue_values(dec!(800), 10, Some(2), Some(6), 12);
        assert_eq!(values[9], Decimal::ZERO);
        assert_eq!(values[10], dec!(800));
        assert_eq!(values[11], dec!(800));
    }

    #[test]
    fn test_calculate_ramp_points() {
        let input: RampInput = serde_json::from_value(serde_json::json!({
            "stabilized_monthly": "1,000",
            "leasing_start": 2,
            "stabilized_offset": 6,
            "horizon_months": 8
        }))
        .unwrap();
        let out = calculate_ramp(&input).unwrap();
        assert_eq!(out.result.len(), 8);
        assert_eq!(out.result[4].revenue, dec!(500));
        assert_eq!(out.result[4].ramp_pct, dec!(50));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_horizon_length() {
        let values = build_ramped_revenue_values(dec!(1), 0, Some(0), Some(12), 60);
        assert_eq!(values.len(), 60);
    }

    #[test]
    fn test_out_of_range_horizon_is_rejected() {
        let input: RampInput = serde_json::from_value(serde_json::json!({
            "stabilized_monthly": 1,
            "horizon_months": 4000000000u64
        }))
        .unwrap();
        assert!(matches!(
            calculate_ramp(&input),
            Err(ProFormaError::InvalidInput { .. })
        ));

        let input: RampInput =
            serde_json::from_value(serde_json::json!({ "horizon_months": 0 })).unwrap();
        assert!(calculate_ramp(&input).is_err());

        let input: RampInput =
            serde_json::from_value(serde_json::json!({ "horizon_months": null })).unwrap();
        assert_eq!(input.horizon_months, DEFAULT_HORIZON_MONTHS);
        assert_eq!(calculate_ramp(&input).unwrap().result.len(), 60);
    }
}
