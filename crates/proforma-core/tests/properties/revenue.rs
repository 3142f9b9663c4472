//! Property tests for revenue lines, ramps and interval conversion.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use proforma_core::expenses::carrying::{to_monthly_amount, CarryingCostRow, IntervalUnit};
use proforma_core::revenue::line::{
    compute_revenue_line, RevenueKind, RevenueLineRow, RevenueOverride,
};
use proforma_core::revenue::ramp::build_ramped_revenue_values;

fn cents(raw: i64) -> Decimal {
    Decimal::new(raw, 2)
}

fn row(units: u32, rent: Decimal) -> RevenueLineRow {
    RevenueLineRow {
        id: "row".into(),
        unit_count: Decimal::from(units),
        rent_budget: Some(rent),
        ..Default::default()
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: the occupancy used is the override clamped to [0, 100].
    #[test]
    fn property_occupancy_is_clamped(raw in -50_000i64..50_000) {
        let occupancy = cents(raw);
        let over = RevenueOverride { occupancy: Some(occupancy), ..Default::default() };
        let line = compute_revenue_line(RevenueKind::Apartment, &row(10, dec!(1000)), Some(&over));
        prop_assert_eq!(line.occupancy, occupancy.max(Decimal::ZERO).min(dec!(100)));
    }

    /// PROPERTY: monthly = units x rent x occupancy / 100, exact at 0 and 100.
    #[test]
    fn property_monthly_identity(
        units in 0u32..500,
        rent_cents in 0i64..1_000_000,
        occupancy in prop_oneof![Just(0i64), Just(100i64), 0i64..=100],
    ) {
        let rent = cents(rent_cents);
        let occ = Decimal::from(occupancy);
        let over = RevenueOverride { occupancy: Some(occ), ..Default::default() };
        let line = compute_revenue_line(RevenueKind::Retail, &row(units, rent), Some(&over));
        prop_assert_eq!(line.monthly, Decimal::from(units) * rent * occ / dec!(100));
        if occupancy == 0 {
            prop_assert_eq!(line.monthly, Decimal::ZERO);
        }
        if occupancy == 100 {
            prop_assert_eq!(line.monthly, Decimal::from(units) * rent);
        }
    }

    /// PROPERTY: every month at or after stabilization earns the full figure.
    #[test]
    fn property_ramp_constant_after_stabilization(
        monthly_cents in 0i64..10_000_000,
        start in 0u32..30,
        leasing in 0u32..40,
        span in 0u32..24,
        horizon in 1u32..120,
    ) {
        let monthly = cents(monthly_cents);
        let stabilized = leasing + span;
        let values = build_ramped_revenue_values(monthly, start, Some(leasing), Some(stabilized), horizon);
        prop_assert_eq!(values.len(), horizon as usize);
        for (i, v) in values.iter().enumerate() {
            let i = i as u32;
            if i >= stabilized && i >= start {
                prop_assert_eq!(*v, monthly);
            }
            prop_assert!(*v <= monthly);
            prop_assert!(*v >= Decimal::ZERO);
        }
    }

    /// PROPERTY: yearly and quarterly rows convert to 1/12 and 1/3 per month.
    #[test]
    fn property_interval_conversion(amount in 0i64..10_000_000) {
        let monthly = cents(amount);
        let yearly = CarryingCostRow {
            amount_usd: monthly * dec!(12),
            interval_unit: Some(IntervalUnit::Yearly),
            ..Default::default()
        };
        let quarterly = CarryingCostRow {
            amount_usd: monthly * dec!(3),
            interval_unit: Some(IntervalUnit::Quarterly),
            ..Default::default()
        };
        prop_assert_eq!(to_monthly_amount(&yearly), monthly);
        prop_assert_eq!(to_monthly_amount(&quarterly), monthly);
    }
}

#[test]
fn test_interval_known_answers() {
    let yearly = CarryingCostRow {
        amount_usd: dec!(1200),
        interval_unit: Some(IntervalUnit::Yearly),
        ..Default::default()
    };
    let quarterly = CarryingCostRow {
        amount_usd: dec!(300),
        interval_unit: Some(IntervalUnit::Quarterly),
        ..Default::default()
    };
    assert_eq!(to_monthly_amount(&yearly), dec!(100));
    assert_eq!(to_monthly_amount(&quarterly), dec!(100));
}
