//! Property tests for refinance distribution.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use proforma_core::returns::waterfall::{refinance_waterfall, GpContributionRow, WaterfallInput};

const TOLERANCE: Decimal = dec!(0.0001);

/// Contribution rows with holdings summing to exactly `total_pct`.
fn partners(total_pct: u32) -> impl Strategy<Value = Vec<GpContributionRow>> {
    proptest::collection::vec((any::<bool>(), 0i64..5_000_000, 1u32..100), 1..6).prop_map(
        move |raw| {
            let weight: u32 = raw.iter().map(|(_, _, w)| *w).sum();
            raw.iter()
                .enumerate()
                .map(|(i, (is_lp, amount, w))| GpContributionRow {
                    id: format!("p{i}"),
                    partner: if *is_lp { "LP".into() } else { format!("Sponsor {i}") },
                    amount_usd: Decimal::from(*amount),
                    holding_pct: Decimal::from(*w) * Decimal::from(total_pct)
                        / Decimal::from(weight),
                    contribution_month: 0,
                })
                .collect()
        },
    )
}

fn input(rows: Vec<GpContributionRow>, r: i64) -> WaterfallInput {
    WaterfallInput {
        contributions: rows,
        refinance_amount: Decimal::from(r),
        available_cash_before_refi: dec!(100000),
        available_cash_after_refi: dec!(80000),
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: with holdings at 100% the whole refinance is distributed.
    #[test]
    fn property_full_holdings_conserve(rows in partners(100), r in 0i64..10_000_000) {
        let w = refinance_waterfall(&input(rows, r));
        prop_assert!((w.total_distributed - Decimal::from(r)).abs() < TOLERANCE);
    }

    /// PROPERTY: with holdings under 100% distributions never exceed proceeds.
    #[test]
    fn property_partial_holdings_bounded(
        rows in partners(60),
        r in 0i64..10_000_000,
    ) {
        let w = refinance_waterfall(&input(rows, r));
        prop_assert!(w.total_distributed <= Decimal::from(r) + TOLERANCE);
        prop_assert!(w.partners.iter().all(|p| p.refinance_distribution >= Decimal::ZERO));
    }
}
