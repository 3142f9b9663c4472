//! Property tests for loan sizing and amortisation.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use proforma_core::financing::construction::{
    size_construction_loan, ConstructionLoanInput, LTC_WARNING_THRESHOLD,
};
use proforma_core::time_value::{amortization_schedule, level_payment};

fn dollars(raw: i64) -> Decimal {
    Decimal::from(raw)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: the construction loan is never negative and LTC stays in [0, 1].
    #[test]
    fn property_construction_loan_non_negative(
        purchase in 0i64..50_000_000,
        development in 0i64..50_000_000,
        equity in 0i64..120_000_000,
        tax in 0i64..1_000_000,
        rate_bp in 0i64..2_000,
        months in 0u32..60,
    ) {
        let loan = size_construction_loan(&ConstructionLoanInput {
            purchase_price: dollars(purchase),
            development_costs: dollars(development),
            gp_equity: dollars(equity),
            construction_period_tax: dollars(tax),
            annual_rate_pct: Decimal::new(rate_bp, 2),
            construction_period_months: months,
            ltc_warning_threshold: LTC_WARNING_THRESHOLD,
        });
        prop_assert!(loan.construction_loan_amount >= Decimal::ZERO);
        prop_assert!(loan.loan_to_cost_ratio >= Decimal::ZERO);
        prop_assert!(loan.loan_to_cost_ratio <= Decimal::ONE);
    }

    /// PROPERTY: at zero rate every payment is principal / term.
    #[test]
    fn property_zero_rate_straight_line(principal in 1i64..10_000_000, term in 1u32..480) {
        let p = dollars(principal);
        let payment = level_payment(p, Decimal::ZERO, term);
        prop_assert_eq!(payment, p / Decimal::from(term));
    }

    /// PROPERTY: a full schedule retires the loan and principal parts sum to it.
    #[test]
    fn property_schedule_retires_loan(
        principal in 1_000i64..10_000_000,
        rate_bp in 1i64..1_500,
        years in 1u32..40,
    ) {
        let p = dollars(principal);
        let r = Decimal::new(rate_bp, 2) / dec!(1200);
        let n = years * 12;
        let schedule = amortization_schedule(p, r, n, n);
        let last = schedule.last().unwrap();
        prop_assert_eq!(last.balance, Decimal::ZERO);
        let repaid: Decimal = schedule.iter().map(|row| row.principal).sum();
        prop_assert!((repaid - p).abs() < dec!(0.000001));
        prop_assert!(schedule.iter().all(|row| row.balance >= Decimal::ZERO));
    }
}

#[test]
fn test_straight_line_known_answer() {
    let payment = level_payment(dec!(100000), Decimal::ZERO, 120);
    assert_eq!(payment, dec!(100000) / dec!(120));
}
