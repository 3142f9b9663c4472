use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ProFormaError;
use crate::types::{Money, Percent, Rate};
use crate::ProFormaResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const MAX_IRR_ITERATIONS: u32 = 100;

/// Convert an annual percentage (6.5 = 6.5%) to a decimal monthly rate.
pub fn monthly_rate_from_annual_pct(annual_pct: Percent) -> Rate {
    annual_pct / dec!(100) / dec!(12)
}

/// Level monthly payment that retires `principal` over `n_months`.
///
/// Zero rate amortises straight-line; a zero term yields no payment. When
/// `(1 + r)^n` overflows the payment is taken at its limit, `principal * r`.
pub fn level_payment(principal: Money, monthly_rate: Rate, n_months: u32) -> Money {
    if n_months == 0 {
        return Decimal::ZERO;
    }
    if monthly_rate.is_zero() {
        return principal / Decimal::from(n_months);
    }

    let growth = Decimal::ONE + monthly_rate;
    let mut compound = Decimal::ONE;
    for _ in 0..n_months {
        match compound.checked_mul(growth) {
            Some(c) => compound = c,
            None => return principal * monthly_rate,
        }
    }

    let mut denominator = compound - Decimal::ONE;
    if denominator.is_zero() {
        denominator = Decimal::ONE;
    }
    principal * monthly_rate * (compound / denominator)
}

/// One month of a level-payment loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    /// 1-based payment number
    pub month: u32,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    /// Balance after this payment
    pub balance: Money,
}

/// Amortisation schedule for the first `periods` months of a loan.
///
/// Months beyond the term carry zero payment and zero balance. The final
/// scheduled payment absorbs any residual so the loan retires exactly.
pub fn amortization_schedule(
    principal: Money,
    monthly_rate: Rate,
    n_months: u32,
    periods: u32,
) -> Vec<AmortizationRow> {
    let payment = level_payment(principal, monthly_rate, n_months);
    let mut balance = principal;
    let mut rows = Vec::with_capacity(periods as usize);

    for month in 1..=periods {
        if month > n_months || balance.is_zero() {
            rows.push(AmortizationRow {
                month,
                payment: Decimal::ZERO,
                interest: Decimal::ZERO,
                principal: Decimal::ZERO,
                balance: Decimal::ZERO,
            });
            continue;
        }

        let interest = balance * monthly_rate;
        let (paid, principal_part) = if month == n_months {
            (balance + interest, balance)
        } else {
            (payment, payment - interest)
        };
        balance -= principal_part;

        rows.push(AmortizationRow {
            month,
            payment: paid,
            interest,
            principal: principal_part,
            balance,
        });
    }

    rows
}

/// Outstanding balance after `after_months` payments.
pub fn remaining_balance(
    principal: Money,
    monthly_rate: Rate,
    n_months: u32,
    after_months: u32,
) -> Money {
    if after_months == 0 {
        return principal;
    }
    amortization_schedule(principal, monthly_rate, n_months, after_months)
        .last()
        .map(|row| row.balance)
        .unwrap_or(principal)
}

/// Compound a periodic rate up to an annual one: `(1 + r)^12 - 1`.
pub fn annualize_monthly_rate(monthly: Rate) -> Rate {
    let growth = Decimal::ONE + monthly;
    let mut compound = Decimal::ONE;
    for _ in 0..12 {
        compound *= growth;
    }
    compound - Decimal::ONE
}

/// Internal Rate of Return per period using Newton-Raphson
pub fn irr(cash_flows: &[Money], guess: Rate) -> ProFormaResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(ProFormaError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }
    let has_outflow = cash_flows.iter().any(|cf| cf.is_sign_negative() && !cf.is_zero());
    let has_inflow = cash_flows.iter().any(|cf| cf.is_sign_positive() && !cf.is_zero());
    if !has_outflow || !has_inflow {
        return Err(ProFormaError::InsufficientData(
            "IRR requires both negative and positive cash flows".into(),
        ));
    }

    let mut rate = guess;
    let mut last_delta = Decimal::ZERO;

    for i in 0..MAX_IRR_ITERATIONS {
        let Some((npv_val, dnpv)) = npv_and_derivative(rate, cash_flows) else {
            return Err(ProFormaError::ConvergenceFailure {
                function: "IRR".into(),
                iterations: i,
                last_delta,
            });
        };
        last_delta = npv_val;

        if npv_val.abs() < CONVERGENCE_THRESHOLD {
            return Ok(rate);
        }

        // Flat or vanishing derivative: Newton cannot take a finite step.
        let Some(step) = npv_val.checked_div(dnpv) else {
            return Err(ProFormaError::ConvergenceFailure {
                function: "IRR".into(),
                iterations: i,
                last_delta: npv_val,
            });
        };
        rate -= step;

        // Guard against divergence
        if rate < dec!(-0.99) {
            rate = dec!(-0.99);
        } else if rate > dec!(10.0) {
            rate = dec!(10.0);
        }
    }

    Err(ProFormaError::ConvergenceFailure {
        function: "IRR".into(),
        iterations: MAX_IRR_ITERATIONS,
        last_delta,
    })
}

/// NPV and its first derivative with respect to the rate; `None` on overflow.
fn npv_and_derivative(rate: Rate, cash_flows: &[Money]) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;
    let mut value = Decimal::ZERO;
    let mut derivative = Decimal::ZERO;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_mul(one_plus_r)?;
        }
        let pv = cf.checked_div(discount)?;
        value = value.checked_add(pv)?;
        if t > 0 {
            let dt = Decimal::from(t as u64) * pv;
            derivative = derivative.checked_sub(dt.checked_div(one_plus_r)?)?;
        }
    }

    Some((value, derivative))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_rate_is_straight_line() {
        let payment = level_payment(dec!(100000), Decimal::ZERO, 120);
        assert_eq!(payment, dec!(100000) / dec!(120));
    }

    #[test]
    fn test_zero_term_has_no_payment() {
        assert_eq!(level_payment(dec!(100000), dec!(0.005), 0), Decimal::ZERO);
    }

    #[test]
    fn test_monthly_payment_sanity() {
        // $750k at 6.5% over 30 years, expected ~$4,740/mo
        let payment = level_payment(dec!(750000), monthly_rate_from_annual_pct(dec!(6.5)), 360);
        assert!(
            payment > dec!(4700) && payment < dec!(4800),
            "Monthly payment {} outside expected range",
            payment
        );
    }

    #[test]
    fn test_schedule_retires_loan() {
        let rows = amortization_schedule(dec!(12000), dec!(0.01), 12, 14);
        assert_eq!(rows.len(), 14);
        assert_eq!(rows[11].balance, Decimal::ZERO);
        assert_eq!(rows[12].payment, Decimal::ZERO);
        let principal_paid: Decimal = rows.iter().map(|r| r.principal).sum();
        assert!((principal_paid - dec!(12000)).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_remaining_balance_declines() {
        let r = monthly_rate_from_annual_pct(dec!(6));
        let b12 = remaining_balance(dec!(1000000), r, 360, 12);
        let b24 = remaining_balance(dec!(1000000), r, 360, 24);
        assert!(b12 < dec!(1000000));
        assert!(b24 < b12);
        assert_eq!(remaining_balance(dec!(1000000), r, 360, 0), dec!(1000000));
    }

    #[test]
    fn test_annualize_monthly_rate() {
        let annual = annualize_monthly_rate(dec!(0.01));
        // 1.01^12 - 1 = 12.68%
        assert!((annual - dec!(0.126825)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_irr_basic() {
        let cfs = vec![dec!(-1000), dec!(400), dec!(400), dec!(400)];
        let result = irr(&cfs, dec!(0.10)).unwrap();
        // IRR should be ~9.7%
        assert!((result - dec!(0.097)).abs() < dec!(0.01));
    }

    #[test]
    fn test_irr_requires_sign_change() {
        let cfs = vec![dec!(100), dec!(400)];
        assert!(matches!(
            irr(&cfs, dec!(0.1)),
            Err(ProFormaError::InsufficientData(_))
        ));
    }
}
