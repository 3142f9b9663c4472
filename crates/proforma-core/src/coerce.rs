//! Lenient numeric coercion for row inputs.
//!
//! Project rows arrive from an editor where any field may be blank, a
//! formatted string (`"$1,200"`, `"95%"`) or plain junk. The engine never
//! rejects a row for that; values are coerced at the serde boundary:
//!
//! * blank (`null`, `""`, missing) is "unset": `0` for amounts, `None` for
//!   optional fields so the documented default applies;
//! * anything that is present but not numeric becomes `0`;
//! * a number beyond [`MAX_INPUT_MAGNITUDE`] is treated as junk and becomes `0`.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::types::{Percent, Scenario, DEFAULT_HORIZON_MONTHS};

/// Largest magnitude accepted from a row field (ten billion).
///
/// Products of two bounded inputs and a percentage stay far inside
/// `Decimal` range, so the row calculators cannot overflow.
pub const MAX_INPUT_MAGNITUDE: Decimal = dec!(10000000000);

enum Lenient {
    Blank,
    Number(Decimal),
    Invalid,
}

fn classify(value: &Value) -> Lenient {
    match value {
        Value::Null => Lenient::Blank,
        Value::String(s) if s.trim().is_empty() => Lenient::Blank,
        Value::String(s) => bounded(parse_decimal(s)),
        Value::Number(n) => bounded(parse_decimal(&n.to_string())),
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => Lenient::Invalid,
    }
}

fn bounded(parsed: Option<Decimal>) -> Lenient {
    match parsed {
        Some(d) if d.abs() <= MAX_INPUT_MAGNITUDE => Lenient::Number(d),
        _ => Lenient::Invalid,
    }
}

/// Parse a user-entered number, tolerating currency symbols, thousands
/// separators, percent signs and scientific notation.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '%' | '_' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}

/// Amount with blank and invalid both mapped to zero.
pub fn amount(value: &Value) -> Decimal {
    match classify(value) {
        Lenient::Number(d) => d,
        Lenient::Blank | Lenient::Invalid => Decimal::ZERO,
    }
}

/// Optional amount: blank is `None`, invalid is `Some(0)`.
pub fn opt_amount(value: &Value) -> Option<Decimal> {
    match classify(value) {
        Lenient::Number(d) => Some(d),
        Lenient::Blank => None,
        Lenient::Invalid => Some(Decimal::ZERO),
    }
}

/// Month offset, floored to a whole month and never negative.
pub fn month(value: &Value) -> u32 {
    to_month(amount(value))
}

pub fn opt_month(value: &Value) -> Option<u32> {
    opt_amount(value).map(to_month)
}

fn to_month(d: Decimal) -> u32 {
    if d <= Decimal::ZERO {
        0
    } else {
        d.floor().to_u32().unwrap_or(u32::MAX)
    }
}

/// Clamp a percentage to `[0, 100]`.
pub fn clamp_percent(p: Percent) -> Percent {
    p.max(Decimal::ZERO).min(dec!(100))
}

// ---------------------------------------------------------------------------
// serde adapters
// ---------------------------------------------------------------------------

pub fn de_amount<'de, D: Deserializer<'de>>(d: D) -> Result<Decimal, D::Error> {
    Ok(amount(&Value::deserialize(d)?))
}

pub fn de_opt_amount<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Decimal>, D::Error> {
    Ok(opt_amount(&Value::deserialize(d)?))
}

pub fn de_month<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    Ok(month(&Value::deserialize(d)?))
}

pub fn de_opt_month<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    Ok(opt_month(&Value::deserialize(d)?))
}

/// Optional free text: blank is `None`, a number becomes its digits.
pub fn de_opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        other => Some(text(other)),
    })
}

/// Nested section or row list where `null` means "none given".
pub fn de_or_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// Projection horizon in months; blank means the standard horizon.
pub fn de_horizon<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    Ok(opt_month(&Value::deserialize(d)?).unwrap_or(DEFAULT_HORIZON_MONTHS))
}

/// Row ids are stored as strings; numeric database ids are accepted too.
pub fn de_id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(text(Value::deserialize(d)?))
}

/// Free text such as a partner name. `null` is empty.
pub fn de_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(text(Value::deserialize(d)?))
}

fn text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Scenario selector: `wc`, `bc`, `default`/`base` in any case. Anything
/// else, `null` included, selects the base scenario.
pub fn scenario(value: &Value) -> Scenario {
    known_scenario(value).unwrap_or_default()
}

fn known_scenario(value: &Value) -> Option<Scenario> {
    let Value::String(s) = value else {
        return None;
    };
    match s.trim().to_ascii_lowercase().as_str() {
        "wc" | "worst" | "worst_case" => Some(Scenario::Wc),
        "default" | "base" => Some(Scenario::Default),
        "bc" | "best" | "best_case" => Some(Scenario::Bc),
        _ => None,
    }
}

pub fn de_scenario<'de, D: Deserializer<'de>>(d: D) -> Result<Scenario, D::Error> {
    Ok(scenario(&Value::deserialize(d)?))
}

/// Optional selector: an unrecognised value leaves the selection unset.
pub fn de_opt_scenario<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Scenario>, D::Error> {
    Ok(known_scenario(&Value::deserialize(d)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_formatted_numbers() {
        assert_eq!(parse_decimal("$1,200.50"), Some(dec!(1200.50)));
        assert_eq!(parse_decimal(" 95% "), Some(dec!(95)));
        assert_eq!(parse_decimal("1e3"), Some(dec!(1000)));
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_decimal("   "), None);
    }

    #[test]
    fn test_amount_coercion() {
        assert_eq!(amount(&json!(12.5)), dec!(12.5));
        assert_eq!(amount(&json!("3000")), dec!(3000));
        assert_eq!(amount(&json!(null)), Decimal::ZERO);
        assert_eq!(amount(&json!("n/a")), Decimal::ZERO);
        assert_eq!(amount(&json!(true)), Decimal::ZERO);
    }

    #[test]
    fn test_opt_amount_blank_vs_invalid() {
        assert_eq!(opt_amount(&json!("")), None);
        assert_eq!(opt_amount(&json!(null)), None);
        assert_eq!(opt_amount(&json!("oops")), Some(Decimal::ZERO));
        assert_eq!(opt_amount(&json!(7)), Some(dec!(7)));
    }

    #[test]
    fn test_month_floors_and_clamps() {
        assert_eq!(month(&json!(6.9)), 6);
        assert_eq!(month(&json!(-3)), 0);
        assert_eq!(month(&json!("12")), 12);
        assert_eq!(opt_month(&json!(null)), None);
    }

    #[test]
    fn test_oversized_numbers_are_junk() {
        assert_eq!(amount(&json!("100000000000000000000")), Decimal::ZERO);
        assert_eq!(amount(&json!(1e20)), Decimal::ZERO);
        assert_eq!(amount(&json!("-1e11")), Decimal::ZERO);
        assert_eq!(amount(&json!("10000000000")), MAX_INPUT_MAGNITUDE);
        assert_eq!(opt_amount(&json!("9e99")), Some(Decimal::ZERO));
    }

    #[test]
    fn test_scenario_is_lenient() {
        assert_eq!(scenario(&json!("WC")), Scenario::Wc);
        assert_eq!(scenario(&json!(" bc ")), Scenario::Bc);
        assert_eq!(scenario(&json!("Base")), Scenario::Default);
        assert_eq!(scenario(&json!(null)), Scenario::Default);
        assert_eq!(scenario(&json!("sideways")), Scenario::Default);
        assert_eq!(scenario(&json!(3)), Scenario::Default);
    }

    #[test]
    fn test_clamp_percent() {
        assert_eq!(clamp_percent(dec!(-5)), Decimal::ZERO);
        assert_eq!(clamp_percent(dec!(140)), dec!(100));
        assert_eq!(clamp_percent(dec!(92.5)), dec!(92.5));
    }
}
