use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Instant;

use crate::coerce;
use crate::types::{with_metadata, ComputationOutput, Money, Percent};

/// Candidate exit cap rates, in percent, from most to least conservative.
pub const EXIT_CAP_RATES: [Decimal; 6] = [
    dec!(7.5),
    dec!(7),
    dec!(6.5),
    dec!(6),
    dec!(5.5),
    dec!(5),
];

pub fn default_exit_cap_rates() -> Vec<Percent> {
    EXIT_CAP_RATES.to_vec()
}

/// Cap-rate list; each entry coerced, anything but a list gives the defaults.
pub fn de_cap_rates<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Percent>, D::Error> {
    Ok(match serde_json::Value::deserialize(d)? {
        serde_json::Value::Array(items) => items.iter().map(coerce::amount).collect(),
        _ => default_exit_cap_rates(),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitSensitivityInput {
    /// Stabilized annual NOI
    #[serde(default, deserialize_with = "coerce::de_amount")]
    pub noi: Money,
    /// Selling costs in percent of sale price
    #[serde(default, deserialize_with = "coerce::de_amount")]
    pub sales_cost_pct: Percent,
    #[serde(default, deserialize_with = "coerce::de_amount")]
    pub construction_loan_amount: Money,
    #[serde(default, deserialize_with = "coerce::de_amount")]
    pub gp_equity: Money,
    #[serde(default = "default_exit_cap_rates", deserialize_with = "de_cap_rates")]
    pub cap_rates: Vec<Percent>,
}

/// One row of the exit table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitScenarioRow {
    pub cap_rate_pct: Percent,
    /// NOI / cap rate
    pub sale_price: Money,
    pub sales_costs: Money,
    pub net_proceeds: Money,
    /// Net proceeds less construction loan and equity
    pub money_in_hand: Money,
}

/// NOI capitalised at `cap_rate_pct`; `None` for a zero cap rate or a price
/// beyond `Decimal` range.
pub fn capitalized_value(noi: Money, cap_rate_pct: Percent) -> Option<Money> {
    noi.checked_div(cap_rate_pct / dec!(100))
}

/// Price a sale at one exit cap rate. A cap rate that cannot price the NOI
/// (zero, or so small the price overflows) prices at zero.
pub fn exit_row(
    noi: Money,
    cap_rate_pct: Percent,
    sales_cost_pct: Percent,
    construction_loan_amount: Money,
    gp_equity: Money,
) -> ExitScenarioRow {
    let sale_price = capitalized_value(noi, cap_rate_pct).unwrap_or(Decimal::ZERO);
    let net_proceeds = sale_price
        .checked_mul(Decimal::ONE - sales_cost_pct / dec!(100))
        .unwrap_or(Decimal::ZERO);

    ExitScenarioRow {
        cap_rate_pct,
        sale_price,
        sales_costs: sale_price - net_proceeds,
        net_proceeds,
        money_in_hand: net_proceeds - (construction_loan_amount + gp_equity),
    }
}

/// Exit table: each cap rate priced independently.
pub fn exit_sensitivity(input: &ExitSensitivityInput) -> Vec<ExitScenarioRow> {
    input
        .cap_rates
        .iter()
        .map(|cap| {
            exit_row(
                input.noi,
                *cap,
                input.sales_cost_pct,
                input.construction_loan_amount,
                input.gp_equity,
            )
        })
        .collect()
}

pub fn calculate_exit_sensitivity(
    input: &ExitSensitivityInput,
) -> ComputationOutput<Vec<ExitScenarioRow>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    if input.noi <= Decimal::ZERO {
        warnings.push("NOI is not positive; exit values are meaningless".into());
    }
    for cap in &input.cap_rates {
        if cap.is_zero() {
            warnings.push("Zero cap rate priced at zero".into());
        } else if capitalized_value(input.noi, *cap).is_none() {
            warnings.push(format!("Sale price at a {cap}% cap rate overflows; priced at zero"));
        }
    }
    let rows = exit_sensitivity(input);

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Exit Cap Rate Sensitivity (direct capitalisation)",
        input,
        warnings,
        elapsed,
        rows,
    )
}
