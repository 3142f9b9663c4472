use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::coerce;
use crate::error::ProFormaError;
use crate::financing::construction::LTC_WARNING_THRESHOLD;
use crate::returns::exit::{de_cap_rates, default_exit_cap_rates};
use crate::types::{Money, Percent, Rate, DEFAULT_HORIZON_MONTHS};
use crate::ProFormaResult;

/// Longest projection the engine will build (50 years).
pub const MAX_HORIZON_MONTHS: u32 = 600;

/// Global financing assumptions the caller keeps alongside the project.
///
/// Every field has a default so a partial JSON document is enough; a blank
/// field also takes its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawAssumptions")]
pub struct FinancingAssumptions {
    pub horizon_months: u32,
    pub construction_period_months: u32,
    /// Construction loan rate, percent
    pub construction_rate_pct: Percent,
    /// Permanent loan rate, percent
    pub stabilized_rate_pct: Percent,
    pub amortization_years: u32,
    /// Cash-out added to the permanent loan at conversion
    pub refinance_amount: Money,
    pub sales_cost_pct: Percent,
    /// Cap rates for the exit table, percent
    pub exit_cap_rates: Vec<Percent>,
    /// Cap rate for a terminal sale at the end of the horizon, percent
    pub terminal_cap_rate_pct: Option<Percent>,
    pub ltc_warning_threshold: Rate,
}

/// Wire form: every field coerced, blanks left unset.
#[derive(Deserialize)]
struct RawAssumptions {
    #[serde(default, deserialize_with = "coerce::de_opt_month")]
    horizon_months: Option<u32>,
    #[serde(default, deserialize_with = "coerce::de_opt_month")]
    construction_period_months: Option<u32>,
    #[serde(default, deserialize_with = "coerce::de_opt_amount")]
    construction_rate_pct: Option<Percent>,
    #[serde(default, deserialize_with = "coerce::de_opt_amount")]
    stabilized_rate_pct: Option<Percent>,
    #[serde(default, deserialize_with = "coerce::de_opt_month")]
    amortization_years: Option<u32>,
    #[serde(default, deserialize_with = "coerce::de_opt_amount")]
    refinance_amount: Option<Money>,
    #[serde(default, deserialize_with = "coerce::de_opt_amount")]
    sales_cost_pct: Option<Percent>,
    #[serde(default = "default_exit_cap_rates", deserialize_with = "de_cap_rates")]
    exit_cap_rates: Vec<Percent>,
    #[serde(default, deserialize_with = "coerce::de_opt_amount")]
    terminal_cap_rate_pct: Option<Percent>,
    #[serde(default, deserialize_with = "coerce::de_opt_amount")]
    ltc_warning_threshold: Option<Rate>,
}

impl From<RawAssumptions> for FinancingAssumptions {
    fn from(raw: RawAssumptions) -> Self {
        let d = Self::default();
        Self {
            horizon_months: raw.horizon_months.unwrap_or(d.horizon_months),
            construction_period_months: raw
                .construction_period_months
                .unwrap_or(d.construction_period_months),
            construction_rate_pct: raw.construction_rate_pct.unwrap_or(d.construction_rate_pct),
            stabilized_rate_pct: raw.stabilized_rate_pct.unwrap_or(d.stabilized_rate_pct),
            amortization_years: raw.amortization_years.unwrap_or(d.amortization_years),
            refinance_amount: raw.refinance_amount.unwrap_or(d.refinance_amount),
            sales_cost_pct: raw.sales_cost_pct.unwrap_or(d.sales_cost_pct),
            exit_cap_rates: raw.exit_cap_rates,
            terminal_cap_rate_pct: raw.terminal_cap_rate_pct,
            ltc_warning_threshold: raw.ltc_warning_threshold.unwrap_or(d.ltc_warning_threshold),
        }
    }
}

impl Default for FinancingAssumptions {
    fn default() -> Self {
        Self {
            horizon_months: DEFAULT_HORIZON_MONTHS,
            construction_period_months: 24,
            construction_rate_pct: dec!(7),
            stabilized_rate_pct: dec!(6.5),
            amortization_years: 30,
            refinance_amount: dec!(0),
            sales_cost_pct: dec!(5),
            exit_cap_rates: default_exit_cap_rates(),
            terminal_cap_rate_pct: None,
            ltc_warning_threshold: LTC_WARNING_THRESHOLD,
        }
    }
}

impl FinancingAssumptions {
    /// The only structural check the engine makes: the horizon must be usable.
    pub fn validate(&self) -> ProFormaResult<()> {
        validate_horizon(self.horizon_months)
    }
}

/// Reject a projection horizon outside `1..=MAX_HORIZON_MONTHS`.
pub fn validate_horizon(horizon_months: u32) -> ProFormaResult<()> {
    if horizon_months == 0 || horizon_months > MAX_HORIZON_MONTHS {
        return Err(ProFormaError::InvalidInput {
            field: "horizon_months".into(),
            reason: format!("Horizon must be between 1 and {MAX_HORIZON_MONTHS} months"),
        });
    }
    Ok(())
}
