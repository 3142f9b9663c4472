use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::coerce;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Ratios expressed as decimals (0.75 = 75%).
pub type Rate = Decimal;

/// Percentages on the 0-100 scale the project inputs use (5 = 5%).
pub type Percent = Decimal;

/// Number of months in the standard projection horizon.
pub const DEFAULT_HORIZON_MONTHS: u32 = 60;

/// Rent/cost assumption set: worst case, base ("default") or best case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    Wc,
    #[default]
    #[serde(alias = "base")]
    Default,
    Bc,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Scenario::Wc, Scenario::Default, Scenario::Bc];

    pub fn label(&self) -> &'static str {
        match self {
            Scenario::Wc => "Worst Case",
            Scenario::Default => "Base",
            Scenario::Bc => "Best Case",
        }
    }
}

/// Per-line-item WC/BC alternatives to a computed base value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOverride {
    #[serde(default, deserialize_with = "coerce::de_opt_amount")]
    pub wc: Option<Money>,
    #[serde(default, deserialize_with = "coerce::de_opt_amount")]
    pub bc: Option<Money>,
    #[serde(default, deserialize_with = "coerce::de_scenario")]
    pub scenario: Scenario,
}

impl ScenarioOverride {
    /// Same WC/BC values, different selected scenario.
    pub fn with_scenario(&self, scenario: Scenario) -> Self {
        Self {
            scenario,
            ..self.clone()
        }
    }
}

/// Pick the override value for the selected scenario.
///
/// A blank or zero WC/BC override falls back to `base`; the `default`
/// scenario always yields `base`.
pub fn select_scenario_value(over: Option<&ScenarioOverride>, base: Money) -> Money {
    let Some(over) = over else {
        return base;
    };
    let picked = match over.scenario {
        Scenario::Default => None,
        Scenario::Wc => over.wc,
        Scenario::Bc => over.bc,
    };
    match picked {
        Some(v) if !v.is_zero() => v,
        _ => base,
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn over(wc: Option<Money>, bc: Option<Money>, scenario: Scenario) -> ScenarioOverride {
        ScenarioOverride { wc, bc, scenario }
    }

    #[test]
    fn test_select_without_override_is_base() {
        assert_eq!(select_scenario_value(None, dec!(250)), dec!(250));
    }

    #[test]
    fn test_select_default_ignores_overrides() {
        let o = over(Some(dec!(1)), Some(dec!(2)), Scenario::Default);
        assert_eq!(select_scenario_value(Some(&o), dec!(250)), dec!(250));
    }

    #[test]
    fn test_select_wc_and_bc() {
        let o = over(Some(dec!(300)), Some(dec!(200)), Scenario::Wc);
        assert_eq!(select_scenario_value(Some(&o), dec!(250)), dec!(300));
        let o = o.with_scenario(Scenario::Bc);
        assert_eq!(select_scenario_value(Some(&o), dec!(250)), dec!(200));
    }

    #[test]
    fn test_select_zero_override_means_unset() {
        let o = over(Some(Decimal::ZERO), None, Scenario::Wc);
        assert_eq!(select_scenario_value(Some(&o), dec!(250)), dec!(250));
        let o = o.with_scenario(Scenario::Bc);
        assert_eq!(select_scenario_value(Some(&o), dec!(250)), dec!(250));
    }

    #[test]
    fn test_scenario_accepts_base_alias() {
        let s: Scenario = serde_json::from_str("\"base\"").unwrap();
        assert_eq!(s, Scenario::Default);
        let s: Scenario = serde_json::from_str("\"wc\"").unwrap();
        assert_eq!(s, Scenario::Wc);
    }

    #[test]
    fn test_override_scenario_tolerates_null_and_case() {
        let o: ScenarioOverride =
            serde_json::from_str(r#"{"wc": "1,200", "scenario": null}"#).unwrap();
        assert_eq!(o.scenario, Scenario::Default);
        assert_eq!(o.wc, Some(dec!(1200)));
        let o: ScenarioOverride = serde_json::from_str(r#"{"scenario": "BC"}"#).unwrap();
        assert_eq!(o.scenario, Scenario::Bc);
    }
}
