use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar::{self, LeaseUpOffsets};
use crate::coerce;
use crate::expenses::carrying::CarryingCostRow;
use crate::expenses::development::{HardCostRow, SoftCostRow};
use crate::returns::waterfall::GpContributionRow;
use crate::revenue::line::{RevenueLineRow, RevenueOverride};
use crate::types::{Money, Scenario, ScenarioOverride};

// ---------------------------------------------------------------------------
// Project input
// ---------------------------------------------------------------------------

/// Project-level facts from the general tab.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralInfo {
    #[serde(default, deserialize_with = "coerce::de_opt_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "coerce::de_amount")]
    pub purchase_price_usd: Money,
    /// Buildable square footage
    #[serde(default, deserialize_with = "coerce::de_amount")]
    pub target_sqft: Decimal,
    #[serde(default, deserialize_with = "coerce::de_opt_text")]
    pub closing_date: Option<String>,
    #[serde(default, deserialize_with = "coerce::de_opt_text")]
    pub leasing_start_date: Option<String>,
    #[serde(default, deserialize_with = "coerce::de_opt_text")]
    pub stabilized_date: Option<String>,
    /// Explicit leasing-start offset; wins over `leasing_start_date`
    #[serde(default, deserialize_with = "coerce::de_opt_month")]
    pub leasing_start_month: Option<u32>,
    /// Explicit stabilization offset; wins over `stabilized_date`
    #[serde(default, deserialize_with = "coerce::de_opt_month")]
    pub stabilized_month: Option<u32>,
    /// Base build cost per square foot
    #[serde(default, deserialize_with = "coerce::de_opt_amount")]
    pub build_cost_per_sqft: Option<Money>,
}

/// Everything the engine reads about one development.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectDetail {
    #[serde(default, deserialize_with = "coerce::de_or_default")]
    pub general: GeneralInfo,
    /// Apartment rent roll
    #[serde(default, deserialize_with = "coerce::de_or_default")]
    pub revenue: Vec<RevenueLineRow>,
    #[serde(default, deserialize_with = "coerce::de_or_default")]
    pub retail_revenue: Vec<RevenueLineRow>,
    #[serde(default, deserialize_with = "coerce::de_or_default")]
    pub parking_revenue: Vec<RevenueLineRow>,
    #[serde(default, deserialize_with = "coerce::de_or_default")]
    pub hard_costs: Vec<HardCostRow>,
    #[serde(default, deserialize_with = "coerce::de_or_default")]
    pub soft_costs: Vec<SoftCostRow>,
    #[serde(default, deserialize_with = "coerce::de_or_default")]
    pub carrying_costs: Vec<CarryingCostRow>,
    #[serde(default, deserialize_with = "coerce::de_or_default")]
    pub gp_contributions: Vec<GpContributionRow>,
}

impl ProjectDetail {
    /// Closing date, if present and parseable. Bad dates become a warning.
    pub fn closing_date(&self, warnings: &mut Vec<String>) -> Option<NaiveDate> {
        parse_optional_date("closing_date", self.general.closing_date.as_deref(), warnings)
    }

    /// Leasing-start and stabilization offsets from explicit months or dates.
    ///
    /// An explicit month wins; its date is then not read at all.
    pub fn lease_up(&self, warnings: &mut Vec<String>) -> LeaseUpOffsets {
        let general = &self.general;
        let closing = self.closing_date(warnings);
        let mut date_of = |field: &str, explicit: Option<u32>, raw: Option<&str>| match explicit {
            Some(_) => None,
            None => parse_optional_date(field, raw, warnings),
        };
        let leasing_date = date_of(
            "leasing_start_date",
            general.leasing_start_month,
            general.leasing_start_date.as_deref(),
        );
        let stabilized_date = date_of(
            "stabilized_date",
            general.stabilized_month,
            general.stabilized_date.as_deref(),
        );

        let dated = calendar::resolve_lease_up(closing, leasing_date, stabilized_date);
        let mut offsets = calendar::clamp_lease_up(
            general.leasing_start_month.or(dated.leasing_start),
            general.stabilized_month.or(dated.stabilized),
        );
        offsets.clamped |= dated.clamped;

        if offsets.clamped {
            warnings.push(format!(
                "Stabilization precedes leasing start; using month {} (leasing start + {})",
                offsets.stabilized.unwrap_or_default(),
                calendar::STABILIZATION_FALLBACK_MONTHS
            ));
        }
        offsets
    }

    /// Sum of every contribution row, GP and LP alike.
    pub fn total_equity(&self) -> Money {
        self.gp_contributions.iter().map(|r| r.amount_usd).sum()
    }
}

fn parse_optional_date(
    field: &str,
    raw: Option<&str>,
    warnings: &mut Vec<String>,
) -> Option<NaiveDate> {
    let raw = raw.filter(|s| !s.trim().is_empty())?;
    match calendar::parse_date(raw) {
        Ok(d) => Some(d),
        Err(e) => {
            warnings.push(format!("{field} ignored: {e}"));
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Scenario state
// ---------------------------------------------------------------------------

/// Caller-owned override layer, keyed by row id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOverrides {
    #[serde(default, deserialize_with = "coerce::de_or_default")]
    pub revenue: BTreeMap<String, RevenueOverride>,
    #[serde(default, deserialize_with = "coerce::de_or_default")]
    pub carrying: BTreeMap<String, ScenarioOverride>,
    #[serde(default)]
    pub build_cost: Option<ScenarioOverride>,
    /// Project-wide scenario; replaces every per-row selection when set
    #[serde(default, deserialize_with = "coerce::de_opt_scenario")]
    pub scenario: Option<Scenario>,
}

impl ScenarioOverrides {
    /// Same override values with every row forced to `scenario`.
    pub fn forcing(&self, scenario: Scenario) -> Self {
        Self {
            scenario: Some(scenario),
            ..self.clone()
        }
    }

    pub fn revenue_for(&self, row_id: &str) -> Option<RevenueOverride> {
        let found = self.revenue.get(row_id);
        match self.scenario {
            Some(s) => Some(found.map(|o| o.with_scenario(s)).unwrap_or(RevenueOverride {
                scenario: s,
                ..Default::default()
            })),
            None => found.cloned(),
        }
    }

    pub fn carrying_for(&self, row_id: &str) -> Option<ScenarioOverride> {
        self.apply_scenario(self.carrying.get(row_id))
    }

    pub fn build_cost_for(&self) -> Option<ScenarioOverride> {
        self.apply_scenario(self.build_cost.as_ref())
    }

    fn apply_scenario(&self, found: Option<&ScenarioOverride>) -> Option<ScenarioOverride> {
        match (self.scenario, found) {
            (Some(s), Some(o)) => Some(o.with_scenario(s)),
            (_, found) => found.cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_explicit_months_win_over_dates() {
        let project = ProjectDetail {
            general: GeneralInfo {
                closing_date: Some("2026-01-01".into()),
                leasing_start_date: Some("2027-01-01".into()),
                leasing_start_month: Some(20),
                stabilized_date: Some("2028-01-01".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut warnings = Vec::new();
        let offsets = project.lease_up(&mut warnings);
        assert_eq!(offsets.leasing_start, Some(20));
        assert_eq!(offsets.stabilized, Some(24));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_reversed_dates_are_clamped() {
        let project = ProjectDetail {
            general: GeneralInfo {
                closing_date: Some("2026-01-01".into()),
                leasing_start_date: Some("2027-07-01".into()),
                stabilized_date: Some("2027-01-01".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut warnings = Vec::new();
        let offsets = project.lease_up(&mut warnings);
        assert_eq!(offsets.leasing_start, Some(18));
        assert_eq!(offsets.stabilized, Some(30));
        assert!(offsets.clamped);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_explicit_month_skips_its_date() {
        let project = ProjectDetail {
            general: GeneralInfo {
                closing_date: Some("2026-01-01".into()),
                leasing_start_month: Some(6),
                leasing_start_date: Some("garbage".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut warnings = Vec::new();
        let offsets = project.lease_up(&mut warnings);
        assert_eq!(offsets.leasing_start, Some(6));
        assert_eq!(offsets.stabilized, None);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_bad_date_becomes_warning() {
        let project = ProjectDetail {
            general: GeneralInfo {
                closing_date: Some("not a date".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut warnings = Vec::new();
        assert!(project.closing_date(&mut warnings).is_none());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_forcing_creates_revenue_override() {
        let overrides = ScenarioOverrides::default().forcing(Scenario::Bc);
        let o = overrides.revenue_for("missing").unwrap();
        assert_eq!(o.scenario, Scenario::Bc);
        assert!(overrides.carrying_for("missing").is_none());
    }

    #[test]
    fn test_forcing_keeps_override_values() {
        let mut overrides = ScenarioOverrides::default();
        overrides.carrying.insert(
            "tax".into(),
            ScenarioOverride {
                wc: Some(dec!(500)),
                bc: None,
                scenario: Scenario::Default,
            },
        );
        let forced = overrides.forcing(Scenario::Wc);
        let o = forced.carrying_for("tax").unwrap();
        assert_eq!(o.scenario, Scenario::Wc);
        assert_eq!(o.wc, Some(dec!(500)));
    }
}
