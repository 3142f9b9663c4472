use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::coerce;
use crate::types::{Money, Percent, Scenario};

/// Vacancy assumed when a row leaves it blank.
pub const DEFAULT_VACANCY_PCT: Decimal = dec!(5);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which rent roll a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevenueKind {
    Apartment,
    Retail,
    Parking,
}

impl RevenueKind {
    /// Base rent field for this kind: parking rows price per space.
    fn base_rent(&self, row: &RevenueLineRow) -> Option<Money> {
        match self {
            RevenueKind::Apartment | RevenueKind::Retail => row.rent_budget,
            RevenueKind::Parking => row.monthly_rent_usd,
        }
    }
}

/// Baseline economics of one unit type (apartments, retail bays, parking).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevenueLineRow {
    #[serde(default, deserialize_with = "coerce::de_id")]
    pub id: String,
    /// Unit type, e.g. "1BR", "Ground floor retail", "Covered"
    #[serde(
        default,
        alias = "unit_type",
        alias = "parking_type",
        deserialize_with = "coerce::de_opt_text"
    )]
    pub type_label: Option<String>,
    /// Units (or parking spaces) of this type
    #[serde(default, alias = "space_count", deserialize_with = "coerce::de_amount")]
    pub unit_count: Decimal,
    /// Vacancy percent (5 = 5%); defaults to 5
    #[serde(default, deserialize_with = "coerce::de_opt_amount")]
    pub vacancy_pct: Option<Percent>,
    /// First month (0-based) the units can earn
    #[serde(default, deserialize_with = "coerce::de_month")]
    pub start_month: u32,
    /// Monthly rent per unit (apartment / retail)
    #[serde(default, deserialize_with = "coerce::de_opt_amount")]
    pub rent_budget: Option<Money>,
    /// Monthly rent per space (parking)
    #[serde(default, deserialize_with = "coerce::de_opt_amount")]
    pub monthly_rent_usd: Option<Money>,
}

/// Caller-held WC/BC rents and occupancy for one row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevenueOverride {
    #[serde(default, deserialize_with = "coerce::de_opt_amount")]
    pub monthly_rent_wc: Option<Money>,
    #[serde(default, deserialize_with = "coerce::de_opt_amount")]
    pub monthly_rent_bc: Option<Money>,
    /// Occupancy percent; defaults to 100 - vacancy
    #[serde(default, deserialize_with = "coerce::de_opt_amount")]
    pub occupancy: Option<Percent>,
    #[serde(default, deserialize_with = "coerce::de_scenario")]
    pub scenario: Scenario,
}

impl RevenueOverride {
    pub fn with_scenario(&self, scenario: Scenario) -> Self {
        Self {
            scenario,
            ..self.clone()
        }
    }
}

/// Stabilized monthly revenue of one row under its scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueLine {
    pub row_id: String,
    pub kind: RevenueKind,
    pub type_label: String,
    pub units: Decimal,
    pub start_month: u32,
    pub rent_default: Money,
    pub rent_wc: Money,
    pub rent_bc: Money,
    /// Rent picked by `scenario`
    pub rent: Money,
    pub occupancy: Percent,
    pub scenario: Scenario,
    /// units * rent * occupancy / 100
    pub monthly: Money,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Turn a rent-roll row plus its override into a monthly revenue figure.
///
/// A zero WC/BC rent override is treated as blank and falls back to the
/// row's base rent.
pub fn compute_revenue_line(
    kind: RevenueKind,
    row: &RevenueLineRow,
    over: Option<&RevenueOverride>,
) -> RevenueLine {
    let rent_default = kind.base_rent(row).unwrap_or(Decimal::ZERO);

    let non_zero_or_default = |v: Option<Money>| match v {
        Some(x) if !x.is_zero() => x,
        _ => rent_default,
    };
    let rent_wc = non_zero_or_default(over.and_then(|o| o.monthly_rent_wc));
    let rent_bc = non_zero_or_default(over.and_then(|o| o.monthly_rent_bc));

    let scenario = over.map(|o| o.scenario).unwrap_or_default();
    let rent = match scenario {
        Scenario::Wc => rent_wc,
        Scenario::Default => rent_default,
        Scenario::Bc => rent_bc,
    };

    let vacancy = row.vacancy_pct.unwrap_or(DEFAULT_VACANCY_PCT);
    let occupancy = coerce::clamp_percent(
        over.and_then(|o| o.occupancy)
            .unwrap_or(dec!(100) - vacancy),
    );

    let monthly = row.unit_count * rent * occupancy / dec!(100);

    RevenueLine {
        row_id: row.id.clone(),
        kind,
        type_label: row.type_label.clone().unwrap_or_default(),
        units: row.unit_count,
        start_month: row.start_month,
        rent_default,
        rent_wc,
        rent_bc,
        rent,
        occupancy,
        scenario,
        monthly,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apartment_row() -> RevenueLineRow {
        RevenueLineRow {
            id: "a1".into(),
            type_label: Some("2BR".into()),
            unit_count: dec!(10),
            vacancy_pct: Some(dec!(5)),
            start_month: 0,
            rent_budget: Some(dec!(1000)),
            monthly_rent_usd: None,
        }
    }

    #[test]
    fn test_default_scenario_apartment() {
        let line = compute_revenue_line(RevenueKind::Apartment, &apartment_row(), None);
        // 10 * 1000 * 0.95
        assert_eq!(line.monthly, dec!(9500));
        assert_eq!(line.occupancy, dec!(95));
        assert_eq!(line.rent, dec!(1000));
        assert_eq!(line.scenario, Scenario::Default);
    }

    #[test]
    fn test_missing_vacancy_defaults_to_five() {
        let mut row = apartment_row();
        row.vacancy_pct = None;
        let line = compute_revenue_line(RevenueKind::Apartment, &row, None);
        assert_eq!(line.occupancy, dec!(95));
    }

    #[test]
    fn test_parking_uses_monthly_rent_usd() {
        let row = RevenueLineRow {
            id: "p1".into(),
            unit_count: dec!(40),
            vacancy_pct: Some(dec!(0)),
            rent_budget: Some(dec!(999)),
            monthly_rent_usd: Some(dec!(75)),
            ..Default::default()
        };
        let line = compute_revenue_line(RevenueKind::Parking, &row, None);
        assert_eq!(line.rent_default, dec!(75));
        assert_eq!(line.monthly, dec!(3000));
    }

    #[test]
    fn test_missing_rent_is_zero() {
        let mut row = apartment_row();
        row.rent_budget = None;
        let line = compute_revenue_line(RevenueKind::Retail, &row, None);
        assert_eq!(line.rent_default, Decimal::ZERO);
        assert_eq!(line.monthly, Decimal::ZERO);
    }

    #[test]
    fn test_wc_and_bc_rents() {
        let over = RevenueOverride {
            monthly_rent_wc: Some(dec!(900)),
            monthly_rent_bc: Some(dec!(1100)),
            occupancy: Some(dec!(90)),
            scenario: Scenario::Wc,
        };
        let line = compute_revenue_line(RevenueKind::Apartment, &apartment_row(), Some(&over));
        assert_eq!(line.rent, dec!(900));
        assert_eq!(line.monthly, dec!(8100));

        let over = over.with_scenario(Scenario::Bc);
        let line = compute_revenue_line(RevenueKind::Apartment, &apartment_row(), Some(&over));
        assert_eq!(line.rent, dec!(1100));
        assert_eq!(line.monthly, dec!(9900));
    }

    #[test]
    fn test_zero_override_falls_back_to_base_rent() {
        let over = RevenueOverride {
            monthly_rent_wc: Some(Decimal::ZERO),
            scenario: Scenario::Wc,
            ..Default::default()
        };
        let line = compute_revenue_line(RevenueKind::Apartment, &apartment_row(), Some(&over));
        assert_eq!(line.rent_wc, dec!(1000));
        assert_eq!(line.rent, dec!(1000));
    }

    #[test]
    fn test_occupancy_override_is_clamped() {
        let over = RevenueOverride {
            occupancy: Some(dec!(130)),
            ..Default::default()
        };
        let line = compute_revenue_line(RevenueKind::Apartment, &apartment_row(), Some(&over));
        assert_eq!(line.occupancy, dec!(100));
        assert_eq!(line.monthly, dec!(10000));

        let over = RevenueOverride {
            occupancy: Some(dec!(-20)),
            ..Default::default()
        };
        let line = compute_revenue_line(RevenueKind::Apartment, &apartment_row(), Some(&over));
        assert_eq!(line.occupancy, Decimal::ZERO);
        assert_eq!(line.monthly, Decimal::ZERO);
    }

    #[test]
    fn test_row_deserializes_leniently() {
        let row: RevenueLineRow = serde_json::from_value(serde_json::json!({
            "id": 17,
            "unit_type": "Studio",
            "unit_count": "12",
            "vacancy_pct": "",
            "start_month": "3",
            "rent_budget": "$1,450"
        }))
        .unwrap();
        assert_eq!(row.id, "17");
        assert_eq!(row.unit_count, dec!(12));
        assert_eq!(row.vacancy_pct, None);
        assert_eq!(row.start_month, 3);
        assert_eq!(row.rent_budget, Some(dec!(1450)));
    }

    #[test]
    fn test_oversized_row_values_coerce_to_zero() {
        let row: RevenueLineRow = serde_json::from_value(serde_json::json!({
            "id": "huge",
            "unit_count": "100000000000000000000",
            "rent_budget": "100000000000000000000"
        }))
        .unwrap();
        assert_eq!(row.unit_count, Decimal::ZERO);
        assert_eq!(row.rent_budget, Some(Decimal::ZERO));
        let line = compute_revenue_line(RevenueKind::Apartment, &row, None);
        assert_eq!(line.monthly, Decimal::ZERO);
    }

    #[test]
    fn test_largest_accepted_values_do_not_overflow() {
        let row = RevenueLineRow {
            unit_count: coerce::MAX_INPUT_MAGNITUDE,
            rent_budget: Some(coerce::MAX_INPUT_MAGNITUDE),
            vacancy_pct: Some(Decimal::ZERO),
            ..apartment_row()
        };
        let line = compute_revenue_line(RevenueKind::Apartment, &row, None);
        assert_eq!(line.monthly, dec!(100000000000000000000));
    }

    #[test]
    fn test_override_scenario_is_lenient() {
        let over: RevenueOverride = serde_json::from_value(serde_json::json!({
            "monthly_rent_wc": "900",
            "scenario": "WC"
        }))
        .unwrap();
        assert_eq!(over.scenario, Scenario::Wc);
        let line = compute_revenue_line(RevenueKind::Apartment, &apartment_row(), Some(&over));
        assert_eq!(line.rent, dec!(900));

        let over: RevenueOverride =
            serde_json::from_value(serde_json::json!({ "scenario": null })).unwrap();
        assert_eq!(over.scenario, Scenario::Default);
    }
}
