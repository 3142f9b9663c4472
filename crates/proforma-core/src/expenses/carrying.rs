use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::time::Instant;

use crate::assumptions::validate_horizon;
use crate::coerce;
use crate::project::ScenarioOverrides;
use crate::types::{
    select_scenario_value, with_metadata, ComputationOutput, Money, DEFAULT_HORIZON_MONTHS,
};
use crate::ProFormaResult;

const DEFAULT_CONSTRUCTION_MONTHS: u32 = 24;

fn default_construction_months() -> u32 {
    DEFAULT_CONSTRUCTION_MONTHS
}

fn default_horizon() -> u32 {
    DEFAULT_HORIZON_MONTHS
}

fn de_construction_months<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    Ok(coerce::opt_month(&Value::deserialize(d)?).unwrap_or(DEFAULT_CONSTRUCTION_MONTHS))
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Billing interval of a cost row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalUnit {
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl IntervalUnit {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "monthly" | "month" => Some(IntervalUnit::Monthly),
            "quarterly" | "quarter" => Some(IntervalUnit::Quarterly),
            "yearly" | "year" | "annual" | "annually" => Some(IntervalUnit::Yearly),
            _ => None,
        }
    }

    /// Months covered by one billed amount.
    pub fn months(&self) -> Decimal {
        match self {
            IntervalUnit::Monthly => Decimal::ONE,
            IntervalUnit::Quarterly => dec!(3),
            IntervalUnit::Yearly => dec!(12),
        }
    }
}

/// Project phase a cost belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxPhase {
    Construction,
    Stabilized,
}

impl TaxPhase {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "construction" => Some(TaxPhase::Construction),
            "stabilized" | "stabilised" | "operating" => Some(TaxPhase::Stabilized),
            _ => None,
        }
    }
}

/// Carrying cost category used for the summary totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarryingType {
    Management,
    PropertyTax,
    Insurance,
    Utilities,
    Maintenance,
    #[default]
    Other,
}

impl CarryingType {
    fn parse(raw: &str) -> Self {
        let key = raw.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match key.as_str() {
            k if k.contains("management") => CarryingType::Management,
            "property_tax" | "real_estate_tax" | "re_tax" | "tax" | "taxes" => {
                CarryingType::PropertyTax
            }
            k if k.contains("insurance") => CarryingType::Insurance,
            k if k.contains("utilit") => CarryingType::Utilities,
            k if k.contains("maint") || k.contains("repair") => CarryingType::Maintenance,
            _ => CarryingType::Other,
        }
    }
}

/// One interval-based cost row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CarryingCostRow {
    #[serde(default, deserialize_with = "coerce::de_id")]
    pub id: String,
    #[serde(default, deserialize_with = "de_carrying_type")]
    pub carrying_type: CarryingType,
    #[serde(default, deserialize_with = "coerce::de_opt_text")]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "coerce::de_amount")]
    pub amount_usd: Money,
    /// Missing or unrecognised intervals bill monthly
    #[serde(default, deserialize_with = "de_interval")]
    pub interval_unit: Option<IntervalUnit>,
    #[serde(default, deserialize_with = "de_phase")]
    pub property_tax_phase: Option<TaxPhase>,
    #[serde(default, deserialize_with = "coerce::de_opt_text")]
    pub cost_group: Option<String>,
    /// First month (0-based, inclusive) the cost applies
    #[serde(default, deserialize_with = "coerce::de_opt_month")]
    pub start_month: Option<u32>,
    /// Last month (0-based, inclusive) the cost applies
    #[serde(default, deserialize_with = "coerce::de_opt_month")]
    pub end_month: Option<u32>,
}

/// Monthly-equivalent view of one cost row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarryingLine {
    pub row_id: String,
    pub carrying_type: CarryingType,
    pub label: String,
    /// `None` for rows that apply in every phase
    pub phase: Option<TaxPhase>,
    pub interval_unit: IntervalUnit,
    pub base_monthly: Money,
    /// Monthly figure after scenario selection
    pub monthly: Money,
    pub annual: Money,
    pub start_month: Option<u32>,
    pub end_month: Option<u32>,
}

/// Category totals of all carrying rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarryingSummary {
    pub lines: Vec<CarryingLine>,
    pub management_monthly: Money,
    pub property_tax_construction_monthly: Money,
    pub property_tax_stabilized_monthly: Money,
    pub other_monthly: Money,
    /// Every row not scoped to construction
    pub operating_monthly: Money,
    pub operating_annual: Money,
    /// Rows scoped to the construction phase
    pub construction_monthly: Money,
}

/// Month-by-month carrying costs over the horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarryingSeries {
    pub operating: Vec<Money>,
    pub construction: Vec<Money>,
}

/// Carrying-cost rows with the phase boundaries needed to lay them out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarryingInput {
    #[serde(default, deserialize_with = "coerce::de_or_default")]
    pub carrying_costs: Vec<CarryingCostRow>,
    #[serde(default, deserialize_with = "coerce::de_or_default")]
    pub overrides: ScenarioOverrides,
    #[serde(
        default = "default_construction_months",
        deserialize_with = "de_construction_months"
    )]
    pub construction_period_months: u32,
    #[serde(default = "default_horizon", deserialize_with = "coerce::de_horizon")]
    pub horizon_months: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarryingReport {
    pub summary: CarryingSummary,
    pub construction_period_tax: Money,
    pub series: CarryingSeries,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Monthly equivalent of a row's billed amount.
pub fn to_monthly_amount(row: &CarryingCostRow) -> Money {
    row.amount_usd / row.interval_unit.unwrap_or_default().months()
}

/// Phase of a property-tax row: explicit phase, then a "construction"
/// cost group, then stabilized.
pub fn get_property_tax_phase(row: &CarryingCostRow) -> TaxPhase {
    if let Some(phase) = row.property_tax_phase {
        return phase;
    }
    if cost_group_is_construction(row) {
        TaxPhase::Construction
    } else {
        TaxPhase::Stabilized
    }
}

/// Phase scoping of any row. Property tax always has a phase; other rows
/// only when tagged explicitly or grouped under construction.
pub fn row_phase(row: &CarryingCostRow) -> Option<TaxPhase> {
    if row.carrying_type == CarryingType::PropertyTax
        || row.property_tax_phase.is_some()
        || cost_group_is_construction(row)
    {
        Some(get_property_tax_phase(row))
    } else {
        None
    }
}

fn cost_group_is_construction(row: &CarryingCostRow) -> bool {
    row.cost_group
        .as_deref()
        .is_some_and(|g| g.to_ascii_lowercase().contains("construction"))
}

/// Price every row under its scenario and total by category.
pub fn summarize_carrying_costs(
    rows: &[CarryingCostRow],
    overrides: &ScenarioOverrides,
) -> CarryingSummary {
    let lines: Vec<CarryingLine> = rows
        .iter()
        .map(|row| {
            let base_monthly = to_monthly_amount(row);
            let over = overrides.carrying_for(&row.id);
            let monthly = select_scenario_value(over.as_ref(), base_monthly);
            CarryingLine {
                row_id: row.id.clone(),
                carrying_type: row.carrying_type,
                label: row.label.clone().unwrap_or_default(),
                phase: row_phase(row),
                interval_unit: row.interval_unit.unwrap_or_default(),
                base_monthly,
                monthly,
                annual: monthly * dec!(12),
                start_month: row.start_month,
                end_month: row.end_month,
            }
        })
        .collect();

    let mut summary = CarryingSummary {
        lines: Vec::new(),
        management_monthly: Decimal::ZERO,
        property_tax_construction_monthly: Decimal::ZERO,
        property_tax_stabilized_monthly: Decimal::ZERO,
        other_monthly: Decimal::ZERO,
        operating_monthly: Decimal::ZERO,
        operating_annual: Decimal::ZERO,
        construction_monthly: Decimal::ZERO,
    };

    for line in &lines {
        match (line.carrying_type, line.phase) {
            (CarryingType::Management, _) => summary.management_monthly += line.monthly,
            (CarryingType::PropertyTax, Some(TaxPhase::Construction)) => {
                summary.property_tax_construction_monthly += line.monthly
            }
            (CarryingType::PropertyTax, _) => {
                summary.property_tax_stabilized_monthly += line.monthly
            }
            _ => summary.other_monthly += line.monthly,
        }
        if line.phase == Some(TaxPhase::Construction) {
            summary.construction_monthly += line.monthly;
        } else {
            summary.operating_monthly += line.monthly;
        }
    }

    summary.operating_annual = summary.operating_monthly * dec!(12);
    summary.lines = lines;
    summary
}

/// Construction-phase property tax accrued over the construction period.
pub fn construction_period_tax(summary: &CarryingSummary, construction_months: u32) -> Money {
    summary.property_tax_construction_monthly * Decimal::from(construction_months)
}

/// Spread each row over the months it applies to.
///
/// Construction rows default to months `[0, construction_months)`,
/// stabilized rows to the months after, unscoped rows to the whole horizon.
/// An explicit `start_month` / `end_month` replaces the matching bound.
pub fn carrying_monthly_series(
    summary: &CarryingSummary,
    construction_months: u32,
    horizon: u32,
) -> CarryingSeries {
    let mut series = CarryingSeries {
        operating: vec![Decimal::ZERO; horizon as usize],
        construction: vec![Decimal::ZERO; horizon as usize],
    };

    for line in &summary.lines {
        let (default_start, default_end) = match line.phase {
            Some(TaxPhase::Construction) => (0, Some(construction_months)),
            Some(TaxPhase::Stabilized) => (construction_months, None),
            None => (0, None),
        };
        let first = line.start_month.unwrap_or(default_start);
        let end_exclusive = line
            .end_month
            .map(|m| m.saturating_add(1))
            .or(default_end)
            .unwrap_or(horizon)
            .min(horizon);

        let bucket = if line.phase == Some(TaxPhase::Construction) {
            &mut series.construction
        } else {
            &mut series.operating
        };
        for month in first..end_exclusive {
            bucket[month as usize] += line.monthly;
        }
    }

    series
}

// ---------------------------------------------------------------------------
// Lenient enum parsing
// ---------------------------------------------------------------------------

fn de_interval<'de, D: Deserializer<'de>>(d: D) -> Result<Option<IntervalUnit>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => IntervalUnit::parse(&s),
        _ => None,
    })
}

fn de_phase<'de, D: Deserializer<'de>>(d: D) -> Result<Option<TaxPhase>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => TaxPhase::parse(&s),
        _ => None,
    })
}

fn de_carrying_type<'de, D: Deserializer<'de>>(d: D) -> Result<CarryingType, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => CarryingType::parse(&s),
        _ => CarryingType::Other,
    })
}

/// Summarise, lay out and wrap carrying costs in the standard envelope.
///
/// The horizon must be `1..=600` months.
pub fn calculate_carrying_costs(
    input: &CarryingInput,
) -> ProFormaResult<ComputationOutput<CarryingReport>> {
    validate_horizon(input.horizon_months)?;
    let start = Instant::now();
    let mut warnings = Vec::new();

    let summary = summarize_carrying_costs(&input.carrying_costs, &input.overrides);
    for line in &summary.lines {
        if line.base_monthly < Decimal::ZERO {
            warnings.push(format!("Row '{}' has a negative amount", line.row_id));
        }
        if let (Some(s), Some(e)) = (line.start_month, line.end_month) {
            if e < s {
                warnings.push(format!(
                    "Row '{}' ends (month {e}) before it starts (month {s}); it never applies",
                    line.row_id
                ));
            }
        }
    }

    let construction_period_tax =
        construction_period_tax(&summary, input.construction_period_months);
    let series =
        carrying_monthly_series(&summary, input.construction_period_months, input.horizon_months);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Carrying Costs (monthly equivalents by phase)",
        &serde_json::json!({
            "construction_period_months": input.construction_period_months,
            "horizon_months": input.horizon_months,
        }),
        warnings,
        elapsed,
        CarryingReport {
            summary,
            construction_period_tax,
            series,
        },
    ))
}
