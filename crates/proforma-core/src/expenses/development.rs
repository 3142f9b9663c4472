use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::coerce;
use crate::project::{ProjectDetail, ScenarioOverrides};
use crate::types::{select_scenario_value, Money};

/// One hard (construction) cost line item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HardCostRow {
    #[serde(default, deserialize_with = "coerce::de_id")]
    pub id: String,
    #[serde(default, alias = "category", deserialize_with = "coerce::de_opt_text")]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "coerce::de_amount")]
    pub amount_usd: Money,
}

/// One soft cost line item (fees, permits, design).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoftCostRow {
    #[serde(default, deserialize_with = "coerce::de_id")]
    pub id: String,
    #[serde(default, alias = "category", deserialize_with = "coerce::de_opt_text")]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "coerce::de_amount")]
    pub amount_usd: Money,
}

/// How the hard-cost figure was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HardCostBasis {
    /// Build cost per sqft times buildable sqft
    PerSqft,
    /// Sum of hard-cost line items
    LineItems,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevelopmentBudget {
    pub purchase_price: Money,
    pub target_sqft: Decimal,
    /// Build cost per sqft after scenario selection
    pub build_cost_per_sqft: Money,
    pub hard_cost_line_items: Money,
    pub hard_cost_basis: HardCostBasis,
    pub hard_costs: Money,
    pub soft_costs: Money,
    /// Hard plus soft costs
    pub development_costs: Money,
    /// Purchase price plus development costs
    pub total_project_cost: Money,
}

/// Total the development budget.
///
/// Hard costs come from the selected build cost per sqft when both it and the
/// buildable area are positive, otherwise from the hard-cost line items.
pub fn development_budget(project: &ProjectDetail, overrides: &ScenarioOverrides) -> DevelopmentBudget {
    let general = &project.general;
    let base_psf = general.build_cost_per_sqft.unwrap_or(Decimal::ZERO);
    let build_cost_per_sqft = select_scenario_value(overrides.build_cost_for().as_ref(), base_psf);

    let hard_cost_line_items: Money = project.hard_costs.iter().map(|r| r.amount_usd).sum();
    let soft_costs: Money = project.soft_costs.iter().map(|r| r.amount_usd).sum();

    let (hard_cost_basis, hard_costs) =
        if general.target_sqft > Decimal::ZERO && build_cost_per_sqft > Decimal::ZERO {
            (HardCostBasis::PerSqft, build_cost_per_sqft * general.target_sqft)
        } else {
            (HardCostBasis::LineItems, hard_cost_line_items)
        };

    let development_costs = hard_costs + soft_costs;

    DevelopmentBudget {
        purchase_price: general.purchase_price_usd,
        target_sqft: general.target_sqft,
        build_cost_per_sqft,
        hard_cost_line_items,
        hard_cost_basis,
        hard_costs,
        soft_costs,
        development_costs,
        total_project_cost: general.purchase_price_usd + development_costs,
    }
}
