//! Upgrade pricing — cost of turning one design into another.
//!
//! Both designs are walked part by part (compartment, hull, modules,
//! equipment). Candidate parts count +1 and current parts count −1 in a
//! per-part delta map, so parts kept across the refit cancel out. Net
//! additions are bought, net removals are sold back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::assembly::{Assembly, Compartment};
use crate::catalog::PartId;
use crate::config::CompositionRules;

/// Currency amount.
pub type Credits = f64;

/// Market price lookup.
pub trait PriceService {
    /// Price of `part` in trading `area`; `selling` asks for the resale price.
    fn price(&self, part: &PartId, area: &str, selling: bool) -> Credits;
}

/// Quote for a refit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UpgradeCost {
    /// Price of building the candidate from nothing.
    pub total_cost_as_new: Credits,
    /// `total_cost_as_new + paint_cost`.
    pub total_cost: Credits,
    pub paint_cost: Credits,
    /// Parts bought for the refit.
    pub upgrade_cost: Credits,
    /// Parts sold back during the refit.
    pub resale_gain: Credits,
    /// `upgrade_cost + paint_cost - resale_gain`.
    pub total_change_cost: Credits,
}

fn compartment_parts(compartment: &Compartment) -> impl Iterator<Item = &PartId> {
    compartment
        .description()
        .into_iter()
        .chain(compartment.hull())
        .chain(compartment.modules().iter().filter_map(|slot| slot.module()))
        .chain(compartment.equipment().iter().flatten())
}

/// Price the refit from `current` to `candidate` in trading `area`.
pub fn upgrade_cost(
    current: &Assembly,
    candidate: &Assembly,
    prices: &dyn PriceService,
    area: &str,
    rules: &CompositionRules,
) -> UpgradeCost {
    let mut cost = UpgradeCost::default();
    let mut deltas: BTreeMap<&PartId, i32> = BTreeMap::new();

    for part in candidate.compartments().iter().flat_map(compartment_parts) {
        *deltas.entry(part).or_default() += 1;
        cost.total_cost_as_new += prices.price(part, area, false);
    }
    for part in current.compartments().iter().flat_map(compartment_parts) {
        *deltas.entry(part).or_default() -= 1;
    }

    if candidate.customization() != current.customization() {
        cost.paint_cost = rules.paint_cost_per_compartment * candidate.compartment_count() as f64;
    }

    for (part, delta) in deltas {
        if delta > 0 {
            cost.upgrade_cost += delta as f64 * prices.price(part, area, false);
        } else if delta < 0 {
            cost.resale_gain += (-delta) as f64 * prices.price(part, area, true);
        }
    }

    cost.total_cost = cost.total_cost_as_new + cost.paint_cost;
    cost.total_change_cost = cost.upgrade_cost + cost.paint_cost - cost.resale_gain;
    cost
}
