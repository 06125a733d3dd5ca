//! Market price table - the JSON-backed [`PriceService`] used for refit quotes

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shipwright_logic::catalog::PartId;
use shipwright_logic::pricing::{Credits, PriceService};

/// Base prices with a resale ratio and per-area modifiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceTable {
    /// Buy price per part in a neutral trading area
    pub base_prices: BTreeMap<PartId, Credits>,
    /// Fraction of the buy price paid back when selling
    pub sell_ratio: f64,
    /// Price multiplier per trading area; unlisted areas use 1.0
    pub area_modifiers: BTreeMap<String, f64>,
    /// Price of parts missing from `base_prices`
    pub default_price: Credits,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self {
            base_prices: BTreeMap::new(),
            sell_ratio: 0.75,
            area_modifiers: BTreeMap::new(),
            default_price: 0.0,
        }
    }
}

impl PriceTable {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn set_price(&mut self, part: impl Into<PartId>, price: Credits) {
        self.base_prices.insert(part.into(), price);
    }

    pub fn area_modifier(&self, area: &str) -> f64 {
        self.area_modifiers.get(area).copied().unwrap_or(1.0)
    }
}

impl PriceService for PriceTable {
    fn price(&self, part: &PartId, area: &str, selling: bool) -> Credits {
        let base = self.base_prices.get(part).copied().unwrap_or(self.default_price);
        let price = base * self.area_modifier(area);
        if selling {
            price * self.sell_ratio
        } else {
            price
        }
    }
}
