//! Shipyard configuration - composition rules plus session and generator knobs

use serde::{Deserialize, Serialize};
use shipwright_logic::config::CompositionRules;
use shipwright_logic::constants::MAX_COMPARTMENT_COUNT;

/// Configuration for a design session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipyardConfig {
    pub rules: CompositionRules,
    /// Trading area used for price quotes
    pub trading_area: String,
    /// Fewest compartments a generated design gets
    pub min_compartments: usize,
    /// Most compartments a generated design gets
    pub max_compartments: usize,
    /// Chance (0..1) that the generator fills a module slot
    pub module_fill_chance: f64,
    /// Chance (0..1) that the generator fills an equipment slot
    pub equipment_fill_chance: f64,
}

impl Default for ShipyardConfig {
    fn default() -> Self {
        Self {
            rules: CompositionRules::default(),
            trading_area: "station.orbital".to_string(),
            min_compartments: 2,
            max_compartments: 5,
            module_fill_chance: 0.6,
            equipment_fill_chance: 0.5,
        }
    }
}

impl ShipyardConfig {
    /// Parse a configuration; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Problems with the generator knobs, empty when the config is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.min_compartments == 0 {
            issues.push("min_compartments must be at least 1".to_string());
        }
        if self.min_compartments > self.max_compartments {
            issues.push(format!(
                "min_compartments ({}) exceeds max_compartments ({})",
                self.min_compartments, self.max_compartments
            ));
        }
        if self.max_compartments > MAX_COMPARTMENT_COUNT {
            issues.push(format!(
                "max_compartments ({}) exceeds the structural limit of {}",
                self.max_compartments, MAX_COMPARTMENT_COUNT
            ));
        }
        for (name, chance) in [
            ("module_fill_chance", self.module_fill_chance),
            ("equipment_fill_chance", self.equipment_fill_chance),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                issues.push(format!("{} must be within 0..1, got {}", name, chance));
            }
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ShipyardConfig::default().validate().is_empty());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ShipyardConfig::from_json(r#"{ "trading_area": "station.belt", "rules": { "minimum_delta_v": 250.0 } }"#)
            .unwrap();
        assert_eq!(config.trading_area, "station.belt");
        assert_eq!(config.rules.minimum_delta_v, 250.0);
        assert_eq!(config.rules.standard_gravity, 9.81, "unset rule keeps its default");
        assert_eq!(config.max_compartments, 5);
    }

    #[test]
    fn test_validate_reports_each_problem() {
        let config = ShipyardConfig {
            min_compartments: 12,
            max_compartments: 11,
            module_fill_chance: 1.5,
            ..ShipyardConfig::default()
        };
        let issues = config.validate();
        assert_eq!(issues.len(), 3, "{:?}", issues);
    }
}
