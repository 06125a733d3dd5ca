//! Tunable composition rules.
//!
//! Every algorithm that depends on a game-balance constant takes a
//! `&CompositionRules` instead of reading a global, so alternative rule sets
//! can be tested side by side.

use serde::{Deserialize, Serialize};

/// Balance constants for propulsion, validation and pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionRules {
    /// Standard gravity used to turn specific impulse into exhaust velocity (m/s²).
    pub standard_gravity: f64,
    /// Capacity multiplier for a module that continues identically into the
    /// next compartment (the shared skirt adds volume).
    pub skirt_capacity_multiplier: f64,
    /// Minimum delta-v (m/s) for a design to be considered flyable.
    pub minimum_delta_v: f64,
    /// Flat paint cost charged per compartment when customization changes.
    pub paint_cost_per_compartment: f64,
    /// Cargo capacity (tonnes) from which a design is a heavy freighter.
    pub heavy_freighter_cargo: f64,
}

impl Default for CompositionRules {
    fn default() -> Self {
        Self {
            standard_gravity: 9.81,
            skirt_capacity_multiplier: 2.0,
            minimum_delta_v: 100.0,
            paint_cost_per_compartment: 10.0,
            heavy_freighter_cargo: 500.0,
        }
    }
}
