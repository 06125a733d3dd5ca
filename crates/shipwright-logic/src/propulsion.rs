//! Propulsion performance — mass budget, thrust and the rocket equation.
//!
//! Per compartment, dry mass is the structure plus every mounted module and
//! equipment. Propellant and cargo capacities are multiplied by
//! [`CompositionRules::skirt_capacity_multiplier`] when the module continues
//! identically into the next compartment. The assembly totals then feed the
//! Tsiolkovsky equation:
//!
//! ```text
//! isp  = Σ(isp·thrust) / Σthrust
//! ve   = g0 · isp
//! Δv   = ve · ln(m_max / m_dry)
//! burn = m_propellant / (thrust / ve)
//! ```
//!
//! With no engine thrust every derived quantity stays at zero.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::assembly::Assembly;
use crate::catalog::{Catalog, EquipmentKind, ModuleKind};
use crate::config::CompositionRules;

/// Mass and thrust contributed by one compartment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CompartmentMetrics {
    pub module_count: usize,
    pub equipment_count: usize,
    /// Tonnes.
    pub dry_mass: f64,
    /// Tonnes.
    pub propellant_capacity: f64,
    /// Tonnes.
    pub cargo_capacity: f64,
    /// Engine thrust in kN.
    pub thrust: f64,
    /// Σ(isp · thrust) over engines, for thrust-weighted ISP.
    pub total_isp_thrust: f64,
}

impl CompartmentMetrics {
    /// Metrics of the compartment at `index`. Unoccupied or out-of-range
    /// compartments contribute nothing.
    pub fn compute(assembly: &Assembly, catalog: &dyn Catalog, rules: &CompositionRules, index: usize) -> Self {
        let mut metrics = Self::default();
        let Some(compartment) = assembly.compartment(index) else {
            return metrics;
        };
        let Some(description) = compartment.description().and_then(|id| catalog.compartment(id)) else {
            return metrics;
        };
        metrics.dry_mass = description.mass;

        for (module_index, slot) in compartment.modules().iter().enumerate() {
            let Some(module) = slot.module().and_then(|id| catalog.module(id)) else {
                continue;
            };
            metrics.module_count += 1;
            metrics.dry_mass += module.mass;

            let multiplier = if assembly.is_same_module_in_next_compartment(catalog, index, module_index) {
                rules.skirt_capacity_multiplier
            } else {
                1.0
            };
            match module.kind {
                ModuleKind::Propellant { propellant_mass } => {
                    metrics.propellant_capacity += propellant_mass * multiplier;
                }
                ModuleKind::Cargo { cargo_mass, .. } => {
                    metrics.cargo_capacity += cargo_mass * multiplier;
                }
                ModuleKind::Processing { .. } => {}
            }
        }

        for equipment in compartment.equipment().iter().flatten() {
            let Some(equipment) = catalog.equipment(equipment) else {
                continue;
            };
            metrics.equipment_count += 1;
            metrics.dry_mass += equipment.mass;

            match equipment.kind {
                EquipmentKind::Engine {
                    thrust,
                    specific_impulse,
                } => {
                    metrics.thrust += thrust;
                    metrics.total_isp_thrust += specific_impulse * thrust;
                }
                EquipmentKind::PropellantTank { propellant_mass } => {
                    metrics.propellant_capacity += propellant_mass;
                }
                _ => {}
            }
        }

        metrics
    }

    /// One-line human-readable description.
    pub fn summary(&self) -> String {
        format!(
            "{} modules, {} equipment, {:.1}T dry, {:.1}T propellant, {:.1}T cargo, {:.1}kN thrust",
            self.module_count,
            self.equipment_count,
            self.dry_mass,
            self.propellant_capacity,
            self.cargo_capacity,
            self.thrust
        )
    }
}

/// Assembly-wide propulsion performance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PropulsionMetrics {
    pub dry_mass: f64,
    pub propellant_mass_capacity: f64,
    pub cargo_mass_capacity: f64,
    /// Dry mass plus full propellant and cargo.
    pub maximum_mass: f64,
    pub engine_thrust: f64,
    /// Attitude thruster thrust, not used by the rocket equation.
    pub thruster_thrust: f64,
    /// Seconds.
    pub specific_impulse: f64,
    /// m/s.
    pub exhaust_velocity: f64,
    /// Tonnes per second.
    pub propellant_rate: f64,
    /// m/s, fully loaded.
    pub maximum_delta_v: f64,
    /// Seconds, full tanks at full thrust.
    pub maximum_burn_time: f64,
}

impl PropulsionMetrics {
    /// Delta-v for a specific load instead of full tanks and holds.
    pub fn delta_v_for(&self, cargo_mass: f64, propellant_mass: f64) -> Result<f64, PropulsionError> {
        if self.engine_thrust <= 0.0 {
            return Ok(0.0);
        }
        if self.dry_mass <= 0.0 {
            return Err(PropulsionError::NonPositiveDryMass(self.dry_mass));
        }
        let empty = self.dry_mass + cargo_mass.max(0.0);
        let loaded = empty + propellant_mass.max(0.0);
        Ok(self.exhaust_velocity * (loaded / empty).ln())
    }
}

/// Precondition failure of the propulsion calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropulsionError {
    /// Dry mass must be positive before taking the mass ratio.
    NonPositiveDryMass(f64),
}

impl fmt::Display for PropulsionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropulsionError::NonPositiveDryMass(mass) => {
                write!(f, "dry mass must be positive, got {:.3}T", mass)
            }
        }
    }
}

impl std::error::Error for PropulsionError {}

/// Aggregate every compartment and solve the rocket equation.
pub fn compute_propulsion_metrics(
    assembly: &Assembly,
    catalog: &dyn Catalog,
    rules: &CompositionRules,
) -> Result<PropulsionMetrics, PropulsionError> {
    let mut metrics = PropulsionMetrics::default();
    let mut total_isp_thrust = 0.0;

    for index in 0..assembly.compartment_count() {
        let compartment = CompartmentMetrics::compute(assembly, catalog, rules, index);
        metrics.dry_mass += compartment.dry_mass;
        metrics.propellant_mass_capacity += compartment.propellant_capacity;
        metrics.cargo_mass_capacity += compartment.cargo_capacity;
        metrics.engine_thrust += compartment.thrust;
        total_isp_thrust += compartment.total_isp_thrust;

        for id in assembly.compartments()[index].equipment().iter().flatten() {
            if let Some(EquipmentKind::Thruster { thrust }) = catalog.equipment(id).map(|e| &e.kind) {
                metrics.thruster_thrust += thrust;
            }
        }
    }

    metrics.maximum_mass = metrics.dry_mass + metrics.propellant_mass_capacity + metrics.cargo_mass_capacity;

    if metrics.engine_thrust > 0.0 {
        if metrics.dry_mass <= 0.0 {
            return Err(PropulsionError::NonPositiveDryMass(metrics.dry_mass));
        }
        metrics.specific_impulse = total_isp_thrust / metrics.engine_thrust;
        metrics.exhaust_velocity = rules.standard_gravity * metrics.specific_impulse;
        metrics.propellant_rate = metrics.engine_thrust / metrics.exhaust_velocity;
        metrics.maximum_delta_v = metrics.exhaust_velocity * (metrics.maximum_mass / metrics.dry_mass).ln();
        metrics.maximum_burn_time = metrics.propellant_mass_capacity / metrics.propellant_rate;
    }

    Ok(metrics)
}

/// Commercial class of a design, by cargo capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    Blank,
    Tug,
    LightFreighter,
    HeavyFreighter,
}

impl Classification {
    /// Classify from the last recompute of `assembly`.
    pub fn of(assembly: &Assembly, rules: &CompositionRules) -> Self {
        let cargo = assembly.propulsion_metrics().cargo_mass_capacity;
        if assembly.compartment_count() == 0 {
            Classification::Blank
        } else if cargo == 0.0 {
            Classification::Tug
        } else if cargo < rules.heavy_freighter_cargo {
            Classification::LightFreighter
        } else {
            Classification::HeavyFreighter
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Classification::Blank => "N/A",
            Classification::Tug => "Tug",
            Classification::LightFreighter => "Light freighter",
            Classification::HeavyFreighter => "Heavy freighter",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::*;
    use crate::test_support::{id, sample_catalog};

    /// One compartment whose parts add up to exactly 10T dry, 90T propellant,
    /// 100kN at 300s.
    fn reference_catalog() -> MemoryCatalog {
        vec![
            CatalogEntry::Compartment(CompartmentDescription {
                id: id("compartment.frame"),
                name: "Frame".into(),
                mass: 5.0,
                module_slots: vec![ModuleSlotLayout {
                    socket_name: "module.center".into(),
                    display_name: "Center".into(),
                    supported_equipment: vec![],
                    linked_equipment: vec![],
                    force_skirt_piping: true,
                }],
                equipment_slots: vec![EquipmentSlotLayout {
                    socket_name: "equipment.aft".into(),
                    display_name: "Aft".into(),
                    supported_positions: vec![],
                    paired_slots: vec![],
                }],
                is_forward_compartment: false,
                hull_variants: vec![],
            }),
            CatalogEntry::Module(ModuleDescription {
                id: id("module.tank"),
                name: "Tank".into(),
                mass: 2.0,
                needs_piping: true,
                kind: ModuleKind::Propellant { propellant_mass: 90.0 },
            }),
            CatalogEntry::Equipment(EquipmentDescription {
                id: id("equipment.engine"),
                name: "Engine".into(),
                mass: 3.0,
                requires_pairing: false,
                position: EquipmentPosition::Aft,
                kind: EquipmentKind::Engine {
                    thrust: 100.0,
                    specific_impulse: 300.0,
                },
            }),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_rocket_equation() {
        let catalog = reference_catalog();
        let mut assembly = Assembly::new("Reference");
        assembly.push_compartment(&catalog, Some(id("compartment.frame"))).unwrap();
        assembly.set_module(&catalog, 0, 0, Some(id("module.tank"))).unwrap();
        assembly.set_equipment(&catalog, 0, 0, Some(id("equipment.engine"))).unwrap();

        let metrics = compute_propulsion_metrics(&assembly, &catalog, &CompositionRules::default()).unwrap();
        assert_eq!(metrics.dry_mass, 10.0);
        assert_eq!(metrics.maximum_mass, 100.0);
        assert!((metrics.exhaust_velocity - 2943.0).abs() < 1e-9);
        assert!((metrics.maximum_delta_v - 2943.0 * 10f64.ln()).abs() < 1e-6);
        assert!((metrics.maximum_burn_time - 2648.7).abs() < 0.01);
    }

    #[test]
    fn test_no_thrust_leaves_performance_zero() {
        let catalog = sample_catalog();
        let mut assembly = Assembly::new("Test");
        assembly.push_compartment(&catalog, Some(id("compartment.standard"))).unwrap();
        assembly.set_module(&catalog, 0, 0, Some(id("module.propellant"))).unwrap();

        let metrics = compute_propulsion_metrics(&assembly, &catalog, &CompositionRules::default()).unwrap();
        assert_eq!(metrics.dry_mass, 14.0);
        assert_eq!(metrics.propellant_mass_capacity, 200.0);
        assert_eq!(metrics.specific_impulse, 0.0);
        assert_eq!(metrics.maximum_delta_v, 0.0);
        assert_eq!(metrics.maximum_burn_time, 0.0);
    }

    #[test]
    fn test_skirt_multiplier_on_continuing_module() {
        let catalog = sample_catalog();
        let mut assembly = Assembly::new("Test");
        assembly.push_compartment(&catalog, Some(id("compartment.standard"))).unwrap();
        assembly.push_compartment(&catalog, Some(id("compartment.standard"))).unwrap();
        assembly.set_module(&catalog, 0, 0, Some(id("module.cargo.general"))).unwrap();
        assembly.set_module(&catalog, 1, 0, Some(id("module.cargo.general"))).unwrap();

        let rules = CompositionRules::default();
        let first = CompartmentMetrics::compute(&assembly, &catalog, &rules, 0);
        let second = CompartmentMetrics::compute(&assembly, &catalog, &rules, 1);
        assert_eq!(first.cargo_capacity, 200.0, "continues into the next compartment");
        assert_eq!(second.cargo_capacity, 100.0);
    }

    #[test]
    fn test_thrust_weighted_isp_and_thrusters() {
        let mut catalog = sample_catalog();
        catalog.insert(CatalogEntry::Equipment(EquipmentDescription {
            id: id("equipment.engine.small"),
            name: "Small engine".into(),
            mass: 1.0,
            requires_pairing: false,
            position: EquipmentPosition::Standard,
            kind: EquipmentKind::Engine {
                thrust: 50.0,
                specific_impulse: 450.0,
            },
        }));
        let mut assembly = Assembly::new("Test");
        assembly.push_compartment(&catalog, Some(id("compartment.standard"))).unwrap();
        assembly.set_equipment(&catalog, 0, 3, Some(id("equipment.engine"))).unwrap();
        assembly.set_equipment(&catalog, 0, 0, Some(id("equipment.engine.small"))).unwrap();
        assembly.set_equipment(&catalog, 0, 1, Some(id("equipment.thruster"))).unwrap();

        let metrics = compute_propulsion_metrics(&assembly, &catalog, &CompositionRules::default()).unwrap();
        assert_eq!(metrics.engine_thrust, 150.0);
        assert!((metrics.specific_impulse - 350.0).abs() < 1e-9, "(300·100 + 450·50) / 150");
        assert_eq!(metrics.thruster_thrust, 5.0);
    }

    #[test]
    fn test_non_positive_dry_mass_is_rejected() {
        let mut catalog = reference_catalog();
        catalog.insert(CatalogEntry::Compartment(CompartmentDescription {
            id: id("compartment.weightless"),
            name: "Weightless".into(),
            mass: -3.0,
            module_slots: vec![],
            equipment_slots: vec![EquipmentSlotLayout {
                socket_name: "equipment.aft".into(),
                display_name: "Aft".into(),
                supported_positions: vec![],
                paired_slots: vec![],
            }],
            is_forward_compartment: false,
            hull_variants: vec![],
        }));
        let mut assembly = Assembly::new("Test");
        assembly.push_compartment(&catalog, Some(id("compartment.weightless"))).unwrap();
        assembly.set_equipment(&catalog, 0, 0, Some(id("equipment.engine"))).unwrap();

        let result = compute_propulsion_metrics(&assembly, &catalog, &CompositionRules::default());
        assert_eq!(result, Err(PropulsionError::NonPositiveDryMass(0.0)));

        let err = assembly.recompute(&catalog, &CompositionRules::default()).unwrap_err();
        assert!(matches!(err, PropulsionError::NonPositiveDryMass(_)));
        assert_eq!(*assembly.propulsion_metrics(), PropulsionMetrics::default());
    }

    #[test]
    fn test_delta_v_for_load() {
        let catalog = reference_catalog();
        let mut assembly = Assembly::new("Reference");
        assembly.push_compartment(&catalog, Some(id("compartment.frame"))).unwrap();
        assembly.set_module(&catalog, 0, 0, Some(id("module.tank"))).unwrap();
        assembly.set_equipment(&catalog, 0, 0, Some(id("equipment.engine"))).unwrap();
        let metrics = compute_propulsion_metrics(&assembly, &catalog, &CompositionRules::default()).unwrap();

        let full = metrics.delta_v_for(0.0, 90.0).unwrap();
        assert!((full - metrics.maximum_delta_v).abs() < 1e-9);
        assert_eq!(metrics.delta_v_for(0.0, 0.0).unwrap(), 0.0);
        assert!(metrics.delta_v_for(40.0, 90.0).unwrap() < full, "cargo lowers delta-v");
        assert_eq!(PropulsionMetrics::default().delta_v_for(10.0, 10.0), Ok(0.0));
    }

    #[test]
    fn test_classification() {
        let catalog = sample_catalog();
        let rules = CompositionRules::default();
        let mut assembly = Assembly::new("Test");
        assert_eq!(Classification::of(&assembly, &rules), Classification::Blank);

        assembly.push_compartment(&catalog, Some(id("compartment.standard"))).unwrap();
        assembly.recompute(&catalog, &rules).unwrap();
        assert_eq!(Classification::of(&assembly, &rules), Classification::Tug);

        assembly.set_module(&catalog, 0, 0, Some(id("module.cargo.general"))).unwrap();
        assembly.recompute(&catalog, &rules).unwrap();
        assert_eq!(Classification::of(&assembly, &rules), Classification::LightFreighter);

        let heavy = CompositionRules {
            heavy_freighter_cargo: 100.0,
            ..CompositionRules::default()
        };
        assert_eq!(Classification::of(&assembly, &heavy), Classification::HeavyFreighter);
        assert_eq!(Classification::Tug.to_string(), "Tug");
    }

    #[test]
    fn test_compartment_summary() {
        let catalog = sample_catalog();
        let mut assembly = Assembly::new("Test");
        assembly.push_compartment(&catalog, Some(id("compartment.standard"))).unwrap();
        assembly.set_module(&catalog, 0, 0, Some(id("module.propellant"))).unwrap();
        assembly.set_equipment(&catalog, 0, 3, Some(id("equipment.engine"))).unwrap();

        let metrics = CompartmentMetrics::compute(&assembly, &catalog, &CompositionRules::default(), 0);
        assert_eq!(
            metrics.summary(),
            "1 modules, 1 equipment, 17.0T dry, 200.0T propellant, 0.0T cargo, 100.0kN thrust"
        );
    }
}
