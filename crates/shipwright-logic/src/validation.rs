//! Design validation — completeness checks run before a design is committed.
//!
//! Every check runs and every failure is collected, so the caller receives
//! the full list at once.

use std::fmt;

use crate::assembly::Assembly;
use crate::catalog::Catalog;
use crate::config::CompositionRules;

/// One reason a design cannot fly.
#[derive(Debug, Clone, PartialEq)]
pub enum DesignIssue {
    Unnamed,
    NoEngine,
    NoPropellant,
    InsufficientDeltaV { delta_v: f64, minimum: f64 },
    /// Pairing-required equipment not mirrored on a paired slot.
    InvalidPairing { compartment: usize, slot: String },
    /// 1-based indices of module groups with no hatch attached.
    GroupsWithoutHatch(Vec<usize>),
    NoThrusters,
    NoHabitat,
}

impl fmt::Display for DesignIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DesignIssue::Unnamed => write!(f, "This spacecraft is unnamed"),
            DesignIssue::NoEngine => write!(f, "This spacecraft has no engine"),
            DesignIssue::NoPropellant => write!(f, "This spacecraft has no propellant tank"),
            DesignIssue::InsufficientDeltaV { delta_v, minimum } => write!(
                f,
                "This spacecraft does not have enough delta-v ({:.0}m/s of {:.0}m/s)",
                delta_v, minimum
            ),
            DesignIssue::InvalidPairing { compartment, slot } => write!(
                f,
                "Equipment in slot {} of compartment {} is not correctly paired with symmetrical equipment",
                slot,
                compartment + 1
            ),
            DesignIssue::GroupsWithoutHatch(groups) => {
                let indices: Vec<String> = groups.iter().map(|i| i.to_string()).collect();
                if groups.len() == 1 {
                    write!(f, "1 module group ({}) doesn't have a hatch attached", indices.join(", "))
                } else {
                    write!(
                        f,
                        "{} module groups ({}) don't have a hatch attached",
                        groups.len(),
                        indices.join(", ")
                    )
                }
            }
            DesignIssue::NoThrusters => write!(f, "This spacecraft has no maneuvering thrusters"),
            DesignIssue::NoHabitat => write!(f, "This spacecraft has no habitable space"),
        }
    }
}

/// Run every design check against the last recompute of `assembly`.
pub fn validate_design(
    assembly: &Assembly,
    catalog: &dyn Catalog,
    rules: &CompositionRules,
) -> Result<(), Vec<DesignIssue>> {
    let mut issues = Vec::new();
    let metrics = assembly.propulsion_metrics();

    if assembly.name().is_empty() {
        issues.push(DesignIssue::Unnamed);
    }
    if metrics.engine_thrust <= 0.0 {
        issues.push(DesignIssue::NoEngine);
    }
    if metrics.propellant_mass_capacity <= 0.0 {
        issues.push(DesignIssue::NoPropellant);
    }
    if metrics.maximum_delta_v < rules.minimum_delta_v {
        issues.push(DesignIssue::InsufficientDeltaV {
            delta_v: metrics.maximum_delta_v,
            minimum: rules.minimum_delta_v,
        });
    }

    let mut has_thruster = false;
    let mut has_habitat = false;

    for (index, compartment) in assembly.compartments().iter().enumerate() {
        let Ok(layout) = assembly.layout(catalog, index) else {
            continue;
        };

        for (slot_index, slot) in layout.equipment_slots.iter().enumerate() {
            let Some(equipment_id) = compartment.equipment_at(slot_index) else {
                continue;
            };
            let Some(equipment) = catalog.equipment(equipment_id) else {
                continue;
            };

            if equipment.requires_pairing {
                for &paired in &slot.paired_slots {
                    if compartment.equipment_at(paired) != Some(equipment_id) {
                        issues.push(DesignIssue::InvalidPairing {
                            compartment: index,
                            slot: slot.display_name.clone(),
                        });
                    }
                }
            }

            has_thruster |= equipment.is_thruster();
            has_habitat |= equipment.is_habitat();
        }
    }

    let without_hatch: Vec<usize> = assembly
        .module_groups()
        .iter()
        .filter(|group| !group.has_hatch)
        .map(|group| group.index + 1)
        .collect();
    if !without_hatch.is_empty() {
        issues.push(DesignIssue::GroupsWithoutHatch(without_hatch));
    }

    if !has_thruster {
        issues.push(DesignIssue::NoThrusters);
    }
    if !has_habitat {
        issues.push(DesignIssue::NoHabitat);
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}
