//! Compatibility queries — which catalog parts fit a given slot.
//!
//! Results follow the catalog's stable iteration order. Module and equipment
//! lists always start with `None`, the option of leaving the slot empty.

use crate::assembly::Assembly;
use crate::catalog::{Catalog, CatalogEntry, CompartmentDescription, EquipmentDescription, EquipmentPosition, ModuleDescription};

/// Compartment types that may be placed at `index`. Forward compartments
/// are only offered for the first position of a non-empty assembly.
pub fn compatible_compartments<'c>(
    assembly: &Assembly,
    catalog: &'c dyn Catalog,
    index: usize,
) -> Vec<&'c CompartmentDescription> {
    let forward_allowed = assembly.is_first_compartment(index) && assembly.compartment_count() > 0;
    catalog
        .entries()
        .filter_map(|entry| match entry {
            CatalogEntry::Compartment(compartment) => Some(compartment),
            _ => None,
        })
        .filter(|compartment| forward_allowed || !compartment.is_forward_compartment)
        .collect()
}

/// Modules that may be mounted in module slot `slot` of compartment `index`.
pub fn compatible_modules<'c>(
    assembly: &Assembly,
    catalog: &'c dyn Catalog,
    index: usize,
    slot: usize,
) -> Vec<Option<&'c ModuleDescription>> {
    let mut modules = vec![None];
    let declared = assembly
        .layout(catalog, index)
        .map_or(false, |layout| slot < layout.module_slots.len());
    if declared {
        modules.extend(catalog.entries().filter_map(|entry| match entry {
            CatalogEntry::Module(module) => Some(Some(module)),
            _ => None,
        }));
    }
    modules
}

/// Equipment that may be mounted in equipment slot `slot` of compartment
/// `index`: the slot must accept its position, forward equipment needs the
/// first compartment and aft equipment the last.
pub fn compatible_equipment<'c>(
    assembly: &Assembly,
    catalog: &'c dyn Catalog,
    index: usize,
    slot: usize,
) -> Vec<Option<&'c EquipmentDescription>> {
    let mut equipment = vec![None];
    let Some(declared) = assembly
        .layout(catalog, index)
        .ok()
        .and_then(|layout| layout.equipment_slot(slot))
    else {
        return equipment;
    };

    let is_first = assembly.is_first_compartment(index);
    let is_last = assembly.is_last_compartment(index);
    equipment.extend(
        catalog
            .entries()
            .filter_map(|entry| match entry {
                CatalogEntry::Equipment(part) => Some(part),
                _ => None,
            })
            .filter(|part| declared.supported_positions.is_empty() || declared.supported_positions.contains(&part.position))
            .filter(|part| match part.position {
                EquipmentPosition::Forward => is_first,
                EquipmentPosition::Aft => is_last,
                _ => true,
            })
            .map(Some),
    );
    equipment
}
