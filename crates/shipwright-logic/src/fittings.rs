//! Procedural fittings — bulkheads, skirts, domes and piping per module slot.
//!
//! Fittings are a pure function of the assembly structure. For an occupied
//! module slot:
//!
//! | Fitting          | Rule                                                        |
//! |------------------|-------------------------------------------------------------|
//! | forward bulkhead | `Outer` if first, `Skirt` if the same module precedes       |
//! | aft bulkhead     | `Outer` if last, `Skirt` if the same module follows         |
//! | skirt piping     | short or none when nothing follows and nothing is attached  |
//! | dome             | first compartment or compartment type change, unless forced |
//!
//! Unoccupied slots keep the reset state.

use serde::{Deserialize, Serialize};

use crate::assembly::Assembly;
use crate::catalog::{Catalog, CompartmentDescription, ModuleSlotLayout};
use crate::constants::MAX_MODULE_COUNT;

/// End cap of a module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BulkheadType {
    #[default]
    Standard,
    /// Exposed end of the spacecraft.
    Outer,
    /// Continues into an identical module.
    Skirt,
}

/// Piping routed through the module skirt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkirtPipingType {
    #[default]
    None,
    Simple,
    Connection,
    ShortConnection,
}

/// Fittings of one module slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleFittings {
    pub forward_bulkhead: BulkheadType,
    pub aft_bulkhead: BulkheadType,
    pub skirt_piping: SkirtPipingType,
    pub needs_skirt: bool,
    pub needs_dome: bool,
    pub needs_collector_piping: bool,
    pub needs_connection_wiring: bool,
}

/// Recompute fittings for every module slot of the assembly.
pub fn update_fittings(assembly: &mut Assembly, catalog: &dyn Catalog) {
    let derived: Vec<[ModuleFittings; MAX_MODULE_COUNT]> = (0..assembly.compartment_count())
        .map(|index| derive_compartment(assembly, catalog, index))
        .collect();

    for (compartment, fittings) in assembly.compartments_mut().iter_mut().zip(derived) {
        for (slot, fitting) in compartment.modules.iter_mut().zip(fittings) {
            slot.fittings = fitting;
        }
    }
}

fn derive_compartment(assembly: &Assembly, catalog: &dyn Catalog, index: usize) -> [ModuleFittings; MAX_MODULE_COUNT] {
    let mut fittings = [ModuleFittings::default(); MAX_MODULE_COUNT];
    let Ok(layout) = assembly.layout(catalog, index) else {
        return fittings;
    };

    for (module_index, slot_layout) in layout.module_slots.iter().enumerate().take(MAX_MODULE_COUNT) {
        if let Some(fitting) = derive_slot(assembly, catalog, layout, slot_layout, index, module_index) {
            fittings[module_index] = fitting;
        }
    }
    fittings
}

fn derive_slot(
    assembly: &Assembly,
    catalog: &dyn Catalog,
    layout: &CompartmentDescription,
    slot_layout: &ModuleSlotLayout,
    index: usize,
    module_index: usize,
) -> Option<ModuleFittings> {
    let module = catalog.module(assembly.module_id(index, module_index)?)?;
    let forced = slot_layout.force_skirt_piping;
    let same_next = assembly.is_same_module_in_next_compartment(catalog, index, module_index);

    let mut fitting = ModuleFittings {
        needs_connection_wiring: true,
        needs_collector_piping: !forced,
        ..ModuleFittings::default()
    };

    if assembly.is_first_compartment(index) {
        fitting.forward_bulkhead = BulkheadType::Outer;
    } else if assembly.is_same_module_in_previous_compartment(catalog, index, module_index) {
        fitting.forward_bulkhead = BulkheadType::Skirt;
        fitting.needs_connection_wiring = false;
    }
    if assembly.is_last_compartment(index) {
        fitting.aft_bulkhead = BulkheadType::Outer;
    } else if same_next {
        fitting.aft_bulkhead = BulkheadType::Skirt;
    }

    let has_supported_equipment = has_supported_equipment(assembly, layout, slot_layout, index);
    if !assembly.is_any_module_in_next_compartment(catalog, index, module_index) && !has_supported_equipment && !forced {
        fitting.skirt_piping = if module.needs_piping {
            SkirtPipingType::ShortConnection
        } else {
            SkirtPipingType::None
        };
    } else {
        fitting.needs_skirt = !forced;
        fitting.skirt_piping = if module.needs_piping && !same_next {
            SkirtPipingType::Connection
        } else {
            SkirtPipingType::Simple
        };
    }

    let type_changed = index == 0
        || assembly.compartments()[index - 1].description() != assembly.compartments()[index].description();
    fitting.needs_dome = (assembly.is_first_compartment(index) || type_changed) && !forced;

    Some(fitting)
}

fn has_supported_equipment(
    assembly: &Assembly,
    layout: &CompartmentDescription,
    slot_layout: &ModuleSlotLayout,
    index: usize,
) -> bool {
    let compartment = &assembly.compartments()[index];
    layout.equipment_slots.iter().enumerate().any(|(slot, declared)| {
        slot_layout.supported_equipment.contains(&declared.socket_name) && compartment.equipment_at(slot).is_some()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompositionRules;
    use crate::test_support::{id, sample_catalog};

    fn fittings(assembly: &Assembly, index: usize, module_index: usize) -> ModuleFittings {
        *assembly.compartments()[index].modules()[module_index].fittings()
    }

    #[test]
    fn test_single_module_is_capped_both_ends() {
        let catalog = sample_catalog();
        let mut assembly = Assembly::new("Test");
        assembly.push_compartment(&catalog, Some(id("compartment.standard"))).unwrap();
        assembly.set_module(&catalog, 0, 0, Some(id("module.propellant"))).unwrap();
        assembly.recompute(&catalog, &CompositionRules::default()).unwrap();

        let f = fittings(&assembly, 0, 0);
        assert_eq!(f.forward_bulkhead, BulkheadType::Outer);
        assert_eq!(f.aft_bulkhead, BulkheadType::Outer);
        assert_eq!(f.skirt_piping, SkirtPipingType::ShortConnection, "piping module with nothing after it");
        assert!(!f.needs_skirt);
        assert!(f.needs_dome);
        assert!(f.needs_collector_piping);
        assert!(f.needs_connection_wiring);
    }

    #[test]
    fn test_continuing_module_uses_skirts() {
        let catalog = sample_catalog();
        let mut assembly = Assembly::new("Test");
        for _ in 0..3 {
            assembly.push_compartment(&catalog, Some(id("compartment.standard"))).unwrap();
        }
        for i in 0..3 {
            assembly.set_module(&catalog, i, 0, Some(id("module.propellant"))).unwrap();
        }
        assembly.recompute(&catalog, &CompositionRules::default()).unwrap();

        let middle = fittings(&assembly, 1, 0);
        assert_eq!(middle.forward_bulkhead, BulkheadType::Skirt);
        assert_eq!(middle.aft_bulkhead, BulkheadType::Skirt);
        assert_eq!(middle.skirt_piping, SkirtPipingType::Simple);
        assert!(middle.needs_skirt);
        assert!(!middle.needs_connection_wiring);
        assert!(!middle.needs_dome, "same compartment type as previous");

        let last = fittings(&assembly, 2, 0);
        assert_eq!(last.aft_bulkhead, BulkheadType::Outer);
        assert_eq!(last.skirt_piping, SkirtPipingType::ShortConnection);
    }

    #[test]
    fn test_different_module_next_needs_connection() {
        let catalog = sample_catalog();
        let mut assembly = Assembly::new("Test");
        assembly.push_compartment(&catalog, Some(id("compartment.standard"))).unwrap();
        assembly.push_compartment(&catalog, Some(id("compartment.light"))).unwrap();
        assembly.set_module(&catalog, 0, 0, Some(id("module.propellant"))).unwrap();
        assembly.set_module(&catalog, 1, 0, Some(id("module.processing"))).unwrap();
        assembly.recompute(&catalog, &CompositionRules::default()).unwrap();

        let first = fittings(&assembly, 0, 0);
        assert_eq!(first.aft_bulkhead, BulkheadType::Standard);
        assert_eq!(first.skirt_piping, SkirtPipingType::Connection);
        assert!(first.needs_skirt);

        let second = fittings(&assembly, 1, 0);
        assert_eq!(second.forward_bulkhead, BulkheadType::Standard);
        assert!(second.needs_dome, "compartment type changed");
    }

    #[test]
    fn test_supported_equipment_needs_skirt() {
        let catalog = sample_catalog();
        let mut assembly = Assembly::new("Test");
        assembly.push_compartment(&catalog, Some(id("compartment.standard"))).unwrap();
        assembly.set_module(&catalog, 0, 0, Some(id("module.cargo.general"))).unwrap();
        assembly.set_equipment(&catalog, 0, 0, Some(id("equipment.hatch"))).unwrap();
        assembly.recompute(&catalog, &CompositionRules::default()).unwrap();

        let f = fittings(&assembly, 0, 0);
        assert!(f.needs_skirt);
        assert_eq!(f.skirt_piping, SkirtPipingType::Simple, "cargo needs no piping");
    }

    #[test]
    fn test_forced_skirt_piping_slot() {
        let catalog = sample_catalog();
        let mut assembly = Assembly::new("Test");
        assembly.push_compartment(&catalog, Some(id("compartment.standard"))).unwrap();
        assembly.set_module(&catalog, 0, 1, Some(id("module.propellant"))).unwrap();
        assembly.recompute(&catalog, &CompositionRules::default()).unwrap();

        let f = fittings(&assembly, 0, 1);
        assert!(!f.needs_skirt);
        assert!(!f.needs_dome);
        assert!(!f.needs_collector_piping);
        assert_eq!(f.skirt_piping, SkirtPipingType::Connection);
    }

    #[test]
    fn test_empty_slots_reset() {
        let catalog = sample_catalog();
        let mut assembly = Assembly::new("Test");
        assembly.push_compartment(&catalog, Some(id("compartment.standard"))).unwrap();
        assembly.set_module(&catalog, 0, 0, Some(id("module.propellant"))).unwrap();
        assembly.recompute(&catalog, &CompositionRules::default()).unwrap();
        assembly.set_module(&catalog, 0, 0, None).unwrap();
        assembly.recompute(&catalog, &CompositionRules::default()).unwrap();

        assert_eq!(fittings(&assembly, 0, 0), ModuleFittings::default());
    }

    #[test]
    fn test_fittings_are_idempotent() {
        let catalog = sample_catalog();
        let mut assembly = Assembly::new("Test");
        assembly.push_compartment(&catalog, Some(id("compartment.standard"))).unwrap();
        assembly.push_compartment(&catalog, Some(id("compartment.standard"))).unwrap();
        assembly.set_module(&catalog, 0, 2, Some(id("module.cargo.bulk"))).unwrap();
        assembly.set_module(&catalog, 1, 2, Some(id("module.cargo.bulk"))).unwrap();

        update_fittings(&mut assembly, &catalog);
        let once: Vec<ModuleFittings> = assembly.compartments().iter().flat_map(|c| c.modules().iter().map(|m| *m.fittings())).collect();
        update_fittings(&mut assembly, &catalog);
        let twice: Vec<ModuleFittings> = assembly.compartments().iter().flat_map(|c| c.modules().iter().map(|m| *m.fittings())).collect();
        assert_eq!(once, twice);
    }
}
