//! Cargo ledger — capacity-bounded, resource-exclusive mass per module slot.
//!
//! Every query and transfer takes a compartment filter and a module filter;
//! [`SlotFilter::Any`] matches every index. Slots are always visited in
//! compartment order, then module order.
//!
//! Invariants maintained for every slot:
//! - `0 <= amount <= capacity(module, resource type)`
//! - `resource.is_none()` exactly when `amount == 0`
//!
//! A slot only ever holds one resource. Transfers that would mix resources,
//! or withdraw from an empty slot, skip that slot; the caller learns about
//! unsatisfied mass through the `bool` result of [`modify_cargo`].

use crate::assembly::Assembly;
use crate::catalog::{Catalog, PartId, ResourceType};
use crate::constants::MASS_EPSILON;

/// Index filter for compartments or module slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotFilter {
    Any,
    Index(usize),
}

impl SlotFilter {
    pub fn matches(&self, index: usize) -> bool {
        match self {
            SlotFilter::Any => true,
            SlotFilter::Index(wanted) => *wanted == index,
        }
    }
}

/// Capacity of a module slot for a resource class; 0 for empty or non-cargo slots.
fn slot_capacity(assembly: &Assembly, catalog: &dyn Catalog, compartment: usize, module: usize, resource_type: ResourceType) -> f64 {
    assembly
        .module_id(compartment, module)
        .and_then(|id| catalog.module(id))
        .map_or(0.0, |module| module.cargo_capacity(resource_type))
}

/// Visit every occupied module slot matching the filters.
fn matching_slots(
    assembly: &Assembly,
    compartment_filter: SlotFilter,
    module_filter: SlotFilter,
) -> impl Iterator<Item = (usize, usize)> + '_ {
    assembly
        .compartments()
        .iter()
        .enumerate()
        .filter(move |(index, _)| compartment_filter.matches(*index))
        .flat_map(move |(index, compartment)| {
            compartment
                .modules()
                .iter()
                .enumerate()
                .filter(move |(module_index, slot)| module_filter.matches(*module_index) && slot.is_occupied())
                .map(move |(module_index, _)| (index, module_index))
        })
}

/// Total capacity for `resource` across matching slots, ignoring what they hold.
pub fn query_capacity(
    assembly: &Assembly,
    catalog: &dyn Catalog,
    resource: &PartId,
    compartment_filter: SlotFilter,
    module_filter: SlotFilter,
) -> f64 {
    let Some(description) = catalog.resource(resource) else {
        return 0.0;
    };
    matching_slots(assembly, compartment_filter, module_filter)
        .map(|(c, m)| slot_capacity(assembly, catalog, c, m, description.resource_type))
        .sum()
}

/// Mass of `resource` held across matching slots.
pub fn query_mass(assembly: &Assembly, resource: &PartId, compartment_filter: SlotFilter, module_filter: SlotFilter) -> f64 {
    matching_slots(assembly, compartment_filter, module_filter)
        .map(|(c, m)| &assembly.compartments()[c].modules()[m].cargo)
        .filter(|cargo| cargo.resource() == Some(resource))
        .map(|cargo| cargo.amount())
        .sum()
}

/// Mass of every resource held across matching slots.
pub fn query_total_mass(assembly: &Assembly, compartment_filter: SlotFilter, module_filter: SlotFilter) -> f64 {
    matching_slots(assembly, compartment_filter, module_filter)
        .map(|(c, m)| assembly.compartments()[c].modules()[m].cargo().amount())
        .sum()
}

/// Free room for `resource`, counting only slots that are empty or already
/// hold the same resource.
pub fn query_available(
    assembly: &Assembly,
    catalog: &dyn Catalog,
    resource: &PartId,
    compartment_filter: SlotFilter,
    module_filter: SlotFilter,
) -> f64 {
    let Some(description) = catalog.resource(resource) else {
        return 0.0;
    };
    matching_slots(assembly, compartment_filter, module_filter)
        .filter_map(|(c, m)| {
            let cargo = assembly.compartments()[c].modules()[m].cargo();
            match cargo.resource() {
                None => Some((c, m, 0.0)),
                Some(held) if held == resource => Some((c, m, cargo.amount())),
                Some(_) => None,
            }
        })
        .map(|(c, m, held)| (slot_capacity(assembly, catalog, c, m, description.resource_type) - held).max(0.0))
        .sum()
}

/// Whether one slot may take part in a transfer of `mass_delta`.
fn can_modify(held: Option<&PartId>, resource: &PartId, mass_delta: f64) -> bool {
    match held {
        _ if mass_delta == 0.0 => false,
        None => mass_delta > 0.0,
        Some(held) => held == resource,
    }
}

/// Add (`mass_delta > 0`) or remove (`mass_delta < 0`) `resource` across
/// matching slots, in order, until the delta is consumed.
///
/// Returns `true` when the whole delta was applied. A `false` result leaves
/// the partial transfer in place; reverting it is up to the caller.
pub fn modify_cargo(
    assembly: &mut Assembly,
    catalog: &dyn Catalog,
    resource: &PartId,
    mass_delta: f64,
    compartment_filter: SlotFilter,
    module_filter: SlotFilter,
) -> bool {
    if !mass_delta.is_finite() {
        return false;
    }
    if mass_delta.abs() <= MASS_EPSILON {
        return true;
    }
    let Some(description) = catalog.resource(resource) else {
        return false;
    };

    let view: &Assembly = assembly;
    let slots: Vec<(usize, usize, f64)> = matching_slots(view, compartment_filter, module_filter)
        .map(|(c, m)| (c, m, slot_capacity(view, catalog, c, m, description.resource_type)))
        .collect();

    let mut remaining = mass_delta;
    for (compartment, module, capacity) in slots {
        let cargo = &mut assembly.compartments_mut()[compartment].modules[module].cargo;
        if !can_modify(cargo.resource.as_ref(), resource, remaining) {
            continue;
        }

        let previous = cargo.amount;
        let mut amount = (previous + remaining).clamp(0.0, capacity.max(0.0));
        if amount <= MASS_EPSILON {
            amount = 0.0;
        }
        cargo.amount = amount;
        cargo.resource = if amount == 0.0 { None } else { Some(resource.clone()) };

        remaining -= amount - previous;
        if remaining.abs() <= MASS_EPSILON {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{id, sample_catalog};

    /// Two compartments: general cargo in slots 0, bulk cargo in slot 2 of
    /// the first compartment, a propellant tank in slot 1.
    fn cargo_assembly() -> (crate::catalog::MemoryCatalog, Assembly) {
        let catalog = sample_catalog();
        let mut assembly = Assembly::new("Freighter");
        assembly.push_compartment(&catalog, Some(id("compartment.standard"))).unwrap();
        assembly.push_compartment(&catalog, Some(id("compartment.standard"))).unwrap();
        assembly.set_module(&catalog, 0, 0, Some(id("module.cargo.general"))).unwrap();
        assembly.set_module(&catalog, 1, 0, Some(id("module.cargo.general"))).unwrap();
        assembly.set_module(&catalog, 0, 2, Some(id("module.cargo.bulk"))).unwrap();
        assembly.set_module(&catalog, 0, 1, Some(id("module.propellant"))).unwrap();
        (catalog, assembly)
    }

    fn assert_invariants(assembly: &Assembly, catalog: &dyn Catalog) {
        for compartment in assembly.compartments() {
            for slot in compartment.modules() {
                let cargo = slot.cargo();
                assert_eq!(cargo.resource().is_none(), cargo.amount() == 0.0, "exclusivity: {:?}", cargo);
                assert!(cargo.amount() >= 0.0);
                if let Some(resource) = cargo.resource() {
                    let resource_type = catalog.resource(resource).unwrap().resource_type;
                    let module = catalog.module(slot.module().unwrap()).unwrap();
                    assert!(cargo.amount() <= module.cargo_capacity(resource_type));
                }
            }
        }
    }

    #[test]
    fn test_capacity_by_resource_type() {
        let (catalog, assembly) = cargo_assembly();
        let goods = id("resource.goods");
        let ore = id("resource.ore");
        assert_eq!(query_capacity(&assembly, &catalog, &goods, SlotFilter::Any, SlotFilter::Any), 200.0);
        assert_eq!(query_capacity(&assembly, &catalog, &ore, SlotFilter::Any, SlotFilter::Any), 150.0);
        assert_eq!(
            query_capacity(&assembly, &catalog, &goods, SlotFilter::Index(1), SlotFilter::Any),
            100.0
        );
        assert_eq!(
            query_capacity(&assembly, &catalog, &goods, SlotFilter::Any, SlotFilter::Index(1)),
            0.0,
            "propellant tanks hold no cargo"
        );
    }

    #[test]
    fn test_fill_in_slot_order() {
        let (catalog, mut assembly) = cargo_assembly();
        let goods = id("resource.goods");

        assert!(modify_cargo(&mut assembly, &catalog, &goods, 150.0, SlotFilter::Any, SlotFilter::Any));
        assert_eq!(assembly.compartments()[0].modules()[0].cargo().amount(), 100.0);
        assert_eq!(assembly.compartments()[1].modules()[0].cargo().amount(), 50.0);
        assert_eq!(query_mass(&assembly, &goods, SlotFilter::Any, SlotFilter::Any), 150.0);
        assert_eq!(query_available(&assembly, &catalog, &goods, SlotFilter::Any, SlotFilter::Any), 50.0);
        assert_invariants(&assembly, &catalog);
    }

    #[test]
    fn test_overfill_is_partial() {
        let (catalog, mut assembly) = cargo_assembly();
        let goods = id("resource.goods");

        assert!(!modify_cargo(&mut assembly, &catalog, &goods, 250.0, SlotFilter::Any, SlotFilter::Any));
        assert_eq!(query_mass(&assembly, &goods, SlotFilter::Any, SlotFilter::Any), 200.0, "partial fill stays");
        assert_invariants(&assembly, &catalog);
    }

    #[test]
    fn test_resources_do_not_mix() {
        let (catalog, mut assembly) = cargo_assembly();
        let goods = id("resource.goods");
        let parts = id("resource.parts");

        assert!(modify_cargo(&mut assembly, &catalog, &goods, 10.0, SlotFilter::Index(0), SlotFilter::Index(0)));
        assert!(!modify_cargo(&mut assembly, &catalog, &parts, 10.0, SlotFilter::Index(0), SlotFilter::Index(0)));
        assert_eq!(query_available(&assembly, &catalog, &parts, SlotFilter::Index(0), SlotFilter::Index(0)), 0.0);

        // The other general slot still takes it
        assert!(modify_cargo(&mut assembly, &catalog, &parts, 10.0, SlotFilter::Any, SlotFilter::Any));
        assert_eq!(assembly.compartments()[1].modules()[0].cargo().resource(), Some(&parts));
        assert_invariants(&assembly, &catalog);
    }

    #[test]
    fn test_withdraw_from_empty_or_foreign_slot() {
        let (catalog, mut assembly) = cargo_assembly();
        let goods = id("resource.goods");
        let parts = id("resource.parts");

        assert!(!modify_cargo(&mut assembly, &catalog, &goods, -5.0, SlotFilter::Any, SlotFilter::Any));
        assert!(modify_cargo(&mut assembly, &catalog, &parts, 20.0, SlotFilter::Any, SlotFilter::Any));
        assert!(!modify_cargo(&mut assembly, &catalog, &goods, -5.0, SlotFilter::Any, SlotFilter::Any));
        assert_eq!(query_mass(&assembly, &parts, SlotFilter::Any, SlotFilter::Any), 20.0);
    }

    #[test]
    fn test_withdraw_clears_resource() {
        let (catalog, mut assembly) = cargo_assembly();
        let ore = id("resource.ore");

        assert!(modify_cargo(&mut assembly, &catalog, &ore, 120.0, SlotFilter::Any, SlotFilter::Any));
        assert!(modify_cargo(&mut assembly, &catalog, &ore, -120.0, SlotFilter::Any, SlotFilter::Any));
        let cargo = assembly.compartments()[0].modules()[2].cargo();
        assert!(cargo.is_empty());
        assert_eq!(cargo.amount(), 0.0);

        assert!(!modify_cargo(&mut assembly, &catalog, &ore, -1.0, SlotFilter::Any, SlotFilter::Any));
    }

    #[test]
    fn test_round_trip_restores_slots() {
        let (catalog, mut assembly) = cargo_assembly();
        let goods = id("resource.goods");
        let before = assembly.clone();

        assert!(modify_cargo(&mut assembly, &catalog, &goods, 130.0, SlotFilter::Any, SlotFilter::Any));
        assert!(modify_cargo(&mut assembly, &catalog, &goods, -130.0, SlotFilter::Any, SlotFilter::Any));
        assert!(assembly.same_structure(&before));
    }

    #[test]
    fn test_zero_delta_and_unknown_resource() {
        let (catalog, mut assembly) = cargo_assembly();
        assert!(modify_cargo(&mut assembly, &catalog, &id("resource.goods"), 0.0, SlotFilter::Any, SlotFilter::Any));
        assert!(!modify_cargo(&mut assembly, &catalog, &id("resource.unknown"), 5.0, SlotFilter::Any, SlotFilter::Any));
        assert_eq!(query_total_mass(&assembly, SlotFilter::Any, SlotFilter::Any), 0.0);
    }

    #[test]
    fn test_cargo_edits_keep_derived_state_fresh() {
        let (catalog, mut assembly) = cargo_assembly();
        assembly
            .recompute(&catalog, &crate::config::CompositionRules::default())
            .unwrap();
        modify_cargo(&mut assembly, &catalog, &id("resource.goods"), 10.0, SlotFilter::Any, SlotFilter::Any);
        assert!(!assembly.is_stale());
    }

    #[test]
    fn test_negative_capacity_rejects_transfer() {
        use crate::catalog::{CatalogEntry, ModuleDescription, ModuleKind, PartId, ResourceType};

        let mut catalog = sample_catalog();
        catalog.insert(CatalogEntry::Module(ModuleDescription {
            id: PartId::from("module.cargo.broken"),
            name: "Broken hold".into(),
            mass: 1.0,
            needs_piping: false,
            kind: ModuleKind::Cargo {
                cargo_type: ResourceType::General,
                cargo_mass: -10.0,
            },
        }));
        let mut assembly = Assembly::new("Broken");
        assembly.push_compartment(&catalog, Some(id("compartment.standard"))).unwrap();
        assembly.set_module(&catalog, 0, 0, Some(id("module.cargo.broken"))).unwrap();

        let goods = id("resource.goods");
        assert!(!modify_cargo(&mut assembly, &catalog, &goods, 5.0, SlotFilter::Any, SlotFilter::Any));
        assert_eq!(query_mass(&assembly, &goods, SlotFilter::Any, SlotFilter::Any), 0.0);
        assert_invariants(&assembly, &catalog);
    }
}
