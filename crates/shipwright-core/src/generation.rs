//! Design generation - builds random designs from compatibility queries
//!
//! Compartments are placed first, then hulls and modules, then equipment
//! once the sequence is final so forward and aft placement rules see the
//! real first and last compartment. Equipment that requires pairing is
//! mirrored into its paired slots. The same seed always yields the same
//! design.

use rand::seq::SliceRandom;
use rand::Rng;
use shipwright_logic::assembly::Assembly;
use shipwright_logic::catalog::{Catalog, CatalogEntry, CompartmentDescription, EquipmentDescription, PartId};
use shipwright_logic::compatibility::{compatible_compartments, compatible_equipment, compatible_modules};
use shipwright_logic::constants::MAX_COMPARTMENT_COUNT;
use uuid::{Builder, Uuid};

use crate::config::ShipyardConfig;

const NAME_PREFIXES: &[&str] = &[
    "Amber", "Bright", "Cold", "Distant", "Ember", "Far", "Iron", "Long", "Quiet", "Silver", "Steady", "Vast",
];

const NAME_SUFFIXES: &[&str] = &[
    "Anchor", "Comet", "Drift", "Harbor", "Horizon", "Lantern", "Meridian", "Passage", "Reach", "Tide", "Voyager",
    "Wake",
];

/// Generate a ship name like "Iron Meridian"
pub fn generate_name(rng: &mut impl Rng) -> String {
    let prefix = NAME_PREFIXES[rng.gen_range(0..NAME_PREFIXES.len())];
    let suffix = NAME_SUFFIXES[rng.gen_range(0..NAME_SUFFIXES.len())];
    format!("{} {}", prefix, suffix)
}

/// Build a random design and recompute it. The launch propellant load is
/// set to full capacity.
pub fn generate_design(catalog: &dyn Catalog, config: &ShipyardConfig, rng: &mut impl Rng) -> Assembly {
    let identifier: Uuid = Builder::from_random_bytes(rng.gen()).into_uuid();
    let mut assembly = Assembly::with_identifier(identifier, generate_name(rng));

    let max = config.max_compartments.clamp(1, MAX_COMPARTMENT_COUNT);
    let min = config.min_compartments.clamp(1, max);
    let count = rng.gen_range(min..=max);

    for index in 0..count {
        // Reserve the position so compatibility sees the final index
        if assembly.push_compartment(catalog, None).is_err() {
            break;
        }
        let Some(compartment) = compatible_compartments(&assembly, catalog, index).choose(rng).copied() else {
            continue;
        };
        if assembly.set_compartment(catalog, index, Some(compartment.id.clone())).is_err() {
            continue;
        }
        fill_hull_and_modules(&mut assembly, catalog, config, compartment, index, rng);
    }

    for index in 0..assembly.compartment_count() {
        fill_equipment(&mut assembly, catalog, config, index, rng);
    }

    if let Err(e) = assembly.recompute(catalog, &config.rules) {
        log::warn!("Generated design '{}' cannot fly: {}", assembly.name(), e);
    }
    let capacity = assembly.propulsion_metrics().propellant_mass_capacity;
    assembly.set_propellant_mass_at_launch(capacity);
    log::debug!(
        "Generated '{}': {} compartments, {} module groups",
        assembly.name(),
        assembly.compartment_count(),
        assembly.module_groups().len()
    );
    assembly
}

fn fill_hull_and_modules(
    assembly: &mut Assembly,
    catalog: &dyn Catalog,
    config: &ShipyardConfig,
    compartment: &CompartmentDescription,
    index: usize,
    rng: &mut impl Rng,
) {
    let hulls: Vec<&PartId> = catalog
        .entries()
        .filter_map(|entry| match entry {
            CatalogEntry::Hull(hull) if compartment.accepts_hull(&hull.id) => Some(&hull.id),
            _ => None,
        })
        .collect();
    if let Some(hull) = hulls.choose(rng) {
        let _ = assembly.set_hull(catalog, index, Some((*hull).clone()));
    }

    for slot in 0..compartment.module_slots.len() {
        if !rng.gen_bool(config.module_fill_chance.clamp(0.0, 1.0)) {
            continue;
        }
        let offered: Vec<PartId> = compatible_modules(assembly, catalog, index, slot)
            .into_iter()
            .flatten()
            .map(|module| module.id.clone())
            .collect();
        if let Some(module) = offered.choose(rng) {
            let _ = assembly.set_module(catalog, index, slot, Some(module.clone()));
        }
    }
}

fn fill_equipment(
    assembly: &mut Assembly,
    catalog: &dyn Catalog,
    config: &ShipyardConfig,
    index: usize,
    rng: &mut impl Rng,
) {
    let Ok(layout) = assembly.layout(catalog, index) else {
        return;
    };

    for (slot, slot_layout) in layout.equipment_slots.iter().enumerate() {
        let occupied = assembly
            .compartment(index)
            .map_or(true, |compartment| compartment.equipment_at(slot).is_some());
        if occupied || !rng.gen_bool(config.equipment_fill_chance.clamp(0.0, 1.0)) {
            continue;
        }

        let offered: Vec<&EquipmentDescription> = compatible_equipment(assembly, catalog, index, slot)
            .into_iter()
            .flatten()
            .filter(|part| !part.requires_pairing || can_mirror(assembly, catalog, index, &slot_layout.paired_slots, part))
            .collect();
        let Some(part) = offered.choose(rng).copied() else {
            continue;
        };

        let mirrors: &[usize] = if part.requires_pairing {
            &slot_layout.paired_slots
        } else {
            &[]
        };
        for &target in std::iter::once(&slot).chain(mirrors) {
            let _ = assembly.set_equipment(catalog, index, target, Some(part.id.clone()));
        }
    }
}

/// Every paired slot is empty and accepts `part`.
fn can_mirror(
    assembly: &Assembly,
    catalog: &dyn Catalog,
    index: usize,
    paired_slots: &[usize],
    part: &EquipmentDescription,
) -> bool {
    paired_slots.iter().all(|&paired| {
        let empty = assembly
            .compartment(index)
            .map_or(false, |compartment| compartment.equipment_at(paired).is_none());
        empty
            && compatible_equipment(assembly, catalog, index, paired)
                .iter()
                .flatten()
                .any(|offered| offered.id == part.id)
    })
}
