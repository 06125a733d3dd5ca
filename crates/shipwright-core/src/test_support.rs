//! Shared fixtures for core tests, built on the bundled catalog.

use shipwright_logic::assembly::Assembly;
use shipwright_logic::cargo::{modify_cargo, SlotFilter};
use shipwright_logic::catalog::{MemoryCatalog, PartId};
use shipwright_logic::config::CompositionRules;

use crate::catalog_data::load_catalog;

pub const CATALOG_JSON: &str = include_str!("../../../data/catalog.json");
pub const PRICES_JSON: &str = include_str!("../../../data/prices.json");

pub fn bundled_catalog() -> MemoryCatalog {
    load_catalog(CATALOG_JSON).expect("bundled catalog is invalid")
}

pub fn id(s: &str) -> PartId {
    PartId::from(s)
}

/// Command section, a structural frame with two holds and a tank, and a
/// tank frame carrying the engine. Passes validation; 120T of machinery
/// loaded and the tanks full.
pub fn sample_freighter(catalog: &MemoryCatalog) -> Assembly {
    let mut ship = Assembly::new("Meridian Drift");
    ship.push_compartment(catalog, Some(id("compartment.command"))).unwrap();
    ship.push_compartment(catalog, Some(id("compartment.structural"))).unwrap();
    ship.push_compartment(catalog, Some(id("compartment.tank"))).unwrap();

    ship.set_hull(catalog, 0, Some(id("hull.streamlined"))).unwrap();
    ship.set_equipment(catalog, 0, 0, Some(id("equipment.antenna"))).unwrap();
    ship.set_equipment(catalog, 0, 1, Some(id("equipment.hatch.habitat"))).unwrap();
    ship.set_equipment(catalog, 0, 2, Some(id("equipment.thruster.rcs"))).unwrap();
    ship.set_equipment(catalog, 0, 3, Some(id("equipment.thruster.rcs"))).unwrap();

    ship.set_module(catalog, 1, 0, Some(id("module.cargo.container"))).unwrap();
    ship.set_module(catalog, 1, 1, Some(id("module.propellant.large"))).unwrap();
    ship.set_module(catalog, 1, 2, Some(id("module.cargo.container"))).unwrap();
    for slot in 0..3 {
        ship.set_equipment(catalog, 1, slot, Some(id("equipment.hatch.cargo"))).unwrap();
    }

    ship.set_module(catalog, 2, 0, Some(id("module.propellant.large"))).unwrap();
    ship.set_equipment(catalog, 2, 2, Some(id("equipment.engine.chemical"))).unwrap();

    ship.recompute(catalog, &CompositionRules::default()).unwrap();
    assert!(modify_cargo(
        &mut ship,
        catalog,
        &id("resource.machinery"),
        120.0,
        SlotFilter::Any,
        SlotFilter::Any
    ));
    let capacity = ship.propulsion_metrics().propellant_mass_capacity;
    ship.set_propellant_mass_at_launch(capacity);
    ship
}
