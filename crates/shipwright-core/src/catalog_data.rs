//! Catalog loading - parses part definitions from JSON and checks layouts
//!
//! The file format is `{ "entries": [ ... ] }`, one object per entry tagged
//! with its `category` (`Compartment`, `Hull`, `Module`, `Equipment`,
//! `Resource`).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use shipwright_logic::catalog::{
    Catalog, CatalogEntry, CompartmentDescription, EquipmentDescription, EquipmentKind, MemoryCatalog, ModuleDescription,
    ModuleKind, PartId,
};
use shipwright_logic::constants::{MAX_EQUIPMENT_COUNT, MAX_MODULE_COUNT};

/// On-disk catalog document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    pub entries: Vec<CatalogEntry>,
}

/// Errors that can occur while loading a catalog
#[derive(Debug)]
pub enum CatalogLoadError {
    Json(serde_json::Error),
    DuplicateId(PartId),
    InvalidLayout { id: PartId, reason: String },
}

impl From<serde_json::Error> for CatalogLoadError {
    fn from(e: serde_json::Error) -> Self {
        CatalogLoadError::Json(e)
    }
}

impl std::fmt::Display for CatalogLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogLoadError::Json(e) => write!(f, "Catalog parse error: {}", e),
            CatalogLoadError::DuplicateId(id) => write!(f, "Duplicate catalog id '{}'", id),
            CatalogLoadError::InvalidLayout { id, reason } => {
                write!(f, "Invalid layout for '{}': {}", id, reason)
            }
        }
    }
}

impl std::error::Error for CatalogLoadError {}

/// Parse and check a catalog document.
pub fn load_catalog(json: &str) -> Result<MemoryCatalog, CatalogLoadError> {
    let file: CatalogFile = serde_json::from_str(json)?;
    build_catalog(file.entries)
}

/// Check a list of entries and collect them into a catalog.
pub fn build_catalog(entries: Vec<CatalogEntry>) -> Result<MemoryCatalog, CatalogLoadError> {
    let mut catalog = MemoryCatalog::new();
    for entry in entries {
        let id = entry.id().clone();
        if catalog.insert(entry).is_some() {
            return Err(CatalogLoadError::DuplicateId(id));
        }
    }

    for entry in catalog.entries() {
        match entry {
            CatalogEntry::Compartment(compartment) => check_compartment(&catalog, compartment)?,
            CatalogEntry::Module(module) => check_module(module)?,
            CatalogEntry::Equipment(equipment) => check_equipment(equipment)?,
            _ => {}
        }
    }

    log::debug!("Loaded catalog with {} entries", catalog.len());
    Ok(catalog)
}

fn invalid(id: &PartId, reason: String) -> CatalogLoadError {
    CatalogLoadError::InvalidLayout { id: id.clone(), reason }
}

/// Masses, capacities, thrust and ISP must be finite and non-negative.
fn check_quantity(id: &PartId, field: &str, value: f64) -> Result<(), CatalogLoadError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(id, format!("{} must be finite and non-negative, got {}", field, value)))
    }
}

fn check_module(module: &ModuleDescription) -> Result<(), CatalogLoadError> {
    check_quantity(&module.id, "mass", module.mass)?;
    match module.kind {
        ModuleKind::Cargo { cargo_mass, .. } => check_quantity(&module.id, "cargo_mass", cargo_mass),
        ModuleKind::Propellant { propellant_mass } => check_quantity(&module.id, "propellant_mass", propellant_mass),
        ModuleKind::Processing { throughput } => check_quantity(&module.id, "throughput", throughput),
    }
}

fn check_equipment(equipment: &EquipmentDescription) -> Result<(), CatalogLoadError> {
    let id = &equipment.id;
    check_quantity(id, "mass", equipment.mass)?;
    match equipment.kind {
        EquipmentKind::Engine {
            thrust,
            specific_impulse,
        } => {
            check_quantity(id, "thrust", thrust)?;
            check_quantity(id, "specific_impulse", specific_impulse)
        }
        EquipmentKind::Thruster { thrust } => check_quantity(id, "thrust", thrust),
        EquipmentKind::PropellantTank { propellant_mass } => check_quantity(id, "propellant_mass", propellant_mass),
        EquipmentKind::Hatch { .. } | EquipmentKind::Generic => Ok(()),
    }
}

fn check_compartment(catalog: &MemoryCatalog, compartment: &CompartmentDescription) -> Result<(), CatalogLoadError> {
    let id = &compartment.id;
    check_quantity(id, "mass", compartment.mass)?;
    if compartment.module_slots.len() > MAX_MODULE_COUNT {
        return Err(invalid(
            id,
            format!("{} module slots, at most {} allowed", compartment.module_slots.len(), MAX_MODULE_COUNT),
        ));
    }
    let equipment_count = compartment.equipment_slots.len();
    if equipment_count > MAX_EQUIPMENT_COUNT {
        return Err(invalid(
            id,
            format!("{} equipment slots, at most {} allowed", equipment_count, MAX_EQUIPMENT_COUNT),
        ));
    }

    let mut sockets = BTreeSet::new();
    for slot in &compartment.module_slots {
        if !sockets.insert(slot.socket_name.as_str()) {
            return Err(invalid(id, format!("socket '{}' declared twice", slot.socket_name)));
        }
    }
    let equipment_sockets: BTreeSet<&str> = compartment
        .equipment_slots
        .iter()
        .map(|slot| slot.socket_name.as_str())
        .collect();
    if equipment_sockets.len() != equipment_count {
        return Err(invalid(id, "equipment socket declared twice".to_string()));
    }

    for slot in &compartment.module_slots {
        for socket in slot.linked_equipment.iter().chain(&slot.supported_equipment) {
            if !equipment_sockets.contains(socket.as_str()) {
                return Err(invalid(
                    id,
                    format!("module slot '{}' references unknown socket '{}'", slot.socket_name, socket),
                ));
            }
        }
    }

    for (index, slot) in compartment.equipment_slots.iter().enumerate() {
        for &paired in &slot.paired_slots {
            if paired >= equipment_count || paired == index {
                return Err(invalid(
                    id,
                    format!("equipment slot '{}' pairs with invalid slot {}", slot.socket_name, paired),
                ));
            }
        }
    }

    for hull in &compartment.hull_variants {
        if catalog.hull(hull).is_none() {
            return Err(invalid(id, format!("unknown hull variant '{}'", hull)));
        }
    }
    Ok(())
}
