//! Save/Load functionality for persisting designs
//!
//! Only the persisted fields of an assembly are written: identity, name,
//! customization, launch propellant and per-compartment parts and cargo.
//! Fittings, module groups and metrics are rebuilt by a recompute on load.
//! Saves use bincode; JSON export is available for tooling.

use serde::{Deserialize, Serialize};
use shipwright_logic::assembly::{Assembly, Compartment, Customization, SlotError};
use shipwright_logic::cargo::{modify_cargo, SlotFilter};
use shipwright_logic::catalog::{Catalog, PartId};
use shipwright_logic::config::CompositionRules;
use std::io::{Read, Write};
use uuid::Uuid;

/// Version number for save file format (increment when format changes)
pub const SAVE_VERSION: u32 = 1;

/// Versioned save file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    /// Save format version
    pub version: u32,
    pub assembly: SavedAssembly,
}

/// Persisted fields of an assembly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedAssembly {
    pub identifier: Uuid,
    pub name: String,
    pub customization: Customization,
    pub propellant_mass_at_launch: f64,
    pub compartments: Vec<SavedCompartment>,
}

/// One compartment position; `description: None` is an empty position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedCompartment {
    pub description: Option<PartId>,
    pub hull: Option<PartId>,
    pub modules: Vec<SavedModule>,
    pub equipment: Vec<Option<PartId>>,
}

/// One module slot with its cargo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedModule {
    pub module: Option<PartId>,
    pub resource: Option<PartId>,
    pub amount: f64,
}

impl From<&Compartment> for SavedCompartment {
    fn from(compartment: &Compartment) -> Self {
        Self {
            description: compartment.description().cloned(),
            hull: compartment.hull().cloned(),
            modules: compartment
                .modules()
                .iter()
                .map(|slot| SavedModule {
                    module: slot.module().cloned(),
                    resource: slot.cargo().resource().cloned(),
                    amount: slot.cargo().amount(),
                })
                .collect(),
            equipment: compartment.equipment().to_vec(),
        }
    }
}

impl From<&Assembly> for SavedAssembly {
    fn from(assembly: &Assembly) -> Self {
        Self {
            identifier: assembly.identifier(),
            name: assembly.name().to_string(),
            customization: assembly.customization().clone(),
            propellant_mass_at_launch: assembly.propellant_mass_at_launch(),
            compartments: assembly.compartments().iter().map(SavedCompartment::from).collect(),
        }
    }
}

impl SavedAssembly {
    /// Rebuild a live assembly, resolving every part through `catalog`, and
    /// run the full recompute before returning it.
    pub fn restore(&self, catalog: &dyn Catalog, rules: &CompositionRules) -> Result<Assembly, SaveError> {
        let mut assembly = Assembly::with_identifier(self.identifier, self.name.clone());
        assembly.set_customization(self.customization.clone());

        for (index, saved) in self.compartments.iter().enumerate() {
            assembly.push_compartment(catalog, saved.description.clone())?;
            if saved.description.is_none() {
                continue;
            }
            if saved.hull.is_some() {
                assembly.set_hull(catalog, index, saved.hull.clone())?;
            }
            for (slot, module) in saved.modules.iter().enumerate() {
                if module.module.is_some() {
                    assembly.set_module(catalog, index, slot, module.module.clone())?;
                }
            }
            for (slot, equipment) in saved.equipment.iter().enumerate() {
                if equipment.is_some() {
                    assembly.set_equipment(catalog, index, slot, equipment.clone())?;
                }
            }
        }

        // Setting a module clears its cargo, so cargo goes back in once the structure is complete
        if let Err(e) = assembly.recompute(catalog, rules) {
            log::warn!("Restored design '{}' has no valid propulsion: {}", self.name, e);
        }
        for (index, saved) in self.compartments.iter().enumerate() {
            for (slot, module) in saved.modules.iter().enumerate() {
                let Some(resource) = &module.resource else {
                    continue;
                };
                if catalog.resource(resource).is_none() {
                    return Err(SaveError::UnknownPart(resource.clone()));
                }
                let stored = modify_cargo(
                    &mut assembly,
                    catalog,
                    resource,
                    module.amount,
                    SlotFilter::Index(index),
                    SlotFilter::Index(slot),
                );
                if !stored {
                    log::warn!(
                        "Cargo of {} ({:.1}T) no longer fits module slot {} of compartment {}",
                        resource,
                        module.amount,
                        slot,
                        index
                    );
                }
            }
        }

        assembly.set_propellant_mass_at_launch(self.propellant_mass_at_launch);
        Ok(assembly)
    }
}

/// Save an assembly to a writer
pub fn save_assembly<W: Write>(writer: W, assembly: &Assembly) -> Result<(), SaveError> {
    let save_data = SaveData {
        version: SAVE_VERSION,
        assembly: SavedAssembly::from(assembly),
    };
    bincode::serialize_into(writer, &save_data)?;
    Ok(())
}

/// Load an assembly from a reader
pub fn load_assembly<R: Read>(
    reader: R,
    catalog: &dyn Catalog,
    rules: &CompositionRules,
) -> Result<Assembly, SaveError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;

    if save_data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }

    save_data.assembly.restore(catalog, rules)
}

/// Export the persisted fields of an assembly as pretty JSON
pub fn export_json(assembly: &Assembly) -> Result<String, SaveError> {
    Ok(serde_json::to_string_pretty(&SavedAssembly::from(assembly))?)
}

/// Import an assembly exported by [`export_json`]
pub fn import_json(json: &str, catalog: &dyn Catalog, rules: &CompositionRules) -> Result<Assembly, SaveError> {
    let saved: SavedAssembly = serde_json::from_str(json)?;
    saved.restore(catalog, rules)
}

/// Errors that can occur during save/load
#[derive(Debug)]
pub enum SaveError {
    Io(std::io::Error),
    Bincode(Box<bincode::ErrorKind>),
    Json(serde_json::Error),
    VersionMismatch { expected: u32, found: u32 },
    /// A saved part id the catalog no longer knows
    UnknownPart(PartId),
    /// A saved part that no longer fits its slot
    Slot(SlotError),
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for SaveError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        SaveError::Bincode(e)
    }
}

impl From<serde_json::Error> for SaveError {
    fn from(e: serde_json::Error) -> Self {
        SaveError::Json(e)
    }
}

impl From<SlotError> for SaveError {
    fn from(e: SlotError) -> Self {
        match e {
            SlotError::UnknownPart(id) | SlotError::WrongPartKind { id, .. } => SaveError::UnknownPart(id),
            other => SaveError::Slot(other),
        }
    }
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "IO error: {}", e),
            SaveError::Bincode(e) => write!(f, "Serialization error: {}", e),
            SaveError::Json(e) => write!(f, "JSON error: {}", e),
            SaveError::VersionMismatch { expected, found } => {
                write!(f, "Save version mismatch: expected {}, found {}", expected, found)
            }
            SaveError::UnknownPart(id) => write!(f, "Saved part '{}' is not in the catalog", id),
            SaveError::Slot(e) => write!(f, "Saved layout no longer fits: {}", e),
        }
    }
}

impl std::error::Error for SaveError {}
