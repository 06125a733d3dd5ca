//! Spacecraft assembly — the mutable design being composed.
//!
//! An [`Assembly`] is an ordered list of [`Compartment`]s, each with
//! fixed-capacity module and equipment slots holding catalog ids. Structural
//! edits go through the `set_*` methods, which bounds-check slot indices
//! against the catalog layout of the compartment (not against the array
//! length) and mark the derived state stale.
//!
//! # Edit / commit
//!
//! Derived state — module fittings, module groups and propulsion metrics —
//! is never updated implicitly. After any structural edit the caller must
//! run [`Assembly::recompute`] before reading it:
//!
//! ```
//! use shipwright_logic::assembly::Assembly;
//! use shipwright_logic::catalog::MemoryCatalog;
//! use shipwright_logic::config::CompositionRules;
//!
//! let catalog = MemoryCatalog::new();
//! let mut assembly = Assembly::new("Tug");
//! assert!(!assembly.is_stale());
//! assembly.recompute(&catalog, &CompositionRules::default()).unwrap();
//! assert_eq!(assembly.propulsion_metrics().maximum_delta_v, 0.0);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{Catalog, CompartmentDescription, PartId};
use crate::config::CompositionRules;
use crate::constants::{MAX_COMPARTMENT_COUNT, MAX_EQUIPMENT_COUNT, MAX_MODULE_COUNT};
use crate::fittings::{update_fittings, ModuleFittings};
use crate::grouping::{build_module_groups, ModuleGroup};
use crate::propulsion::{compute_propulsion_metrics, PropulsionError, PropulsionMetrics};

// ============================================================================
// SLOTS & COMPARTMENTS
// ============================================================================

/// Cargo held by one module slot.
///
/// `resource` is `None` exactly when `amount` is zero. Only the cargo ledger
/// mutates it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cargo {
    pub(crate) resource: Option<PartId>,
    pub(crate) amount: f64,
}

impl Cargo {
    pub fn resource(&self) -> Option<&PartId> {
        self.resource.as_ref()
    }

    /// Mass held, in tonnes.
    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn is_empty(&self) -> bool {
        self.resource.is_none()
    }

    pub(crate) fn clear(&mut self) {
        self.resource = None;
        self.amount = 0.0;
    }
}

/// One module mounting point of a compartment.
#[derive(Debug, Clone, Default)]
pub struct ModuleSlot {
    pub(crate) module: Option<PartId>,
    pub(crate) cargo: Cargo,
    pub(crate) fittings: ModuleFittings,
}

impl ModuleSlot {
    pub fn module(&self) -> Option<&PartId> {
        self.module.as_ref()
    }

    pub fn cargo(&self) -> &Cargo {
        &self.cargo
    }

    /// Procedural fittings, as of the last recompute.
    pub fn fittings(&self) -> &ModuleFittings {
        &self.fittings
    }

    pub fn is_occupied(&self) -> bool {
        self.module.is_some()
    }

    fn same_structure(&self, other: &ModuleSlot) -> bool {
        self.module == other.module && self.cargo == other.cargo
    }
}

/// One hull section of an assembly. An empty `description` marks an
/// unoccupied position in the sequence.
#[derive(Debug, Clone, Default)]
pub struct Compartment {
    pub(crate) description: Option<PartId>,
    pub(crate) hull: Option<PartId>,
    pub(crate) modules: [ModuleSlot; MAX_MODULE_COUNT],
    pub(crate) equipment: [Option<PartId>; MAX_EQUIPMENT_COUNT],
}

impl Compartment {
    pub fn new(description: PartId) -> Self {
        Self {
            description: Some(description),
            ..Self::default()
        }
    }

    pub fn description(&self) -> Option<&PartId> {
        self.description.as_ref()
    }

    pub fn hull(&self) -> Option<&PartId> {
        self.hull.as_ref()
    }

    pub fn is_occupied(&self) -> bool {
        self.description.is_some()
    }

    pub fn modules(&self) -> &[ModuleSlot] {
        &self.modules
    }

    pub fn module_slot(&self, index: usize) -> Option<&ModuleSlot> {
        self.modules.get(index)
    }

    pub fn equipment(&self) -> &[Option<PartId>] {
        &self.equipment
    }

    pub fn equipment_at(&self, index: usize) -> Option<&PartId> {
        self.equipment.get(index)?.as_ref()
    }

    /// Module slot mounted on `socket_name`, with its index.
    pub fn module_by_socket<'a>(
        &'a self,
        layout: &CompartmentDescription,
        socket_name: &str,
    ) -> Option<(usize, &'a ModuleSlot)> {
        let index = layout.module_slot_index(socket_name)?;
        Some((index, self.modules.get(index)?))
    }

    /// Equipment mounted on `socket_name`.
    pub fn equipment_by_socket(&self, layout: &CompartmentDescription, socket_name: &str) -> Option<&PartId> {
        self.equipment_at(layout.equipment_slot_index(socket_name)?)
    }

    fn clear_contents(&mut self) {
        self.hull = None;
        self.modules = Default::default();
        self.equipment = Default::default();
    }

    fn same_structure(&self, other: &Compartment) -> bool {
        self.description == other.description
            && self.hull == other.hull
            && self.equipment == other.equipment
            && self
                .modules
                .iter()
                .zip(other.modules.iter())
                .all(|(a, b)| a.same_structure(b))
    }
}

/// Cosmetic choices. Paint and emblem values are palette indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customization {
    pub structural_paint: u8,
    pub hull_paint: u8,
    pub detail_paint: u8,
    pub emblem: u8,
    pub enable_hull_paint: bool,
}

// ============================================================================
// ERRORS
// ============================================================================

/// Rejected structural edit.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotError {
    /// Compartment index past the end of the sequence.
    CompartmentOutOfRange { index: usize, count: usize },
    /// The compartment at this index is unoccupied.
    EmptyCompartment(usize),
    /// Module slot index past the layout's declared slot count.
    ModuleSlotOutOfRange {
        compartment: usize,
        slot: usize,
        declared: usize,
    },
    /// Equipment slot index past the layout's declared slot count.
    EquipmentSlotOutOfRange {
        compartment: usize,
        slot: usize,
        declared: usize,
    },
    /// Id not present in the catalog.
    UnknownPart(PartId),
    /// Id resolves to an entry of another category.
    WrongPartKind { id: PartId, expected: &'static str },
    /// Assembly already holds the maximum number of compartments.
    TooManyCompartments(usize),
    /// Hull variant not offered for this compartment.
    IncompatibleHull { compartment: usize, hull: PartId },
}

impl fmt::Display for SlotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotError::CompartmentOutOfRange { index, count } => {
                write!(f, "compartment {} out of range ({} compartments)", index, count)
            }
            SlotError::EmptyCompartment(index) => write!(f, "compartment {} is empty", index),
            SlotError::ModuleSlotOutOfRange {
                compartment,
                slot,
                declared,
            } => write!(
                f,
                "module slot {} out of range in compartment {} ({} declared)",
                slot, compartment, declared
            ),
            SlotError::EquipmentSlotOutOfRange {
                compartment,
                slot,
                declared,
            } => write!(
                f,
                "equipment slot {} out of range in compartment {} ({} declared)",
                slot, compartment, declared
            ),
            SlotError::UnknownPart(id) => write!(f, "unknown part '{}'", id),
            SlotError::WrongPartKind { id, expected } => {
                write!(f, "part '{}' is not a {}", id, expected)
            }
            SlotError::TooManyCompartments(max) => {
                write!(f, "an assembly holds at most {} compartments", max)
            }
            SlotError::IncompatibleHull { compartment, hull } => {
                write!(f, "hull '{}' does not fit compartment {}", hull, compartment)
            }
        }
    }
}

impl std::error::Error for SlotError {}

fn expect_part(catalog: &dyn Catalog, id: &PartId, expected: &'static str) -> Result<(), SlotError> {
    match catalog.lookup(id) {
        None => Err(SlotError::UnknownPart(id.clone())),
        Some(entry) if entry.category() != expected => Err(SlotError::WrongPartKind {
            id: id.clone(),
            expected,
        }),
        Some(_) => Ok(()),
    }
}

// ============================================================================
// ASSEMBLY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Neighbor {
    Previous,
    Next,
}

/// A complete spacecraft design plus its derived state.
#[derive(Debug, Clone)]
pub struct Assembly {
    identifier: Uuid,
    name: String,
    compartments: Vec<Compartment>,
    customization: Customization,
    propellant_mass_at_launch: f64,
    propulsion_metrics: PropulsionMetrics,
    module_groups: Vec<ModuleGroup>,
    stale: bool,
}

impl Assembly {
    /// Create an empty design with a fresh identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_identifier(Uuid::new_v4(), name)
    }

    /// Create an empty design with a known identifier (used when loading).
    pub fn with_identifier(identifier: Uuid, name: impl Into<String>) -> Self {
        Self {
            identifier,
            name: name.into(),
            compartments: Vec::new(),
            customization: Customization::default(),
            propellant_mass_at_launch: 0.0,
            propulsion_metrics: PropulsionMetrics::default(),
            module_groups: Vec::new(),
            stale: false,
        }
    }

    pub fn identifier(&self) -> Uuid {
        self.identifier
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn compartments(&self) -> &[Compartment] {
        &self.compartments
    }

    pub fn compartment(&self, index: usize) -> Option<&Compartment> {
        self.compartments.get(index)
    }

    pub fn compartment_count(&self) -> usize {
        self.compartments.len()
    }

    pub fn customization(&self) -> &Customization {
        &self.customization
    }

    /// Propellant loaded at departure, clamped to capacity on recompute.
    pub fn propellant_mass_at_launch(&self) -> f64 {
        self.propellant_mass_at_launch
    }

    /// Metrics as of the last recompute.
    pub fn propulsion_metrics(&self) -> &PropulsionMetrics {
        &self.propulsion_metrics
    }

    /// Module groups as of the last recompute.
    pub fn module_groups(&self) -> &[ModuleGroup] {
        &self.module_groups
    }

    /// Whether a structural edit happened since the last recompute.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    // ── Adjacency ──────────────────────────────────────────────────────

    /// No occupied compartment before `index`.
    pub fn is_first_compartment(&self, index: usize) -> bool {
        let end = index.min(self.compartments.len());
        self.compartments[..end].iter().all(|c| !c.is_occupied())
    }

    /// No occupied compartment after `index`.
    pub fn is_last_compartment(&self, index: usize) -> bool {
        self.compartments
            .iter()
            .skip(index + 1)
            .all(|c| !c.is_occupied())
    }

    /// Catalog layout of the compartment at `index`.
    pub fn layout<'c>(
        &self,
        catalog: &'c dyn Catalog,
        index: usize,
    ) -> Result<&'c CompartmentDescription, SlotError> {
        let compartment = self
            .compartments
            .get(index)
            .ok_or(SlotError::CompartmentOutOfRange {
                index,
                count: self.compartments.len(),
            })?;
        let id = compartment
            .description
            .as_ref()
            .ok_or(SlotError::EmptyCompartment(index))?;
        catalog
            .compartment(id)
            .ok_or_else(|| SlotError::UnknownPart(id.clone()))
    }

    /// Module id mounted at (`index`, `module_index`).
    pub fn module_id(&self, index: usize, module_index: usize) -> Option<&PartId> {
        self.compartments
            .get(index)?
            .modules
            .get(module_index)?
            .module
            .as_ref()
    }

    /// Slot sharing the socket name of (`index`, `module_index`) in the
    /// compartment at literal index `index - 1`, if that compartment is
    /// occupied and declares the socket.
    pub fn previous_module_slot(&self, catalog: &dyn Catalog, index: usize, module_index: usize) -> Option<(usize, usize)> {
        self.neighbor_slot(catalog, index, module_index, Neighbor::Previous)
    }

    /// Same as [`previous_module_slot`](Self::previous_module_slot), at `index + 1`.
    pub fn next_module_slot(&self, catalog: &dyn Catalog, index: usize, module_index: usize) -> Option<(usize, usize)> {
        self.neighbor_slot(catalog, index, module_index, Neighbor::Next)
    }

    pub fn is_same_module_in_previous_compartment(&self, catalog: &dyn Catalog, index: usize, module_index: usize) -> bool {
        self.is_same_module_in(catalog, index, module_index, Neighbor::Previous)
    }

    pub fn is_same_module_in_next_compartment(&self, catalog: &dyn Catalog, index: usize, module_index: usize) -> bool {
        self.is_same_module_in(catalog, index, module_index, Neighbor::Next)
    }

    /// Any module (identical or not) on the same socket in the next compartment.
    pub fn is_any_module_in_next_compartment(&self, catalog: &dyn Catalog, index: usize, module_index: usize) -> bool {
        self.next_module_slot(catalog, index, module_index)
            .and_then(|(ci, mi)| self.module_id(ci, mi))
            .is_some()
    }

    /// Whether the compartment carries nose or tail equipment.
    pub fn has_forward_or_aft_equipment(&self, catalog: &dyn Catalog, index: usize) -> bool {
        use crate::catalog::EquipmentPosition::{Aft, Forward};

        let Ok(layout) = self.layout(catalog, index) else {
            return false;
        };
        let compartment = &self.compartments[index];
        layout.equipment_slots.iter().enumerate().any(|(slot, declared)| {
            compartment.equipment_at(slot).is_some()
                && (declared.supported_positions.contains(&Forward)
                    || declared.supported_positions.contains(&Aft))
        })
    }

    fn neighbor_slot(
        &self,
        catalog: &dyn Catalog,
        index: usize,
        module_index: usize,
        neighbor: Neighbor,
    ) -> Option<(usize, usize)> {
        let layout = self.layout(catalog, index).ok()?;
        let socket = &layout.module_slot(module_index)?.socket_name;
        let other_index = match neighbor {
            Neighbor::Previous => index.checked_sub(1)?,
            Neighbor::Next => index + 1,
        };
        let other_layout = self.layout(catalog, other_index).ok()?;
        let other_module_index = other_layout.module_slot_index(socket)?;
        Some((other_index, other_module_index))
    }

    fn is_same_module_in(&self, catalog: &dyn Catalog, index: usize, module_index: usize, neighbor: Neighbor) -> bool {
        let Some(current) = self.module_id(index, module_index) else {
            return false;
        };
        self.neighbor_slot(catalog, index, module_index, neighbor)
            .and_then(|(ci, mi)| self.module_id(ci, mi))
            .map_or(false, |other| other == current)
    }

    // ── Structural edits ───────────────────────────────────────────────

    /// Append a compartment (or an empty position) to the sequence.
    pub fn push_compartment(&mut self, catalog: &dyn Catalog, description: Option<PartId>) -> Result<usize, SlotError> {
        let index = self.compartments.len();
        self.insert_compartment(catalog, index, description)?;
        Ok(index)
    }

    /// Insert a compartment before `index`; `index == len` appends.
    pub fn insert_compartment(
        &mut self,
        catalog: &dyn Catalog,
        index: usize,
        description: Option<PartId>,
    ) -> Result<(), SlotError> {
        if self.compartments.len() >= MAX_COMPARTMENT_COUNT {
            return Err(SlotError::TooManyCompartments(MAX_COMPARTMENT_COUNT));
        }
        if index > self.compartments.len() {
            return Err(SlotError::CompartmentOutOfRange {
                index,
                count: self.compartments.len(),
            });
        }
        if let Some(id) = &description {
            expect_part(catalog, id, "compartment")?;
        }
        self.compartments.insert(
            index,
            Compartment {
                description,
                ..Compartment::default()
            },
        );
        self.stale = true;
        Ok(())
    }

    pub fn remove_compartment(&mut self, index: usize) -> Result<Compartment, SlotError> {
        if index >= self.compartments.len() {
            return Err(SlotError::CompartmentOutOfRange {
                index,
                count: self.compartments.len(),
            });
        }
        self.stale = true;
        Ok(self.compartments.remove(index))
    }

    /// Replace the compartment type at `index`. Changing the type clears
    /// the hull, modules, cargo and equipment; `None` leaves an empty position.
    pub fn set_compartment(
        &mut self,
        catalog: &dyn Catalog,
        index: usize,
        description: Option<PartId>,
    ) -> Result<(), SlotError> {
        let count = self.compartments.len();
        let compartment = self
            .compartments
            .get_mut(index)
            .ok_or(SlotError::CompartmentOutOfRange { index, count })?;
        if let Some(id) = &description {
            expect_part(catalog, id, "compartment")?;
        }
        if compartment.description != description {
            compartment.description = description;
            compartment.clear_contents();
            self.stale = true;
        }
        Ok(())
    }

    pub fn set_hull(&mut self, catalog: &dyn Catalog, index: usize, hull: Option<PartId>) -> Result<(), SlotError> {
        let layout = self.layout(catalog, index)?;
        if let Some(id) = &hull {
            expect_part(catalog, id, "hull")?;
            if !layout.accepts_hull(id) {
                return Err(SlotError::IncompatibleHull {
                    compartment: index,
                    hull: id.clone(),
                });
            }
        }
        let compartment = &mut self.compartments[index];
        if compartment.hull != hull {
            compartment.hull = hull;
            self.stale = true;
        }
        Ok(())
    }

    /// Mount or clear a module. Replacing a module empties its cargo.
    pub fn set_module(
        &mut self,
        catalog: &dyn Catalog,
        index: usize,
        slot: usize,
        module: Option<PartId>,
    ) -> Result<(), SlotError> {
        let layout = self.layout(catalog, index)?;
        let declared = layout.module_slots.len().min(MAX_MODULE_COUNT);
        if slot >= declared {
            return Err(SlotError::ModuleSlotOutOfRange {
                compartment: index,
                slot,
                declared,
            });
        }
        if let Some(id) = &module {
            expect_part(catalog, id, "module")?;
        }
        let target = &mut self.compartments[index].modules[slot];
        if target.module != module {
            target.module = module;
            target.cargo.clear();
            self.stale = true;
        }
        Ok(())
    }

    pub fn set_equipment(
        &mut self,
        catalog: &dyn Catalog,
        index: usize,
        slot: usize,
        equipment: Option<PartId>,
    ) -> Result<(), SlotError> {
        let layout = self.layout(catalog, index)?;
        let declared = layout.equipment_slots.len().min(MAX_EQUIPMENT_COUNT);
        if slot >= declared {
            return Err(SlotError::EquipmentSlotOutOfRange {
                compartment: index,
                slot,
                declared,
            });
        }
        if let Some(id) = &equipment {
            expect_part(catalog, id, "equipment")?;
        }
        let target = &mut self.compartments[index].equipment[slot];
        if *target != equipment {
            *target = equipment;
            self.stale = true;
        }
        Ok(())
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_customization(&mut self, customization: Customization) {
        self.customization = customization;
    }

    /// Set the departure propellant load, clamped into `[0, capacity]`
    /// using the capacity of the last recompute.
    pub fn set_propellant_mass_at_launch(&mut self, mass: f64) {
        let capacity = self.propulsion_metrics.propellant_mass_capacity;
        self.propellant_mass_at_launch = mass.clamp(0.0, capacity.max(0.0));
    }

    // ── Commit ─────────────────────────────────────────────────────────

    /// Rebuild all derived state: fittings, then module groups, then
    /// propulsion metrics.
    ///
    /// On a propulsion precondition failure the fittings and groups are
    /// still refreshed, the metrics are zeroed and the error is returned.
    pub fn recompute(&mut self, catalog: &dyn Catalog, rules: &CompositionRules) -> Result<(), PropulsionError> {
        update_fittings(self, catalog);
        self.module_groups = build_module_groups(self, catalog);
        self.stale = false;

        let result = compute_propulsion_metrics(self, catalog, rules);
        self.propulsion_metrics = match &result {
            Ok(metrics) => *metrics,
            Err(_) => PropulsionMetrics::default(),
        };
        self.propellant_mass_at_launch = self
            .propellant_mass_at_launch
            .min(self.propulsion_metrics.propellant_mass_capacity);
        result.map(|_| ())
    }

    /// Structural equality: identity, name, customization, compartments
    /// and cargo. Derived state is ignored.
    pub fn same_structure(&self, other: &Assembly) -> bool {
        self.identifier == other.identifier
            && self.name == other.name
            && self.customization == other.customization
            && self.compartments.len() == other.compartments.len()
            && self
                .compartments
                .iter()
                .zip(other.compartments.iter())
                .all(|(a, b)| a.same_structure(b))
    }

    pub(crate) fn compartments_mut(&mut self) -> &mut [Compartment] {
        &mut self.compartments
    }
}
