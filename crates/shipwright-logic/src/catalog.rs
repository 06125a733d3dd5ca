//! Static part catalog — compartments, hulls, modules, equipment, resources.
//!
//! Catalog entries are immutable records looked up by a stable [`PartId`].
//! An [`Assembly`](crate::assembly::Assembly) never owns them: it stores ids
//! and every algorithm resolves them through a [`Catalog`] passed in by the
//! caller.
//!
//! Module and equipment behavior is a closed set of variants
//! ([`ModuleKind`], [`EquipmentKind`]), each carrying only the attributes
//! relevant to that kind.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// IDENTIFIERS & TAGS
// ============================================================================

/// Stable identity of a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartId(pub String);

impl PartId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PartId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Storage class of a resource. A cargo module only holds its own class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    /// Crates and containers.
    General,
    /// Loose solids (ore, regolith).
    Bulk,
    /// Pressurized liquids.
    Liquid,
}

/// Mounting position of an equipment part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipmentPosition {
    /// Side-mounted, fits any compartment.
    Standard,
    /// Nose equipment, only on the first compartment.
    Forward,
    /// Tail equipment, only on the last compartment.
    Aft,
    /// Radial mounts around the hull.
    Radial,
}

// ============================================================================
// COMPARTMENTS
// ============================================================================

/// One module mounting point declared by a compartment layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSlotLayout {
    /// Socket name, shared across compartments for longitudinal continuity.
    pub socket_name: String,
    pub display_name: String,
    /// Equipment sockets whose occupancy makes this module need a skirt.
    #[serde(default)]
    pub supported_equipment: Vec<String>,
    /// Equipment sockets that link this module to a module group.
    #[serde(default)]
    pub linked_equipment: Vec<String>,
    /// Central slots route piping through the skirt unconditionally.
    #[serde(default)]
    pub force_skirt_piping: bool,
}

/// One equipment mounting point declared by a compartment layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentSlotLayout {
    pub socket_name: String,
    pub display_name: String,
    /// Accepted equipment positions. Empty accepts every position.
    #[serde(default)]
    pub supported_positions: Vec<EquipmentPosition>,
    /// Symmetrical slots that must hold the same part when pairing is required.
    #[serde(default)]
    pub paired_slots: Vec<usize>,
}

/// Hull section definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompartmentDescription {
    pub id: PartId,
    pub name: String,
    /// Structural mass in tonnes.
    pub mass: f64,
    pub module_slots: Vec<ModuleSlotLayout>,
    pub equipment_slots: Vec<EquipmentSlotLayout>,
    /// Nose compartments can only be placed first.
    #[serde(default)]
    pub is_forward_compartment: bool,
    /// Hull variants that fit this compartment. Empty accepts every hull.
    #[serde(default)]
    pub hull_variants: Vec<PartId>,
}

impl CompartmentDescription {
    pub fn module_slot(&self, index: usize) -> Option<&ModuleSlotLayout> {
        self.module_slots.get(index)
    }

    pub fn equipment_slot(&self, index: usize) -> Option<&EquipmentSlotLayout> {
        self.equipment_slots.get(index)
    }

    /// Index of the module slot mounted on `socket_name`.
    pub fn module_slot_index(&self, socket_name: &str) -> Option<usize> {
        self.module_slots
            .iter()
            .position(|slot| slot.socket_name == socket_name)
    }

    /// Index of the equipment slot mounted on `socket_name`.
    pub fn equipment_slot_index(&self, socket_name: &str) -> Option<usize> {
        self.equipment_slots
            .iter()
            .position(|slot| slot.socket_name == socket_name)
    }

    pub fn accepts_hull(&self, hull: &PartId) -> bool {
        self.hull_variants.is_empty() || self.hull_variants.contains(hull)
    }
}

/// Cosmetic hull variant for a compartment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HullDescription {
    pub id: PartId,
    pub name: String,
}

// ============================================================================
// MODULES
// ============================================================================

/// Kind-specific module attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ModuleKind {
    /// Cargo hold for one resource class.
    Cargo {
        cargo_type: ResourceType,
        /// Capacity in tonnes.
        cargo_mass: f64,
    },
    /// Internal propellant tank.
    Propellant {
        /// Capacity in tonnes.
        propellant_mass: f64,
    },
    /// Processing plant (refinery, smelter).
    Processing {
        /// Tonnes processed per hour.
        throughput: f64,
    },
}

/// Module definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDescription {
    pub id: PartId,
    pub name: String,
    /// Dry mass in tonnes.
    pub mass: f64,
    /// Whether the module needs propellant piping to neighbors.
    #[serde(default)]
    pub needs_piping: bool,
    pub kind: ModuleKind,
}

impl ModuleDescription {
    pub fn cargo_type(&self) -> Option<ResourceType> {
        match self.kind {
            ModuleKind::Cargo { cargo_type, .. } => Some(cargo_type),
            _ => None,
        }
    }

    /// Cargo capacity for a given resource class, 0 if it does not store it.
    pub fn cargo_capacity(&self, resource_type: ResourceType) -> f64 {
        match self.kind {
            ModuleKind::Cargo {
                cargo_type,
                cargo_mass,
            } if cargo_type == resource_type => cargo_mass,
            _ => 0.0,
        }
    }
}

// ============================================================================
// EQUIPMENT
// ============================================================================

/// Kind-specific equipment attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EquipmentKind {
    /// Main drive.
    Engine {
        /// Thrust in kN.
        thrust: f64,
        /// Specific impulse in seconds.
        specific_impulse: f64,
    },
    /// Attitude control thruster.
    Thruster {
        /// Thrust in kN.
        thrust: f64,
    },
    /// External propellant tank.
    PropellantTank {
        /// Capacity in tonnes.
        propellant_mass: f64,
    },
    /// Docking hatch, optionally with habitable space.
    Hatch {
        #[serde(default)]
        is_habitat: bool,
    },
    /// Anything without propulsion or access semantics.
    Generic,
}

/// Equipment definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentDescription {
    pub id: PartId,
    pub name: String,
    /// Dry mass in tonnes.
    pub mass: f64,
    /// Must be mirrored on every paired slot.
    #[serde(default)]
    pub requires_pairing: bool,
    pub position: EquipmentPosition,
    pub kind: EquipmentKind,
}

impl EquipmentDescription {
    pub fn is_hatch(&self) -> bool {
        matches!(self.kind, EquipmentKind::Hatch { .. })
    }

    pub fn is_habitat(&self) -> bool {
        matches!(self.kind, EquipmentKind::Hatch { is_habitat: true })
    }

    pub fn is_thruster(&self) -> bool {
        matches!(self.kind, EquipmentKind::Thruster { .. })
    }
}

// ============================================================================
// RESOURCES
// ============================================================================

/// Tradable resource stored in cargo modules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescription {
    pub id: PartId,
    pub name: String,
    pub resource_type: ResourceType,
}

// ============================================================================
// CATALOG
// ============================================================================

/// Any catalog record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category")]
pub enum CatalogEntry {
    Compartment(CompartmentDescription),
    Hull(HullDescription),
    Module(ModuleDescription),
    Equipment(EquipmentDescription),
    Resource(ResourceDescription),
}

impl CatalogEntry {
    pub fn id(&self) -> &PartId {
        match self {
            Self::Compartment(c) => &c.id,
            Self::Hull(h) => &h.id,
            Self::Module(m) => &m.id,
            Self::Equipment(e) => &e.id,
            Self::Resource(r) => &r.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Compartment(c) => &c.name,
            Self::Hull(h) => &h.name,
            Self::Module(m) => &m.name,
            Self::Equipment(e) => &e.name,
            Self::Resource(r) => &r.name,
        }
    }

    /// Short category label, used in error messages.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Compartment(_) => "compartment",
            Self::Hull(_) => "hull",
            Self::Module(_) => "module",
            Self::Equipment(_) => "equipment",
            Self::Resource(_) => "resource",
        }
    }
}

/// Read-only lookup service over catalog entries.
///
/// Implementations must iterate [`entries`](Catalog::entries) in a stable
/// order; compatibility queries and design generation depend on it.
pub trait Catalog {
    fn lookup(&self, id: &PartId) -> Option<&CatalogEntry>;

    /// Every entry, in a stable order.
    fn entries(&self) -> Box<dyn Iterator<Item = &CatalogEntry> + '_>;

    fn compartment(&self, id: &PartId) -> Option<&CompartmentDescription> {
        match self.lookup(id)? {
            CatalogEntry::Compartment(c) => Some(c),
            _ => None,
        }
    }

    fn hull(&self, id: &PartId) -> Option<&HullDescription> {
        match self.lookup(id)? {
            CatalogEntry::Hull(h) => Some(h),
            _ => None,
        }
    }

    fn module(&self, id: &PartId) -> Option<&ModuleDescription> {
        match self.lookup(id)? {
            CatalogEntry::Module(m) => Some(m),
            _ => None,
        }
    }

    fn equipment(&self, id: &PartId) -> Option<&EquipmentDescription> {
        match self.lookup(id)? {
            CatalogEntry::Equipment(e) => Some(e),
            _ => None,
        }
    }

    fn resource(&self, id: &PartId) -> Option<&ResourceDescription> {
        match self.lookup(id)? {
            CatalogEntry::Resource(r) => Some(r),
            _ => None,
        }
    }
}

/// In-memory catalog sorted by part id.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    entries: BTreeMap<PartId, CatalogEntry>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, returning the one it replaced.
    pub fn insert(&mut self, entry: CatalogEntry) -> Option<CatalogEntry> {
        self.entries.insert(entry.id().clone(), entry)
    }

    pub fn contains(&self, id: &PartId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Catalog for MemoryCatalog {
    fn lookup(&self, id: &PartId) -> Option<&CatalogEntry> {
        self.entries.get(id)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = &CatalogEntry> + '_> {
        Box::new(self.entries.values())
    }
}

impl FromIterator<CatalogEntry> for MemoryCatalog {
    fn from_iter<I: IntoIterator<Item = CatalogEntry>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for entry in iter {
            catalog.insert(entry);
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_catalog;

    #[test]
    fn test_typed_lookup() {
        let catalog = sample_catalog();
        assert!(catalog.compartment(&"compartment.standard".into()).is_some());
        assert!(catalog.module(&"compartment.standard".into()).is_none());
        assert!(catalog.module(&"module.cargo.general".into()).is_some());
        assert!(catalog.equipment(&"equipment.engine".into()).is_some());
        assert!(catalog.resource(&"resource.ore".into()).is_some());
        assert!(catalog.lookup(&"does.not.exist".into()).is_none());
    }

    #[test]
    fn test_entries_sorted_by_id() {
        let catalog = sample_catalog();
        let ids: Vec<&PartId> = catalog.entries().map(|e| e.id()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_cargo_capacity_by_type() {
        let catalog = sample_catalog();
        let module = catalog.module(&"module.cargo.general".into()).unwrap();
        assert_eq!(module.cargo_capacity(ResourceType::General), 100.0);
        assert_eq!(module.cargo_capacity(ResourceType::Bulk), 0.0);

        let tank = catalog.module(&"module.propellant".into()).unwrap();
        assert_eq!(tank.cargo_type(), None);
    }

    #[test]
    fn test_socket_lookup() {
        let catalog = sample_catalog();
        let compartment = catalog.compartment(&"compartment.standard".into()).unwrap();
        assert_eq!(compartment.module_slot_index("module.left"), Some(0));
        assert_eq!(compartment.equipment_slot_index("equipment.left"), Some(0));
        assert_eq!(compartment.module_slot_index("nope"), None);
    }

    #[test]
    fn test_insert_replaces() {
        let mut catalog = MemoryCatalog::new();
        let hull = CatalogEntry::Hull(HullDescription {
            id: "hull.a".into(),
            name: "A".into(),
        });
        assert!(catalog.insert(hull.clone()).is_none());
        let replaced = catalog.insert(hull.clone());
        assert_eq!(replaced, Some(hull));
        assert_eq!(catalog.len(), 1);
    }
}
