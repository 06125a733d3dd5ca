//! Shipyard - one design session: catalog, prices, rules and the working design
//!
//! Edits go straight to the working [`Assembly`] and leave its derived
//! state stale. [`Shipyard::commit`] runs the recompute; until then every
//! accessor for fittings, groups or metrics returns
//! [`ShipyardError::StaleDerivedState`].

use std::io::{Read, Write};

use rand::Rng;
use shipwright_logic::assembly::{Assembly, Customization, SlotError};
use shipwright_logic::cargo::{modify_cargo, query_available, query_capacity, query_mass, SlotFilter};
use shipwright_logic::catalog::{
    Catalog, CompartmentDescription, EquipmentDescription, MemoryCatalog, ModuleDescription, PartId,
};
use shipwright_logic::compatibility::{compatible_compartments, compatible_equipment, compatible_modules};
use shipwright_logic::grouping::ModuleGroup;
use shipwright_logic::pricing::{upgrade_cost, UpgradeCost};
use shipwright_logic::propulsion::{Classification, CompartmentMetrics, PropulsionError, PropulsionMetrics};
use shipwright_logic::validation::{validate_design, DesignIssue};

use crate::config::ShipyardConfig;
use crate::generation::generate_design;
use crate::market::PriceTable;
use crate::persistence::{self, SaveError};

/// Default name for a fresh design
pub const NEW_DESIGN_NAME: &str = "New spacecraft";

/// Errors surfaced by a design session
#[derive(Debug)]
pub enum ShipyardError {
    /// Rejected structural edit
    Slot(SlotError),
    /// Recompute failed its propulsion preconditions
    Propulsion(PropulsionError),
    /// Derived state read before the pending edits were committed
    StaleDerivedState,
    /// Design failed validation
    Design(Vec<DesignIssue>),
    Save(SaveError),
}

impl From<SlotError> for ShipyardError {
    fn from(e: SlotError) -> Self {
        ShipyardError::Slot(e)
    }
}

impl From<PropulsionError> for ShipyardError {
    fn from(e: PropulsionError) -> Self {
        ShipyardError::Propulsion(e)
    }
}

impl From<SaveError> for ShipyardError {
    fn from(e: SaveError) -> Self {
        ShipyardError::Save(e)
    }
}

impl std::fmt::Display for ShipyardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShipyardError::Slot(e) => write!(f, "Edit rejected: {}", e),
            ShipyardError::Propulsion(e) => write!(f, "Propulsion error: {}", e),
            ShipyardError::StaleDerivedState => write!(f, "Design has uncommitted edits"),
            ShipyardError::Design(issues) => {
                let messages: Vec<String> = issues.iter().map(|i| i.to_string()).collect();
                write!(f, "Design is not flyable: {}", messages.join("; "))
            }
            ShipyardError::Save(e) => write!(f, "Save error: {}", e),
        }
    }
}

impl std::error::Error for ShipyardError {}

/// Owner of a design session
pub struct Shipyard {
    catalog: MemoryCatalog,
    prices: PriceTable,
    config: ShipyardConfig,
    assembly: Assembly,
}

impl Shipyard {
    /// Start a session with an empty, committed design
    pub fn new(catalog: MemoryCatalog, prices: PriceTable, config: ShipyardConfig) -> Self {
        for issue in config.validate() {
            log::warn!("Shipyard config: {}; the generator clamps it", issue);
        }
        let mut assembly = Assembly::new(NEW_DESIGN_NAME);
        let _ = assembly.recompute(&catalog, &config.rules);
        Self {
            catalog,
            prices,
            config,
            assembly,
        }
    }

    pub fn catalog(&self) -> &MemoryCatalog {
        &self.catalog
    }

    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    pub fn config(&self) -> &ShipyardConfig {
        &self.config
    }

    /// The working design, including possibly stale derived state
    pub fn assembly(&self) -> &Assembly {
        &self.assembly
    }

    pub fn is_stale(&self) -> bool {
        self.assembly.is_stale()
    }

    /// Discard the working design and start an empty one
    pub fn new_design(&mut self, name: &str) {
        log::info!("New design '{}'", name);
        self.assembly = Assembly::new(name);
        // An empty design always passes the propulsion preconditions
        let _ = self.assembly.recompute(&self.catalog, &self.config.rules);
    }

    /// Replace the working design and commit it
    pub fn open_design(&mut self, assembly: Assembly) -> Result<(), ShipyardError> {
        log::info!("Opened design '{}' ({} compartments)", assembly.name(), assembly.compartment_count());
        self.assembly = assembly;
        self.commit()
    }

    // ── Edits ──────────────────────────────────────────────────────────

    fn edit<T>(
        &mut self,
        what: &str,
        apply: impl FnOnce(&mut Assembly, &dyn Catalog) -> Result<T, SlotError>,
    ) -> Result<T, ShipyardError> {
        let catalog: &dyn Catalog = &self.catalog;
        apply(&mut self.assembly, catalog).map_err(|e| {
            log::warn!("Rejected {}: {}", what, e);
            ShipyardError::Slot(e)
        })
    }

    pub fn push_compartment(&mut self, description: Option<PartId>) -> Result<usize, ShipyardError> {
        self.edit("compartment push", |a, c| a.push_compartment(c, description))
    }

    pub fn insert_compartment(&mut self, index: usize, description: Option<PartId>) -> Result<(), ShipyardError> {
        self.edit("compartment insert", |a, c| a.insert_compartment(c, index, description))
    }

    pub fn remove_compartment(&mut self, index: usize) -> Result<(), ShipyardError> {
        self.edit("compartment removal", |a, _| a.remove_compartment(index).map(|_| ()))
    }

    pub fn set_compartment(&mut self, index: usize, description: Option<PartId>) -> Result<(), ShipyardError> {
        self.edit("compartment change", |a, c| a.set_compartment(c, index, description))
    }

    pub fn set_hull(&mut self, index: usize, hull: Option<PartId>) -> Result<(), ShipyardError> {
        self.edit("hull change", |a, c| a.set_hull(c, index, hull))
    }

    pub fn set_module(&mut self, index: usize, slot: usize, module: Option<PartId>) -> Result<(), ShipyardError> {
        self.edit("module change", |a, c| a.set_module(c, index, slot, module))
    }

    pub fn set_equipment(&mut self, index: usize, slot: usize, equipment: Option<PartId>) -> Result<(), ShipyardError> {
        self.edit("equipment change", |a, c| a.set_equipment(c, index, slot, equipment))
    }

    pub fn set_name(&mut self, name: &str) {
        self.assembly.set_name(name);
    }

    pub fn set_customization(&mut self, customization: Customization) {
        self.assembly.set_customization(customization);
    }

    /// Set the launch propellant load, clamped to the committed capacity
    pub fn set_propellant_at_launch(&mut self, mass: f64) -> Result<(), ShipyardError> {
        self.ensure_fresh()?;
        self.assembly.set_propellant_mass_at_launch(mass);
        Ok(())
    }

    // ── Commit ─────────────────────────────────────────────────────────

    /// Recompute derived state. On a propulsion failure the design is still
    /// committed with zeroed metrics and the error is returned.
    pub fn commit(&mut self) -> Result<(), ShipyardError> {
        let result = self.assembly.recompute(&self.catalog, &self.config.rules);
        let metrics = self.assembly.propulsion_metrics();
        log::debug!(
            "Committed '{}': dry mass {:.1}T, delta-v {:.0}m/s, {} module groups",
            self.assembly.name(),
            metrics.dry_mass,
            metrics.maximum_delta_v,
            self.assembly.module_groups().len()
        );
        result.map_err(|e| {
            log::warn!("Design '{}' cannot fly: {}", self.assembly.name(), e);
            ShipyardError::Propulsion(e)
        })
    }

    fn ensure_fresh(&self) -> Result<(), ShipyardError> {
        if self.assembly.is_stale() {
            Err(ShipyardError::StaleDerivedState)
        } else {
            Ok(())
        }
    }

    // ── Derived state ──────────────────────────────────────────────────

    pub fn propulsion_metrics(&self) -> Result<&PropulsionMetrics, ShipyardError> {
        self.ensure_fresh()?;
        Ok(self.assembly.propulsion_metrics())
    }

    pub fn module_groups(&self) -> Result<&[ModuleGroup], ShipyardError> {
        self.ensure_fresh()?;
        Ok(self.assembly.module_groups())
    }

    pub fn compartment_metrics(&self, index: usize) -> Result<CompartmentMetrics, ShipyardError> {
        self.ensure_fresh()?;
        if index >= self.assembly.compartment_count() {
            return Err(ShipyardError::Slot(SlotError::CompartmentOutOfRange {
                index,
                count: self.assembly.compartment_count(),
            }));
        }
        Ok(CompartmentMetrics::compute(&self.assembly, &self.catalog, &self.config.rules, index))
    }

    pub fn classification(&self) -> Result<Classification, ShipyardError> {
        self.ensure_fresh()?;
        Ok(Classification::of(&self.assembly, &self.config.rules))
    }

    /// Run every design check against the committed state
    pub fn validate(&self) -> Result<(), ShipyardError> {
        self.ensure_fresh()?;
        validate_design(&self.assembly, &self.catalog, &self.config.rules).map_err(ShipyardError::Design)
    }

    /// Quote the refit from `current` to the working design in the
    /// configured trading area
    pub fn quote_upgrade_from(&self, current: &Assembly) -> UpgradeCost {
        upgrade_cost(
            current,
            &self.assembly,
            &self.prices,
            &self.config.trading_area,
            &self.config.rules,
        )
    }

    // ── Compatibility ──────────────────────────────────────────────────

    pub fn compatible_compartments(&self, index: usize) -> Vec<&CompartmentDescription> {
        compatible_compartments(&self.assembly, &self.catalog, index)
    }

    pub fn compatible_modules(&self, index: usize, slot: usize) -> Vec<Option<&ModuleDescription>> {
        compatible_modules(&self.assembly, &self.catalog, index, slot)
    }

    pub fn compatible_equipment(&self, index: usize, slot: usize) -> Vec<Option<&EquipmentDescription>> {
        compatible_equipment(&self.assembly, &self.catalog, index, slot)
    }

    // ── Cargo ──────────────────────────────────────────────────────────

    /// Add or remove cargo in the committed design. Refused while structural
    /// edits are pending. Returns whether the whole delta was applied; a
    /// partial transfer stays in place.
    pub fn transfer_cargo(
        &mut self,
        resource: &PartId,
        mass_delta: f64,
        compartment_filter: SlotFilter,
        module_filter: SlotFilter,
    ) -> Result<bool, ShipyardError> {
        self.ensure_fresh()?;
        let before = query_mass(&self.assembly, resource, compartment_filter, module_filter);
        let complete = modify_cargo(
            &mut self.assembly,
            &self.catalog,
            resource,
            mass_delta,
            compartment_filter,
            module_filter,
        );
        if !complete {
            let after = query_mass(&self.assembly, resource, compartment_filter, module_filter);
            log::warn!(
                "Partial cargo transfer of {}: requested {:.1}T, moved {:.1}T",
                resource,
                mass_delta,
                after - before
            );
        }
        Ok(complete)
    }

    pub fn cargo_mass(&self, resource: &PartId) -> f64 {
        query_mass(&self.assembly, resource, SlotFilter::Any, SlotFilter::Any)
    }

    pub fn cargo_capacity(&self, resource: &PartId) -> Result<f64, ShipyardError> {
        self.ensure_fresh()?;
        Ok(query_capacity(&self.assembly, &self.catalog, resource, SlotFilter::Any, SlotFilter::Any))
    }

    pub fn cargo_available(&self, resource: &PartId) -> Result<f64, ShipyardError> {
        self.ensure_fresh()?;
        Ok(query_available(&self.assembly, &self.catalog, resource, SlotFilter::Any, SlotFilter::Any))
    }

    // ── Generation ─────────────────────────────────────────────────────

    /// Replace the working design with a random one
    pub fn generate(&mut self, rng: &mut impl Rng) -> Result<(), ShipyardError> {
        let assembly = generate_design(&self.catalog, &self.config, rng);
        log::info!(
            "Generated design '{}' with {} compartments",
            assembly.name(),
            assembly.compartment_count()
        );
        self.assembly = assembly;
        self.commit()
    }

    // ── Save/Load ──────────────────────────────────────────────────────

    /// Save the working design. Only persisted fields are written, so
    /// uncommitted edits are saved as well.
    pub fn save<W: Write>(&self, writer: W) -> Result<(), ShipyardError> {
        persistence::save_assembly(writer, &self.assembly)?;
        log::info!("Saved design '{}'", self.assembly.name());
        Ok(())
    }

    /// Load a design, replacing the working one. The loaded design is
    /// committed before this returns.
    pub fn load<R: Read>(&mut self, reader: R) -> Result<(), ShipyardError> {
        let assembly = persistence::load_assembly(reader, &self.catalog, &self.config.rules)
            .map_err(|e| self.log_load_failure(e))?;
        log::info!("Loaded design '{}'", assembly.name());
        self.assembly = assembly;
        Ok(())
    }

    pub fn export_json(&self) -> Result<String, ShipyardError> {
        Ok(persistence::export_json(&self.assembly)?)
    }

    pub fn import_json(&mut self, json: &str) -> Result<(), ShipyardError> {
        let assembly = persistence::import_json(json, &self.catalog, &self.config.rules)
            .map_err(|e| self.log_load_failure(e))?;
        log::info!("Imported design '{}'", assembly.name());
        self.assembly = assembly;
        Ok(())
    }

    fn log_load_failure(&self, e: SaveError) -> ShipyardError {
        match &e {
            SaveError::UnknownPart(id) => log::warn!("Saved design uses '{}', which the catalog no longer knows", id),
            other => log::warn!("Load failed: {}", other),
        }
        ShipyardError::Save(e)
    }
}
