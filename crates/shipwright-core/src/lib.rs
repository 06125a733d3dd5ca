//! Shipwright Core - spacecraft design sessions
//!
//! Wraps the pure composition logic of `shipwright-logic` with the state a
//! shipyard needs: a loaded catalog and price table, tuning configuration
//! and one working design guarded by the edit/commit protocol.
//!
//! # Architecture
//!
//! - **Catalog data**: part definitions parsed from JSON and checked
//! - **Market**: JSON price table used for refit quotes
//! - **Shipyard**: edits, commit, derived-state accessors, cargo, quotes
//! - **Persistence**: versioned bincode saves plus JSON export
//! - **Generation**: seeded random designs
//!
//! # Example
//!
//! ```rust,no_run
//! use shipwright_core::prelude::*;
//!
//! let catalog = load_catalog(&std::fs::read_to_string("data/catalog.json").unwrap()).unwrap();
//! let mut shipyard = Shipyard::new(catalog, PriceTable::default(), ShipyardConfig::default());
//!
//! shipyard.push_compartment(Some(PartId::from("compartment.command"))).unwrap();
//! shipyard.commit().unwrap();
//! println!("{:?}", shipyard.propulsion_metrics().unwrap());
//! ```

pub mod catalog_data;
pub mod config;
pub mod engine;
pub mod generation;
pub mod market;
pub mod persistence;

#[cfg(test)]
mod test_support;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::catalog_data::load_catalog;
    pub use crate::config::ShipyardConfig;
    pub use crate::engine::{Shipyard, ShipyardError};
    pub use crate::market::PriceTable;
    pub use crate::persistence::SaveError;
    pub use shipwright_logic::cargo::SlotFilter;
    pub use shipwright_logic::catalog::{Catalog, PartId};
}
