//! Structural limits shared by every part of the composition engine.
//!
//! These are fixed at compile time: catalog layouts that declare more slots
//! than these limits are rejected when the catalog is loaded.

/// Maximum number of compartments in one assembly.
pub const MAX_COMPARTMENT_COUNT: usize = 10;

/// Maximum number of module slots a compartment layout can declare.
pub const MAX_MODULE_COUNT: usize = 4;

/// Maximum number of equipment slots a compartment layout can declare.
pub const MAX_EQUIPMENT_COUNT: usize = 6;

/// Number of distinct colors cycled through by module groups.
pub const GROUP_COLOR_COUNT: usize = 8;

/// Masses below this (in tonnes) are treated as zero by the cargo ledger.
pub const MASS_EPSILON: f64 = 1e-9;
