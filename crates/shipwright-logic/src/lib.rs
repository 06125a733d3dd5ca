//! Pure spacecraft composition logic for Shipwright.
//!
//! This crate contains the composition engine independent of any storage,
//! market or runtime. Functions take an [`Assembly`](assembly::Assembly) and
//! a [`Catalog`](catalog::Catalog) and return plain data, making them
//! unit-testable and deterministic.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`assembly`] | Compartments, slots, structural edits and the recompute step |
//! | [`cargo`] | Capacity-bounded, resource-exclusive cargo ledger |
//! | [`catalog`] | Immutable part definitions and the catalog lookup trait |
//! | [`compatibility`] | Parts that fit a given compartment or slot |
//! | [`config`] | Tunable composition rules |
//! | [`constants`] | Structural limits (compartment and slot counts) |
//! | [`fittings`] | Bulkheads, skirts, domes and piping from adjacency |
//! | [`grouping`] | Longitudinal and lateral module grouping |
//! | [`pricing`] | Refit quotes between two designs |
//! | [`propulsion`] | Mass budget, rocket equation, classification |
//! | [`validation`] | Design completeness checks |
//!
//! # Recompute order
//!
//! Structural edits leave derived state stale. [`Assembly::recompute`]
//! refreshes it in a fixed order, each step reading the previous one:
//!
//! 1. [`fittings::update_fittings`]
//! 2. [`grouping::build_module_groups`]
//! 3. [`propulsion::compute_propulsion_metrics`]
//!
//! [`Assembly::recompute`]: assembly::Assembly::recompute

pub mod assembly;
pub mod cargo;
pub mod catalog;
pub mod compatibility;
pub mod config;
pub mod constants;
pub mod fittings;
pub mod grouping;
pub mod pricing;
pub mod propulsion;
pub mod validation;

#[cfg(test)]
mod test_support;
