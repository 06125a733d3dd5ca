//! Shipwright Headless Composition Harness
//!
//! Validates the bundled catalog and price data and sweeps every engine
//! operation against them. Runs entirely in-process.
//!
//! Usage:
//!   cargo run -p shipwright-simtest
//!   cargo run -p shipwright-simtest -- --verbose

use rand::rngs::StdRng;
use rand::SeedableRng;
use shipwright_core::catalog_data::load_catalog;
use shipwright_core::config::ShipyardConfig;
use shipwright_core::engine::{Shipyard, ShipyardError};
use shipwright_core::generation::generate_design;
use shipwright_core::market::PriceTable;
use shipwright_logic::assembly::Customization;
use shipwright_logic::cargo::SlotFilter;
use shipwright_logic::catalog::{Catalog, CatalogEntry, MemoryCatalog, PartId};
use shipwright_logic::fittings::{BulkheadType, SkirtPipingType};
use shipwright_logic::grouping::ModuleGroupType;
use shipwright_logic::propulsion::Classification;
use shipwright_logic::validation::{validate_design, DesignIssue};

// ── Bundled data (same JSON the core tests use) ─────────────────────────
const CATALOG_JSON: &str = include_str!("../../../data/catalog.json");
const PRICES_JSON: &str = include_str!("../../../data/prices.json");

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn check(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    if verbose {
        // Core crates log through the `log` facade; the subscriber bridges it
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
            .with_writer(std::io::stderr)
            .init();
    }
    println!("=== Shipwright Composition Harness ===\n");

    let mut results = Vec::new();

    // 1. Catalog and price data
    let Some((catalog, prices)) = load_data(&mut results) else {
        report(&results, verbose);
        return;
    };

    // 2. Edit/commit protocol
    results.extend(validate_edit_protocol(&catalog, &prices));

    // 3. Fittings on a two-compartment stack
    results.extend(validate_fittings(&catalog, &prices));

    // 4. Propulsion and classification
    results.extend(validate_propulsion(&catalog, &prices, verbose));

    // 5. Module grouping
    results.extend(validate_grouping(&catalog, &prices));

    // 6. Cargo ledger
    results.extend(validate_cargo(&catalog, &prices));

    // 7. Validation and refit pricing
    results.extend(validate_design_checks(&catalog, &prices));

    // 8. Save/load
    results.extend(validate_persistence(&catalog, &prices));

    // 9. Generator sweep
    results.extend(validate_generation(&catalog, verbose));

    report(&results, verbose);
}

fn report(results: &[TestResult], verbose: bool) {
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!("\n=== RESULT: {}/{} passed, {} failed ===", passed, total, failed);

    if failed > 0 {
        std::process::exit(1);
    }
}

fn id(s: &str) -> PartId {
    PartId::from(s)
}

fn new_shipyard(catalog: &MemoryCatalog, prices: &PriceTable) -> Shipyard {
    Shipyard::new(catalog.clone(), prices.clone(), ShipyardConfig::default())
}

/// Command section, structural frame with two holds and a propellant tank,
/// tank frame with the engine.
fn build_freighter(yard: &mut Shipyard) -> Result<(), ShipyardError> {
    yard.new_design("Harness Freighter");
    yard.push_compartment(Some(id("compartment.command")))?;
    yard.push_compartment(Some(id("compartment.structural")))?;
    yard.push_compartment(Some(id("compartment.tank")))?;

    yard.set_equipment(0, 1, Some(id("equipment.hatch.habitat")))?;
    yard.set_equipment(0, 2, Some(id("equipment.thruster.rcs")))?;
    yard.set_equipment(0, 3, Some(id("equipment.thruster.rcs")))?;

    yard.set_module(1, 0, Some(id("module.cargo.container")))?;
    yard.set_module(1, 1, Some(id("module.propellant.large")))?;
    yard.set_module(1, 2, Some(id("module.cargo.container")))?;
    for slot in 0..3 {
        yard.set_equipment(1, slot, Some(id("equipment.hatch.cargo")))?;
    }

    yard.set_module(2, 0, Some(id("module.propellant.large")))?;
    yard.set_equipment(2, 2, Some(id("equipment.engine.chemical")))?;
    yard.commit()
}

fn freighter(catalog: &MemoryCatalog, prices: &PriceTable) -> Result<Shipyard, ShipyardError> {
    let mut yard = new_shipyard(catalog, prices);
    build_freighter(&mut yard)?;
    Ok(yard)
}

fn setup_failure(name: &str, e: ShipyardError) -> Vec<TestResult> {
    vec![TestResult::check(name, false, format!("setup failed: {}", e))]
}

// ── 1. Data ─────────────────────────────────────────────────────────────

fn load_data(results: &mut Vec<TestResult>) -> Option<(MemoryCatalog, PriceTable)> {
    println!("--- Catalog Data ---");

    let catalog = match load_catalog(CATALOG_JSON) {
        Ok(c) => c,
        Err(e) => {
            results.push(TestResult::check("catalog_parse", false, format!("{}", e)));
            return None;
        }
    };
    let prices = match PriceTable::from_json(PRICES_JSON) {
        Ok(p) => p,
        Err(e) => {
            results.push(TestResult::check("prices_parse", false, format!("JSON parse error: {}", e)));
            return None;
        }
    };

    let count = |category: &str| catalog.entries().filter(|e| e.category() == category).count();
    results.push(TestResult::check(
        "catalog_has_every_category",
        ["compartment", "hull", "module", "equipment", "resource"]
            .iter()
            .all(|c| count(c) > 0),
        format!(
            "{} compartments, {} hulls, {} modules, {} equipment, {} resources",
            count("compartment"),
            count("hull"),
            count("module"),
            count("equipment"),
            count("resource")
        ),
    ));

    let noses = catalog
        .entries()
        .filter(|e| matches!(e, CatalogEntry::Compartment(c) if c.is_forward_compartment))
        .count();
    results.push(TestResult::check(
        "catalog_has_forward_compartment",
        noses > 0,
        format!("{} forward compartments", noses),
    ));

    let unpriced: Vec<String> = catalog
        .entries()
        .filter(|e| !prices.base_prices.contains_key(e.id()))
        .map(|e| e.id().to_string())
        .collect();
    results.push(TestResult::check(
        "prices_cover_catalog",
        unpriced.is_empty(),
        if unpriced.is_empty() {
            "every part has a base price".to_string()
        } else {
            format!("unpriced: {}", unpriced.join(", "))
        },
    ));

    let sell_ratio_ok = prices.sell_ratio > 0.0 && prices.sell_ratio <= 1.0;
    results.push(TestResult::check(
        "prices_sell_ratio",
        sell_ratio_ok,
        format!("sell ratio {}", prices.sell_ratio),
    ));

    Some((catalog, prices))
}

// ── 2. Edit/commit protocol ─────────────────────────────────────────────

fn validate_edit_protocol(catalog: &MemoryCatalog, prices: &PriceTable) -> Vec<TestResult> {
    println!("--- Edit/Commit Protocol ---");
    let mut results = Vec::new();
    let mut yard = new_shipyard(catalog, prices);

    let pushed = yard.push_compartment(Some(id("compartment.structural")));
    results.push(TestResult::check(
        "edit_marks_stale",
        pushed.is_ok() && yard.is_stale(),
        "structural edit leaves derived state stale",
    ));
    results.push(TestResult::check(
        "stale_read_rejected",
        matches!(yard.propulsion_metrics(), Err(ShipyardError::StaleDerivedState)),
        "metrics unavailable before commit",
    ));

    let committed = yard.commit();
    results.push(TestResult::check(
        "commit_clears_stale",
        committed.is_ok() && !yard.is_stale() && yard.propulsion_metrics().is_ok(),
        "metrics available after commit",
    ));

    yard.set_name("Renamed");
    yard.set_customization(Customization {
        hull_paint: 2,
        enable_hull_paint: true,
        ..Customization::default()
    });
    results.push(TestResult::check(
        "cosmetic_edit_stays_fresh",
        !yard.is_stale(),
        "name and paint do not touch derived state",
    ));

    let rejected = yard.set_module(0, 7, Some(id("module.cargo.bulk")));
    results.push(TestResult::check(
        "out_of_range_slot_rejected",
        rejected.is_err() && !yard.is_stale(),
        format!("{:?}", rejected.err().map(|e| e.to_string())),
    ));

    let mut overflow = Ok(0);
    for _ in 0..20 {
        overflow = yard.push_compartment(None);
        if overflow.is_err() {
            break;
        }
    }
    results.push(TestResult::check(
        "compartment_limit",
        overflow.is_err(),
        format!("{} compartments accepted", yard.assembly().compartment_count()),
    ));

    results
}

// ── 3. Fittings ─────────────────────────────────────────────────────────

fn validate_fittings(catalog: &MemoryCatalog, prices: &PriceTable) -> Vec<TestResult> {
    println!("--- Fittings ---");
    let yard = match freighter(catalog, prices) {
        Ok(y) => y,
        Err(e) => return setup_failure("fittings_setup", e),
    };
    let mut results = Vec::new();
    let assembly = yard.assembly();
    let fittings = |c: usize, m: usize| *assembly.compartments()[c].modules()[m].fittings();

    let tank_front = fittings(1, 1);
    let tank_back = fittings(2, 0);
    results.push(TestResult::check(
        "identical_modules_share_skirt",
        tank_front.aft_bulkhead == BulkheadType::Skirt && tank_back.forward_bulkhead == BulkheadType::Skirt,
        format!("{:?} / {:?}", tank_front.aft_bulkhead, tank_back.forward_bulkhead),
    ));
    results.push(TestResult::check(
        "last_compartment_outer_bulkhead",
        tank_back.aft_bulkhead == BulkheadType::Outer,
        format!("{:?}", tank_back.aft_bulkhead),
    ));
    results.push(TestResult::check(
        "continued_tank_simple_piping",
        tank_front.skirt_piping == SkirtPipingType::Simple,
        format!("{:?}", tank_front.skirt_piping),
    ));

    let hold = fittings(1, 0);
    results.push(TestResult::check(
        "hold_with_hatch_needs_skirt",
        hold.needs_skirt && hold.needs_dome,
        format!("skirt {}, dome {}", hold.needs_skirt, hold.needs_dome),
    ));

    results
}

// ── 4. Propulsion ───────────────────────────────────────────────────────

fn validate_propulsion(catalog: &MemoryCatalog, prices: &PriceTable, verbose: bool) -> Vec<TestResult> {
    println!("--- Propulsion ---");
    let yard = match freighter(catalog, prices) {
        Ok(y) => y,
        Err(e) => return setup_failure("propulsion_setup", e),
    };
    let mut results = Vec::new();
    let Ok(metrics) = yard.propulsion_metrics() else {
        return setup_failure("propulsion_metrics", ShipyardError::StaleDerivedState);
    };
    let rules = &yard.config().rules;

    let expected_ve = 320.0 * rules.standard_gravity;
    results.push(TestResult::check(
        "exhaust_velocity",
        (metrics.exhaust_velocity - expected_ve).abs() < 1e-6,
        format!("{:.1} m/s", metrics.exhaust_velocity),
    ));

    let expected_dv = metrics.exhaust_velocity * (metrics.maximum_mass / metrics.dry_mass).ln();
    results.push(TestResult::check(
        "rocket_equation",
        (metrics.maximum_delta_v - expected_dv).abs() < 1e-6 && metrics.maximum_delta_v > rules.minimum_delta_v,
        format!("{:.0} m/s delta-v", metrics.maximum_delta_v),
    ));

    let burn = metrics.propellant_mass_capacity / metrics.propellant_rate;
    results.push(TestResult::check(
        "burn_time",
        (metrics.maximum_burn_time - burn).abs() < 1e-6,
        format!("{:.0} s", metrics.maximum_burn_time),
    ));

    let empty_holds = metrics.delta_v_for(0.0, metrics.propellant_mass_capacity);
    let full_holds = metrics.delta_v_for(metrics.cargo_mass_capacity, metrics.propellant_mass_capacity);
    results.push(TestResult::check(
        "cargo_reduces_delta_v",
        matches!((empty_holds, full_holds), (Ok(empty), Ok(full)) if full < empty && full > 0.0),
        format!("{:?} empty, {:?} full", empty_holds, full_holds),
    ));

    let classification = yard.classification();
    results.push(TestResult::check(
        "classification",
        matches!(classification, Ok(Classification::LightFreighter)),
        format!("{:?}", classification),
    ));

    if verbose {
        for index in 0..yard.assembly().compartment_count() {
            if let Ok(summary) = yard.compartment_metrics(index) {
                println!("    compartment {}: {}", index + 1, summary.summary());
            }
        }
    }

    results
}

// ── 5. Grouping ─────────────────────────────────────────────────────────

fn validate_grouping(catalog: &MemoryCatalog, prices: &PriceTable) -> Vec<TestResult> {
    println!("--- Module Grouping ---");
    let yard = match freighter(catalog, prices) {
        Ok(y) => y,
        Err(e) => return setup_failure("grouping_setup", e),
    };
    let mut results = Vec::new();
    let groups = yard.module_groups().unwrap_or(&[]);

    let propellant: Vec<_> = groups
        .iter()
        .filter(|g| g.group_type == ModuleGroupType::Propellant)
        .collect();
    results.push(TestResult::check(
        "longitudinal_propellant_group",
        propellant.len() == 1 && propellant[0].contains(1, 1) && propellant[0].contains(2, 0),
        format!("{} propellant groups", propellant.len()),
    ));

    let cargo = groups.iter().filter(|g| g.group_type == ModuleGroupType::Hatch).count();
    results.push(TestResult::check(
        "side_holds_separate",
        cargo == 2,
        format!("{} cargo groups", cargo),
    ));

    results.push(TestResult::check(
        "every_group_has_hatch",
        groups.iter().all(|g| g.has_hatch),
        format!("{} groups", groups.len()),
    ));

    results
}

// ── 6. Cargo ────────────────────────────────────────────────────────────

fn validate_cargo(catalog: &MemoryCatalog, prices: &PriceTable) -> Vec<TestResult> {
    println!("--- Cargo Ledger ---");
    let mut yard = match freighter(catalog, prices) {
        Ok(y) => y,
        Err(e) => return setup_failure("cargo_setup", e),
    };
    let mut results = Vec::new();
    let machinery = id("resource.machinery");
    let electronics = id("resource.electronics");

    let capacity = yard.cargo_capacity(&machinery).unwrap_or(0.0);
    let full = yard.transfer_cargo(&machinery, capacity, SlotFilter::Any, SlotFilter::Any);
    results.push(TestResult::check(
        "fill_to_capacity",
        matches!(full, Ok(true)) && (yard.cargo_mass(&machinery) - capacity).abs() < 1e-9,
        format!("{:.1}T of {:.1}T", yard.cargo_mass(&machinery), capacity),
    ));

    let overflow = yard.transfer_cargo(&machinery, 1.0, SlotFilter::Any, SlotFilter::Any);
    results.push(TestResult::check(
        "overflow_rejected",
        matches!(overflow, Ok(false)),
        format!("{:?}", overflow.ok()),
    ));

    let exclusive = yard.transfer_cargo(&electronics, 5.0, SlotFilter::Any, SlotFilter::Any);
    results.push(TestResult::check(
        "slots_resource_exclusive",
        matches!(exclusive, Ok(false)) && yard.cargo_mass(&electronics) == 0.0,
        "full holds refuse a second resource",
    ));

    let unload = yard.transfer_cargo(&machinery, -capacity, SlotFilter::Any, SlotFilter::Any);
    let available = yard.cargo_available(&electronics).unwrap_or(0.0);
    results.push(TestResult::check(
        "unload_frees_slots",
        matches!(unload, Ok(true)) && (available - capacity).abs() < 1e-9,
        format!("{:.1}T free for electronics", available),
    ));

    results
}

// ── 7. Validation and pricing ───────────────────────────────────────────

fn validate_design_checks(catalog: &MemoryCatalog, prices: &PriceTable) -> Vec<TestResult> {
    println!("--- Validation & Pricing ---");
    let mut yard = match freighter(catalog, prices) {
        Ok(y) => y,
        Err(e) => return setup_failure("validation_setup", e),
    };
    let mut results = Vec::new();

    let valid = yard.validate();
    results.push(TestResult::check(
        "freighter_flyable",
        valid.is_ok(),
        match &valid {
            Ok(()) => "no issues".to_string(),
            Err(e) => e.to_string(),
        },
    ));

    let empty = new_shipyard(catalog, prices);
    let issues = validate_design(empty.assembly(), catalog, &empty.config().rules).err().unwrap_or_default();
    results.push(TestResult::check(
        "empty_design_issues",
        issues.contains(&DesignIssue::NoEngine) && issues.contains(&DesignIssue::NoHabitat),
        format!("{} issues", issues.len()),
    ));

    let current = yard.assembly().clone();
    let same = yard.quote_upgrade_from(&current);
    results.push(TestResult::check(
        "unchanged_design_free",
        same.total_change_cost == 0.0 && same.total_cost_as_new > 0.0,
        format!("{:.0} credits as new", same.total_cost_as_new),
    ));

    let refit = yard
        .set_equipment(2, 2, Some(id("equipment.engine.fusion")))
        .and_then(|_| yard.commit());
    let quote = yard.quote_upgrade_from(&current);
    let fusion = prices.base_prices.get(&id("equipment.engine.fusion")).copied().unwrap_or(0.0);
    let chemical = prices.base_prices.get(&id("equipment.engine.chemical")).copied().unwrap_or(0.0);
    let modifier = prices.area_modifier(&yard.config().trading_area);
    let expected = (fusion - chemical * prices.sell_ratio) * modifier;
    results.push(TestResult::check(
        "engine_swap_quote",
        refit.is_ok() && (quote.total_change_cost - expected).abs() < 1e-6,
        format!("{:.0} credits", quote.total_change_cost),
    ));

    results
}

// ── 8. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(catalog: &MemoryCatalog, prices: &PriceTable) -> Vec<TestResult> {
    println!("--- Save/Load ---");
    let yard = match freighter(catalog, prices) {
        Ok(y) => y,
        Err(e) => return setup_failure("persistence_setup", e),
    };
    let mut results = Vec::new();

    let mut buffer = Vec::new();
    let saved = yard.save(&mut buffer);
    let mut other = new_shipyard(catalog, prices);
    let loaded = other.load(&buffer[..]);
    results.push(TestResult::check(
        "bincode_roundtrip",
        saved.is_ok() && loaded.is_ok() && other.assembly().same_structure(yard.assembly()),
        format!("{} bytes", buffer.len()),
    ));
    results.push(TestResult::check(
        "load_recomputes",
        !other.is_stale() && other.propulsion_metrics().ok() == yard.propulsion_metrics().ok(),
        "derived state rebuilt on load",
    ));

    let json = yard.export_json();
    let mut imported = new_shipyard(catalog, prices);
    let restored = json.as_deref().map(|j| imported.import_json(j));
    results.push(TestResult::check(
        "json_roundtrip",
        matches!(restored, Ok(Ok(()))) && imported.assembly().same_structure(yard.assembly()),
        format!("{} characters", json.as_ref().map_or(0, |j| j.len())),
    ));

    results
}

// ── 9. Generation ───────────────────────────────────────────────────────

fn validate_generation(catalog: &MemoryCatalog, verbose: bool) -> Vec<TestResult> {
    println!("--- Design Generation ---");
    let mut results = Vec::new();
    let config = ShipyardConfig::default();

    let a = generate_design(catalog, &config, &mut StdRng::seed_from_u64(2024));
    let b = generate_design(catalog, &config, &mut StdRng::seed_from_u64(2024));
    results.push(TestResult::check(
        "seeded_generation_deterministic",
        a.same_structure(&b),
        format!("'{}' with {} compartments", a.name(), a.compartment_count()),
    ));

    let mut pairing_failures = 0;
    let mut flyable = 0;
    let mut classes = std::collections::BTreeMap::new();
    let sweep = 200;
    for seed in 0..sweep {
        let ship = generate_design(catalog, &config, &mut StdRng::seed_from_u64(seed));
        *classes
            .entry(Classification::of(&ship, &config.rules).label())
            .or_insert(0) += 1;
        match validate_design(&ship, catalog, &config.rules) {
            Ok(()) => flyable += 1,
            Err(issues) => {
                if issues.iter().any(|i| matches!(i, DesignIssue::InvalidPairing { .. })) {
                    pairing_failures += 1;
                }
            }
        }
    }
    results.push(TestResult::check(
        "generated_pairing_valid",
        pairing_failures == 0,
        format!("{} of {} designs with broken pairing", pairing_failures, sweep),
    ));

    if verbose {
        println!("    {} of {} generated designs flyable", flyable, sweep);
        for (label, count) in &classes {
            println!("    {:<16} {}", label, count);
        }
    }

    results
}
