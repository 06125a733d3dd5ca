//! Shared catalog fixture for unit tests.

use crate::catalog::*;

fn module_slot(socket: &str, linked: &[&str], force_skirt_piping: bool) -> ModuleSlotLayout {
    ModuleSlotLayout {
        socket_name: socket.to_string(),
        display_name: socket.to_string(),
        supported_equipment: linked.iter().map(|s| s.to_string()).collect(),
        linked_equipment: linked.iter().map(|s| s.to_string()).collect(),
        force_skirt_piping,
    }
}

fn equipment_slot(socket: &str, positions: &[EquipmentPosition], paired: &[usize]) -> EquipmentSlotLayout {
    EquipmentSlotLayout {
        socket_name: socket.to_string(),
        display_name: socket.to_string(),
        supported_positions: positions.to_vec(),
        paired_slots: paired.to_vec(),
    }
}

fn standard_layout(id: &str, mass: f64) -> CompartmentDescription {
    use EquipmentPosition::*;
    CompartmentDescription {
        id: id.into(),
        name: id.to_string(),
        mass,
        module_slots: vec![
            module_slot("module.left", &["equipment.left"], false),
            module_slot("module.center", &["equipment.top"], true),
            module_slot("module.right", &["equipment.right"], false),
        ],
        equipment_slots: vec![
            equipment_slot("equipment.left", &[Standard, Radial], &[1]),
            equipment_slot("equipment.right", &[Standard, Radial], &[0]),
            equipment_slot("equipment.forward", &[Forward], &[]),
            equipment_slot("equipment.aft", &[Aft], &[]),
            equipment_slot("equipment.top", &[Standard], &[]),
        ],
        is_forward_compartment: false,
        hull_variants: vec![],
    }
}

/// Catalog with two interchangeable hull sections, a nose section, and a
/// handful of modules, equipment and resources.
///
/// Slots 0 and 2 of the standard layouts link to the side equipment sockets
/// 0 and 1; slot 1 is a central slot with forced skirt piping, linked to the
/// top socket 4.
pub fn sample_catalog() -> MemoryCatalog {
    let mut entries = vec![
        CatalogEntry::Compartment(standard_layout("compartment.standard", 10.0)),
        CatalogEntry::Compartment(standard_layout("compartment.light", 6.0)),
        CatalogEntry::Compartment(CompartmentDescription {
            id: "compartment.nose".into(),
            name: "Nose".into(),
            mass: 8.0,
            module_slots: vec![module_slot("module.center", &[], true)],
            equipment_slots: vec![
                equipment_slot("equipment.forward", &[EquipmentPosition::Forward], &[]),
                equipment_slot("equipment.hatch", &[EquipmentPosition::Standard], &[]),
            ],
            is_forward_compartment: true,
            hull_variants: vec!["hull.plain".into()],
        }),
        CatalogEntry::Hull(HullDescription {
            id: "hull.plain".into(),
            name: "Plain".into(),
        }),
        CatalogEntry::Hull(HullDescription {
            id: "hull.armored".into(),
            name: "Armored".into(),
        }),
    ];

    let modules = [
        ("module.cargo.general", 5.0, false, ModuleKind::Cargo { cargo_type: ResourceType::General, cargo_mass: 100.0 }),
        ("module.cargo.bulk", 6.0, false, ModuleKind::Cargo { cargo_type: ResourceType::Bulk, cargo_mass: 150.0 }),
        ("module.propellant", 4.0, true, ModuleKind::Propellant { propellant_mass: 200.0 }),
        ("module.processing", 8.0, true, ModuleKind::Processing { throughput: 2.0 }),
    ];
    for (id, mass, needs_piping, kind) in modules {
        entries.push(CatalogEntry::Module(ModuleDescription {
            id: id.into(),
            name: id.to_string(),
            mass,
            needs_piping,
            kind,
        }));
    }

    let equipment = [
        ("equipment.engine", 3.0, false, EquipmentPosition::Aft, EquipmentKind::Engine { thrust: 100.0, specific_impulse: 300.0 }),
        ("equipment.thruster", 1.0, true, EquipmentPosition::Radial, EquipmentKind::Thruster { thrust: 5.0 }),
        ("equipment.hatch", 2.0, false, EquipmentPosition::Standard, EquipmentKind::Hatch { is_habitat: false }),
        ("equipment.habitat", 4.0, false, EquipmentPosition::Standard, EquipmentKind::Hatch { is_habitat: true }),
        ("equipment.tank", 2.0, false, EquipmentPosition::Radial, EquipmentKind::PropellantTank { propellant_mass: 50.0 }),
        ("equipment.antenna", 0.5, false, EquipmentPosition::Forward, EquipmentKind::Generic),
    ];
    for (id, mass, requires_pairing, position, kind) in equipment {
        entries.push(CatalogEntry::Equipment(EquipmentDescription {
            id: id.into(),
            name: id.to_string(),
            mass,
            requires_pairing,
            position,
            kind,
        }));
    }

    let resources = [
        ("resource.ore", ResourceType::Bulk),
        ("resource.goods", ResourceType::General),
        ("resource.parts", ResourceType::General),
    ];
    for (id, resource_type) in resources {
        entries.push(CatalogEntry::Resource(ResourceDescription {
            id: id.into(),
            name: id.to_string(),
            resource_type,
        }));
    }

    entries.into_iter().collect()
}

pub fn id(s: &str) -> PartId {
    PartId::new(s)
}
