//! Module grouping — clusters module slots into functional groups.
//!
//! Slots are visited compartment by compartment, then by slot index. Each
//! occupied slot is placed by the first rule that applies:
//!
//! 1. **Longitudinal** — the compartment at the literal previous index holds
//!    a module of the same group type on the same socket: join its group.
//! 2. **Lateral** — an existing group of the same type whose latest entry is
//!    this compartment has recorded a linked equipment socket that this slot
//!    also links to: join that group (first match wins).
//! 3. Otherwise start a new group.
//!
//! The slot's linked equipment sockets are then merged into the group's
//! latest entry, and the group gains a hatch if any of them holds one.
//!
//! Membership is recorded as `(compartment index, module indices)` entries
//! rather than references into the assembly.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::assembly::Assembly;
use crate::catalog::{Catalog, ModuleDescription, ModuleKind};
use crate::constants::{GROUP_COLOR_COUNT, MAX_MODULE_COUNT};

/// Functional class of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleGroupType {
    /// Cargo holds, loaded and unloaded through hatches.
    Hatch,
    /// Propellant tanks and processing plants, connected by piping.
    Propellant,
}

/// Group type of a module, from its catalog kind.
pub fn module_group_type(module: &ModuleDescription) -> ModuleGroupType {
    match module.kind {
        ModuleKind::Cargo { .. } => ModuleGroupType::Hatch,
        ModuleKind::Propellant { .. } | ModuleKind::Processing { .. } => ModuleGroupType::Propellant,
    }
}

/// Members of a group within one compartment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleGroupCompartment {
    pub compartment_index: usize,
    pub module_indices: BTreeSet<usize>,
    /// Equipment sockets linked by the member slots.
    pub linked_equipment: BTreeSet<String>,
}

impl ModuleGroupCompartment {
    fn new(compartment_index: usize, module_index: usize) -> Self {
        Self {
            compartment_index,
            module_indices: BTreeSet::from([module_index]),
            linked_equipment: BTreeSet::new(),
        }
    }
}

/// A cluster of functionally connected module slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleGroup {
    /// Position in the group list.
    pub index: usize,
    /// Display color, cycling over [`GROUP_COLOR_COUNT`] entries.
    pub color_index: usize,
    pub group_type: ModuleGroupType,
    /// Entries in ascending compartment order.
    pub compartments: Vec<ModuleGroupCompartment>,
    pub has_hatch: bool,
}

impl ModuleGroup {
    fn new(group_type: ModuleGroupType, compartment_index: usize, module_index: usize) -> Self {
        Self {
            index: 0,
            color_index: 0,
            group_type,
            compartments: vec![ModuleGroupCompartment::new(compartment_index, module_index)],
            has_hatch: false,
        }
    }

    pub fn contains(&self, compartment_index: usize, module_index: usize) -> bool {
        self.compartments
            .iter()
            .any(|entry| entry.compartment_index == compartment_index && entry.module_indices.contains(&module_index))
    }

    pub fn module_count(&self) -> usize {
        self.compartments.iter().map(|entry| entry.module_indices.len()).sum()
    }

    fn add_member(&mut self, compartment_index: usize, module_index: usize) {
        match self.compartments.last_mut() {
            Some(entry) if entry.compartment_index == compartment_index => {
                entry.module_indices.insert(module_index);
            }
            _ => self
                .compartments
                .push(ModuleGroupCompartment::new(compartment_index, module_index)),
        }
    }
}

/// Group that holds the module slot (`compartment_index`, `module_index`).
pub fn find_module_group(groups: &[ModuleGroup], compartment_index: usize, module_index: usize) -> Option<&ModuleGroup> {
    groups.iter().find(|group| group.contains(compartment_index, module_index))
}

/// Rebuild every module group from scratch.
pub fn build_module_groups(assembly: &Assembly, catalog: &dyn Catalog) -> Vec<ModuleGroup> {
    let mut groups: Vec<ModuleGroup> = Vec::new();

    for (compartment_index, compartment) in assembly.compartments().iter().enumerate() {
        let Ok(layout) = assembly.layout(catalog, compartment_index) else {
            continue;
        };

        for (module_index, slot_layout) in layout.module_slots.iter().enumerate().take(MAX_MODULE_COUNT) {
            let Some(module) = assembly
                .module_id(compartment_index, module_index)
                .and_then(|id| catalog.module(id))
            else {
                continue;
            };
            let group_type = module_group_type(module);

            let current = match same_kind_in_previous(assembly, catalog, compartment_index, module_index, group_type) {
                Some((previous_compartment, previous_module)) => {
                    let found = groups
                        .iter()
                        .position(|group| group.contains(previous_compartment, previous_module));
                    if let Some(group_index) = found {
                        groups[group_index].add_member(compartment_index, module_index);
                    }
                    found
                }
                None => {
                    let found = groups.iter().position(|group| {
                        group.group_type == group_type
                            && group.compartments.last().map_or(false, |entry| {
                                entry.compartment_index == compartment_index
                                    && slot_layout
                                        .linked_equipment
                                        .iter()
                                        .any(|socket| entry.linked_equipment.contains(socket))
                            })
                    });
                    if let Some(group_index) = found {
                        groups[group_index].add_member(compartment_index, module_index);
                    }
                    found
                }
            };

            let group_index = current.unwrap_or_else(|| {
                groups.push(ModuleGroup::new(group_type, compartment_index, module_index));
                groups.len() - 1
            });
            let group = &mut groups[group_index];

            if let Some(entry) = group.compartments.last_mut() {
                entry
                    .linked_equipment
                    .extend(slot_layout.linked_equipment.iter().cloned());
            }
            let links_hatch = slot_layout.linked_equipment.iter().any(|socket| {
                compartment
                    .equipment_by_socket(layout, socket)
                    .and_then(|id| catalog.equipment(id))
                    .map_or(false, |equipment| equipment.is_hatch())
            });
            if links_hatch {
                group.has_hatch = true;
            }
        }
    }

    for (index, group) in groups.iter_mut().enumerate() {
        group.index = index;
        group.color_index = index % GROUP_COLOR_COUNT;
    }
    groups
}

fn same_kind_in_previous(
    assembly: &Assembly,
    catalog: &dyn Catalog,
    compartment_index: usize,
    module_index: usize,
    group_type: ModuleGroupType,
) -> Option<(usize, usize)> {
    let (previous_compartment, previous_module) = assembly.previous_module_slot(catalog, compartment_index, module_index)?;
    let module = catalog.module(assembly.module_id(previous_compartment, previous_module)?)?;
    (module_group_type(module) == group_type).then_some((previous_compartment, previous_module))
}
