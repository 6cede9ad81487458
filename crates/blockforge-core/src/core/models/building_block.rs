use super::attributes::{AttrValue, Attributes};
use super::functional_group::FunctionalGroup;
use super::molecule::{Molecule, MoleculeError};
use crate::core::topology::matcher::{MatchError, Matcher};
use crate::core::topology::registry::MotifRegistry;
use nalgebra::Point3;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildingBlockError {
    #[error("Functional group {id} references atom {atom}, but the molecule has {atom_count} atoms")]
    GroupAtomOutOfRange {
        id: usize,
        atom: usize,
        atom_count: usize,
    },
    #[error("Functional group {id} ('{name}') has no bonder atoms")]
    GroupWithoutBonder { id: usize, name: String },
}

/// A molecule annotated with the reactive functional groups it offers for assembly.
///
/// The functional group sequence is derived once, when the block is built, and
/// never changes afterwards. Positions can still be replaced as a whole.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingBlock {
    molecule: Molecule,
    functional_group_names: Vec<String>,
    functional_groups: Vec<FunctionalGroup>,
    attributes: Attributes,
}

/// Sorted, deduplicated copy of the requested motif names.
pub fn normalized_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut normalized: Vec<String> = names.iter().map(|n| n.as_ref().to_string()).collect();
    normalized.sort_unstable();
    normalized.dedup();
    normalized
}

impl BuildingBlock {
    /// Detects the named functional groups in `molecule` and wraps both into a block.
    pub fn new<S: AsRef<str>>(
        molecule: Molecule,
        functional_group_names: &[S],
        registry: &MotifRegistry,
    ) -> Result<Self, MatchError> {
        let functional_groups = Matcher::new(registry).find(&molecule, functional_group_names)?;
        Ok(Self {
            molecule,
            functional_group_names: normalized_names(functional_group_names),
            functional_groups,
            attributes: Attributes::new(),
        })
    }

    /// Reassembles a block from previously derived parts, e.g. a dump.
    ///
    /// Every group must reference atoms of `molecule` and carry at least one bonder.
    pub fn from_parts(
        molecule: Molecule,
        functional_group_names: Vec<String>,
        functional_groups: Vec<FunctionalGroup>,
        attributes: Attributes,
    ) -> Result<Self, BuildingBlockError> {
        let atom_count = molecule.atom_count();
        for group in &functional_groups {
            if let Some(&atom) = group.atom_ids().iter().find(|&&a| a >= atom_count) {
                return Err(BuildingBlockError::GroupAtomOutOfRange {
                    id: group.id(),
                    atom,
                    atom_count,
                });
            }
            if group.bonder_ids().is_empty() {
                return Err(BuildingBlockError::GroupWithoutBonder {
                    id: group.id(),
                    name: group.name().to_string(),
                });
            }
        }
        Ok(Self {
            molecule,
            functional_group_names: normalized_names(&functional_group_names),
            functional_groups,
            attributes,
        })
    }

    pub fn molecule(&self) -> &Molecule {
        &self.molecule
    }

    pub fn position_matrix(&self) -> &[Point3<f64>] {
        self.molecule.position_matrix()
    }

    pub fn set_position_matrix(&mut self, positions: Vec<Point3<f64>>) -> Result<(), MoleculeError> {
        self.molecule.set_position_matrix(positions)
    }

    /// The motif names this block was built with, sorted and deduplicated.
    pub fn functional_group_names(&self) -> &[String] {
        &self.functional_group_names
    }

    pub fn functional_groups(&self) -> &[FunctionalGroup] {
        &self.functional_groups
    }

    pub fn num_functional_groups(&self) -> usize {
        self.functional_groups.len()
    }

    /// Groups whose motif name is one of `names`, in id order. Never fails:
    /// names without occurrences simply contribute nothing.
    pub fn get_functional_groups<S: AsRef<str>>(&self, names: &[S]) -> Vec<&FunctionalGroup> {
        self.functional_groups
            .iter()
            .filter(|g| names.iter().any(|n| n.as_ref() == g.name()))
            .collect()
    }

    /// Copies of the functional groups with the given new ids and every atom id
    /// increased by `offset`. Groups beyond the end of `ids` are not copied.
    pub fn shift_fgs(&self, ids: &[usize], offset: usize) -> Vec<FunctionalGroup> {
        self.functional_groups
            .iter()
            .zip(ids)
            .map(|(group, &id)| group.shifted(id, offset))
            .collect()
    }

    /// Bonder atom ids of every group, in group order.
    pub fn bonder_ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.functional_groups
            .iter()
            .flat_map(|g| g.bonder_ids().iter().copied())
    }

    /// Atoms belonging to no functional group.
    pub fn core_atom_ids(&self) -> Vec<usize> {
        let mut in_group = vec![false; self.molecule.atom_count()];
        for group in &self.functional_groups {
            for &atom in group.atom_ids() {
                in_group[atom] = true;
            }
        }
        in_group
            .iter()
            .enumerate()
            .filter(|(_, member)| !**member)
            .map(|(atom, _)| atom)
            .collect()
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    /// Sets an extra attribute, returning the previous value if there was one.
    pub fn set_attribute(
        &mut self,
        name: impl Into<String>,
        value: impl Into<AttrValue>,
    ) -> Option<AttrValue> {
        self.attributes.insert(name.into(), value.into())
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<AttrValue> {
        self.attributes.remove(name)
    }
}
