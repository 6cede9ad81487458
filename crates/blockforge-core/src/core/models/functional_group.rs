use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FunctionalGroupError {
    #[error("Functional group '{name}' lists {role} atom {atom} which is not one of its atoms")]
    NotAMember {
        name: String,
        role: &'static str,
        atom: usize,
    },
    #[error("Functional group '{name}' lists atom {atom} as both bonder and deleter")]
    BonderIsDeleter { name: String, atom: usize },
    #[error("Functional group '{name}' lists atom {atom} more than once")]
    DuplicateAtom { name: String, atom: usize },
}

/// One occurrence of a functional group (motif) within a molecule.
///
/// All id tuples are sorted ascending. `bonder_ids` and `deleter_ids` are
/// disjoint subsets of `atom_ids`. Records are immutable; shifting produces a
/// new record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionalGroup {
    id: usize,
    name: String,
    atom_ids: Vec<usize>,
    bonder_ids: Vec<usize>,
    deleter_ids: Vec<usize>,
}

impl FunctionalGroup {
    /// Creates a validated functional group record. Id lists are sorted.
    pub fn new(
        id: usize,
        name: impl Into<String>,
        mut atom_ids: Vec<usize>,
        mut bonder_ids: Vec<usize>,
        mut deleter_ids: Vec<usize>,
    ) -> Result<Self, FunctionalGroupError> {
        let name = name.into();
        atom_ids.sort_unstable();
        bonder_ids.sort_unstable();
        deleter_ids.sort_unstable();

        let mut members = HashSet::with_capacity(atom_ids.len());
        for &atom in &atom_ids {
            if !members.insert(atom) {
                return Err(FunctionalGroupError::DuplicateAtom { name, atom });
            }
        }
        for (role, ids) in [("bonder", &bonder_ids), ("deleter", &deleter_ids)] {
            if let Some(&atom) = ids.iter().find(|a| !members.contains(a)) {
                return Err(FunctionalGroupError::NotAMember { name, role, atom });
            }
        }
        if let Some(&atom) = bonder_ids
            .iter()
            .find(|a| deleter_ids.binary_search(a).is_ok())
        {
            return Err(FunctionalGroupError::BonderIsDeleter { name, atom });
        }

        Ok(Self {
            id,
            name,
            atom_ids,
            bonder_ids,
            deleter_ids,
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// The motif name, e.g. "amine".
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn atom_ids(&self) -> &[usize] {
        &self.atom_ids
    }

    pub fn bonder_ids(&self) -> &[usize] {
        &self.bonder_ids
    }

    pub fn deleter_ids(&self) -> &[usize] {
        &self.deleter_ids
    }

    /// Returns a copy with a new id and every atom id increased by `offset`.
    pub fn shifted(&self, id: usize, offset: usize) -> Self {
        let shift = |ids: &[usize]| ids.iter().map(|a| a + offset).collect();
        Self {
            id,
            name: self.name.clone(),
            atom_ids: shift(&self.atom_ids),
            bonder_ids: shift(&self.bonder_ids),
            deleter_ids: shift(&self.deleter_ids),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amine() -> FunctionalGroup {
        FunctionalGroup::new(0, "amine", vec![6, 5, 0], vec![0], vec![6, 5]).unwrap()
    }

    #[test]
    fn new_sorts_all_id_lists() {
        let fg = amine();
        assert_eq!(fg.atom_ids(), &[0, 5, 6]);
        assert_eq!(fg.bonder_ids(), &[0]);
        assert_eq!(fg.deleter_ids(), &[5, 6]);
        assert_eq!(fg.name(), "amine");
    }

    #[test]
    fn new_rejects_roles_outside_the_group() {
        let err = FunctionalGroup::new(0, "amine", vec![0, 5], vec![0], vec![5, 6]).unwrap_err();
        assert_eq!(
            err,
            FunctionalGroupError::NotAMember {
                name: "amine".into(),
                role: "deleter",
                atom: 6
            }
        );
    }

    #[test]
    fn new_rejects_overlapping_bonders_and_deleters() {
        let err = FunctionalGroup::new(0, "x", vec![1, 2], vec![1], vec![1, 2]).unwrap_err();
        assert!(matches!(
            err,
            FunctionalGroupError::BonderIsDeleter { atom: 1, .. }
        ));
    }

    #[test]
    fn new_rejects_duplicate_atoms() {
        let err = FunctionalGroup::new(0, "x", vec![1, 1], vec![1], vec![]).unwrap_err();
        assert!(matches!(err, FunctionalGroupError::DuplicateAtom { atom: 1, .. }));
    }

    #[test]
    fn shifted_offsets_every_id_and_leaves_original_untouched() {
        let original = amine();
        let shifted = original.shifted(20, 32);
        assert_eq!(shifted.id(), 20);
        assert_eq!(shifted.atom_ids(), &[32, 37, 38]);
        assert_eq!(shifted.bonder_ids(), &[32]);
        assert_eq!(shifted.deleter_ids(), &[37, 38]);
        assert_eq!(shifted.name(), original.name());
        assert_eq!(original.atom_ids(), &[0, 5, 6]);
    }
}
