use super::registry::{AtomPattern, AtomRole, MotifDefinition, MotifRegistry};
use crate::core::models::functional_group::{FunctionalGroup, FunctionalGroupError};
use crate::core::models::molecule::Molecule;
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("Unknown functional group motif '{0}'")]
    UnknownMotif(String),
    #[error("Matched atoms do not form a valid functional group: {0}")]
    InvalidGroup(#[from] FunctionalGroupError),
}

/// Finds functional groups in a molecule using motifs from a registry.
pub struct Matcher<'a> {
    registry: &'a MotifRegistry,
}

/// Atoms assigned so far during one anchor's search.
#[derive(Default)]
struct Assignment {
    atoms: Vec<(usize, AtomRole)>,
}

impl Assignment {
    fn contains(&self, atom: usize) -> bool {
        self.atoms.iter().any(|&(a, _)| a == atom)
    }
}

type Task<'p> = (usize, &'p [AtomPattern]);

impl<'a> Matcher<'a> {
    pub fn new(registry: &'a MotifRegistry) -> Self {
        Self { registry }
    }

    /// Detects every occurrence of the named motifs.
    ///
    /// Occurrences are ordered by anchor atom index, then by the position of
    /// the motif name in `names`; ids are assigned `0..n` in that order.
    /// Repeated names are considered once. Every name must exist in the
    /// registry, otherwise nothing is matched and `UnknownMotif` is returned.
    pub fn find<S: AsRef<str>>(
        &self,
        molecule: &Molecule,
        names: &[S],
    ) -> Result<Vec<FunctionalGroup>, MatchError> {
        let mut motifs: Vec<(&str, &MotifDefinition)> = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            if motifs.iter().any(|(n, _)| *n == name) {
                continue;
            }
            let motif = self
                .registry
                .get(name)
                .ok_or_else(|| MatchError::UnknownMotif(name.to_string()))?;
            motifs.push((name, motif));
        }

        let mut groups = Vec::new();
        for (anchor, atom) in molecule.atoms().iter().enumerate() {
            for &(name, motif) in &motifs {
                if !motif.element.accepts(atom.element) {
                    continue;
                }
                let Some(assignment) = Self::match_at(molecule, anchor, motif) else {
                    continue;
                };
                trace!(motif = name, anchor, "Matched functional group.");
                groups.push(Self::to_functional_group(groups.len(), name, assignment)?);
            }
        }

        debug!(
            num_groups = groups.len(),
            num_motifs = motifs.len(),
            "Functional group perception complete."
        );
        Ok(groups)
    }

    fn match_at(molecule: &Molecule, anchor: usize, motif: &MotifDefinition) -> Option<Assignment> {
        let mut assignment = Assignment::default();
        assignment.atoms.push((anchor, motif.role));
        let tasks = [(anchor, motif.neighbors.as_slice())];
        if Self::search(molecule, &tasks, &mut assignment) {
            Some(assignment)
        } else {
            None
        }
    }

    /// Depth-first assignment of pattern atoms to distinct molecule atoms.
    ///
    /// `tasks` is the stack of (center atom, patterns still to place around it).
    /// Candidates are tried in ascending atom index, so the first complete
    /// assignment found is the lowest-index one.
    fn search(molecule: &Molecule, tasks: &[Task<'_>], assignment: &mut Assignment) -> bool {
        let Some((&(center, patterns), remaining)) = tasks.split_first() else {
            return true;
        };
        let Some((pattern, siblings)) = patterns.split_first() else {
            return Self::search(molecule, remaining, assignment);
        };

        for (neighbor, order) in molecule.neighbors(center) {
            if assignment.contains(neighbor) {
                continue;
            }
            let element = molecule.atoms()[neighbor].element;
            if !pattern.element.accepts(element) {
                continue;
            }
            if pattern.bond.is_some_and(|required| required != order) {
                continue;
            }

            assignment.atoms.push((neighbor, pattern.role));
            let mut next: Vec<Task<'_>> = Vec::with_capacity(remaining.len() + 2);
            next.push((neighbor, pattern.neighbors.as_slice()));
            next.push((center, siblings));
            next.extend_from_slice(remaining);
            if Self::search(molecule, &next, assignment) {
                return true;
            }
            assignment.atoms.pop();
        }
        false
    }

    fn to_functional_group(
        id: usize,
        name: &str,
        assignment: Assignment,
    ) -> Result<FunctionalGroup, MatchError> {
        let mut atom_ids = Vec::with_capacity(assignment.atoms.len());
        let mut bonder_ids = Vec::new();
        let mut deleter_ids = Vec::new();
        for (atom, role) in assignment.atoms {
            atom_ids.push(atom);
            match role {
                AtomRole::Bonder => bonder_ids.push(atom),
                AtomRole::Deleter => deleter_ids.push(atom),
                AtomRole::Member => {}
            }
        }
        Ok(FunctionalGroup::new(
            id,
            name,
            atom_ids,
            bonder_ids,
            deleter_ids,
        )?)
    }
}
