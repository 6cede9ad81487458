use super::atom::Atom;
use super::topology::{Bond, BondOrder};
use crate::core::utils::geometry::{self, GeometryError};
use nalgebra::{Point3, Vector3};
use std::collections::HashSet;
use std::fmt::Write;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoleculeError {
    #[error("Position matrix has {found} rows but the molecule has {expected} atoms")]
    PositionCountMismatch { expected: usize, found: usize },
    #[error("Bond ({atom1}, {atom2}) references an atom outside 0..{atom_count}")]
    BondOutOfRange {
        atom1: usize,
        atom2: usize,
        atom_count: usize,
    },
    #[error("Atom {0} cannot be bonded to itself")]
    SelfBond(usize),
    #[error("Atoms {0} and {1} are bonded more than once")]
    DuplicateBond(usize, usize),
}

/// A molecule: an ordered atom sequence, its bonds, and one 3D position per atom.
///
/// Atom ids are indices into the atom sequence. The position matrix always has
/// exactly one row per atom and can only be replaced as a whole.
#[derive(Debug, Clone, PartialEq)]
pub struct Molecule {
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    positions: Vec<Point3<f64>>,
    /// adjacency[atom] = (neighbor, bond index), sorted by neighbor.
    adjacency: Vec<Vec<(usize, usize)>>,
}

impl Molecule {
    /// Creates a molecule, validating bonds and the position matrix shape.
    pub fn new(
        atoms: Vec<Atom>,
        bonds: Vec<Bond>,
        positions: Vec<Point3<f64>>,
    ) -> Result<Self, MoleculeError> {
        if positions.len() != atoms.len() {
            return Err(MoleculeError::PositionCountMismatch {
                expected: atoms.len(),
                found: positions.len(),
            });
        }

        let mut adjacency = vec![Vec::new(); atoms.len()];
        let mut seen = HashSet::with_capacity(bonds.len());
        for (bond_idx, bond) in bonds.iter().enumerate() {
            if bond.atom1 >= atoms.len() || bond.atom2 >= atoms.len() {
                return Err(MoleculeError::BondOutOfRange {
                    atom1: bond.atom1,
                    atom2: bond.atom2,
                    atom_count: atoms.len(),
                });
            }
            if bond.atom1 == bond.atom2 {
                return Err(MoleculeError::SelfBond(bond.atom1));
            }
            let pair = bond.ordered_pair();
            if !seen.insert(pair) {
                return Err(MoleculeError::DuplicateBond(pair.0, pair.1));
            }
            adjacency[bond.atom1].push((bond.atom2, bond_idx));
            adjacency[bond.atom2].push((bond.atom1, bond_idx));
        }
        for neighbors in &mut adjacency {
            neighbors.sort_unstable();
        }

        Ok(Self {
            atoms,
            bonds,
            positions,
            adjacency,
        })
    }

    /// Creates a molecule with every atom placed at the origin.
    pub fn from_topology(atoms: Vec<Atom>, bonds: Vec<Bond>) -> Result<Self, MoleculeError> {
        let positions = vec![Point3::origin(); atoms.len()];
        Self::new(atoms, bonds, positions)
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn atom(&self, id: usize) -> Option<&Atom> {
        self.atoms.get(id)
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    pub fn heavy_atom_count(&self) -> usize {
        self.atoms
            .iter()
            .filter(|a| !a.element.is_hydrogen())
            .count()
    }

    /// Neighbors of `atom` in ascending index order, with the connecting bond order.
    pub fn neighbors(&self, atom: usize) -> impl Iterator<Item = (usize, BondOrder)> + '_ {
        self.adjacency
            .get(atom)
            .into_iter()
            .flatten()
            .map(|&(neighbor, bond_idx)| (neighbor, self.bonds[bond_idx].order))
    }

    pub fn degree(&self, atom: usize) -> usize {
        self.adjacency.get(atom).map_or(0, Vec::len)
    }

    pub fn bond_between(&self, atom1: usize, atom2: usize) -> Option<&Bond> {
        self.adjacency
            .get(atom1)?
            .iter()
            .find(|(neighbor, _)| *neighbor == atom2)
            .map(|&(_, bond_idx)| &self.bonds[bond_idx])
    }

    pub fn position_matrix(&self) -> &[Point3<f64>] {
        &self.positions
    }

    pub fn position(&self, atom: usize) -> Option<&Point3<f64>> {
        self.positions.get(atom)
    }

    /// Replaces the whole position matrix. The matrix must have one row per atom.
    pub fn set_position_matrix(&mut self, positions: Vec<Point3<f64>>) -> Result<(), MoleculeError> {
        if positions.len() != self.atoms.len() {
            return Err(MoleculeError::PositionCountMismatch {
                expected: self.atoms.len(),
                found: positions.len(),
            });
        }
        self.positions = positions;
        Ok(())
    }

    /// Mean position of the selected atoms, or of all atoms when `atom_ids` is `None`.
    pub fn centroid(&self, atom_ids: Option<&[usize]>) -> Result<Point3<f64>, GeometryError> {
        match atom_ids {
            None => geometry::centroid(&self.positions),
            Some(ids) => geometry::centroid(self.select_positions(ids)?.iter()),
        }
    }

    /// Collects the positions of `atom_ids`, failing on any out-of-range id.
    pub fn select_positions(&self, atom_ids: &[usize]) -> Result<Vec<Point3<f64>>, GeometryError> {
        atom_ids
            .iter()
            .map(|&id| {
                self.positions
                    .get(id)
                    .copied()
                    .ok_or(GeometryError::AtomOutOfRange {
                        index: id,
                        atom_count: self.atoms.len(),
                    })
            })
            .collect()
    }

    /// Mass-weighted mean position of all atoms.
    pub fn center_of_mass(&self) -> Result<Point3<f64>, GeometryError> {
        let total_mass: f64 = self.atoms.iter().map(|a| a.element.mass()).sum();
        if self.atoms.is_empty() || total_mass <= 0.0 {
            return Err(GeometryError::EmptySelection);
        }
        let weighted = self
            .atoms
            .iter()
            .zip(&self.positions)
            .fold(Vector3::zeros(), |acc, (atom, p)| {
                acc + p.coords * atom.element.mass()
            });
        Ok(Point3::from(weighted / total_mass))
    }

    /// Largest distance between any two atoms.
    pub fn maximum_diameter(&self) -> f64 {
        let mut max = 0.0f64;
        for (i, p1) in self.positions.iter().enumerate() {
            for p2 in &self.positions[i + 1..] {
                max = max.max((p1 - p2).norm());
            }
        }
        max
    }

    /// Translates every atom by `displacement`.
    pub fn apply_displacement(&mut self, displacement: &Vector3<f64>) {
        for p in &mut self.positions {
            *p += displacement;
        }
    }

    /// Translates the molecule so that its centroid lands on `target`.
    pub fn set_centroid(&mut self, target: &Point3<f64>) -> Result<(), GeometryError> {
        let current = self.centroid(None)?;
        self.apply_displacement(&(target - current));
        Ok(())
    }

    /// A key identifying the molecular graph exactly as ordered: elements with
    /// charges, followed by the sorted bond list.
    ///
    /// Two molecules built from the same descriptor always share a key.
    pub fn structural_key(&self) -> String {
        let mut key = String::with_capacity(self.atoms.len() * 3 + self.bonds.len() * 8);
        for (i, atom) in self.atoms.iter().enumerate() {
            if i > 0 {
                key.push('.');
            }
            key.push_str(atom.element.symbol());
            if atom.charge != 0 {
                let _ = write!(key, "{:+}", atom.charge);
            }
        }
        key.push('|');

        let mut bonds: Vec<(usize, usize, u8)> = self
            .bonds
            .iter()
            .map(|b| {
                let (a, c) = b.ordered_pair();
                (a, c, b.order.molfile_code())
            })
            .collect();
        bonds.sort_unstable();
        for (i, (a, b, order)) in bonds.iter().enumerate() {
            if i > 0 {
                key.push(',');
            }
            let _ = write!(key, "{}-{}:{}", a, b, order);
        }
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::element::Element;

    fn water() -> Molecule {
        Molecule::new(
            vec![
                Atom::new(Element::O),
                Atom::new(Element::H),
                Atom::new(Element::H),
            ],
            vec![
                Bond::new(0, 1, BondOrder::Single),
                Bond::new(0, 2, BondOrder::Single),
            ],
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.96, 0.0, 0.0),
                Point3::new(-0.24, 0.93, 0.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn new_rejects_position_count_mismatch() {
        let result = Molecule::new(vec![Atom::new(Element::C)], vec![], vec![]);
        assert_eq!(
            result.unwrap_err(),
            MoleculeError::PositionCountMismatch {
                expected: 1,
                found: 0
            }
        );
    }

    #[test]
    fn new_rejects_bad_bonds() {
        let atoms = vec![Atom::new(Element::C), Atom::new(Element::C)];
        assert!(matches!(
            Molecule::from_topology(atoms.clone(), vec![Bond::new(0, 2, BondOrder::Single)]),
            Err(MoleculeError::BondOutOfRange { .. })
        ));
        assert_eq!(
            Molecule::from_topology(atoms.clone(), vec![Bond::new(1, 1, BondOrder::Single)])
                .unwrap_err(),
            MoleculeError::SelfBond(1)
        );
        assert_eq!(
            Molecule::from_topology(
                atoms,
                vec![
                    Bond::new(0, 1, BondOrder::Single),
                    Bond::new(1, 0, BondOrder::Double)
                ]
            )
            .unwrap_err(),
            MoleculeError::DuplicateBond(0, 1)
        );
    }

    #[test]
    fn neighbors_are_sorted_and_carry_bond_order() {
        let mol = water();
        let neighbors: Vec<_> = mol.neighbors(0).collect();
        assert_eq!(neighbors, vec![(1, BondOrder::Single), (2, BondOrder::Single)]);
        assert_eq!(mol.degree(1), 1);
        assert_eq!(mol.neighbors(99).count(), 0);
        assert!(mol.bond_between(2, 0).is_some());
        assert!(mol.bond_between(1, 2).is_none());
    }

    #[test]
    fn set_position_matrix_requires_full_replacement() {
        let mut mol = water();
        let err = mol
            .set_position_matrix(vec![Point3::origin(); 2])
            .unwrap_err();
        assert!(matches!(err, MoleculeError::PositionCountMismatch { .. }));
        assert_eq!(mol.position(1), Some(&Point3::new(0.96, 0.0, 0.0)));

        mol.set_position_matrix(vec![Point3::origin(); 3]).unwrap();
        assert!(mol.position_matrix().iter().all(|p| *p == Point3::origin()));
    }

    #[test]
    fn centroid_over_subset_and_all_atoms() {
        let mol = water();
        let subset = mol.centroid(Some(&[0, 1])).unwrap();
        assert!((subset - Point3::new(0.48, 0.0, 0.0)).norm() < 1e-12);
        let all = mol.centroid(None).unwrap();
        assert!((all - Point3::new(0.24, 0.31, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn centroid_errors_on_empty_or_out_of_range_selection() {
        let mol = water();
        assert_eq!(mol.centroid(Some(&[])), Err(GeometryError::EmptySelection));
        assert_eq!(
            mol.centroid(Some(&[0, 7])),
            Err(GeometryError::AtomOutOfRange {
                index: 7,
                atom_count: 3
            })
        );
    }

    #[test]
    fn set_centroid_moves_whole_molecule() {
        let mut mol = water();
        let before = mol.maximum_diameter();
        mol.set_centroid(&Point3::new(10.0, -5.0, 2.0)).unwrap();
        let after = mol.centroid(None).unwrap();
        assert!((after - Point3::new(10.0, -5.0, 2.0)).norm() < 1e-12);
        assert!((mol.maximum_diameter() - before).abs() < 1e-12);
    }

    #[test]
    fn center_of_mass_is_pulled_towards_heavy_atoms() {
        let mol = water();
        let com = mol.center_of_mass().unwrap();
        let centroid = mol.centroid(None).unwrap();
        assert!(com.coords.norm() < centroid.coords.norm());
    }

    #[test]
    fn structural_key_is_independent_of_bond_listing_order() {
        let atoms = vec![
            Atom::new(Element::C),
            Atom::with_charge(Element::N, 1),
            Atom::new(Element::O),
        ];
        let a = Molecule::from_topology(
            atoms.clone(),
            vec![
                Bond::new(0, 1, BondOrder::Single),
                Bond::new(2, 0, BondOrder::Double),
            ],
        )
        .unwrap();
        let b = Molecule::from_topology(
            atoms,
            vec![
                Bond::new(0, 2, BondOrder::Double),
                Bond::new(1, 0, BondOrder::Single),
            ],
        )
        .unwrap();
        assert_eq!(a.structural_key(), b.structural_key());
        assert_eq!(a.structural_key(), "C.N+1.O|0-1:1,0-2:2");
    }
}
