use super::EmbeddingConfig;
use super::placement::{domain_count, ideal_angle, ideal_bond_length};
use crate::core::models::molecule::Molecule;
use itertools::Itertools;
use nalgebra::{Point3, Vector3};
use std::collections::HashSet;
use tracing::trace;

/// Below this total displacement per sweep the relaxation has converged.
const CONVERGENCE_THRESHOLD: f64 = 1e-7;

#[derive(Debug, Clone, Copy)]
struct Spring {
    a: usize,
    b: usize,
    rest: f64,
    stiffness: f64,
}

fn build_springs(molecule: &Molecule, config: &EmbeddingConfig) -> (Vec<Spring>, HashSet<(usize, usize)>) {
    let atoms = molecule.atoms();
    let mut springs = Vec::with_capacity(molecule.bond_count() * 3);
    let mut excluded = HashSet::new();

    for bond in molecule.bonds() {
        let (a, b) = bond.ordered_pair();
        springs.push(Spring {
            a,
            b,
            rest: ideal_bond_length(atoms[a].element, atoms[b].element, bond.order),
            stiffness: config.bond_stiffness,
        });
        excluded.insert((a, b));
    }

    for center in 0..molecule.atom_count() {
        let angle = ideal_angle(domain_count(molecule, center));
        let neighbors: Vec<(usize, f64)> = molecule
            .neighbors(center)
            .map(|(n, order)| {
                let length = ideal_bond_length(atoms[center].element, atoms[n].element, order);
                (n, length)
            })
            .collect();

        for ((i, li), (j, lj)) in neighbors.into_iter().tuple_combinations() {
            let pair = (i.min(j), i.max(j));
            if !excluded.insert(pair) {
                continue;
            }
            if let Some(theta) = angle {
                springs.push(Spring {
                    a: pair.0,
                    b: pair.1,
                    rest: (li * li + lj * lj - 2.0 * li * lj * theta.cos()).sqrt(),
                    stiffness: config.angle_stiffness,
                });
            }
        }
    }

    (springs, excluded)
}

/// Direction used when two atoms coincide; depends only on the indices.
fn fallback_direction(a: usize, b: usize) -> Vector3<f64> {
    let v = Vector3::new(1.0, ((a + 1) as f64 * 0.37).sin(), ((b + 1) as f64 * 0.71).cos());
    v / v.norm()
}

fn unit_between(positions: &[Point3<f64>], a: usize, b: usize) -> (Vector3<f64>, f64) {
    let d = positions[b] - positions[a];
    let length = d.norm();
    if length > 1e-8 {
        (d / length, length)
    } else {
        (fallback_direction(a, b), 0.0)
    }
}

/// Relaxes `positions` with bond and 1-3 springs plus a soft repulsion between
/// all other atom pairs. Returns the number of sweeps performed.
pub(crate) fn relax(molecule: &Molecule, positions: &mut [Point3<f64>], config: &EmbeddingConfig) -> usize {
    let (springs, excluded) = build_springs(molecule, config);
    let atom_count = positions.len();
    let mut displacements = vec![Vector3::zeros(); atom_count];

    for sweep in 0..config.relaxation_sweeps {
        displacements.iter_mut().for_each(|d| *d = Vector3::zeros());

        for spring in &springs {
            let (direction, length) = unit_between(positions, spring.a, spring.b);
            let correction = direction * (0.5 * spring.stiffness * (length - spring.rest));
            displacements[spring.a] += correction;
            displacements[spring.b] -= correction;
        }

        for a in 0..atom_count {
            for b in a + 1..atom_count {
                if excluded.contains(&(a, b)) {
                    continue;
                }
                let (direction, length) = unit_between(positions, a, b);
                if length >= config.repulsion_distance {
                    continue;
                }
                let push = direction
                    * (0.5 * config.repulsion_stiffness * (config.repulsion_distance - length));
                displacements[a] -= push;
                displacements[b] += push;
            }
        }

        let mut total = 0.0;
        for (position, displacement) in positions.iter_mut().zip(&displacements) {
            let norm = displacement.norm();
            let step = if norm > config.max_step {
                displacement * (config.max_step / norm)
            } else {
                *displacement
            };
            *position += step;
            total += step.norm();
        }

        if total < CONVERGENCE_THRESHOLD {
            trace!(sweep, "Relaxation converged.");
            return sweep + 1;
        }
    }
    config.relaxation_sweeps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::conformer::placement;
    use crate::core::io::smiles;

    fn bond_errors(molecule: &Molecule, positions: &[Point3<f64>]) -> Vec<f64> {
        molecule
            .bonds()
            .iter()
            .map(|bond| {
                let atoms = molecule.atoms();
                let ideal =
                    ideal_bond_length(atoms[bond.atom1].element, atoms[bond.atom2].element, bond.order);
                ((positions[bond.atom1] - positions[bond.atom2]).norm() - ideal).abs()
            })
            .collect()
    }

    #[test]
    fn springs_cover_bonds_and_angles_once() {
        let molecule = smiles::parse("C").unwrap();
        let (springs, excluded) = build_springs(&molecule, &EmbeddingConfig::default());
        // Four C-H bonds and six H-C-H angles.
        assert_eq!(springs.len(), 10);
        assert_eq!(excluded.len(), 10);
    }

    #[test]
    fn ideal_placement_is_a_fixed_point() {
        let molecule = smiles::parse("C").unwrap();
        let mut positions = placement::place(&molecule, 4.0);
        let before = positions.clone();
        let sweeps = relax(&molecule, &mut positions, &EmbeddingConfig::default());
        assert_eq!(sweeps, 1);
        for (a, b) in positions.iter().zip(&before) {
            assert!((a - b).norm() < 1e-6);
        }
    }

    #[test]
    fn stretched_bond_is_pulled_back() {
        let molecule = smiles::parse("[H][H]").unwrap();
        let mut positions = vec![Point3::origin(), Point3::new(3.0, 0.0, 0.0)];
        relax(&molecule, &mut positions, &EmbeddingConfig::default());
        let errors = bond_errors(&molecule, &positions);
        assert!(errors[0] < 1e-3, "bond error {}", errors[0]);
    }

    #[test]
    fn coincident_atoms_are_separated() {
        let molecule = smiles::parse("[H].[H]").unwrap();
        let mut positions = vec![Point3::origin(); 2];
        relax(&molecule, &mut positions, &EmbeddingConfig::default());
        assert!((positions[1] - positions[0]).norm() > 1.0);
    }
}
