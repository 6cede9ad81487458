use crate::core::models::element::Element;
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::BondOrder;
use crate::core::utils::geometry;
use nalgebra::{Point3, Unit, Vector3};
use std::collections::VecDeque;

const TETRAHEDRAL_COS: f64 = -1.0 / 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Hybridization {
    Sp,
    Sp2,
    Sp3,
}

impl Hybridization {
    fn electron_domains(self) -> usize {
        match self {
            Self::Sp => 2,
            Self::Sp2 => 3,
            Self::Sp3 => 4,
        }
    }
}

pub(crate) fn hybridization(molecule: &Molecule, atom: usize) -> Hybridization {
    let mut doubles = 0;
    let mut triple = false;
    let mut aromatic = false;
    for (_, order) in molecule.neighbors(atom) {
        match order {
            BondOrder::Double => doubles += 1,
            BondOrder::Triple => triple = true,
            BondOrder::Aromatic => aromatic = true,
            BondOrder::Single => {}
        }
    }
    if triple || doubles >= 2 {
        Hybridization::Sp
    } else if doubles == 1 || aromatic {
        Hybridization::Sp2
    } else {
        Hybridization::Sp3
    }
}

/// Number of directions to distribute around `atom`; hypervalent centres get
/// one per neighbor.
pub(crate) fn domain_count(molecule: &Molecule, atom: usize) -> usize {
    hybridization(molecule, atom)
        .electron_domains()
        .max(molecule.degree(atom))
}

/// Ideal angle between two neighbors of a centre with `domains` directions,
/// or `None` when the arrangement has no single ideal angle.
pub(crate) fn ideal_angle(domains: usize) -> Option<f64> {
    match domains {
        0..=2 => Some(std::f64::consts::PI),
        3 => Some(120f64.to_radians()),
        4 => Some(TETRAHEDRAL_COS.acos()),
        _ => None,
    }
}

pub(crate) fn ideal_bond_length(a: Element, b: Element, order: BondOrder) -> f64 {
    let single = a.covalent_radius() + b.covalent_radius();
    single
        * match order {
            BondOrder::Single => 1.0,
            BondOrder::Aromatic => 0.91,
            BondOrder::Double => 0.87,
            BondOrder::Triple => 0.78,
        }
}

/// Unit directions in a local frame. The first points along +x; the second,
/// where it is not -x, has a positive y component.
fn direction_template(domains: usize) -> Vec<Vector3<f64>> {
    let (s120, c120) = (120f64.to_radians().sin(), -0.5);
    match domains {
        0 | 1 => vec![Vector3::x()],
        2 => vec![Vector3::x(), -Vector3::x()],
        3 => vec![
            Vector3::x(),
            Vector3::new(c120, s120, 0.0),
            Vector3::new(c120, -s120, 0.0),
        ],
        4 => {
            let radial = (1.0 - TETRAHEDRAL_COS * TETRAHEDRAL_COS).sqrt();
            let mut dirs = vec![Vector3::x()];
            for k in 0..3 {
                let phi = (120.0 * k as f64).to_radians();
                dirs.push(Vector3::new(
                    TETRAHEDRAL_COS,
                    radial * phi.cos(),
                    radial * phi.sin(),
                ));
            }
            dirs
        }
        5 => vec![
            Vector3::x(),
            -Vector3::x(),
            Vector3::y(),
            Vector3::new(0.0, c120, s120),
            Vector3::new(0.0, c120, -s120),
        ],
        6 => vec![
            Vector3::x(),
            Vector3::y(),
            Vector3::z(),
            -Vector3::y(),
            -Vector3::z(),
            -Vector3::x(),
        ],
        n => {
            // Golden-spiral points, starting at +x.
            let golden = std::f64::consts::PI * (3.0 - 5f64.sqrt());
            (0..n)
                .map(|i| {
                    let x = 1.0 - 2.0 * i as f64 / (n - 1) as f64;
                    let r = (1.0 - x * x).max(0.0).sqrt();
                    let theta = golden * i as f64;
                    Vector3::new(x, r * theta.cos(), r * theta.sin())
                })
                .collect()
        }
    }
}

struct PlacementState<'m> {
    molecule: &'m Molecule,
    positions: Vec<Point3<f64>>,
    placed: Vec<bool>,
    parent: Vec<Option<usize>>,
}

impl PlacementState<'_> {
    /// World directions for the still-unplaced neighbors of `atom`.
    fn free_directions(&self, atom: usize) -> Vec<Unit<Vector3<f64>>> {
        let template = direction_template(domain_count(self.molecule, atom));
        let origin = self.positions[atom];

        let (axis, reference, skip) = match self.parent[atom] {
            Some(parent) => {
                let axis = Unit::new_normalize(self.positions[parent] - origin);
                (axis, self.staggered_reference(atom, parent, &axis), 1)
            }
            None => (Vector3::x_axis(), Vector3::y_axis(), 0),
        };
        let third = axis.cross(&*reference);

        template
            .into_iter()
            .skip(skip)
            .map(|local| {
                Unit::new_normalize(
                    axis.into_inner() * local.x + reference.into_inner() * local.y + third * local.z,
                )
            })
            .collect()
    }

    /// Perpendicular to `axis` pointing away from another neighbor of
    /// `parent`, so the first child of `atom` is anti-periplanar to it.
    fn staggered_reference(
        &self,
        atom: usize,
        parent: usize,
        axis: &Unit<Vector3<f64>>,
    ) -> Unit<Vector3<f64>> {
        let other = self.parent[parent].or_else(|| {
            self.molecule
                .neighbors(parent)
                .map(|(n, _)| n)
                .find(|&n| n != atom && self.placed[n])
        });

        other
            .and_then(|other| {
                let w = self.positions[other] - self.positions[parent];
                let perpendicular = w - axis.into_inner() * axis.dot(&w);
                geometry::normalize(&-perpendicular).ok()
            })
            .unwrap_or_else(|| geometry::any_perpendicular(axis))
    }

    fn place_component(&mut self, root: usize) -> Vec<usize> {
        self.placed[root] = true;
        self.positions[root] = Point3::origin();
        let mut members = vec![root];
        let mut queue = VecDeque::from([root]);

        while let Some(atom) = queue.pop_front() {
            let children: Vec<(usize, BondOrder)> = self
                .molecule
                .neighbors(atom)
                .filter(|&(n, _)| !self.placed[n])
                .collect();
            if children.is_empty() {
                continue;
            }

            let directions = self.free_directions(atom);
            let element = self.molecule.atoms()[atom].element;
            for ((child, order), direction) in children.into_iter().zip(directions) {
                let child_element = self.molecule.atoms()[child].element;
                let length = ideal_bond_length(element, child_element, order);
                self.positions[child] = self.positions[atom] + direction.into_inner() * length;
                self.placed[child] = true;
                self.parent[child] = Some(atom);
                members.push(child);
                queue.push_back(child);
            }
        }
        members
    }
}

/// Initial coordinates: each connected component grown breadth-first from
/// its lowest-index atom, components laid out along +x.
pub(crate) fn place(molecule: &Molecule, component_spacing: f64) -> Vec<Point3<f64>> {
    let atom_count = molecule.atom_count();
    let mut state = PlacementState {
        molecule,
        positions: vec![Point3::origin(); atom_count],
        placed: vec![false; atom_count],
        parent: vec![None; atom_count],
    };

    let mut previous_max_x: Option<f64> = None;
    for root in 0..atom_count {
        if state.placed[root] {
            continue;
        }
        let members = state.place_component(root);

        if let Some(max_x) = previous_max_x {
            let min_x = members
                .iter()
                .map(|&a| state.positions[a].x)
                .fold(f64::INFINITY, f64::min);
            let shift = max_x + component_spacing - min_x;
            for &a in &members {
                state.positions[a].x += shift;
            }
        }
        previous_max_x = Some(
            members
                .iter()
                .map(|&a| state.positions[a].x)
                .fold(f64::NEG_INFINITY, f64::max),
        );
    }
    state.positions
}
