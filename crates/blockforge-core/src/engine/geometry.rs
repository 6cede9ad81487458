use crate::core::models::building_block::BuildingBlock;
use crate::core::models::functional_group::FunctionalGroup;
use crate::core::utils::geometry::{self, GeometryError, Plane};
use itertools::Itertools;
use nalgebra::{Point3, Unit, Vector3};
use std::iter::FusedIterator;
use std::slice;

/// Iterator over the bonder centroid of each functional group, in group order.
///
/// A clone is an independent cursor at the same position; calling
/// [`BuildingBlock::bonder_centroids`] again starts a new pass.
#[derive(Clone)]
pub struct BonderCentroids<'a> {
    positions: &'a [Point3<f64>],
    groups: slice::Iter<'a, FunctionalGroup>,
}

impl Iterator for BonderCentroids<'_> {
    type Item = Point3<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        let group = self.groups.next()?;
        let bonders = group.bonder_ids();
        let sum = bonders
            .iter()
            .fold(Vector3::zeros(), |acc, &id| acc + self.positions[id].coords);
        Some(Point3::from(sum / bonders.len() as f64))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.groups.size_hint()
    }
}

impl ExactSizeIterator for BonderCentroids<'_> {}
impl FusedIterator for BonderCentroids<'_> {}

impl BuildingBlock {
    /// Mean position of `atom_ids`, or of every atom when `None`.
    pub fn centroid(&self, atom_ids: Option<&[usize]>) -> Result<Point3<f64>, GeometryError> {
        self.molecule().centroid(atom_ids)
    }

    /// One centroid per functional group, over that group's bonder atoms.
    pub fn bonder_centroids(&self) -> BonderCentroids<'_> {
        BonderCentroids {
            positions: self.position_matrix(),
            groups: self.functional_groups().iter(),
        }
    }

    /// Least-squares plane through the bonder centroids, oriented like
    /// [`plane_normal`](Self::plane_normal).
    pub fn bonder_plane(&self) -> Result<Plane, GeometryError> {
        let centroids: Vec<Point3<f64>> = self.bonder_centroids().collect();
        let plane = geometry::fit_plane(&centroids)?;
        let reference = centroids[0] - self.core_centroid()?;
        Ok(plane.oriented_towards(&reference))
    }

    /// Unit normal of [`bonder_plane`](Self::bonder_plane).
    ///
    /// Its dot product with the vector from the core centroid to the first
    /// bonder centroid is non-negative. When that vector lies in the plane the
    /// largest-magnitude component of the normal is made positive.
    pub fn plane_normal(&self) -> Result<Unit<Vector3<f64>>, GeometryError> {
        Ok(self.bonder_plane()?.normal)
    }

    /// Normal of the best-fit plane through arbitrary atoms (all atoms when
    /// `None`), with the largest-magnitude component positive.
    pub fn atom_plane_normal(
        &self,
        atom_ids: Option<&[usize]>,
    ) -> Result<Unit<Vector3<f64>>, GeometryError> {
        let points = match atom_ids {
            Some(ids) => self.molecule().select_positions(ids)?,
            None => self.position_matrix().to_vec(),
        };
        let plane = geometry::fit_plane(&points)?;
        Ok(plane.oriented_towards(&Vector3::zeros()).normal)
    }

    /// `(id1, id2, distance)` between the bonder centroids of every pair of
    /// functional groups, outer id ascending, then inner id ascending.
    pub fn bonder_distances(&self) -> Vec<(usize, usize, f64)> {
        self.group_centroid_pairs()
            .map(|((id1, c1), (id2, c2))| (id1, id2, (c2 - c1).norm()))
            .collect()
    }

    /// `(id1, id2, unit vector from id1's bonder centroid to id2's)` for every
    /// pair of functional groups, in the same order as
    /// [`bonder_distances`](Self::bonder_distances).
    pub fn bonder_direction_vectors(
        &self,
    ) -> Result<Vec<(usize, usize, Unit<Vector3<f64>>)>, GeometryError> {
        self.group_centroid_pairs()
            .map(|((id1, c1), (id2, c2))| Ok((id1, id2, geometry::normalize(&(c2 - c1))?)))
            .collect()
    }

    /// Unit vector from the centroid of all bonder atoms to the centroid of all atoms.
    pub fn centroid_centroid_direction_vector(&self) -> Result<Unit<Vector3<f64>>, GeometryError> {
        let bonder_ids: Vec<usize> = self.bonder_ids().collect();
        let bonder_centroid = self.centroid(Some(&bonder_ids))?;
        let centroid = self.centroid(None)?;
        geometry::normalize(&(centroid - bonder_centroid))
    }

    pub fn maximum_diameter(&self) -> f64 {
        self.molecule().maximum_diameter()
    }

    pub fn center_of_mass(&self) -> Result<Point3<f64>, GeometryError> {
        self.molecule().center_of_mass()
    }

    /// Centroid of the atoms outside every functional group, or of all atoms
    /// when every atom belongs to one.
    fn core_centroid(&self) -> Result<Point3<f64>, GeometryError> {
        let core = self.core_atom_ids();
        if core.is_empty() {
            self.centroid(None)
        } else {
            self.centroid(Some(&core))
        }
    }

    fn group_centroid_pairs(
        &self,
    ) -> impl Iterator<Item = ((usize, Point3<f64>), (usize, Point3<f64>))> + '_ {
        let mut indexed: Vec<(usize, Point3<f64>)> = self
            .functional_groups()
            .iter()
            .map(FunctionalGroup::id)
            .zip(self.bonder_centroids())
            .collect();
        indexed.sort_by_key(|&(id, _)| id);
        indexed.into_iter().tuple_combinations()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::smiles;
    use crate::core::topology::registry::MotifRegistry;

    const TOLERANCE: f64 = 1e-6;

    fn block(smiles_str: &str, names: &[&str]) -> BuildingBlock {
        let molecule = smiles::parse(smiles_str).unwrap();
        BuildingBlock::new(molecule, names, &MotifRegistry::builtin()).unwrap()
    }

    /// Deterministic, non-degenerate coordinates: atom i sits on a helix.
    fn spread_positions(block: &mut BuildingBlock) {
        let positions = (0..block.molecule().atom_count())
            .map(|i| {
                let t = i as f64;
                Point3::new(t.cos() * 2.0, t.sin() * 2.0, 0.3 * t)
            })
            .collect();
        block.set_position_matrix(positions).unwrap();
    }

    #[test]
    fn bonder_centroids_at_origin_for_zero_positions() {
        let mut aldehyde3 = block("O=CC(C=O)C=O", &["aldehyde"]);
        let zeros = vec![Point3::origin(); aldehyde3.molecule().atom_count()];
        aldehyde3.set_position_matrix(zeros).unwrap();

        let centroids: Vec<_> = aldehyde3.bonder_centroids().collect();
        assert_eq!(centroids.len(), 3);
        for centroid in centroids {
            assert!(centroid.coords.norm() < TOLERANCE);
        }
    }

    #[test]
    fn bonder_centroids_are_restartable() {
        let mut aldehyde3 = block("O=CC(C=O)C=O", &["aldehyde"]);
        spread_positions(&mut aldehyde3);
        let iter = aldehyde3.bonder_centroids();
        assert_eq!(iter.len(), 3);
        let first: Vec<_> = iter.clone().collect();
        let second: Vec<_> = iter.collect();
        assert_eq!(first, second);
        assert_eq!(aldehyde3.bonder_centroids().collect::<Vec<_>>(), first);
    }

    #[test]
    fn bonder_plane_passes_through_every_bonder_centroid() {
        let mut amine3 = block("NCC(CN)CN", &["amine"]);
        spread_positions(&mut amine3);
        let [a, b, c, d] = amine3.bonder_plane().unwrap().coefficients();
        assert!(((a * a + b * b + c * c).sqrt() - 1.0).abs() < TOLERANCE);
        for centroid in amine3.bonder_centroids() {
            let product = a * centroid.x + b * centroid.y + c * centroid.z;
            assert!((product - d).abs() < TOLERANCE);
        }
    }

    #[test]
    fn plane_normal_of_flat_block_points_along_z() {
        let mut aldehyde3 = block("O=CC(C=O)C=O", &["aldehyde"]);
        spread_positions(&mut aldehyde3);
        let flattened = aldehyde3
            .position_matrix()
            .iter()
            .map(|p| Point3::new(p.x, p.y, 0.0))
            .collect();
        aldehyde3.set_position_matrix(flattened).unwrap();

        let normal = aldehyde3.plane_normal().unwrap();
        assert!((normal.into_inner() - Vector3::z()).norm() < TOLERANCE);
    }

    #[test]
    fn plane_normal_points_away_from_core() {
        let mut aldehyde3 = block("O=CC(C=O)C=O", &["aldehyde"]);
        let mut positions = vec![Point3::new(0.0, 0.0, -2.0); aldehyde3.molecule().atom_count()];
        let bonders: Vec<usize> = aldehyde3.bonder_ids().collect();
        positions[bonders[0]] = Point3::new(1.0, 0.0, 1.0);
        positions[bonders[1]] = Point3::new(0.0, 1.0, 1.0);
        positions[bonders[2]] = Point3::new(-1.0, -1.0, 1.0);
        aldehyde3.set_position_matrix(positions).unwrap();

        let normal = aldehyde3.plane_normal().unwrap();
        assert!((normal.into_inner() - Vector3::z()).norm() < TOLERANCE);
        let [_, _, _, d] = aldehyde3.bonder_plane().unwrap().coefficients();
        assert!((d - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn bonder_plane_needs_three_centroids() {
        let mut amine2 = block("NCCCN", &["amine"]);
        spread_positions(&mut amine2);
        assert!(matches!(
            amine2.bonder_plane(),
            Err(GeometryError::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn atom_plane_normal_of_flat_molecule_points_along_z() {
        let mut amine2 = block("NCCCN", &["amine"]);
        spread_positions(&mut amine2);
        let flattened = amine2
            .position_matrix()
            .iter()
            .map(|p| Point3::new(p.x, p.y, 0.0))
            .collect();
        amine2.set_position_matrix(flattened).unwrap();
        let normal = amine2.atom_plane_normal(None).unwrap();
        assert!((normal.into_inner() - Vector3::z()).norm() < TOLERANCE);
    }

    #[test]
    fn bonder_distances_between_unit_separated_bonders() {
        let mut amine2 = block("NCCCN", &["amine"]);
        spread_positions(&mut amine2);
        let mut positions = amine2.position_matrix().to_vec();
        for &id in amine2.functional_groups()[0].bonder_ids() {
            positions[id] = Point3::origin();
        }
        for &id in amine2.functional_groups()[1].bonder_ids() {
            positions[id] = Point3::new(1.0, 0.0, 0.0);
        }
        amine2.set_position_matrix(positions).unwrap();

        let distances = amine2.bonder_distances();
        assert_eq!(distances.len(), 1);
        let (id1, id2, distance) = distances[0];
        assert_eq!((id1, id2), (0, 1));
        assert!((distance - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn bonder_direction_vectors_follow_group_ids() {
        let mut aldehyde3 = block("O=CC(C=O)C=O", &["aldehyde"]);
        let mut positions = aldehyde3.position_matrix().to_vec();
        for group in aldehyde3.functional_groups() {
            let id = group.id() as f64;
            for &bonder in group.bonder_ids() {
                positions[bonder] = Point3::new(id, id, id);
            }
        }
        aldehyde3.set_position_matrix(positions).unwrap();

        let vectors = aldehyde3.bonder_direction_vectors().unwrap();
        let pairs: Vec<(usize, usize)> = vectors.iter().map(|&(a, b, _)| (a, b)).collect();
        assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 2)]);
        let expected = Vector3::new(1.0, 1.0, 1.0).normalize();
        for (_, _, v) in vectors {
            assert!((v.into_inner() - expected).norm() < 1e-8);
        }
    }

    #[test]
    fn coincident_bonder_centroids_have_no_direction() {
        let mut amine2 = block("NCCCN", &["amine"]);
        let zeros = vec![Point3::origin(); amine2.molecule().atom_count()];
        amine2.set_position_matrix(zeros).unwrap();
        assert_eq!(
            amine2.bonder_direction_vectors().unwrap_err(),
            GeometryError::ZeroVector
        );
    }

    #[test]
    fn centroid_centroid_direction_matches_manual_computation() {
        let mut aldehyde3 = block("O=CC(C=O)C=O", &["aldehyde"]);
        spread_positions(&mut aldehyde3);
        let bonder_ids: Vec<usize> = aldehyde3.bonder_ids().collect();
        let c1 = aldehyde3.centroid(Some(&bonder_ids)).unwrap();
        let c2 = aldehyde3.centroid(None).unwrap();
        let expected = (c2 - c1).normalize();
        let actual = aldehyde3.centroid_centroid_direction_vector().unwrap();
        assert!((actual.into_inner() - expected).norm() < 1e-8);
    }

    #[test]
    fn centroid_of_empty_selection_fails() {
        let amine2 = block("NCCCN", &["amine"]);
        assert_eq!(
            amine2.centroid(Some(&[])).unwrap_err(),
            GeometryError::EmptySelection
        );
        assert!(matches!(
            amine2.centroid(Some(&[99])),
            Err(GeometryError::AtomOutOfRange { index: 99, .. })
        ));
    }
}
