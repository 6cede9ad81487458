use crate::core::models::building_block::BuildingBlock;
use crate::core::utils::geometry;
use nalgebra::{Point3, Vector3};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupReport {
    pub id: usize,
    pub name: String,
    pub atom_ids: Vec<usize>,
    pub bonder_ids: Vec<usize>,
    pub deleter_ids: Vec<usize>,
    pub bonder_centroid: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BonderPair {
    pub id1: usize,
    pub id2: usize,
    pub distance: f64,
    /// Unit vector from `id1`'s bonder centroid to `id2`'s; absent when the
    /// two centroids coincide.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<[f64; 3]>,
}

/// A serializable summary of a building block: composition, functional
/// groups and the bonder geometry derived from them.
///
/// Geometric quantities that are undefined for the block (for instance a
/// bonding plane with fewer than three groups) are left out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockReport {
    pub atom_count: usize,
    pub heavy_atom_count: usize,
    pub bond_count: usize,
    pub functional_group_names: Vec<String>,
    pub maximum_diameter: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center_of_mass: Option<[f64; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plane_normal: Option<[f64; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub centroid_centroid_direction: Option<[f64; 3]>,
    pub functional_groups: Vec<GroupReport>,
    pub bonder_pairs: Vec<BonderPair>,
}

fn array(v: &Vector3<f64>) -> [f64; 3] {
    [v.x, v.y, v.z]
}

impl BlockReport {
    pub fn new(block: &BuildingBlock) -> Self {
        let molecule = block.molecule();

        let functional_groups = block
            .functional_groups()
            .iter()
            .zip(block.bonder_centroids())
            .map(|(group, centroid)| GroupReport {
                id: group.id(),
                name: group.name().to_string(),
                atom_ids: group.atom_ids().to_vec(),
                bonder_ids: group.bonder_ids().to_vec(),
                deleter_ids: group.deleter_ids().to_vec(),
                bonder_centroid: array(&centroid.coords),
            })
            .collect();

        let centroids: HashMap<usize, Point3<f64>> = block
            .functional_groups()
            .iter()
            .map(|group| group.id())
            .zip(block.bonder_centroids())
            .collect();
        let bonder_pairs = block
            .bonder_distances()
            .into_iter()
            .map(|(id1, id2, distance)| BonderPair {
                id1,
                id2,
                distance,
                direction: geometry::normalize(&(centroids[&id2] - centroids[&id1]))
                    .ok()
                    .map(|d| array(&d)),
            })
            .collect();

        Self {
            atom_count: molecule.atom_count(),
            heavy_atom_count: molecule.heavy_atom_count(),
            bond_count: molecule.bond_count(),
            functional_group_names: block.functional_group_names().to_vec(),
            maximum_diameter: block.maximum_diameter(),
            center_of_mass: block.center_of_mass().ok().map(|p| array(&p.coords)),
            plane_normal: block.plane_normal().ok().map(|n| array(&n)),
            centroid_centroid_direction: block
                .centroid_centroid_direction_vector()
                .ok()
                .map(|d| array(&d)),
            functional_groups,
            bonder_pairs,
        }
    }
}
