//! Deterministic 3D coordinate generation for molecules built from
//! connectivity alone.
//!
//! Each connected component is grown breadth-first from its lowest-index atom
//! using ideal bond lengths and hybridization-derived angles, then relaxed with
//! a small spring model that closes rings and pushes apart crowded atoms. The
//! same molecule always receives the same coordinates.

mod placement;
mod relax;

use crate::core::models::molecule::{Molecule, MoleculeError};
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error, PartialEq)]
pub enum ConformerError {
    #[error("Invalid embedding parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("Molecule error: {0}")]
    Molecule(#[from] MoleculeError),
}

/// Parameters of the spring relaxation that follows the initial placement.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingConfig {
    pub relaxation_sweeps: usize,
    pub bond_stiffness: f64,
    pub angle_stiffness: f64,
    pub repulsion_stiffness: f64,
    /// Non-bonded pairs closer than this (in Å) repel each other.
    pub repulsion_distance: f64,
    /// Largest displacement of a single atom in one sweep, in Å.
    pub max_step: f64,
    /// Gap along x between the bounding boxes of disconnected fragments.
    pub component_spacing: f64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            relaxation_sweeps: 500,
            bond_stiffness: 0.2,
            angle_stiffness: 0.1,
            repulsion_stiffness: 0.05,
            repulsion_distance: 2.0,
            max_step: 0.1,
            component_spacing: 4.0,
        }
    }
}

impl EmbeddingConfig {
    pub fn validate(&self) -> Result<(), ConformerError> {
        let unit_interval = [
            ("bond_stiffness", self.bond_stiffness),
            ("angle_stiffness", self.angle_stiffness),
            ("repulsion_stiffness", self.repulsion_stiffness),
        ];
        for (name, value) in unit_interval {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConformerError::InvalidParameter {
                    name,
                    reason: format!("{value} is outside [0, 1]"),
                });
            }
        }

        let positive = [
            ("repulsion_distance", self.repulsion_distance),
            ("max_step", self.max_step),
            ("component_spacing", self.component_spacing),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConformerError::InvalidParameter {
                    name,
                    reason: format!("{value} must be a positive finite number"),
                });
            }
        }
        Ok(())
    }
}

/// Replaces the coordinates of `molecule` with a generated conformation.
///
/// # Errors
///
/// Returns [`ConformerError::InvalidParameter`] if `config` fails validation;
/// the molecule is left untouched in that case.
#[instrument(skip_all, name = "conformer_embedding", fields(atoms = molecule.atom_count()))]
pub fn embed(molecule: &mut Molecule, config: &EmbeddingConfig) -> Result<(), ConformerError> {
    config.validate()?;

    let mut positions = placement::place(molecule, config.component_spacing);
    let sweeps = relax::relax(molecule, &mut positions, config);
    debug!(sweeps, "Conformer relaxed.");

    molecule.set_position_matrix(positions)?;
    Ok(())
}
