use thiserror::Error;

use super::config::ConfigError;
use crate::core::conformer::ConformerError;
use crate::core::io::dump::DumpError;
use crate::core::io::molfile::MolFileError;
use crate::core::io::smiles::SmilesError;
use crate::core::models::molecule::MoleculeError;
use crate::core::topology::matcher::MatchError;
use crate::core::topology::registry::RegistryLoadError;
use crate::core::utils::geometry::GeometryError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid structure: {0}")]
    InvalidStructure(#[from] SmilesError),

    #[error("Functional group perception failed: {0}")]
    Match(#[from] MatchError),

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Failed to load motif registry: {0}")]
    Registry(#[from] RegistryLoadError),

    #[error("Molfile error: {0}")]
    MolFile(#[from] MolFileError),

    #[error("Dump error: {0}")]
    Dump(#[from] DumpError),

    #[error("Invalid molecule: {0}")]
    Molecule(#[from] MoleculeError),

    #[error("Coordinate generation failed: {0}")]
    Conformer(#[from] ConformerError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}
