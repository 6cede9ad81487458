//! TOML dump format for building blocks.
//!
//! A dump stores the atoms, bonds, positions, declared functional group names
//! and derived functional groups of a block, plus an explicit allow-list of
//! extra attributes. Loading rebuilds the block without re-running group
//! perception, so the loaded groups compare equal to the dumped ones.

use crate::core::models::atom::Atom;
use crate::core::models::attributes::Attributes;
use crate::core::models::building_block::{BuildingBlock, BuildingBlockError};
use crate::core::models::functional_group::{FunctionalGroup, FunctionalGroupError};
use crate::core::models::molecule::{Molecule, MoleculeError};
use crate::core::models::topology::Bond;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum DumpError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to serialize dump: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Failed to parse dump: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Attribute '{0}' was requested for the dump but is not set")]
    MissingAttribute(String),
    #[error("Unsupported dump format version {0} (expected {FORMAT_VERSION})")]
    UnsupportedVersion(u32),
    #[error("Dump holds an invalid molecule: {0}")]
    Molecule(#[from] MoleculeError),
    #[error("Dump holds an invalid functional group: {0}")]
    FunctionalGroup(#[from] FunctionalGroupError),
    #[error("Dump holds an inconsistent building block: {0}")]
    BuildingBlock(#[from] BuildingBlockError),
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionalGroupRecord {
    id: usize,
    name: String,
    atom_ids: Vec<usize>,
    bonder_ids: Vec<usize>,
    deleter_ids: Vec<usize>,
}

impl From<&FunctionalGroup> for FunctionalGroupRecord {
    fn from(group: &FunctionalGroup) -> Self {
        Self {
            id: group.id(),
            name: group.name().to_string(),
            atom_ids: group.atom_ids().to_vec(),
            bonder_ids: group.bonder_ids().to_vec(),
            deleter_ids: group.deleter_ids().to_vec(),
        }
    }
}

impl TryFrom<FunctionalGroupRecord> for FunctionalGroup {
    type Error = FunctionalGroupError;

    fn try_from(record: FunctionalGroupRecord) -> Result<Self, Self::Error> {
        FunctionalGroup::new(
            record.id,
            record.name,
            record.atom_ids,
            record.bonder_ids,
            record.deleter_ids,
        )
    }
}

/// On-disk layout. Plain values precede arrays of tables so the TOML stays flat.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct BuildingBlockDump {
    format_version: u32,
    functional_group_names: Vec<String>,
    positions: Vec<[f64; 3]>,
    atoms: Vec<Atom>,
    #[serde(default)]
    bonds: Vec<Bond>,
    #[serde(default)]
    functional_groups: Vec<FunctionalGroupRecord>,
    #[serde(default)]
    attributes: Attributes,
}

/// Serializes `block` with the attributes named in `include_attrs`.
///
/// # Arguments
///
/// * `block` - The building block to serialize.
/// * `include_attrs` - Names of the attributes to persist alongside the block.
///
/// # Return
///
/// Returns the dump as TOML text.
///
/// # Errors
///
/// Returns [`DumpError::MissingAttribute`] if a requested attribute is not set
/// on `block`, or [`DumpError::Serialize`] if TOML encoding fails.
pub fn to_string<S: AsRef<str>>(
    block: &BuildingBlock,
    include_attrs: &[S],
) -> Result<String, DumpError> {
    let mut attributes = Attributes::new();
    for name in include_attrs {
        let name = name.as_ref();
        let value = block
            .attribute(name)
            .ok_or_else(|| DumpError::MissingAttribute(name.to_string()))?;
        attributes.insert(name.to_string(), value.clone());
    }

    let molecule = block.molecule();
    let dump = BuildingBlockDump {
        format_version: FORMAT_VERSION,
        functional_group_names: block.functional_group_names().to_vec(),
        positions: molecule
            .position_matrix()
            .iter()
            .map(|p| [p.x, p.y, p.z])
            .collect(),
        atoms: molecule.atoms().to_vec(),
        bonds: molecule.bonds().to_vec(),
        functional_groups: block.functional_groups().iter().map(Into::into).collect(),
        attributes,
    };
    Ok(toml::to_string(&dump)?)
}

/// Rebuilds a block from dump text, validating its internal consistency.
///
/// Functional groups are taken from the stored records; no motif perception
/// is run.
///
/// # Arguments
///
/// * `content` - TOML text produced by [`to_string`].
///
/// # Return
///
/// Returns the reconstructed building block with its persisted attributes.
///
/// # Errors
///
/// Returns [`DumpError::Parse`] for malformed TOML,
/// [`DumpError::UnsupportedVersion`] for another format version, and the
/// molecule, functional group or building block variants when the stored
/// records contradict each other.
pub fn from_str(content: &str) -> Result<BuildingBlock, DumpError> {
    let dump: BuildingBlockDump = toml::from_str(content)?;
    if dump.format_version != FORMAT_VERSION {
        return Err(DumpError::UnsupportedVersion(dump.format_version));
    }

    let positions = dump
        .positions
        .into_iter()
        .map(|[x, y, z]| Point3::new(x, y, z))
        .collect();
    let molecule = Molecule::new(dump.atoms, dump.bonds, positions)?;
    let functional_groups = dump
        .functional_groups
        .into_iter()
        .map(FunctionalGroup::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(BuildingBlock::from_parts(
        molecule,
        dump.functional_group_names,
        functional_groups,
        dump.attributes,
    )?)
}

/// Writes the dump of `block` to a file.
///
/// # Arguments
///
/// * `block` - The building block to serialize.
/// * `include_attrs` - Names of the attributes to persist alongside the block.
/// * `path` - The path to the file to write.
///
/// # Errors
///
/// Returns the errors of [`to_string`], or [`DumpError::Io`] if the file
/// cannot be written.
pub fn write<S: AsRef<str>>(
    block: &BuildingBlock,
    include_attrs: &[S],
    path: &Path,
) -> Result<(), DumpError> {
    let content = to_string(block, include_attrs)?;
    std::fs::write(path, content).map_err(|e| DumpError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })
}

/// Reads a dump file back into a building block.
///
/// # Arguments
///
/// * `path` - The path to the file to read.
///
/// # Return
///
/// Returns a new, uncached building block.
///
/// # Errors
///
/// Returns [`DumpError::Io`] if the file cannot be read, otherwise the errors
/// of [`from_str`].
pub fn read(path: &Path) -> Result<BuildingBlock, DumpError> {
    let content = std::fs::read_to_string(path).map_err(|e| DumpError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    from_str(&content)
}

impl BuildingBlock {
    /// Writes this block to `path`; see [`write`].
    pub fn dump<S: AsRef<str>>(&self, path: &Path, include_attrs: &[S]) -> Result<(), DumpError> {
        write(self, include_attrs, path)
    }
}
