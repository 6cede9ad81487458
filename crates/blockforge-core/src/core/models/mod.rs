//! # Core Models Module
//!
//! Plain data types describing molecules and the building blocks made from them.
//!
//! ## Key Components
//!
//! - [`element`] - Static element table (symbol, mass, covalent radius, valences)
//! - [`atom`] - Element plus formal charge
//! - [`topology`] - Bond orders and bonds
//! - [`molecule`] - Atoms, bonds, adjacency and the position matrix
//! - [`functional_group`] - Immutable functional group records
//! - [`building_block`] - A molecule annotated with its functional groups
//! - [`attributes`] - Typed values attached to a building block
//! - [`periodic`] - Unit cell vectors and derived lattice parameters
//!
//! ## Usage
//!
//! ```ignore
//! use blockforge::core::io::smiles;
//! use blockforge::core::models::building_block::BuildingBlock;
//! use blockforge::core::topology::registry::MotifRegistry;
//!
//! let molecule = smiles::parse("NCCCN")?;
//! let block = BuildingBlock::new(molecule, &["amine"], &MotifRegistry::builtin())?;
//! assert_eq!(block.num_functional_groups(), 2);
//! ```

pub mod atom;
pub mod attributes;
pub mod building_block;
pub mod element;
pub mod functional_group;
pub mod molecule;
pub mod periodic;
pub mod topology;
