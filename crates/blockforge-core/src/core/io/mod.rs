//! # I/O Module
//!
//! Readers and writers for the structure formats the library understands.
//!
//! - [`smiles`] - SMILES line notation to a molecule with explicit hydrogens
//! - [`molfile`] - MDL V2000 molfiles via the [`traits::MolecularFile`] trait
//! - [`dump`] - TOML dumps of complete building blocks

pub mod dump;
pub mod molfile;
pub mod smiles;
pub mod traits;
