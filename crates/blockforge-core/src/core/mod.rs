//! # Core Module
//!
//! Data structures and algorithms that every other layer builds on.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Elements, atoms, bonds, molecules,
//!   functional groups, building blocks and their attributes
//! - **Motif Perception** ([`topology`]) - The motif registry and the functional group matcher
//! - **File I/O** ([`io`]) - SMILES parsing, MDL molfiles and the block dump format
//! - **Coordinate Generation** ([`conformer`]) - Deterministic 3D embedding from connectivity
//! - **Utilities** ([`utils`]) - Centroids, plane fitting and vector helpers

pub mod conformer;
pub mod io;
pub mod models;
pub mod topology;
pub mod utils;
