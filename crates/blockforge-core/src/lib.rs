//! # blockforge
//!
//! Building blocks for molecular assembly: small molecules annotated with the
//! reactive functional groups through which they bond to other blocks.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer layout:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Molecule`,
//!   `FunctionalGroup`, `BuildingBlock`), motif perception, structure I/O
//!   (SMILES, molfile, dumps) and coordinate generation.
//!
//! - **[`engine`]: Shared Machinery.** Bonder geometry queries over a block,
//!   the identity cache, build configuration, progress reporting and the
//!   aggregated error type.
//!
//! - **[`workflows`]: The Public API.** Cache-aware construction through a
//!   `BuildContext` and batch construction with progress events.

pub mod core;
pub mod engine;
pub mod workflows;
