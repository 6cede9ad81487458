//! # Workflows Module
//!
//! The entry points most users need.
//!
//! ## Architecture
//!
//! - **Construction** ([`build`]) - [`build::BuildContext`] builds blocks from SMILES,
//!   molfiles, molecules or dumps, optionally through its identity cache
//! - **Batch Construction** ([`batch`]) - Many requests at once, with progress events and
//!   per-request failures collected instead of aborting
//! - **Reporting** ([`report`]) - Serializable summaries of a block's groups and geometry

pub mod batch;
pub mod build;
pub mod report;
