//! Functional group perception.
//!
//! [`registry`] holds the named motif definitions; [`matcher`] finds their
//! occurrences in a molecule and numbers them in a stable order.

pub mod matcher;
pub mod registry;
