//! # Engine Module
//!
//! Shared machinery used by the workflows on top of the core data models.
//!
//! ## Architecture
//!
//! - **Bonder Geometry** ([`geometry`]) - Centroids, bonding planes, distances and
//!   direction vectors of a building block's functional groups
//! - **Identity Cache** ([`cache`]) - Canonical key to shared building block instance
//! - **Configuration** ([`config`]) - Motif source and coordinate embedding parameters
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - The error type aggregating every subsystem
//!
//! ## Key Capabilities
//!
//! - **Lazy, restartable bonder centroid iteration** without intermediate allocation
//! - **Least-squares bonding planes** with a deterministic normal orientation
//! - **Identity-preserving construction** so equal requests share one instance

pub mod cache;
pub mod config;
pub mod error;
pub mod geometry;
pub mod progress;
