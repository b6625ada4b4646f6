//! gitver - deterministic versions from Git history
//!
//! gitver computes a reproducible version string for a working tree from its
//! commit graph: the nearest release tag, the distance to it, the branch and
//! the dirty state. No version file is maintained by hand.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Walks history, renders the version and metadata
//! - [`core`] - Domain types, versions, and configuration
//! - [`git`] - Single read-only interface to repositories
//!
//! # Correctness Invariants
//!
//! 1. The repository is never mutated
//! 2. The same graph and configuration always yield the same version
//! 3. Timestamps never depend on the local timezone
//! 4. One calculator computes its result at most once

pub mod cli;
pub mod core;
pub mod engine;
pub mod git;

pub use engine::{CalculatorBuilder, MetadataKey, VersionCalculator, VersionError};
