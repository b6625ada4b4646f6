//! engine
//!
//! Resolves a version from repository history: Locate -> Walk -> Render.
//!
//! # Architecture
//!
//! 1. **Locate**: resolve the reference to a start commit, branch and dirty flag
//! 2. **Walk**: breadth-first search for the nearest matching release tag
//! 3. **Render**: apply the strategy and collect the metadata bundle
//!
//! The [`VersionCalculator`] facade runs this pipeline at most once per
//! instance and serves every query from the resulting snapshot.
//!
//! # Invariants
//!
//! - The repository is never mutated
//! - Exactly one base tag is selected, even when several tie on distance
//! - A snapshot, once computed, never changes for the life of the calculator
//! - Missing tags, dirty trees and detached HEADs are states, not errors
//!
//! # Example
//!
//! ```
//! use gitver::core::config::VersionConfig;
//! use gitver::engine::{MetadataKey, VersionCalculator};
//! use gitver::git::MemoryRepo;
//!
//! let mut repo = MemoryRepo::new();
//! let root = repo.commit(&[]);
//! repo.tag("v1.0.0", &root);
//! repo.checkout(&root, Some("main"));
//!
//! let calculator = VersionCalculator::from_reader(repo, &VersionConfig::default()).unwrap();
//! assert_eq!(calculator.version().unwrap(), "1.0.0");
//! assert_eq!(calculator.meta(MetadataKey::Dirty).unwrap().as_deref(), Some("false"));
//! ```

pub mod calculator;
pub mod matcher;
pub mod metadata;
pub mod resolve;
pub mod strategy;
pub mod walker;

pub use calculator::{CalculatorBuilder, CalculatorState, VersionCalculator, VersionError};
pub use matcher::TagMatcher;
pub use metadata::{Metadata, MetadataKey, UnknownKey};
pub use resolve::{Resolver, VersionSnapshot, DETACHED_BRANCH_NAME};
pub use strategy::{sanitize, Strategy};
pub use walker::{TagCandidate, TraversalResult, WalkOptions};
