//! core
//!
//! Core domain types and configuration for gitver.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Oid, BranchName, CommitTime
//! - [`version`] - Base versions parsed from release tags
//! - [`config`] - Configuration schema and layered loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing
//! - Nothing here touches the repository

pub mod config;
pub mod types;
pub mod version;
