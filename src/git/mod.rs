//! git
//!
//! Read-only access to repositories.
//!
//! # Architecture
//!
//! This module is the **only doorway** to Git. The version engine sees a
//! repository exclusively through the [`RepositoryReader`] trait; no other
//! module imports `git2`.
//!
//! # Implementations
//!
//! - [`Git`] - on-disk repository via `git2` (no shelling out to the git CLI)
//! - [`MemoryRepo`] - in-memory commit arena for tests and embedding
//!
//! # Invariants
//!
//! - No operation mutates the repository
//! - Annotated tags are peeled to commits before they leave this module
//! - All operations return strong types (Oid, BranchName)
//!
//! # Example
//!
//! ```ignore
//! use gitver::git::{Git, RepositoryReader};
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let head = git.head()?;
//! for tag in git.tags_reachable_from(&head)? {
//!     println!("{} -> {}", tag.name, tag.target.short(7));
//! }
//! ```

mod interface;
pub mod memory;
mod reader;

pub use interface::{
    CommitInfo, Git, GitError, RepoInfo, Signature, TagKind, TagRef, WorktreeStatus,
};
pub use memory::{FailOn, MemoryRepo};
pub use reader::RepositoryReader;
