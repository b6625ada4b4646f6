//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module is the **single doorway** to the on-disk repository. It
//! exposes read-only queries with structured results and normalizes `git2`
//! errors into typed failure categories.
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: Not inside a Git repository
//! - [`GitError::RefNotFound`]: Requested ref does not exist (or HEAD is unborn)
//! - [`GitError::ObjectNotFound`]: Object missing from the database
//! - [`GitError::BareRepo`]: Working tree queried on a bare repository
//!
//! # Example
//!
//! ```ignore
//! use gitver::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let oid = git.head_oid()?;
//! println!("HEAD is at {}", oid.short(7));
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::types::{BranchName, CommitTime, Oid, TypeError};

/// Errors from Git operations.
///
/// Every variant means the repository could not be read as asked; none of
/// them is retried.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository has no working tree")]
    BareRepo,

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The OID that was not found
        oid: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Permission or filesystem error.
    #[error("repository access error: {message}")]
    AccessError {
        /// Description of the error
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound | git2::ErrorCode::UnbornBranch => {
                if context.starts_with("refs/") || context == "HEAD" {
                    GitError::RefNotFound {
                        refname: context.to_string(),
                    }
                } else {
                    GitError::ObjectNotFound {
                        oid: context.to_string(),
                    }
                }
            }
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: context.to_string(),
            },
            git2::ErrorCode::Locked => GitError::AccessError {
                message: format!("repository is locked: {}", err.message()),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }

    /// Revision lookups report a missing target as a missing ref.
    fn from_ref_lookup(err: git2::Error, refname: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound
            | git2::ErrorCode::UnbornBranch
            | git2::ErrorCode::InvalidSpec
            | git2::ErrorCode::Peel => GitError::RefNotFound {
                refname: refname.to_string(),
            },
            _ => Self::from_git2(err, refname),
        }
    }

    fn internal(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            TypeError::InvalidBranchName(msg) => GitError::Internal { message: msg },
        }
    }
}

/// Information about a Git repository.
#[derive(Debug, Clone)]
pub struct RepoInfo {
    /// Path to .git directory
    pub git_dir: PathBuf,
    /// Path to working directory (None for bare repositories)
    pub work_dir: Option<PathBuf>,
}

/// How a tag refers to its commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    /// Tag object with its own message and tagger, peeled to a commit.
    Annotated,
    /// Plain ref pointing straight at a commit.
    Lightweight,
}

impl TagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagKind::Annotated => "annotated",
            TagKind::Lightweight => "lightweight",
        }
    }
}

/// A tag resolved to the commit it marks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagRef {
    /// Short tag name (without `refs/tags/`)
    pub name: String,
    /// The commit the tag resolves to
    pub target: Oid,
    pub kind: TagKind,
}

/// Summary of working tree status.
///
/// Counts different types of changes in the working tree. Ignored files are
/// never counted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorktreeStatus {
    /// Number of staged changes
    pub staged: usize,
    /// Number of unstaged changes to tracked files
    pub unstaged: usize,
    /// Number of untracked files
    pub untracked: usize,
    /// Whether there are unresolved conflicts
    pub has_conflicts: bool,
}

impl WorktreeStatus {
    /// Whether the working tree differs from HEAD in any way, untracked
    /// files included.
    pub fn is_dirty(&self) -> bool {
        self.staged > 0 || self.unstaged > 0 || self.untracked > 0 || self.has_conflicts
    }
}

/// Name, email and time of a commit's author or committer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub email: String,
    pub time: CommitTime,
}

/// Information about a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// The commit OID
    pub oid: Oid,
    /// The root tree OID
    pub tree: Oid,
    /// Parent OIDs in commit-parent order
    pub parents: Vec<Oid>,
    pub author: Signature,
    pub committer: Signature,
}

/// The Git interface.
///
/// Owns the `git2` repository handle for its whole lifetime; dropping the
/// value releases it.
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Repository Opening and Info
    // =========================================================================

    /// Open a repository at the given path.
    ///
    /// Uses `git2::Repository::discover` to find the repository root,
    /// so `path` can be any directory within the repository. Bare
    /// repositories open fine; only working tree queries fail on them.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        Ok(Self { repo })
    }

    /// Get repository information (git_dir and work_dir paths).
    pub fn info(&self) -> RepoInfo {
        RepoInfo {
            git_dir: self.repo.path().to_path_buf(),
            work_dir: self.repo.workdir().map(Path::to_path_buf),
        }
    }

    // =========================================================================
    // Working Tree Status
    // =========================================================================

    /// Get working tree status summary.
    ///
    /// # Errors
    ///
    /// - [`GitError::BareRepo`] if the repository has no working tree
    pub fn worktree_status(&self) -> Result<WorktreeStatus, GitError> {
        if self.repo.is_bare() {
            return Err(GitError::BareRepo);
        }

        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(false)
            .include_ignored(false);

        let statuses = self
            .repo
            .statuses(Some(&mut opts))
            .map_err(GitError::internal)?;

        let mut result = WorktreeStatus::default();

        for entry in statuses.iter() {
            let status = entry.status();

            if status.is_conflicted() {
                result.has_conflicts = true;
            }

            if status.is_index_new()
                || status.is_index_modified()
                || status.is_index_deleted()
                || status.is_index_renamed()
                || status.is_index_typechange()
            {
                result.staged += 1;
            }

            if status.is_wt_modified()
                || status.is_wt_deleted()
                || status.is_wt_renamed()
                || status.is_wt_typechange()
            {
                result.unstaged += 1;
            }

            if status.is_wt_new() {
                result.untracked += 1;
            }
        }

        Ok(result)
    }

    // =========================================================================
    // Ref Resolution
    // =========================================================================

    /// Resolve a revision to a commit OID.
    ///
    /// Accepts anything `git rev-parse` does: `HEAD`, branch and tag names,
    /// full ref names, hex ids. Annotated tags are peeled to their commit.
    ///
    /// # Errors
    ///
    /// - [`GitError::RefNotFound`] if the revision doesn't resolve
    pub fn resolve_ref(&self, refname: &str) -> Result<Oid, GitError> {
        let object = self
            .repo
            .revparse_single(refname)
            .map_err(|e| GitError::from_ref_lookup(e, refname))?;

        let commit = object
            .peel_to_commit()
            .map_err(|e| GitError::from_ref_lookup(e, refname))?;

        Ok(Oid::new(commit.id().to_string())?)
    }

    /// Get HEAD commit OID.
    ///
    /// # Errors
    ///
    /// - [`GitError::RefNotFound`] if HEAD is unborn (new repository)
    pub fn head_oid(&self) -> Result<Oid, GitError> {
        let head = self
            .repo
            .head()
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;

        let oid = head
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, "HEAD"))?
            .id();

        Ok(Oid::new(oid.to_string())?)
    }

    /// Get the current branch name, if on a branch.
    ///
    /// Returns `None` if HEAD is detached or unborn.
    pub fn current_branch(&self) -> Result<Option<BranchName>, GitError> {
        let head = match self.repo.head() {
            Ok(h) => h,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(GitError::from_git2(e, "HEAD")),
        };

        if head.is_branch() {
            if let Some(name) = head.shorthand() {
                return Ok(BranchName::new(name).ok());
            }
        }

        Ok(None) // Detached HEAD
    }

    /// Check whether a local branch with this name exists.
    pub fn branch_exists(&self, name: &str) -> bool {
        self.repo
            .find_branch(name, git2::BranchType::Local)
            .is_ok()
    }

    // =========================================================================
    // Tags
    // =========================================================================

    /// List every tag that resolves to a commit.
    ///
    /// Tags pointing at trees or blobs, and tags with non-UTF-8 names, are
    /// skipped. Results are sorted by name.
    pub fn list_tags(&self) -> Result<Vec<TagRef>, GitError> {
        let refs = self
            .repo
            .references_glob("refs/tags/*")
            .map_err(GitError::internal)?;

        let mut tags = Vec::new();
        for reference in refs {
            let reference = reference.map_err(GitError::internal)?;

            let name = match reference.name().and_then(|n| n.strip_prefix("refs/tags/")) {
                Some(n) => n.to_string(),
                None => continue,
            };

            let kind = match reference.peel(git2::ObjectType::Tag) {
                Ok(_) => TagKind::Annotated,
                Err(_) => TagKind::Lightweight,
            };

            let target = match reference.peel_to_commit() {
                Ok(commit) => commit.id(),
                Err(_) => continue,
            };

            let target = match Oid::new(target.to_string()) {
                Ok(o) => o,
                Err(_) => continue,
            };

            tags.push(TagRef { name, target, kind });
        }

        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    // =========================================================================
    // Ancestry Queries
    // =========================================================================

    /// Tags whose target is `start` or one of its ancestors.
    ///
    /// One revision walk from `start`, stopping as soon as every tag target
    /// has been seen.
    pub fn tags_reachable_from(&self, start: &Oid) -> Result<Vec<TagRef>, GitError> {
        let tags = self.list_tags()?;
        let mut pending: HashSet<&Oid> = tags.iter().map(|t| &t.target).collect();
        let mut reachable = HashSet::new();

        let mut walk = self.repo.revwalk().map_err(GitError::internal)?;
        walk.push(Self::to_git2(start)?)
            .map_err(|e| GitError::from_git2(e, start.as_str()))?;

        for id in walk {
            if pending.is_empty() {
                break;
            }
            let id = Oid::new(id.map_err(GitError::internal)?.to_string())?;
            if pending.remove(&id) {
                reachable.insert(id);
            }
        }

        Ok(tags
            .into_iter()
            .filter(|t| reachable.contains(&t.target))
            .collect())
    }

    // =========================================================================
    // Commit Information
    // =========================================================================

    /// Get information about a commit.
    ///
    /// # Errors
    ///
    /// - [`GitError::ObjectNotFound`] if the commit doesn't exist
    pub fn commit_info(&self, oid: &Oid) -> Result<CommitInfo, GitError> {
        let commit = self.find_commit(oid)?;

        let mut parents = Vec::with_capacity(commit.parent_count());
        for id in commit.parent_ids() {
            parents.push(Oid::new(id.to_string())?);
        }

        let author = Self::signature(&commit.author());
        let committer = Self::signature(&commit.committer());

        Ok(CommitInfo {
            oid: oid.clone(),
            tree: Oid::new(commit.tree_id().to_string())?,
            parents,
            author,
            committer,
        })
    }

    /// Get the parent OIDs of a commit.
    ///
    /// Returns empty vec for root commits, multiple OIDs for merge commits,
    /// always in commit-parent order (first parent first).
    pub fn commit_parents(&self, oid: &Oid) -> Result<Vec<Oid>, GitError> {
        let commit = self.find_commit(oid)?;

        let mut parents = Vec::with_capacity(commit.parent_count());
        for id in commit.parent_ids() {
            parents.push(Oid::new(id.to_string())?);
        }

        Ok(parents)
    }

    fn find_commit(&self, oid: &Oid) -> Result<git2::Commit<'_>, GitError> {
        let git_oid = Self::to_git2(oid)?;
        self.repo
            .find_commit(git_oid)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))
    }

    fn to_git2(oid: &Oid) -> Result<git2::Oid, GitError> {
        git2::Oid::from_str(oid.as_str()).map_err(|e| GitError::from_git2(e, oid.as_str()))
    }

    fn signature(sig: &git2::Signature<'_>) -> Signature {
        let when = sig.when();
        Signature {
            name: sig.name().unwrap_or("").to_string(),
            email: sig.email().unwrap_or("").to_string(),
            time: CommitTime::new(when.seconds(), when.offset_minutes() * 60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod git_error {
        use super::*;

        #[test]
        fn error_display_formatting() {
            let err = GitError::RefNotFound {
                refname: "HEAD".to_string(),
            };
            assert_eq!(err.to_string(), "ref not found: HEAD");
            assert!(GitError::BareRepo.to_string().contains("bare"));
        }

        #[test]
        fn type_errors_convert() {
            let err: GitError = TypeError::InvalidOid("xyz".to_string()).into();
            assert!(matches!(err, GitError::InvalidOid { .. }));
        }
    }

    mod worktree_status {
        use super::*;

        #[test]
        fn default_is_clean() {
            assert!(!WorktreeStatus::default().is_dirty());
        }

        #[test]
        fn any_change_is_dirty() {
            let cases = [
                WorktreeStatus {
                    staged: 1,
                    ..Default::default()
                },
                WorktreeStatus {
                    unstaged: 2,
                    ..Default::default()
                },
                WorktreeStatus {
                    untracked: 5,
                    ..Default::default()
                },
                WorktreeStatus {
                    has_conflicts: true,
                    ..Default::default()
                },
            ];
            for status in cases {
                assert!(status.is_dirty(), "{status:?}");
            }
        }
    }

    #[test]
    fn tag_kind_names() {
        assert_eq!(TagKind::Annotated.as_str(), "annotated");
        assert_eq!(TagKind::Lightweight.as_str(), "lightweight");
    }
}
