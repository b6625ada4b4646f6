//! git::reader
//!
//! The read-only seam between the version engine and a repository.
//!
//! # Design
//!
//! The engine never talks to `git2` directly. It asks a [`RepositoryReader`]
//! for commits, parents, tags and the dirty flag, so the same traversal and
//! rendering code runs against an on-disk repository ([`Git`]) or an
//! in-memory arena ([`super::MemoryRepo`]).
//!
//! All methods are queries; implementations must not mutate the repository.

use super::interface::{CommitInfo, Git, GitError, TagRef};
use crate::core::types::{BranchName, Oid};

/// Read-only access to a commit graph, its tags and the working tree state.
pub trait RepositoryReader {
    /// Commit currently checked out.
    fn head(&self) -> Result<Oid, GitError>;

    /// Resolve a revision (`HEAD`, branch, tag, ref name, hex id) to a commit.
    fn resolve_ref(&self, name: &str) -> Result<Oid, GitError>;

    /// Branch currently checked out, `None` when HEAD is detached.
    fn current_branch(&self) -> Result<Option<BranchName>, GitError>;

    /// Whether a local branch with this name exists.
    fn branch_exists(&self, name: &str) -> Result<bool, GitError>;

    /// Parents of a commit in commit-parent order.
    fn commit_parents(&self, oid: &Oid) -> Result<Vec<Oid>, GitError>;

    /// Author and committer identity and timestamps of a commit.
    fn commit_info(&self, oid: &Oid) -> Result<CommitInfo, GitError>;

    /// Tags whose target commit is `oid` or one of its ancestors.
    ///
    /// Annotated tags are already peeled to their commit.
    fn tags_reachable_from(&self, oid: &Oid) -> Result<Vec<TagRef>, GitError>;

    /// Whether the working tree differs from HEAD (staged, modified or
    /// untracked changes).
    fn is_worktree_dirty(&self) -> Result<bool, GitError>;
}

impl RepositoryReader for Git {
    fn head(&self) -> Result<Oid, GitError> {
        self.head_oid()
    }

    fn resolve_ref(&self, name: &str) -> Result<Oid, GitError> {
        Git::resolve_ref(self, name)
    }

    fn current_branch(&self) -> Result<Option<BranchName>, GitError> {
        Git::current_branch(self)
    }

    fn branch_exists(&self, name: &str) -> Result<bool, GitError> {
        Ok(Git::branch_exists(self, name))
    }

    fn commit_parents(&self, oid: &Oid) -> Result<Vec<Oid>, GitError> {
        Git::commit_parents(self, oid)
    }

    fn commit_info(&self, oid: &Oid) -> Result<CommitInfo, GitError> {
        Git::commit_info(self, oid)
    }

    fn tags_reachable_from(&self, oid: &Oid) -> Result<Vec<TagRef>, GitError> {
        Git::tags_reachable_from(self, oid)
    }

    fn is_worktree_dirty(&self) -> Result<bool, GitError> {
        Ok(self.worktree_status()?.is_dirty())
    }
}

macro_rules! forward_reader {
    ($($ty:ty),+) => {$(
        impl<R: RepositoryReader + ?Sized> RepositoryReader for $ty {
            fn head(&self) -> Result<Oid, GitError> {
                (**self).head()
            }

            fn resolve_ref(&self, name: &str) -> Result<Oid, GitError> {
                (**self).resolve_ref(name)
            }

            fn current_branch(&self) -> Result<Option<BranchName>, GitError> {
                (**self).current_branch()
            }

            fn branch_exists(&self, name: &str) -> Result<bool, GitError> {
                (**self).branch_exists(name)
            }

            fn commit_parents(&self, oid: &Oid) -> Result<Vec<Oid>, GitError> {
                (**self).commit_parents(oid)
            }

            fn commit_info(&self, oid: &Oid) -> Result<CommitInfo, GitError> {
                (**self).commit_info(oid)
            }

            fn tags_reachable_from(&self, oid: &Oid) -> Result<Vec<TagRef>, GitError> {
                (**self).tags_reachable_from(oid)
            }

            fn is_worktree_dirty(&self) -> Result<bool, GitError> {
                (**self).is_worktree_dirty()
            }
        }
    )+};
}

forward_reader!(&R, Box<R>, std::sync::Arc<R>);
