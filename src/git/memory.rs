//! git::memory
//!
//! In-memory repository for deterministic testing and embedding.
//!
//! # Design
//!
//! Commits live in an arena keyed by [`Oid`]; parent links are ids, never
//! references, so merge histories with shared ancestors need no shared
//! ownership. Object ids are minted from a SHA-256 of the commit's sequence
//! number and parents, which keeps them stable across runs.
//!
//! A failure can be injected for any reader operation, and parent lookups are
//! counted so callers can observe how many traversals happened.
//!
//! # Example
//!
//! ```
//! use gitver::git::{MemoryRepo, RepositoryReader};
//!
//! let mut repo = MemoryRepo::new();
//! let root = repo.commit(&[]);
//! let child = repo.commit(&[&root]);
//! repo.tag("v1.0.0", &root);
//! repo.checkout(&child, Some("main"));
//!
//! assert_eq!(repo.head().unwrap(), child);
//! assert_eq!(repo.commit_parents(&child).unwrap(), vec![root]);
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

use sha2::{Digest, Sha256};

use super::interface::{CommitInfo, GitError, Signature, TagKind, TagRef};
use super::reader::RepositoryReader;
use crate::core::types::{BranchName, CommitTime, Oid};

/// First synthetic commit time (2017-07-14T02:40:00Z); each commit is a
/// minute later than the previous one.
const BASE_EPOCH: i64 = 1_500_000_000;

/// Reader operation that should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    Head,
    CommitParents,
    CommitInfo,
    Tags,
    Dirty,
}

#[derive(Debug, Clone)]
struct MemoryCommit {
    parents: Vec<Oid>,
    tree: Oid,
    author: Signature,
    committer: Signature,
}

/// Arena-backed repository implementing [`RepositoryReader`].
#[derive(Debug, Default)]
pub struct MemoryRepo {
    commits: HashMap<Oid, MemoryCommit>,
    tags: Vec<TagRef>,
    branches: HashMap<String, Oid>,
    head: Option<Oid>,
    branch: Option<BranchName>,
    dirty: bool,
    bare: bool,
    fail_on: Option<FailOn>,
    parent_lookups: AtomicUsize,
}

impl MemoryRepo {
    /// Create an empty repository (unborn HEAD).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a commit with the given parents and a synthetic timestamp.
    pub fn commit(&mut self, parents: &[&Oid]) -> Oid {
        let seconds = BASE_EPOCH + 60 * self.commits.len() as i64;
        self.commit_at(parents, CommitTime::new(seconds, 0))
    }

    /// Add a commit whose author and committer share `time`.
    pub fn commit_at(&mut self, parents: &[&Oid], time: CommitTime) -> Oid {
        self.commit_with(parents, time, time)
    }

    /// Add a commit with distinct author and committer times.
    pub fn commit_with(
        &mut self,
        parents: &[&Oid],
        authored: CommitTime,
        committed: CommitTime,
    ) -> Oid {
        let sequence = self.commits.len();
        let oid = Self::mint(&format!(
            "commit {} {}",
            sequence,
            parents
                .iter()
                .map(|p| p.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        ));
        let tree = Self::mint(&format!("tree {}", sequence));

        self.commits.insert(
            oid.clone(),
            MemoryCommit {
                parents: parents.iter().map(|p| (*p).clone()).collect(),
                tree,
                author: Self::signature("Test Author", "author@example.com", authored),
                committer: Self::signature("Test Committer", "committer@example.com", committed),
            },
        );
        oid
    }

    /// Add a linear chain of `count` commits on top of `parent`.
    ///
    /// Returns the ids in creation order; the last one is the tip.
    pub fn chain(&mut self, parent: Option<&Oid>, count: usize) -> Vec<Oid> {
        let mut ids: Vec<Oid> = Vec::with_capacity(count);
        for _ in 0..count {
            let previous = ids.last().cloned().or_else(|| parent.cloned());
            let oid = match &previous {
                Some(p) => self.commit(&[p]),
                None => self.commit(&[]),
            };
            ids.push(oid);
        }
        ids
    }

    /// Add a lightweight tag.
    pub fn tag(&mut self, name: &str, target: &Oid) {
        self.add_tag(name, target, TagKind::Lightweight);
    }

    /// Add an annotated tag.
    pub fn annotated_tag(&mut self, name: &str, target: &Oid) {
        self.add_tag(name, target, TagKind::Annotated);
    }

    fn add_tag(&mut self, name: &str, target: &Oid, kind: TagKind) {
        self.tags.retain(|t| t.name != name);
        self.tags.push(TagRef {
            name: name.to_string(),
            target: target.clone(),
            kind,
        });
    }

    /// Point a local branch at a commit.
    pub fn branch(&mut self, name: &str, target: &Oid) {
        self.branches.insert(name.to_string(), target.clone());
    }

    /// Move HEAD to `oid`, on `branch` or detached when `None`.
    pub fn checkout(&mut self, oid: &Oid, branch: Option<&str>) {
        self.head = Some(oid.clone());
        self.branch = branch.and_then(|b| BranchName::new(b).ok());
        if let Some(name) = branch {
            self.branches.insert(name.to_string(), oid.clone());
        }
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    /// Behave like a bare repository: dirty-state queries fail.
    pub fn set_bare(&mut self, bare: bool) {
        self.bare = bare;
    }

    /// Make one reader operation fail with an access error.
    pub fn fail_on(&mut self, op: Option<FailOn>) {
        self.fail_on = op;
    }

    /// Number of `commit_parents` calls served so far.
    pub fn parent_lookups(&self) -> usize {
        self.parent_lookups.load(Ordering::SeqCst)
    }

    fn check(&self, op: FailOn) -> Result<(), GitError> {
        if self.fail_on == Some(op) {
            return Err(GitError::AccessError {
                message: format!("injected failure: {:?}", op),
            });
        }
        Ok(())
    }

    fn find(&self, oid: &Oid) -> Result<&MemoryCommit, GitError> {
        self.commits.get(oid).ok_or_else(|| GitError::ObjectNotFound {
            oid: oid.to_string(),
        })
    }

    fn mint(seed: &str) -> Oid {
        Oid::from_digest(&Sha256::digest(seed.as_bytes()))
    }

    fn signature(name: &str, email: &str, time: CommitTime) -> Signature {
        Signature {
            name: name.to_string(),
            email: email.to_string(),
            time,
        }
    }

    fn ancestors(&self, start: &Oid) -> Result<HashSet<Oid>, GitError> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([start.clone()]);
        while let Some(current) = queue.pop_front() {
            if seen.insert(current.clone()) {
                queue.extend(self.find(&current)?.parents.iter().cloned());
            }
        }
        Ok(seen)
    }
}

impl RepositoryReader for MemoryRepo {
    fn head(&self) -> Result<Oid, GitError> {
        self.check(FailOn::Head)?;
        self.head.clone().ok_or_else(|| GitError::RefNotFound {
            refname: "HEAD".to_string(),
        })
    }

    fn resolve_ref(&self, name: &str) -> Result<Oid, GitError> {
        if name == "HEAD" {
            return self.head();
        }
        let short = name
            .strip_prefix("refs/heads/")
            .or_else(|| name.strip_prefix("refs/tags/"))
            .unwrap_or(name);
        if let Some(oid) = self.branches.get(short) {
            return Ok(oid.clone());
        }
        if let Some(tag) = self.tags.iter().find(|t| t.name == short) {
            return Ok(tag.target.clone());
        }
        match Oid::new(name) {
            Ok(oid) if self.commits.contains_key(&oid) => Ok(oid),
            _ => Err(GitError::RefNotFound {
                refname: name.to_string(),
            }),
        }
    }

    fn current_branch(&self) -> Result<Option<BranchName>, GitError> {
        Ok(self.branch.clone())
    }

    fn branch_exists(&self, name: &str) -> Result<bool, GitError> {
        Ok(self.branches.contains_key(name))
    }

    fn commit_parents(&self, oid: &Oid) -> Result<Vec<Oid>, GitError> {
        self.check(FailOn::CommitParents)?;
        self.parent_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.find(oid)?.parents.clone())
    }

    fn commit_info(&self, oid: &Oid) -> Result<CommitInfo, GitError> {
        self.check(FailOn::CommitInfo)?;
        let commit = self.find(oid)?;
        Ok(CommitInfo {
            oid: oid.clone(),
            tree: commit.tree.clone(),
            parents: commit.parents.clone(),
            author: commit.author.clone(),
            committer: commit.committer.clone(),
        })
    }

    fn tags_reachable_from(&self, oid: &Oid) -> Result<Vec<TagRef>, GitError> {
        self.check(FailOn::Tags)?;
        let reachable = self.ancestors(oid)?;
        let mut tags: Vec<TagRef> = self
            .tags
            .iter()
            .filter(|t| reachable.contains(&t.target))
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    fn is_worktree_dirty(&self) -> Result<bool, GitError> {
        self.check(FailOn::Dirty)?;
        if self.bare {
            return Err(GitError::BareRepo);
        }
        Ok(self.dirty)
    }
}
