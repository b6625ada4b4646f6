//! engine::resolve
//!
//! One resolution: reference → walk → render → metadata.
//!
//! [`Resolver`] holds everything compiled from the configuration (tag
//! matcher, strategy, walk options) and runs against any
//! [`RepositoryReader`]. It keeps no state between runs; caching belongs to
//! the calculator.

use tracing::{debug, info};

use super::matcher::TagMatcher;
use super::metadata::{Metadata, MetadataKey};
use super::strategy::{RenderInput, Strategy};
use super::walker::{self, TraversalResult, WalkOptions};
use crate::core::config::{ConfigError, VersionConfig};
use crate::core::types::{Oid, TimestampZone};
use crate::core::version::Version;
use crate::git::{CommitInfo, GitError, RepositoryReader, TagRef};

/// Marker reported as the branch name when HEAD is detached.
pub const DETACHED_BRANCH_NAME: &str = "HEAD";

/// Result of one resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSnapshot {
    pub version: String,
    pub metadata: Metadata,
    pub traversal: TraversalResult,
}

/// Compiled configuration, ready to resolve.
#[derive(Debug, Clone)]
pub struct Resolver {
    matcher: TagMatcher,
    strategy: Strategy,
    walk: WalkOptions,
    fallback: Version,
    reference: String,
    branch_override: Option<String>,
    commit_id_length: usize,
    timestamp_zone: TimestampZone,
}

struct Position {
    start: Oid,
    branch: Option<String>,
    detached: bool,
    dirty: bool,
}

impl Resolver {
    /// Validate and compile a configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for invalid values, a malformed
    /// tag pattern or a malformed version template.
    pub fn new(config: &VersionConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let fallback = config.default_base_version.parse::<Version>().map_err(|e| {
            ConfigError::InvalidValue(format!(
                "invalid default_base_version '{}': {}",
                config.default_base_version, e
            ))
        })?;

        Ok(Self {
            matcher: TagMatcher::new(&config.tag_pattern)?,
            strategy: Strategy::from_config(config)?,
            walk: WalkOptions {
                policy: config.lookup_policy,
                max_depth: config.max_depth,
            },
            fallback,
            reference: config.reference.clone(),
            branch_override: config.branch.clone(),
            commit_id_length: config.commit_id_length,
            timestamp_zone: config.timestamp_zone,
        })
    }

    /// Resolve the version of the configured reference.
    ///
    /// # Errors
    ///
    /// Propagates reader failures. An untagged history, a dirty tree or a
    /// detached HEAD are not errors.
    pub fn resolve<R: RepositoryReader + ?Sized>(
        &self,
        reader: &R,
    ) -> Result<VersionSnapshot, GitError> {
        let position = self.locate(reader)?;
        let tags = walker::index_tags(reader.tags_reachable_from(&position.start)?);
        let traversal = walker::walk(reader, &position.start, &tags, &self.matcher, self.walk)?;
        let head = reader.commit_info(&position.start)?;

        let base = traversal.nearest.as_ref().map(|c| &c.version);
        let input = RenderInput {
            base,
            fallback: &self.fallback,
            distance: traversal.distance(),
            dirty: position.dirty,
            branch: position.branch.as_deref(),
            commit: &position.start,
        };

        let head_tags = self.head_tags(tags.get(&position.start).map(Vec::as_slice));
        let mut metadata = self.metadata(&position, &head, &traversal, &input, head_tags);
        let version = self.strategy.render(&input, &metadata);
        metadata.insert(MetadataKey::CalculatedVersion, version.clone());

        info!(
            version = %version,
            base = traversal.nearest.as_ref().map(|c| c.tag.name.as_str()),
            distance = traversal.distance(),
            dirty = position.dirty,
            "version resolved"
        );

        Ok(VersionSnapshot {
            version,
            metadata,
            traversal,
        })
    }

    /// Start commit, branch and dirty flag for the configured reference.
    ///
    /// Only `HEAD` has a working tree; any other reference is clean.
    fn locate<R: RepositoryReader + ?Sized>(&self, reader: &R) -> Result<Position, GitError> {
        let (start, branch, dirty) = if self.reference == "HEAD" {
            let start = reader.head()?;
            let branch = reader.current_branch()?.map(|b| b.to_string());
            (start, branch, reader.is_worktree_dirty()?)
        } else {
            let start = reader.resolve_ref(&self.reference)?;
            let name = self
                .reference
                .strip_prefix("refs/heads/")
                .unwrap_or(&self.reference);
            let branch = if reader.branch_exists(name)? {
                Some(name.to_string())
            } else {
                None
            };
            (start, branch, false)
        };

        debug!(
            reference = %self.reference,
            start = %start.short(self.commit_id_length),
            branch = branch.as_deref().unwrap_or(DETACHED_BRANCH_NAME),
            dirty,
            "located start commit"
        );

        Ok(Position {
            start,
            detached: branch.is_none(),
            branch: self.branch_override.clone().or(branch),
            dirty,
        })
    }

    fn head_tags(&self, tags: Option<&[TagRef]>) -> Vec<String> {
        tags.unwrap_or_default()
            .iter()
            .filter(|t| self.matcher.matches(&t.name).is_some())
            .map(|t| t.name.clone())
            .collect()
    }

    fn metadata(
        &self,
        position: &Position,
        head: &CommitInfo,
        traversal: &TraversalResult,
        input: &RenderInput<'_>,
        head_tags: Vec<String>,
    ) -> Metadata {
        let zone = self.timestamp_zone;
        let flag = |b: bool| if b { "true" } else { "false" };
        let mut m = Metadata::default();

        m.insert(MetadataKey::CommitTimestamp, head.author.time.encode(zone));
        m.insert(
            MetadataKey::CommitterTimestamp,
            head.committer.time.encode(zone),
        );
        m.insert(MetadataKey::GitSha1Full, position.start.as_str());
        m.insert(
            MetadataKey::GitSha1Abbrev,
            position.start.short(self.commit_id_length),
        );
        m.insert(
            MetadataKey::BranchName,
            position.branch.as_deref().unwrap_or(DETACHED_BRANCH_NAME),
        );
        if let Some(qualifier) = self.strategy.branch_qualifier(position.branch.as_deref()) {
            m.insert(MetadataKey::QualifiedBranchName, qualifier);
        }
        m.insert(MetadataKey::DetachedHead, flag(position.detached));
        m.insert(MetadataKey::Dirty, flag(position.dirty));
        m.insert(MetadataKey::CommitDistance, traversal.distance().to_string());

        if let Some(base) = &traversal.nearest {
            m.insert(MetadataKey::BaseTag, base.tag.name.as_str());
            m.insert(MetadataKey::BaseTagType, base.tag.kind.as_str());
            m.insert(MetadataKey::BaseVersion, base.version.to_string());
            m.insert(MetadataKey::BaseCommitOnHead, flag(base.distance == 0));
        }

        let current = self.strategy.effective_version(input);
        m.insert(MetadataKey::CurrentVersionMajor, current.major().to_string());
        m.insert(MetadataKey::CurrentVersionMinor, current.minor().to_string());
        m.insert(MetadataKey::CurrentVersionPatch, current.patch().to_string());

        let base = input.base.unwrap_or(input.fallback);
        m.insert(MetadataKey::NextMajorVersion, base.next_major().to_string());
        m.insert(MetadataKey::NextMinorVersion, base.next_minor().to_string());
        m.insert(MetadataKey::NextPatchVersion, base.next_patch().to_string());

        if !head_tags.is_empty() {
            m.insert(MetadataKey::HeadTags, head_tags.join(","));
        }
        m.insert(MetadataKey::HeadCommitterName, head.committer.name.as_str());
        m.insert(MetadataKey::HeadCommitterEmail, head.committer.email.as_str());

        m
    }
}
