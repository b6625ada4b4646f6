//! engine::walker
//!
//! Breadth-first search from a start commit to its tagged ancestors.
//!
//! # Algorithm
//!
//! The walk proceeds level by level. Level 0 is the start commit; level
//! `n + 1` holds the not-yet-visited parents of level `n`, enqueued in
//! commit-parent order (first parent before merge parents). A commit reached
//! twice keeps the distance it was first assigned, which BFS guarantees is
//! the shortest.
//!
//! With [`LookupPolicy::Nearest`] the walk stops after draining the first
//! level that contains a matching tag, so every tag tied at that distance is
//! seen. `Max` and `Latest` walk the whole history.
//!
//! # Tie-break
//!
//! Among candidates at the minimal distance the highest version wins (by
//! semantic precedence, then lexicographically greatest token); remaining
//! ties go to the candidate discovered first. Tags on the same commit are
//! examined in name order.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::matcher::TagMatcher;
use crate::core::config::LookupPolicy;
use crate::core::types::{CommitTime, Oid};
use crate::core::version::Version;
use crate::git::{GitError, RepositoryReader, TagRef};

/// A matching tag found during the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCandidate {
    pub tag: TagRef,
    /// Base version extracted from the tag name.
    pub version: Version,
    /// Edges from the start commit to the tagged commit.
    pub distance: u32,
    /// Position in discovery order (0 = first).
    pub order: usize,
}

/// Everything the walk learned about the start commit's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalResult {
    pub start: Oid,
    /// Every matching tag discovered, in discovery order.
    pub candidates: Vec<TagCandidate>,
    /// The selected base tag, `None` if no matching tag was found.
    pub nearest: Option<TagCandidate>,
    /// Deepest level reached.
    pub depth: u32,
    /// Number of distinct commits visited.
    pub visited: usize,
    /// True when the walk stopped at the configured depth limit.
    pub truncated: bool,
}

impl TraversalResult {
    /// Distance used for rendering: the base tag's, else the depth reached.
    pub fn distance(&self) -> u32 {
        self.nearest
            .as_ref()
            .map(|c| c.distance)
            .unwrap_or(self.depth)
    }
}

/// Walk options.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkOptions {
    pub policy: LookupPolicy,
    /// Maximum level to visit; deeper history is ignored.
    pub max_depth: Option<u32>,
}

/// Index tags by their target commit, each list in name order.
pub fn index_tags(tags: Vec<TagRef>) -> HashMap<Oid, Vec<TagRef>> {
    let mut index: HashMap<Oid, Vec<TagRef>> = HashMap::new();
    for tag in tags {
        index.entry(tag.target.clone()).or_default().push(tag);
    }
    for list in index.values_mut() {
        list.sort_by(|a, b| a.name.cmp(&b.name));
    }
    index
}

/// Walk the history of `start` looking for release tags.
///
/// # Errors
///
/// Propagates reader failures; nothing about the graph's shape is an error.
pub fn walk<R: RepositoryReader + ?Sized>(
    reader: &R,
    start: &Oid,
    tags: &HashMap<Oid, Vec<TagRef>>,
    matcher: &TagMatcher,
    options: WalkOptions,
) -> Result<TraversalResult, GitError> {
    let mut visited: HashSet<Oid> = HashSet::from([start.clone()]);
    let mut level = vec![start.clone()];
    let mut distance: u32 = 0;
    let mut candidates: Vec<TagCandidate> = Vec::new();
    let mut truncated = false;

    loop {
        for commit in &level {
            for tag in tags.get(commit).into_iter().flatten() {
                if let Some(version) = matcher.matches(&tag.name) {
                    debug!(tag = %tag.name, distance, "found release tag");
                    candidates.push(TagCandidate {
                        tag: tag.clone(),
                        version,
                        distance,
                        order: candidates.len(),
                    });
                }
            }
        }

        if options.policy == LookupPolicy::Nearest && !candidates.is_empty() {
            break;
        }

        if options.max_depth.is_some_and(|max| distance >= max) {
            truncated = true;
            break;
        }

        let mut next = Vec::new();
        for commit in &level {
            for parent in reader.commit_parents(commit)? {
                if visited.insert(parent.clone()) {
                    next.push(parent);
                }
            }
        }

        if next.is_empty() {
            break;
        }

        level = next;
        distance += 1;
    }

    let nearest = match options.policy {
        LookupPolicy::Nearest => select_nearest(&candidates),
        LookupPolicy::Max => select_max(&candidates),
        LookupPolicy::Latest => select_latest(reader, &candidates)?,
    };

    debug!(
        start = %start.short(8),
        depth = distance,
        visited = visited.len(),
        candidates = candidates.len(),
        base = nearest.as_ref().map(|c| c.tag.name.as_str()),
        "history walk complete"
    );

    Ok(TraversalResult {
        start: start.clone(),
        candidates,
        nearest,
        depth: distance,
        visited: visited.len(),
        truncated,
    })
}

/// Higher version first, then lexicographically greater token.
fn precedence(a: &TagCandidate, b: &TagCandidate) -> std::cmp::Ordering {
    a.version
        .cmp(&b.version)
        .then_with(|| a.version.to_string().cmp(&b.version.to_string()))
}

/// Minimal distance, then highest precedence, then first discovered.
pub fn select_nearest(candidates: &[TagCandidate]) -> Option<TagCandidate> {
    let min = candidates.iter().map(|c| c.distance).min()?;
    candidates
        .iter()
        .filter(|c| c.distance == min)
        .fold(None::<&TagCandidate>, |best, c| match best {
            Some(b) if precedence(c, b).is_le() => Some(b),
            _ => Some(c),
        })
        .cloned()
}

/// Highest precedence, then smallest distance, then first discovered.
fn select_max(candidates: &[TagCandidate]) -> Option<TagCandidate> {
    candidates
        .iter()
        .fold(None::<&TagCandidate>, |best, c| match best {
            Some(b) => {
                let better = precedence(c, b)
                    .then_with(|| b.distance.cmp(&c.distance))
                    .is_gt();
                Some(if better { c } else { b })
            }
            None => Some(c),
        })
        .cloned()
}

/// Newest committer time of the tagged commit, then smallest distance,
/// then highest precedence, then first discovered.
fn select_latest<R: RepositoryReader + ?Sized>(
    reader: &R,
    candidates: &[TagCandidate],
) -> Result<Option<TagCandidate>, GitError> {
    let mut times: HashMap<&Oid, CommitTime> = HashMap::new();
    for candidate in candidates {
        if !times.contains_key(&candidate.tag.target) {
            let info = reader.commit_info(&candidate.tag.target)?;
            times.insert(&candidate.tag.target, info.committer.time);
        }
    }

    let seconds = |c: &TagCandidate| times.get(&c.tag.target).map_or(i64::MIN, |t| t.seconds);

    Ok(candidates
        .iter()
        .fold(None::<&TagCandidate>, |best, c| match best {
            Some(b) => {
                let better = seconds(c)
                    .cmp(&seconds(b))
                    .then_with(|| b.distance.cmp(&c.distance))
                    .then_with(|| precedence(c, b))
                    .is_gt();
                Some(if better { c } else { b })
            }
            None => Some(c),
        })
        .cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::schema::DEFAULT_TAG_PATTERN;
    use crate::git::MemoryRepo;

    fn run(repo: &MemoryRepo, start: &Oid, options: WalkOptions) -> TraversalResult {
        let matcher = TagMatcher::new(DEFAULT_TAG_PATTERN).unwrap();
        let tags = index_tags(repo.tags_reachable_from(start).unwrap());
        walk(repo, start, &tags, &matcher, options).unwrap()
    }

    fn nearest_name(result: &TraversalResult) -> Option<&str> {
        result.nearest.as_ref().map(|c| c.tag.name.as_str())
    }

    #[test]
    fn tag_on_start_is_distance_zero() {
        let mut repo = MemoryRepo::new();
        let root = repo.commit(&[]);
        repo.tag("1.0.0", &root);

        let result = run(&repo, &root, WalkOptions::default());
        assert_eq!(nearest_name(&result), Some("1.0.0"));
        assert_eq!(result.distance(), 0);
        assert_eq!(result.visited, 1);
    }

    #[test]
    fn counts_edges_to_tag() {
        let mut repo = MemoryRepo::new();
        let ids = repo.chain(None, 4);
        repo.tag("v1.0.0", &ids[0]);

        let result = run(&repo, &ids[3], WalkOptions::default());
        assert_eq!(nearest_name(&result), Some("v1.0.0"));
        assert_eq!(result.distance(), 3);
    }

    #[test]
    fn nearest_wins_over_higher_version_further_away() {
        let mut repo = MemoryRepo::new();
        let ids = repo.chain(None, 3);
        repo.tag("v9.0.0", &ids[0]);
        repo.tag("v1.0.0", &ids[1]);

        let result = run(&repo, &ids[2], WalkOptions::default());
        assert_eq!(nearest_name(&result), Some("v1.0.0"));
        assert_eq!(result.distance(), 1);
        // Stops after the matching level
        assert_eq!(result.candidates.len(), 1);
    }

    #[test]
    fn non_matching_tags_are_invisible() {
        let mut repo = MemoryRepo::new();
        let ids = repo.chain(None, 3);
        repo.tag("v1.0.0", &ids[0]);
        repo.tag("deploy-prod", &ids[2]);
        repo.tag("v1.2.3.4.5", &ids[1]);

        let result = run(&repo, &ids[2], WalkOptions::default());
        assert_eq!(nearest_name(&result), Some("v1.0.0"));
        assert_eq!(result.distance(), 2);
    }

    #[test]
    fn merge_tie_prefers_highest_version() {
        let mut repo = MemoryRepo::new();
        let root = repo.commit(&[]);
        let left = repo.commit(&[&root]);
        let right = repo.commit(&[&root]);
        let merge = repo.commit(&[&left, &right]);
        repo.tag("v1.0.0", &left);
        repo.tag("v2.0.0", &right);

        let result = run(&repo, &merge, WalkOptions::default());
        assert_eq!(nearest_name(&result), Some("v2.0.0"));
        assert_eq!(result.distance(), 1);
        assert_eq!(result.candidates.len(), 2);
    }

    #[test]
    fn merge_tie_uses_semantic_precedence() {
        let mut repo = MemoryRepo::new();
        let root = repo.commit(&[]);
        let left = repo.commit(&[&root]);
        let right = repo.commit(&[&root]);
        let merge = repo.commit(&[&left, &right]);
        repo.tag("v1.10.0", &left);
        repo.tag("v1.9.0", &right);

        let result = run(&repo, &merge, WalkOptions::default());
        assert_eq!(nearest_name(&result), Some("v1.10.0"));
    }

    #[test]
    fn equal_versions_fall_back_to_discovery_order() {
        let mut repo = MemoryRepo::new();
        let root = repo.commit(&[]);
        let left = repo.commit(&[&root]);
        let right = repo.commit(&[&root]);
        let merge = repo.commit(&[&left, &right]);
        repo.tag("v1.0.0", &right);
        repo.tag("1.0.0", &left);

        let result = run(&repo, &merge, WalkOptions::default());
        // First parent is examined first
        assert_eq!(nearest_name(&result), Some("1.0.0"));
    }

    #[test]
    fn shared_ancestor_keeps_shortest_distance() {
        // root <- a <- b <- merge
        //   ^------------/
        let mut repo = MemoryRepo::new();
        let root = repo.commit(&[]);
        let a = repo.commit(&[&root]);
        let b = repo.commit(&[&a]);
        let merge = repo.commit(&[&b, &root]);
        repo.tag("v0.1.0", &root);

        let result = run(&repo, &merge, WalkOptions::default());
        assert_eq!(result.distance(), 1);
        assert_eq!(result.candidates.len(), 1);
    }

    #[test]
    fn untagged_history_reports_depth() {
        let mut repo = MemoryRepo::new();
        let ids = repo.chain(None, 3);

        let result = run(&repo, &ids[2], WalkOptions::default());
        assert!(result.nearest.is_none());
        assert_eq!(result.depth, 2);
        assert_eq!(result.distance(), 2);
        assert_eq!(result.visited, 3);
        assert!(!result.truncated);
    }

    #[test]
    fn max_depth_truncates() {
        let mut repo = MemoryRepo::new();
        let ids = repo.chain(None, 6);
        repo.tag("v1.0.0", &ids[0]);

        let options = WalkOptions {
            max_depth: Some(2),
            ..Default::default()
        };
        let result = run(&repo, &ids[5], options);
        assert!(result.nearest.is_none());
        assert!(result.truncated);
        assert_eq!(result.distance(), 2);
    }

    #[test]
    fn max_policy_walks_everything() {
        let mut repo = MemoryRepo::new();
        let ids = repo.chain(None, 3);
        repo.tag("v9.0.0", &ids[0]);
        repo.tag("v1.0.0", &ids[1]);

        let options = WalkOptions {
            policy: LookupPolicy::Max,
            ..Default::default()
        };
        let result = run(&repo, &ids[2], options);
        assert_eq!(nearest_name(&result), Some("v9.0.0"));
        assert_eq!(result.distance(), 2);
        assert_eq!(result.candidates.len(), 2);
    }

    #[test]
    fn latest_policy_uses_commit_time() {
        let mut repo = MemoryRepo::new();
        let root = repo.commit_at(&[], CommitTime::new(1_000, 0));
        let old_side = repo.commit_at(&[&root], CommitTime::new(2_000, 0));
        let new_side = repo.commit_at(&[&root], CommitTime::new(9_000, 0));
        let deep = repo.commit_at(&[&new_side], CommitTime::new(9_500, 0));
        let merge = repo.commit_at(&[&old_side, &deep], CommitTime::new(10_000, 0));
        repo.tag("v5.0.0", &old_side);
        repo.tag("v2.0.0", &new_side);

        let options = WalkOptions {
            policy: LookupPolicy::Latest,
            ..Default::default()
        };
        let result = run(&repo, &merge, options);
        assert_eq!(nearest_name(&result), Some("v2.0.0"));
        assert_eq!(result.distance(), 2);
    }

    #[test]
    fn reader_errors_propagate() {
        let mut repo = MemoryRepo::new();
        let ids = repo.chain(None, 2);
        repo.fail_on(Some(crate::git::FailOn::CommitParents));

        let matcher = TagMatcher::new(DEFAULT_TAG_PATTERN).unwrap();
        let result = walk(
            &repo,
            &ids[1],
            &HashMap::new(),
            &matcher,
            WalkOptions::default(),
        );
        assert!(matches!(result, Err(GitError::AccessError { .. })));
    }
}
