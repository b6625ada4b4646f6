//! engine::metadata
//!
//! The closed set of metadata keys and the immutable bundle of values
//! computed for one resolution.
//!
//! # Encoding
//!
//! Every value is a string. Booleans are `"true"`/`"false"`, integers are
//! decimal, timestamps use `yyyyMMddHHmmss` in the commit's recorded offset
//! (or UTC, by configuration). Keys that cannot be derived for the current
//! state (tag-derived keys when no tag was found) are absent rather than
//! empty.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// A metadata key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetadataKey {
    CalculatedVersion,
    CommitTimestamp,
    CommitterTimestamp,
    GitSha1Full,
    GitSha1Abbrev,
    BranchName,
    QualifiedBranchName,
    DetachedHead,
    Dirty,
    BaseTag,
    BaseTagType,
    BaseVersion,
    BaseCommitOnHead,
    CommitDistance,
    CurrentVersionMajor,
    CurrentVersionMinor,
    CurrentVersionPatch,
    NextMajorVersion,
    NextMinorVersion,
    NextPatchVersion,
    HeadTags,
    HeadCommitterName,
    HeadCommitterEmail,
}

impl MetadataKey {
    /// Every key, in display order.
    pub const ALL: [MetadataKey; 23] = [
        MetadataKey::CalculatedVersion,
        MetadataKey::CommitTimestamp,
        MetadataKey::CommitterTimestamp,
        MetadataKey::GitSha1Full,
        MetadataKey::GitSha1Abbrev,
        MetadataKey::BranchName,
        MetadataKey::QualifiedBranchName,
        MetadataKey::DetachedHead,
        MetadataKey::Dirty,
        MetadataKey::BaseTag,
        MetadataKey::BaseTagType,
        MetadataKey::BaseVersion,
        MetadataKey::BaseCommitOnHead,
        MetadataKey::CommitDistance,
        MetadataKey::CurrentVersionMajor,
        MetadataKey::CurrentVersionMinor,
        MetadataKey::CurrentVersionPatch,
        MetadataKey::NextMajorVersion,
        MetadataKey::NextMinorVersion,
        MetadataKey::NextPatchVersion,
        MetadataKey::HeadTags,
        MetadataKey::HeadCommitterName,
        MetadataKey::HeadCommitterEmail,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataKey::CalculatedVersion => "CALCULATED_VERSION",
            MetadataKey::CommitTimestamp => "COMMIT_TIMESTAMP",
            MetadataKey::CommitterTimestamp => "COMMITTER_TIMESTAMP",
            MetadataKey::GitSha1Full => "GIT_SHA1_FULL",
            MetadataKey::GitSha1Abbrev => "GIT_SHA1_ABBREV",
            MetadataKey::BranchName => "BRANCH_NAME",
            MetadataKey::QualifiedBranchName => "QUALIFIED_BRANCH_NAME",
            MetadataKey::DetachedHead => "DETACHED_HEAD",
            MetadataKey::Dirty => "DIRTY",
            MetadataKey::BaseTag => "BASE_TAG",
            MetadataKey::BaseTagType => "BASE_TAG_TYPE",
            MetadataKey::BaseVersion => "BASE_VERSION",
            MetadataKey::BaseCommitOnHead => "BASE_COMMIT_ON_HEAD",
            MetadataKey::CommitDistance => "COMMIT_DISTANCE",
            MetadataKey::CurrentVersionMajor => "CURRENT_VERSION_MAJOR",
            MetadataKey::CurrentVersionMinor => "CURRENT_VERSION_MINOR",
            MetadataKey::CurrentVersionPatch => "CURRENT_VERSION_PATCH",
            MetadataKey::NextMajorVersion => "NEXT_MAJOR_VERSION",
            MetadataKey::NextMinorVersion => "NEXT_MINOR_VERSION",
            MetadataKey::NextPatchVersion => "NEXT_PATCH_VERSION",
            MetadataKey::HeadTags => "HEAD_TAGS",
            MetadataKey::HeadCommitterName => "HEAD_COMMITTER_NAME",
            MetadataKey::HeadCommitterEmail => "HEAD_COMMITTER_EMAIL",
        }
    }
}

/// Error for a key name outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown metadata key '{0}'")]
pub struct UnknownKey(pub String);

impl FromStr for MetadataKey {
    type Err = UnknownKey;

    /// Case-insensitive; `-` is accepted in place of `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        MetadataKey::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == normalized)
            .ok_or_else(|| UnknownKey(s.to_string()))
    }
}

impl std::fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MetadataKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Immutable metadata bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Metadata {
    values: BTreeMap<MetadataKey, String>,
}

impl Metadata {
    pub fn get(&self, key: MetadataKey) -> Option<&str> {
        self.values.get(&key).map(String::as_str)
    }

    pub fn contains(&self, key: MetadataKey) -> bool {
        self.values.contains_key(&key)
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (MetadataKey, &str)> {
        self.values.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn insert(&mut self, key: MetadataKey, value: impl Into<String>) {
        self.values.insert(key, value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_parse() {
        for key in MetadataKey::ALL {
            assert_eq!(key.as_str().parse::<MetadataKey>().unwrap(), key);
        }
    }

    #[test]
    fn parse_is_lenient_on_case_and_dashes() {
        assert_eq!(
            "git-sha1-abbrev".parse::<MetadataKey>().unwrap(),
            MetadataKey::GitSha1Abbrev
        );
        assert_eq!("dirty".parse::<MetadataKey>().unwrap(), MetadataKey::Dirty);
        assert!("NOT_A_KEY".parse::<MetadataKey>().is_err());
    }

    #[test]
    fn absent_keys_are_none() {
        let mut metadata = Metadata::default();
        metadata.insert(MetadataKey::Dirty, "false");
        assert_eq!(metadata.get(MetadataKey::Dirty), Some("false"));
        assert_eq!(metadata.get(MetadataKey::BaseTag), None);
        assert!(!metadata.contains(MetadataKey::BaseTag));
    }

    #[test]
    fn serializes_as_flat_object() {
        let mut metadata = Metadata::default();
        metadata.insert(MetadataKey::CommitDistance, "3");
        metadata.insert(MetadataKey::BaseTag, "v1.0.0");

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["COMMIT_DISTANCE"], "3");
        assert_eq!(json["BASE_TAG"], "v1.0.0");
    }
}
