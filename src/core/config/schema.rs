//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Files
//!
//! Every configuration file (global or repository) shares the same
//! [`ConfigFile`] schema. All fields are optional; unset fields fall through
//! to the next layer and finally to the defaults of [`VersionConfig`].
//!
//! # Validation
//!
//! [`VersionConfig::validate`] checks values that serde cannot (lengths,
//! parseable default version, non-empty markers). The tag pattern and the
//! version templates are compiled when the engine is built, which is where
//! their errors surface.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::{BranchName, TimestampZone};
use crate::core::version::Version;

/// Default tag pattern: optional `v` prefix, 1-3 numeric components,
/// optional qualifier.
pub const DEFAULT_TAG_PATTERN: &str =
    r"^v?(?P<version>[0-9]+(?:\.[0-9]+){0,2}(?:-[0-9A-Za-z][0-9A-Za-z._-]*)?)$";

/// Base version used when no matching tag is reachable.
pub const DEFAULT_BASE_VERSION: &str = "0.0.0";

/// Marker appended to versions computed from a dirty working tree.
pub const DEFAULT_DIRTY_MARKER: &str = "dirty";

/// Default length of the abbreviated commit id.
pub const DEFAULT_COMMIT_ID_LENGTH: usize = 8;

/// Rendering policy for the version string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// `<version>-<distance>-<sha>-<branch>-<dirty>` with per-part toggles.
    #[default]
    Configurable,
    /// `<version>[-<branch>]-SNAPSHOT` for anything but a release.
    Maven,
    /// User supplied templates.
    Pattern,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Configurable => "configurable",
            StrategyKind::Maven => "maven",
            StrategyKind::Pattern => "pattern",
        }
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "configurable" => Ok(StrategyKind::Configurable),
            "maven" => Ok(StrategyKind::Maven),
            "pattern" => Ok(StrategyKind::Pattern),
            other => Err(ConfigError::InvalidValue(format!(
                "unknown strategy '{}', must be one of: configurable, maven, pattern",
                other
            ))),
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule choosing the base tag among reachable candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupPolicy {
    /// Nearest tagged ancestor; ties broken by highest version.
    #[default]
    Nearest,
    /// Highest version anywhere in history.
    Max,
    /// Tag on the most recently committed ancestor.
    Latest,
}

/// One configuration file, global or repository scoped.
///
/// # Example
///
/// ```toml
/// tag_pattern = '^release-(?P<version>\d+\.\d+\.\d+)$'
/// strategy = "maven"
/// non_qualifier_branches = ["main", "develop"]
/// auto_increment_patch = true
/// timestamp_zone = "utc"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub tag_pattern: Option<String>,
    pub strategy: Option<StrategyKind>,
    pub maven_like: Option<bool>,
    pub non_qualifier_branches: Option<Vec<String>>,
    pub auto_increment_patch: Option<bool>,
    pub use_distance: Option<bool>,
    pub use_commit_id: Option<bool>,
    pub commit_id_length: Option<usize>,
    pub use_dirty: Option<bool>,
    pub dirty_marker: Option<String>,
    pub default_base_version: Option<String>,
    pub lookup_policy: Option<LookupPolicy>,
    pub max_depth: Option<u32>,
    pub version_pattern: Option<String>,
    pub tag_version_pattern: Option<String>,
    pub timestamp_zone: Option<TimestampZone>,
    /// Revision to compute the version for (default `HEAD`).
    pub reference: Option<String>,
    /// Branch name to report instead of the checked-out one.
    pub branch: Option<String>,
}

impl ConfigFile {
    /// Overlay `other` on top of `self`; fields set in `other` win.
    pub fn merge(self, other: ConfigFile) -> ConfigFile {
        ConfigFile {
            tag_pattern: other.tag_pattern.or(self.tag_pattern),
            strategy: other.strategy.or(self.strategy),
            maven_like: other.maven_like.or(self.maven_like),
            non_qualifier_branches: other
                .non_qualifier_branches
                .or(self.non_qualifier_branches),
            auto_increment_patch: other.auto_increment_patch.or(self.auto_increment_patch),
            use_distance: other.use_distance.or(self.use_distance),
            use_commit_id: other.use_commit_id.or(self.use_commit_id),
            commit_id_length: other.commit_id_length.or(self.commit_id_length),
            use_dirty: other.use_dirty.or(self.use_dirty),
            dirty_marker: other.dirty_marker.or(self.dirty_marker),
            default_base_version: other.default_base_version.or(self.default_base_version),
            lookup_policy: other.lookup_policy.or(self.lookup_policy),
            max_depth: other.max_depth.or(self.max_depth),
            version_pattern: other.version_pattern.or(self.version_pattern),
            tag_version_pattern: other.tag_version_pattern.or(self.tag_version_pattern),
            timestamp_zone: other.timestamp_zone.or(self.timestamp_zone),
            reference: other.reference.or(self.reference),
            branch: other.branch.or(self.branch),
        }
    }

    /// Fill unset fields with defaults.
    pub fn resolve(self) -> VersionConfig {
        let defaults = VersionConfig::default();
        VersionConfig {
            tag_pattern: self.tag_pattern.unwrap_or(defaults.tag_pattern),
            strategy: self.strategy.unwrap_or(defaults.strategy),
            maven_like: self.maven_like.unwrap_or(defaults.maven_like),
            non_qualifier_branches: self
                .non_qualifier_branches
                .unwrap_or(defaults.non_qualifier_branches),
            auto_increment_patch: self
                .auto_increment_patch
                .unwrap_or(defaults.auto_increment_patch),
            use_distance: self.use_distance.unwrap_or(defaults.use_distance),
            use_commit_id: self.use_commit_id.unwrap_or(defaults.use_commit_id),
            commit_id_length: self.commit_id_length.unwrap_or(defaults.commit_id_length),
            use_dirty: self.use_dirty.unwrap_or(defaults.use_dirty),
            dirty_marker: self.dirty_marker.unwrap_or(defaults.dirty_marker),
            default_base_version: self
                .default_base_version
                .unwrap_or(defaults.default_base_version),
            lookup_policy: self.lookup_policy.unwrap_or(defaults.lookup_policy),
            max_depth: self.max_depth.or(defaults.max_depth),
            version_pattern: self.version_pattern.or(defaults.version_pattern),
            tag_version_pattern: self.tag_version_pattern.or(defaults.tag_version_pattern),
            timestamp_zone: self.timestamp_zone.unwrap_or(defaults.timestamp_zone),
            reference: self.reference.unwrap_or(defaults.reference),
            branch: self.branch.or(defaults.branch),
        }
    }
}

/// Fully resolved engine configuration.
///
/// Selected once per calculator and immutable for its lifetime.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionConfig {
    /// Regular expression selecting release tags.
    pub tag_pattern: String,
    pub strategy: StrategyKind,
    /// Force maven-compatible output (`-SNAPSHOT`, restricted charset).
    pub maven_like: bool,
    /// Branches that never get a branch qualifier.
    pub non_qualifier_branches: Vec<String>,
    pub auto_increment_patch: bool,
    pub use_distance: bool,
    pub use_commit_id: bool,
    pub commit_id_length: usize,
    pub use_dirty: bool,
    pub dirty_marker: String,
    pub default_base_version: String,
    pub lookup_policy: LookupPolicy,
    pub max_depth: Option<u32>,
    pub version_pattern: Option<String>,
    pub tag_version_pattern: Option<String>,
    pub timestamp_zone: TimestampZone,
    pub reference: String,
    pub branch: Option<String>,
}

impl Default for VersionConfig {
    fn default() -> Self {
        Self {
            tag_pattern: DEFAULT_TAG_PATTERN.to_string(),
            strategy: StrategyKind::Configurable,
            maven_like: false,
            non_qualifier_branches: vec!["main".to_string(), "master".to_string()],
            auto_increment_patch: true,
            use_distance: true,
            use_commit_id: true,
            commit_id_length: DEFAULT_COMMIT_ID_LENGTH,
            use_dirty: true,
            dirty_marker: DEFAULT_DIRTY_MARKER.to_string(),
            default_base_version: DEFAULT_BASE_VERSION.to_string(),
            lookup_policy: LookupPolicy::Nearest,
            max_depth: None,
            version_pattern: None,
            tag_version_pattern: None,
            timestamp_zone: TimestampZone::Commit,
            reference: "HEAD".to_string(),
            branch: None,
        }
    }
}

impl VersionConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tag_pattern.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "tag_pattern cannot be empty".to_string(),
            ));
        }

        if !(4..=64).contains(&self.commit_id_length) {
            return Err(ConfigError::InvalidValue(format!(
                "commit_id_length must be between 4 and 64, got {}",
                self.commit_id_length
            )));
        }

        let marker_ok = !self.dirty_marker.is_empty()
            && self
                .dirty_marker
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_'));
        if !marker_ok {
            return Err(ConfigError::InvalidValue(format!(
                "dirty_marker '{}' must be non-empty and use only [A-Za-z0-9._]",
                self.dirty_marker
            )));
        }

        self.default_base_version
            .parse::<Version>()
            .map_err(|e| {
                ConfigError::InvalidValue(format!(
                    "invalid default_base_version '{}': {}",
                    self.default_base_version, e
                ))
            })?;

        for branch in &self.non_qualifier_branches {
            BranchName::new(branch.as_str()).map_err(|e| {
                ConfigError::InvalidValue(format!("invalid non-qualifier branch: {}", e))
            })?;
        }

        if let Some(branch) = &self.branch {
            BranchName::new(branch.as_str()).map_err(|e| {
                ConfigError::InvalidValue(format!("invalid branch override: {}", e))
            })?;
        }

        if self.reference.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "reference cannot be empty".to_string(),
            ));
        }

        if self.strategy == StrategyKind::Pattern && self.version_pattern.is_none() {
            return Err(ConfigError::InvalidValue(
                "the pattern strategy requires version_pattern".to_string(),
            ));
        }

        Ok(())
    }
}
