//! engine::strategy
//!
//! Renders the version string from the walk's findings.
//!
//! # Cases
//!
//! | State                          | Rendered                                   |
//! |--------------------------------|--------------------------------------------|
//! | tag on start commit, clean     | tag version verbatim                       |
//! | tag on start commit, dirty     | tag version + dirty marker                 |
//! | tag at distance > 0            | bumped version + distance + commit id      |
//! | no tag reachable               | default base + distance + commit id        |
//!
//! The first row is the released state; every other state is a snapshot.
//!
//! # Strategies
//!
//! - `configurable`: `<version>[-<distance>][-<sha>][-<branch>][-<dirty>]`
//! - `maven`: `<version>[-<branch>]-SNAPSHOT`
//! - `pattern`: user templates with `${v}`, `${M}`, `${m}`, `${p}` and
//!   `${meta.KEY}` placeholders
//!
//! `maven_like` switches `configurable` to maven rendering and makes
//! `pattern` output maven compatible.

use super::metadata::{Metadata, MetadataKey};
use crate::core::config::{ConfigError, StrategyKind, VersionConfig};
use crate::core::types::Oid;
use crate::core::version::Version;

/// Suffix marking a maven snapshot.
pub const SNAPSHOT_SUFFIX: &str = "SNAPSHOT";

/// Default template for the released state of the pattern strategy.
pub const DEFAULT_TAG_VERSION_PATTERN: &str = "${v}";

/// Replace every character outside `[A-Za-z0-9._-]` with `_`.
///
/// # Example
///
/// ```
/// use gitver::engine::strategy::sanitize;
///
/// assert_eq!(sanitize("feature/JIRA-12 fix"), "feature_JIRA-12_fix");
/// ```
pub fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Facts the strategy renders from.
#[derive(Debug, Clone, Copy)]
pub struct RenderInput<'a> {
    /// Version of the selected base tag, `None` when no tag was found.
    pub base: Option<&'a Version>,
    /// Version used when `base` is `None`.
    pub fallback: &'a Version,
    pub distance: u32,
    pub dirty: bool,
    /// Checked-out branch, `None` when HEAD is detached.
    pub branch: Option<&'a str>,
    pub commit: &'a Oid,
}

impl RenderInput<'_> {
    /// Tag on the start commit and a clean tree.
    pub fn is_released(&self) -> bool {
        self.base.is_some() && self.distance == 0 && !self.dirty
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Version,
    Major,
    Minor,
    Patch,
    Meta(MetadataKey),
}

/// A parsed version template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Parse a template.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for unknown or unterminated
    /// placeholders.
    pub fn parse(source: &str) -> Result<Self, ConfigError> {
        let mut segments = Vec::new();
        let mut rest = source;

        while let Some(start) = rest.find("${") {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }
            let after = &rest[start + 2..];
            let end = after.find('}').ok_or_else(|| {
                ConfigError::InvalidValue(format!(
                    "unterminated placeholder in version pattern '{}'",
                    source
                ))
            })?;
            segments.push(Self::placeholder(&after[..end], source)?);
            rest = &after[end + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { segments })
    }

    fn placeholder(name: &str, source: &str) -> Result<Segment, ConfigError> {
        let unknown = || {
            ConfigError::InvalidValue(format!(
                "unknown placeholder '${{{}}}' in version pattern '{}'",
                name, source
            ))
        };
        match name {
            "v" => Ok(Segment::Version),
            "M" => Ok(Segment::Major),
            "m" => Ok(Segment::Minor),
            "p" => Ok(Segment::Patch),
            _ => {
                let key = name.strip_prefix("meta.").ok_or_else(unknown)?;
                // Exact key names only
                MetadataKey::ALL
                    .iter()
                    .copied()
                    .find(|k| k.as_str() == key)
                    .map(Segment::Meta)
                    .ok_or_else(unknown)
            }
        }
    }

    fn render(&self, version: &Version, metadata: &Metadata) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Version => out.push_str(&version.to_string()),
                Segment::Major => out.push_str(&version.major().to_string()),
                Segment::Minor => out.push_str(&version.minor().to_string()),
                Segment::Patch => out.push_str(&version.patch().to_string()),
                Segment::Meta(key) => out.push_str(metadata.get(*key).unwrap_or_default()),
            }
        }
        out
    }
}

#[derive(Debug, Clone)]
struct Templates {
    unreleased: Template,
    released: Template,
}

/// Configured rendering policy.
#[derive(Debug, Clone)]
pub struct Strategy {
    kind: StrategyKind,
    maven_like: bool,
    auto_increment_patch: bool,
    use_distance: bool,
    use_commit_id: bool,
    commit_id_length: usize,
    use_dirty: bool,
    dirty_marker: String,
    non_qualifier_branches: Vec<String>,
    templates: Option<Templates>,
}

impl Strategy {
    /// Build the strategy, compiling any version templates.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for malformed templates, or when
    /// the pattern strategy has no `version_pattern`.
    pub fn from_config(config: &VersionConfig) -> Result<Self, ConfigError> {
        let templates = match &config.version_pattern {
            Some(unreleased) => Some(Templates {
                unreleased: Template::parse(unreleased)?,
                released: Template::parse(
                    config
                        .tag_version_pattern
                        .as_deref()
                        .unwrap_or(DEFAULT_TAG_VERSION_PATTERN),
                )?,
            }),
            None => None,
        };

        if config.strategy == StrategyKind::Pattern && templates.is_none() {
            return Err(ConfigError::InvalidValue(
                "the pattern strategy requires version_pattern".to_string(),
            ));
        }

        Ok(Self {
            kind: config.strategy,
            maven_like: config.maven_like,
            auto_increment_patch: config.auto_increment_patch,
            use_distance: config.use_distance,
            use_commit_id: config.use_commit_id,
            commit_id_length: config.commit_id_length,
            use_dirty: config.use_dirty,
            dirty_marker: config.dirty_marker.clone(),
            non_qualifier_branches: config.non_qualifier_branches.clone(),
            templates,
        })
    }

    /// The strategy actually used for rendering.
    pub fn effective_kind(&self) -> StrategyKind {
        match self.kind {
            StrategyKind::Configurable if self.maven_like => StrategyKind::Maven,
            kind => kind,
        }
    }

    /// Version before qualifiers: the base, bumped when past a plain
    /// release, or the fallback when no tag was found.
    pub fn effective_version(&self, input: &RenderInput<'_>) -> Version {
        match input.base {
            Some(base)
                if input.distance > 0 && self.auto_increment_patch && !base.is_qualified() =>
            {
                base.next_patch()
            }
            Some(base) => base.clone(),
            None => input.fallback.clone(),
        }
    }

    /// Sanitized branch qualifier, `None` for detached HEAD and
    /// non-qualifier branches.
    pub fn branch_qualifier(&self, branch: Option<&str>) -> Option<String> {
        let branch = branch?;
        if self.non_qualifier_branches.iter().any(|b| b == branch) {
            return None;
        }
        Some(sanitize(branch))
    }

    /// Render the version string.
    ///
    /// `metadata` feeds `${meta.KEY}` placeholders; the other strategies
    /// ignore it.
    pub fn render(&self, input: &RenderInput<'_>, metadata: &Metadata) -> String {
        let version = self.effective_version(input);
        if input.is_released() && self.effective_kind() != StrategyKind::Pattern {
            return version.to_string();
        }

        match (self.effective_kind(), &self.templates) {
            (StrategyKind::Pattern, Some(templates)) => {
                self.render_pattern(templates, input, &version, metadata)
            }
            (StrategyKind::Maven, _) => self.render_maven(input, &version),
            _ => self.render_configurable(input, &version),
        }
    }

    fn render_configurable(&self, input: &RenderInput<'_>, version: &Version) -> String {
        let mut parts = vec![version.to_string()];

        if input.distance > 0 || input.base.is_none() {
            if self.use_distance {
                parts.push(input.distance.to_string());
            }
            if self.use_commit_id {
                parts.push(input.commit.short(self.commit_id_length).to_string());
            }
            if let Some(qualifier) = self.branch_qualifier(input.branch) {
                parts.push(qualifier);
            }
        }
        if input.dirty && self.use_dirty {
            parts.push(self.dirty_marker.clone());
        }

        parts.join("-")
    }

    fn render_maven(&self, input: &RenderInput<'_>, version: &Version) -> String {
        let mut out = version.to_string();
        if let Some(qualifier) = self.branch_qualifier(input.branch) {
            out.push('-');
            out.push_str(&qualifier);
        }
        out.push('-');
        out.push_str(SNAPSHOT_SUFFIX);
        out
    }

    fn render_pattern(
        &self,
        templates: &Templates,
        input: &RenderInput<'_>,
        version: &Version,
        metadata: &Metadata,
    ) -> String {
        let released = input.is_released();
        let template = if released {
            &templates.released
        } else {
            &templates.unreleased
        };
        let rendered = template.render(version, metadata);
        if !self.maven_like {
            return rendered;
        }

        let mut out = sanitize(&rendered);
        let suffix = format!("-{}", SNAPSHOT_SUFFIX);
        if !released && !out.ends_with(&suffix) {
            out.push_str(&suffix);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHA: &str = "abcdef0123456789abcdef0123456789abcdef01";

    fn strategy(config: VersionConfig) -> Strategy {
        Strategy::from_config(&config).unwrap()
    }

    fn render(
        strategy: &Strategy,
        base: Option<&str>,
        distance: u32,
        dirty: bool,
        branch: Option<&str>,
    ) -> String {
        let commit = Oid::new(SHA).unwrap();
        let base = base.map(|b| b.parse::<Version>().unwrap());
        let fallback = Version::new(0, 0, 0);
        let input = RenderInput {
            base: base.as_ref(),
            fallback: &fallback,
            distance,
            dirty,
            branch,
            commit: &commit,
        };
        let mut metadata = Metadata::default();
        if let Some(b) = branch {
            metadata.insert(MetadataKey::BranchName, b);
        }
        strategy.render(&input, &metadata)
    }

    mod configurable {
        use super::*;

        #[test]
        fn released_state_is_verbatim() {
            let s = strategy(VersionConfig::default());
            assert_eq!(render(&s, Some("1.0.0"), 0, false, Some("main")), "1.0.0");
            assert_eq!(render(&s, Some("2.1"), 0, false, Some("topic")), "2.1");
        }

        #[test]
        fn dirty_on_tag_appends_marker_only() {
            let s = strategy(VersionConfig::default());
            assert_eq!(
                render(&s, Some("1.0.0"), 0, true, Some("main")),
                "1.0.0-dirty"
            );
            assert_eq!(
                render(&s, Some("1.0.0"), 0, true, Some("feature/x")),
                "1.0.0-dirty"
            );
        }

        #[test]
        fn distance_bumps_patch_and_qualifies() {
            let s = strategy(VersionConfig::default());
            assert_eq!(
                render(&s, Some("1.0.0"), 1, false, Some("main")),
                "1.0.1-1-abcdef01"
            );
            assert_eq!(
                render(&s, Some("1.0.0"), 3, true, Some("main")),
                "1.0.1-3-abcdef01-dirty"
            );
        }

        #[test]
        fn qualified_base_is_not_bumped() {
            let s = strategy(VersionConfig::default());
            assert_eq!(
                render(&s, Some("2.0.0-rc1"), 2, false, None),
                "2.0.0-rc1-2-abcdef01"
            );
        }

        #[test]
        fn auto_increment_can_be_disabled() {
            let s = strategy(VersionConfig {
                auto_increment_patch: false,
                ..Default::default()
            });
            assert_eq!(
                render(&s, Some("1.0.0"), 1, false, None),
                "1.0.0-1-abcdef01"
            );
        }

        #[test]
        fn feature_branch_is_sanitized_qualifier() {
            let s = strategy(VersionConfig::default());
            assert_eq!(
                render(&s, Some("1.0.0"), 2, false, Some("feature/login")),
                "1.0.1-2-abcdef01-feature_login"
            );
        }

        #[test]
        fn detached_head_has_no_branch_qualifier() {
            let s = strategy(VersionConfig::default());
            assert_eq!(
                render(&s, Some("1.0.0"), 2, false, None),
                "1.0.1-2-abcdef01"
            );
        }

        #[test]
        fn fallback_is_never_bumped() {
            let s = strategy(VersionConfig::default());
            assert_eq!(render(&s, None, 2, false, Some("main")), "0.0.0-2-abcdef01");
            assert_eq!(render(&s, None, 0, false, Some("main")), "0.0.0-0-abcdef01");
        }

        #[test]
        fn toggles_drop_parts() {
            let s = strategy(VersionConfig {
                use_distance: false,
                use_commit_id: false,
                use_dirty: false,
                ..Default::default()
            });
            assert_eq!(render(&s, Some("1.0.0"), 4, true, Some("main")), "1.0.1");
        }

        #[test]
        fn commit_id_length_is_honored() {
            let s = strategy(VersionConfig {
                commit_id_length: 12,
                ..Default::default()
            });
            assert_eq!(
                render(&s, Some("1.0.0"), 1, false, None),
                "1.0.1-1-abcdef012345"
            );
        }

        #[test]
        fn custom_dirty_marker() {
            let s = strategy(VersionConfig {
                dirty_marker: "modified".to_string(),
                ..Default::default()
            });
            assert_eq!(
                render(&s, Some("1.0.0"), 0, true, None),
                "1.0.0-modified"
            );
        }
    }

    mod maven {
        use super::*;

        fn maven() -> Strategy {
            strategy(VersionConfig {
                strategy: StrategyKind::Maven,
                ..Default::default()
            })
        }

        #[test]
        fn release_is_verbatim() {
            assert_eq!(render(&maven(), Some("1.0.0"), 0, false, None), "1.0.0");
        }

        #[test]
        fn dirty_release_is_unbumped_snapshot() {
            assert_eq!(
                render(&maven(), Some("1.0.0"), 0, true, Some("main")),
                "1.0.0-SNAPSHOT"
            );
        }

        #[test]
        fn distance_is_bumped_snapshot() {
            assert_eq!(
                render(&maven(), Some("1.0.0"), 5, false, Some("master")),
                "1.0.1-SNAPSHOT"
            );
        }

        #[test]
        fn branch_qualifier_before_snapshot() {
            assert_eq!(
                render(&maven(), Some("1.0.0"), 1, false, Some("feature/x y")),
                "1.0.1-feature_x_y-SNAPSHOT"
            );
        }

        #[test]
        fn no_tag_snapshot() {
            assert_eq!(render(&maven(), None, 3, false, None), "0.0.0-SNAPSHOT");
        }

        #[test]
        fn maven_like_forces_maven_rendering() {
            let s = strategy(VersionConfig {
                maven_like: true,
                ..Default::default()
            });
            assert_eq!(s.effective_kind(), StrategyKind::Maven);
            assert_eq!(render(&s, Some("1.0.0"), 2, false, None), "1.0.1-SNAPSHOT");
        }
    }

    mod pattern {
        use super::*;

        fn pattern(version: &str, tag: Option<&str>, maven_like: bool) -> Strategy {
            strategy(VersionConfig {
                strategy: StrategyKind::Pattern,
                version_pattern: Some(version.to_string()),
                tag_version_pattern: tag.map(str::to_string),
                maven_like,
                ..Default::default()
            })
        }

        #[test]
        fn placeholders_expand() {
            let s = pattern("${M}.${m}.${p}-${meta.BRANCH_NAME}", None, false);
            assert_eq!(
                render(&s, Some("1.2.3"), 1, false, Some("dev")),
                "1.2.4-dev"
            );
        }

        #[test]
        fn released_uses_tag_template() {
            let s = pattern("${v}-next", None, false);
            assert_eq!(render(&s, Some("1.2"), 0, false, None), "1.2");

            let s = pattern("${v}-next", Some("v${v}"), false);
            assert_eq!(render(&s, Some("1.2"), 0, false, None), "v1.2");
        }

        #[test]
        fn absent_meta_renders_empty() {
            let s = pattern("${v}+${meta.BASE_TAG}", None, false);
            assert_eq!(render(&s, None, 2, false, None), "0.0.0+");
        }

        #[test]
        fn maven_like_sanitizes_and_snapshots() {
            let s = pattern("${v}+${meta.BRANCH_NAME}", None, true);
            assert_eq!(
                render(&s, Some("1.0.0"), 1, false, Some("feat/a")),
                "1.0.1_feat_a-SNAPSHOT"
            );
            assert_eq!(render(&s, Some("1.0.0"), 0, false, None), "1.0.0");
        }

        #[test]
        fn unknown_placeholder_is_rejected() {
            for bad in ["${x}", "${meta.NOPE}", "${v", "${meta.dirty}"] {
                let result = Strategy::from_config(&VersionConfig {
                    strategy: StrategyKind::Pattern,
                    version_pattern: Some(bad.to_string()),
                    ..Default::default()
                });
                assert!(
                    matches!(result, Err(ConfigError::InvalidValue(_))),
                    "{bad} should be rejected"
                );
            }
        }

        #[test]
        fn pattern_requires_version_pattern() {
            let result = Strategy::from_config(&VersionConfig {
                strategy: StrategyKind::Pattern,
                ..Default::default()
            });
            assert!(result.is_err());
        }

        #[test]
        fn literal_only_template() {
            let t = Template::parse("fixed").unwrap();
            assert_eq!(t.render(&Version::new(1, 0, 0), &Metadata::default()), "fixed");
        }
    }

    #[test]
    fn sanitize_replaces_disallowed_characters() {
        assert_eq!(sanitize("a/b c#d"), "a_b_c_d");
        assert_eq!(sanitize("ok-1.2_x"), "ok-1.2_x");
    }
}
