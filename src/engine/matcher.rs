//! engine::matcher
//!
//! Selects release tags and extracts their base version.
//!
//! The configured pattern is a regular expression. The version token is
//! taken from the named group `version` if present, else from the first
//! capture group, else from the whole match. A tag whose token does not
//! parse as a [`Version`] is treated as not matching: one malformed tag in a
//! long history never aborts resolution.

use regex::Regex;
use tracing::debug;

use crate::core::config::ConfigError;
use crate::core::version::Version;

/// Compiled tag pattern.
#[derive(Debug, Clone)]
pub struct TagMatcher {
    pattern: Regex,
}

impl TagMatcher {
    /// Compile a tag pattern.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the pattern is not a valid
    /// regular expression.
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        let pattern = Regex::new(pattern).map_err(|e| {
            ConfigError::InvalidValue(format!("invalid tag_pattern '{}': {}", pattern, e))
        })?;
        Ok(Self { pattern })
    }

    /// Return the normalized base version if `tag` is a release tag.
    ///
    /// # Example
    ///
    /// ```
    /// use gitver::core::config::schema::DEFAULT_TAG_PATTERN;
    /// use gitver::engine::TagMatcher;
    ///
    /// let matcher = TagMatcher::new(DEFAULT_TAG_PATTERN).unwrap();
    /// assert_eq!(matcher.matches("v1.2.3").unwrap().to_string(), "1.2.3");
    /// assert!(matcher.matches("nightly").is_none());
    /// ```
    pub fn matches(&self, tag: &str) -> Option<Version> {
        let captures = self.pattern.captures(tag)?;
        let token = captures
            .name("version")
            .or_else(|| captures.get(1))
            .or_else(|| captures.get(0))?
            .as_str();

        match token.parse::<Version>() {
            Ok(version) => Some(version),
            Err(e) => {
                debug!(tag, token, error = %e, "skipping tag with malformed version");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::schema::DEFAULT_TAG_PATTERN;

    fn default_matcher() -> TagMatcher {
        TagMatcher::new(DEFAULT_TAG_PATTERN).unwrap()
    }

    #[test]
    fn strips_leading_v() {
        let matcher = default_matcher();
        assert_eq!(matcher.matches("v1.0.0").unwrap().to_string(), "1.0.0");
        assert_eq!(matcher.matches("1.0.0").unwrap().to_string(), "1.0.0");
    }

    #[test]
    fn keeps_short_forms_and_qualifiers() {
        let matcher = default_matcher();
        assert_eq!(matcher.matches("v2").unwrap().to_string(), "2");
        assert_eq!(matcher.matches("1.4").unwrap().to_string(), "1.4");
        assert_eq!(
            matcher.matches("v3.0.0-rc.1").unwrap().to_string(),
            "3.0.0-rc.1"
        );
    }

    #[test]
    fn ignores_non_release_tags() {
        let matcher = default_matcher();
        for tag in ["nightly", "release", "v1.2.3.4", "x1.0.0", "1.0.0-", "v"] {
            assert!(matcher.matches(tag).is_none(), "{tag} should not match");
        }
    }

    #[test]
    fn custom_pattern_with_named_group() {
        let matcher = TagMatcher::new(r"^release/(?P<version>.+)$").unwrap();
        assert_eq!(
            matcher.matches("release/4.5.6").unwrap().to_string(),
            "4.5.6"
        );
        assert!(matcher.matches("v4.5.6").is_none());
    }

    #[test]
    fn malformed_token_is_skipped_not_fatal() {
        // Pattern is loose enough to capture garbage; parsing rejects it.
        let matcher = TagMatcher::new(r"^release/(?P<version>.+)$").unwrap();
        assert!(matcher.matches("release/banana").is_none());
        assert!(matcher.matches("release/1.2.3.4.5").is_none());
    }

    #[test]
    fn first_group_when_unnamed() {
        let matcher = TagMatcher::new(r"^rel-(\d+\.\d+)$").unwrap();
        assert_eq!(matcher.matches("rel-1.9").unwrap().to_string(), "1.9");
    }

    #[test]
    fn whole_match_without_groups() {
        let matcher = TagMatcher::new(r"^\d+\.\d+\.\d+$").unwrap();
        assert_eq!(matcher.matches("7.0.1").unwrap().to_string(), "7.0.1");
    }

    #[test]
    fn invalid_pattern_is_config_error() {
        assert!(matches!(
            TagMatcher::new("v(unclosed"),
            Err(ConfigError::InvalidValue(_))
        ));
    }
}
