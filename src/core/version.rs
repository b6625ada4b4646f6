//! core::version
//!
//! Base versions extracted from release tags.
//!
//! A version is one to three numeric components optionally followed by a
//! `-qualifier` (e.g. `1`, `1.2`, `1.2.3`, `2.0.0-rc1`). The token is kept
//! exactly as written so a release build renders the tag's version verbatim;
//! arithmetic (bumps) always produces a full three-component version.
//!
//! # Ordering
//!
//! Versions order by semantic precedence: numeric components first (missing
//! components count as zero), then a release outranks any qualified
//! pre-release, then qualifiers compare lexicographically.
//!
//! # Example
//!
//! ```
//! use gitver::core::version::Version;
//!
//! let v: Version = "1.2".parse().unwrap();
//! assert_eq!(v.to_string(), "1.2");
//! assert_eq!(v.next_patch().to_string(), "1.2.1");
//!
//! let rc: Version = "2.0.0-rc1".parse().unwrap();
//! let ga: Version = "2.0.0".parse().unwrap();
//! assert!(rc < ga);
//! ```

use std::cmp::Ordering;
use std::str::FromStr;

use thiserror::Error;

/// Errors from version parsing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VersionParseError {
    #[error("empty version")]
    Empty,

    #[error("invalid numeric component '{0}'")]
    InvalidNumber(String),

    #[error("too many numeric components in '{0}' (at most 3)")]
    TooManyComponents(String),

    #[error("invalid qualifier '{0}'")]
    InvalidQualifier(String),

    #[error("numeric component '{0}' is too large to increment")]
    TooLarge(String),
}

/// A parsed base version.
#[derive(Debug, Clone, Eq)]
pub struct Version {
    major: u64,
    minor: u64,
    patch: u64,
    /// Number of numeric components written in the source token (1..=3).
    components: usize,
    qualifier: Option<String>,
}

impl Version {
    /// Create a full three-component release version.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            components: 3,
            qualifier: None,
        }
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    pub fn patch(&self) -> u64 {
        self.patch
    }

    /// The pre-release qualifier, if any (text after the first `-`).
    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    /// Whether this version carries a qualifier (a pre-release).
    pub fn is_qualified(&self) -> bool {
        self.qualifier.is_some()
    }

    /// The next patch release: `1.2.3` → `1.2.4`, qualifier dropped.
    pub fn next_patch(&self) -> Self {
        Self::new(self.major, self.minor, self.patch.saturating_add(1))
    }

    /// The next minor release: `1.2.3` → `1.3.0`.
    pub fn next_minor(&self) -> Self {
        Self::new(self.major, self.minor.saturating_add(1), 0)
    }

    /// The next major release: `1.2.3` → `2.0.0`.
    pub fn next_major(&self) -> Self {
        Self::new(self.major.saturating_add(1), 0, 0)
    }

    /// Numeric part only, always three components (`1.2` → `1.2.0`).
    pub fn numeric(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.patch)
    }

    fn parse_number(s: &str) -> Result<u64, VersionParseError> {
        if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(VersionParseError::InvalidNumber(s.to_string()));
        }
        let value: u64 = s
            .parse()
            .map_err(|_| VersionParseError::InvalidNumber(s.to_string()))?;
        // Every component must survive a bump.
        if value == u64::MAX {
            return Err(VersionParseError::TooLarge(s.to_string()));
        }
        Ok(value)
    }

    fn validate_qualifier(q: &str) -> Result<(), VersionParseError> {
        let valid = !q.is_empty()
            && q
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
        if valid {
            Ok(())
        } else {
            Err(VersionParseError::InvalidQualifier(q.to_string()))
        }
    }
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(VersionParseError::Empty);
        }

        let (numbers, qualifier) = match s.split_once('-') {
            Some((numbers, qualifier)) => {
                Self::validate_qualifier(qualifier)?;
                (numbers, Some(qualifier.to_string()))
            }
            None => (s, None),
        };

        let parts: Vec<&str> = numbers.split('.').collect();
        if parts.len() > 3 {
            return Err(VersionParseError::TooManyComponents(s.to_string()));
        }

        let mut values = [0u64; 3];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = Self::parse_number(part)?;
        }

        Ok(Self {
            major: values[0],
            minor: values[1],
            patch: values[2],
            components: parts.len(),
            qualifier,
        })
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.major)?;
        if self.components >= 2 {
            write!(f, ".{}", self.minor)?;
        }
        if self.components >= 3 {
            write!(f, ".{}", self.patch)?;
        }
        if let Some(q) = &self.qualifier {
            write!(f, "-{}", q)?;
        }
        Ok(())
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.qualifier, &other.qualifier) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
