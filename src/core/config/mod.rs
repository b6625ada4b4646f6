//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! gitver reads configuration from up to three files plus the environment:
//! - **Global**: User-level defaults
//! - **Shared repo**: `.gitver.toml` committed in the work tree
//! - **Local repo**: `.git/gitver/config.toml`, never committed
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Shared repo config file
//! 4. Local repo config file
//! 5. Environment (`GITVER_BRANCH`)
//! 6. CLI flags (passed as an overlay to [`Config::resolve`])
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$GITVER_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/gitver/config.toml`
//! 3. `~/.gitver/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use gitver::core::config::{Config, ConfigFile};
//! use std::path::Path;
//!
//! let result = Config::load(Some(Path::new("/path/to/repo"))).unwrap();
//! let config = result.config.resolve(ConfigFile::default()).unwrap();
//! println!("strategy: {}", config.strategy);
//! ```

pub mod schema;

pub use schema::{ConfigFile, LookupPolicy, StrategyKind, VersionConfig};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming an explicit global config file.
pub const CONFIG_ENV: &str = "GITVER_CONFIG";

/// Environment variable overriding the reported branch name.
///
/// CI systems usually check out a detached HEAD; this lets them report the
/// branch being built.
pub const BRANCH_ENV: &str = "GITVER_BRANCH";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Files that contributed, lowest precedence first.
    pub sources: Vec<PathBuf>,
}

/// Layered configuration from all sources.
///
/// Call [`Config::resolve`] to apply precedence and defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: ConfigFile,
    /// `.gitver.toml` in the work tree
    pub shared: Option<ConfigFile>,
    /// `.git/gitver/config.toml`
    pub local: Option<ConfigFile>,
    /// Overrides taken from the environment
    pub env: ConfigFile,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `repo_root` is provided, also loads repository config.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be read or parsed.
    /// Missing config files are not an error (defaults are used).
    pub fn load(repo_root: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let mut sources = Vec::new();

        let global = match Self::global_config_path() {
            Some(path) => {
                let file = Self::read_config_file(&path)?;
                sources.push(path);
                file
            }
            None => ConfigFile::default(),
        };

        let (shared, local) = match repo_root {
            Some(root) => {
                let shared = Self::read_optional(&Self::shared_config_path(root), &mut sources)?;
                let local = Self::read_optional(&Self::local_config_path(root), &mut sources)?;
                (shared, local)
            }
            None => (None, None),
        };

        let env = Self::env_overrides(|key| std::env::var(key).ok());

        Ok(ConfigLoadResult {
            config: Config {
                global,
                shared,
                local,
                env,
            },
            sources,
        })
    }

    /// Find the global config file, if any exists.
    fn global_config_path() -> Option<PathBuf> {
        // 1. Check $GITVER_CONFIG
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check $XDG_CONFIG_HOME/gitver/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("gitver/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.gitver/config.toml
        dirs::home_dir()
            .map(|home| home.join(".gitver/config.toml"))
            .filter(|path| path.exists())
    }

    /// Path of the shared (committed) repository config.
    pub fn shared_config_path(repo_root: &Path) -> PathBuf {
        repo_root.join(".gitver.toml")
    }

    /// Path of the local (uncommitted) repository config.
    pub fn local_config_path(repo_root: &Path) -> PathBuf {
        repo_root.join(".git/gitver/config.toml")
    }

    /// Collect overrides from environment variables.
    ///
    /// Takes a lookup function so callers (and tests) control the source.
    pub fn env_overrides(lookup: impl Fn(&str) -> Option<String>) -> ConfigFile {
        ConfigFile {
            branch: lookup(BRANCH_ENV).filter(|b| !b.trim().is_empty()),
            ..Default::default()
        }
    }

    fn read_optional(
        path: &Path,
        sources: &mut Vec<PathBuf>,
    ) -> Result<Option<ConfigFile>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let file = Self::read_config_file(path)?;
        sources.push(path.to_path_buf());
        Ok(Some(file))
    }

    /// Read and parse a config file.
    pub fn read_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Apply precedence, fill defaults, and validate.
    ///
    /// `overrides` is the highest-precedence layer (usually CLI flags).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the merged configuration is invalid.
    pub fn resolve(&self, overrides: ConfigFile) -> Result<VersionConfig, ConfigError> {
        let mut merged = self.global.clone();
        if let Some(shared) = &self.shared {
            merged = merged.merge(shared.clone());
        }
        if let Some(local) = &self.local {
            merged = merged.merge(local.clone());
        }
        let config = merged.merge(self.env.clone()).merge(overrides).resolve();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn resolve_empty_is_default() {
        let config = Config::default().resolve(ConfigFile::default()).unwrap();
        assert_eq!(config, VersionConfig::default());
    }

    #[test]
    fn load_repo_configs() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".git/gitver")).unwrap();
        fs::write(
            temp.path().join(".gitver.toml"),
            r#"
            strategy = "maven"
            commit_id_length = 12
            "#,
        )
        .unwrap();
        fs::write(
            temp.path().join(".git/gitver/config.toml"),
            "commit_id_length = 10\n",
        )
        .unwrap();

        let result = Config::load(Some(temp.path())).unwrap();
        assert!(result
            .sources
            .iter()
            .any(|p| p.ends_with(".gitver.toml")));

        let config = result.config.resolve(ConfigFile::default()).unwrap();
        assert_eq!(config.strategy, StrategyKind::Maven);
        // Local overrides shared
        assert_eq!(config.commit_id_length, 10);
    }

    #[test]
    fn overrides_win_over_files() {
        let config = Config {
            local: Some(ConfigFile {
                strategy: Some(StrategyKind::Maven),
                ..Default::default()
            }),
            ..Default::default()
        };

        let resolved = config
            .resolve(ConfigFile {
                strategy: Some(StrategyKind::Configurable),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(resolved.strategy, StrategyKind::Configurable);
    }

    #[test]
    fn env_branch_override() {
        let env = Config::env_overrides(|key| {
            (key == BRANCH_ENV).then(|| "release/1.x".to_string())
        });
        assert_eq!(env.branch.as_deref(), Some("release/1.x"));

        let blank = Config::env_overrides(|_| Some("  ".to_string()));
        assert!(blank.branch.is_none());
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(".gitver.toml"),
            r#"
            strategy = "maven"
            unknown_field = true
            "#,
        )
        .unwrap();

        let result = Config::load(Some(temp.path()));
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn invalid_values_rejected_on_resolve() {
        let config = Config {
            shared: Some(ConfigFile {
                default_base_version: Some("not-a-version".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(matches!(
            config.resolve(ConfigFile::default()),
            Err(ConfigError::InvalidValue(_))
        ));
    }
}
