//! engine::calculator
//!
//! The public facade: owns the repository handle and serves queries from a
//! snapshot computed at most once.
//!
//! # Lifecycle
//!
//! ```text
//! CalculatorBuilder ──open()──▶ VersionCalculator (Open) ──close()──▶ Closed
//! ```
//!
//! The builder is the uninitialized state. An open calculator answers any
//! number of [`version`](VersionCalculator::version) and
//! [`meta`](VersionCalculator::meta) calls from the same snapshot, computed
//! on first access. A failed computation is not cached; the next query
//! retries. After [`close`](VersionCalculator::close) every query fails with
//! [`VersionError::InvalidState`]. Dropping the calculator closes it.
//!
//! # Concurrency
//!
//! The reader sits behind a mutex and the snapshot behind a `OnceCell`, so
//! concurrent queries on one calculator never trigger a second traversal.
//!
//! # Example
//!
//! ```ignore
//! use gitver::engine::{CalculatorBuilder, MetadataKey};
//!
//! let calculator = CalculatorBuilder::location(".").open()?;
//! println!("{}", calculator.version()?);
//! println!("{:?}", calculator.meta(MetadataKey::CommitDistance)?);
//! calculator.close();
//! ```

use std::path::PathBuf;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

use super::metadata::{Metadata, MetadataKey};
use super::resolve::{Resolver, VersionSnapshot};
use super::walker::TraversalResult;
use crate::core::config::{Config, ConfigError, ConfigFile, VersionConfig};
use crate::git::{Git, GitError, RepositoryReader};

/// Errors from the version calculator.
#[derive(Debug, Error)]
pub enum VersionError {
    /// The repository could not be opened or read.
    #[error("repository access failed: {0}")]
    RepositoryAccess(#[from] GitError),

    /// The configuration is invalid; raised before any traversal.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    /// The calculator was used outside the open state.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

/// Calculator lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalculatorState {
    Open,
    Closed,
}

impl CalculatorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalculatorState::Open => "open",
            CalculatorState::Closed => "closed",
        }
    }
}

impl std::fmt::Display for CalculatorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where and how to calculate, before the repository is opened.
#[derive(Debug, Clone)]
pub struct CalculatorBuilder {
    location: PathBuf,
    config: Option<VersionConfig>,
    overrides: ConfigFile,
}

impl CalculatorBuilder {
    /// Start from a path inside the repository.
    pub fn location(path: impl Into<PathBuf>) -> Self {
        Self {
            location: path.into(),
            config: None,
            overrides: ConfigFile::default(),
        }
    }

    /// Use this configuration as is, skipping configuration files.
    pub fn config(mut self, config: VersionConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Highest-precedence layer on top of the configuration files.
    ///
    /// Ignored when an explicit [`config`](Self::config) is set.
    pub fn overrides(mut self, overrides: ConfigFile) -> Self {
        self.overrides = overrides;
        self
    }

    /// Open the repository and validate the configuration.
    ///
    /// # Errors
    ///
    /// - `RepositoryAccess` if no repository contains the location
    /// - `InvalidConfiguration` if configuration files or values are invalid
    pub fn open(self) -> Result<VersionCalculator<Git>, VersionError> {
        let git = Git::open(&self.location)?;

        let config = match self.config {
            Some(config) => config,
            None => {
                let info = git.info();
                let root = info.work_dir.as_deref();
                let loaded = Config::load(root)?;
                for source in &loaded.sources {
                    debug!(path = %source.display(), "loaded configuration");
                }
                loaded.config.resolve(self.overrides)?
            }
        };

        VersionCalculator::from_reader(git, &config)
    }
}

/// Open calculator over a repository reader.
pub struct VersionCalculator<R = Git> {
    reader: Mutex<Option<R>>,
    snapshot: OnceCell<VersionSnapshot>,
    resolver: Resolver,
}

impl<R: RepositoryReader> VersionCalculator<R> {
    /// Wrap an already open reader.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the configuration does not compile.
    pub fn from_reader(reader: R, config: &VersionConfig) -> Result<Self, VersionError> {
        let resolver = Resolver::new(config)?;
        Ok(Self {
            reader: Mutex::new(Some(reader)),
            snapshot: OnceCell::new(),
            resolver,
        })
    }

    fn snapshot(&self) -> Result<&VersionSnapshot, VersionError> {
        let guard = self.reader.lock();
        let reader = guard.as_ref().ok_or_else(closed)?;
        let snapshot = self.snapshot.get_or_try_init(|| {
            debug!("computing version snapshot");
            self.resolver.resolve(reader)
        })?;
        Ok(snapshot)
    }

    /// The rendered version string.
    pub fn version(&self) -> Result<String, VersionError> {
        Ok(self.snapshot()?.version.clone())
    }

    /// One metadata value, `None` if it cannot be derived for this state.
    pub fn meta(&self, key: MetadataKey) -> Result<Option<String>, VersionError> {
        Ok(self.snapshot()?.metadata.get(key).map(str::to_string))
    }

    /// The whole metadata bundle.
    pub fn metadata(&self) -> Result<Metadata, VersionError> {
        Ok(self.snapshot()?.metadata.clone())
    }

    /// Tags found by the history walk and the selected base.
    pub fn traversal(&self) -> Result<TraversalResult, VersionError> {
        Ok(self.snapshot()?.traversal.clone())
    }
}

impl<R> VersionCalculator<R> {
    pub fn state(&self) -> CalculatorState {
        if self.reader.lock().is_some() {
            CalculatorState::Open
        } else {
            CalculatorState::Closed
        }
    }

    /// Release the repository handle. Safe to call more than once.
    pub fn close(&self) {
        if self.reader.lock().take().is_some() {
            debug!("calculator closed");
        }
    }
}

impl<R> Drop for VersionCalculator<R> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<R> std::fmt::Debug for VersionCalculator<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionCalculator")
            .field("state", &self.state())
            .field("computed", &self.snapshot.get().is_some())
            .finish()
    }
}

fn closed() -> VersionError {
    VersionError::InvalidState("calculator is closed".to_string())
}
