//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--config <file>`: Extra configuration file, above repository files
//! - `--tag-pattern`, `--strategy`, `--maven-like`, `--non-qualifier-branch`,
//!   `--no-auto-increment-patch`, `--reference`: Configuration overrides

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::core::config::{ConfigFile, StrategyKind};
use crate::engine::MetadataKey;

/// gitver - Deterministic versions from Git history
#[derive(Parser, Debug)]
#[command(name = "gitver")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if gitver was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Read configuration from this file (layered above repository files)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Regular expression selecting release tags
    #[arg(long, global = true, value_name = "REGEX")]
    pub tag_pattern: Option<String>,

    /// Rendering strategy: configurable, maven or pattern
    #[arg(long, global = true, value_name = "STRATEGY")]
    pub strategy: Option<StrategyKind>,

    /// Produce maven compatible versions
    #[arg(long, global = true)]
    pub maven_like: bool,

    /// Branch that never gets a branch qualifier (repeatable)
    #[arg(long = "non-qualifier-branch", global = true, value_name = "BRANCH")]
    pub non_qualifier_branches: Vec<String>,

    /// Do not bump the patch component past a release tag
    #[arg(long, global = true)]
    pub no_auto_increment_patch: bool,

    /// Compute the version of this revision instead of HEAD
    #[arg(long, global = true, value_name = "REV")]
    pub reference: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Configuration overrides expressed by flags.
    ///
    /// Only flags that were given are set, so unset flags fall through to
    /// the configuration files.
    pub fn overrides(&self) -> ConfigFile {
        ConfigFile {
            tag_pattern: self.tag_pattern.clone(),
            strategy: self.strategy,
            maven_like: self.maven_like.then_some(true),
            non_qualifier_branches: (!self.non_qualifier_branches.is_empty())
                .then(|| self.non_qualifier_branches.clone()),
            auto_increment_patch: self.no_auto_increment_patch.then_some(false),
            reference: self.reference.clone(),
            ..Default::default()
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the version (default)
    #[command(
        name = "version",
        long_about = "Print the version computed from repository history.\n\n\
            The version is derived from the nearest reachable release tag, the \
            number of commits since that tag, the current branch and whether the \
            working tree has uncommitted changes.",
        after_help = "\
EXAMPLES:
    # Version of the current checkout
    gitver

    # Version of another revision
    gitver --reference release/2.x version

    # Maven friendly output
    gitver --maven-like"
    )]
    Version,

    /// Print one metadata value
    #[command(
        name = "meta",
        long_about = "Print one metadata value.\n\n\
            Exits with a non-zero status if the value cannot be derived for the \
            current state, for example BASE_TAG in a repository without release tags.",
        after_help = "\
EXAMPLES:
    gitver meta COMMIT_DISTANCE
    gitver meta GIT_SHA1_ABBREV
    gitver meta base_tag"
    )]
    Meta {
        /// Metadata key (e.g. COMMIT_TIMESTAMP, BASE_TAG)
        #[arg(value_name = "KEY")]
        key: MetadataKey,
    },

    /// Print every metadata value
    #[command(name = "show")]
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        long_about = "Generate shell completion scripts for tab-completion.\n\n\
            Outputs a completion script for the specified shell. Add the output \
            to your shell's configuration to enable tab-completion for gitver.",
        after_help = "\
EXAMPLES:
    # Bash (add to ~/.bashrc)
    gitver completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    gitver completion zsh >> ~/.zshrc

    # Fish
    gitver completion fish > ~/.config/fish/completions/gitver.fish

    # PowerShell
    gitver completion powershell >> $PROFILE"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_version() {
        let cli = Cli::try_parse_from(["gitver"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn meta_key_is_parsed() {
        let cli = Cli::try_parse_from(["gitver", "meta", "commit_distance"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Meta {
                key: MetadataKey::CommitDistance
            })
        );
    }

    #[test]
    fn unknown_meta_key_is_rejected() {
        assert!(Cli::try_parse_from(["gitver", "meta", "NOPE"]).is_err());
    }

    #[test]
    fn flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "gitver",
            "--strategy",
            "maven",
            "--non-qualifier-branch",
            "develop",
            "--non-qualifier-branch",
            "main",
            "--no-auto-increment-patch",
            "show",
            "--json",
        ])
        .unwrap();

        let overrides = cli.overrides();
        assert_eq!(overrides.strategy, Some(StrategyKind::Maven));
        assert_eq!(
            overrides.non_qualifier_branches,
            Some(vec!["develop".to_string(), "main".to_string()])
        );
        assert_eq!(overrides.auto_increment_patch, Some(false));
        assert_eq!(overrides.maven_like, None);
        assert_eq!(cli.command, Some(Command::Show { json: true }));
    }

    #[test]
    fn unset_flags_do_not_override() {
        let cli = Cli::try_parse_from(["gitver"]).unwrap();
        assert_eq!(cli.overrides(), ConfigFile::default());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["gitver", "version", "--maven-like"]).unwrap();
        assert!(cli.maven_like);
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        assert!(Cli::try_parse_from(["gitver", "--strategy", "semver"]).is_err());
    }
}
