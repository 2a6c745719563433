//! CLI module: Clap argument parser, logging setup, output helpers, and
//! action implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

/// Setting this variable (to anything) turns the helper into a no-op.
pub const SKIP_ENV: &str = "PASS_GIT_HELPER_SKIP";

/// pass-git-helper: git credential helper backed by pass.
#[derive(Parser)]
#[command(
    name = "pass-git-helper",
    about = "Git credential helper using pass as the data source.",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Mapping file specifying how hosts map to pass entries (overrides the XDG config locations)
    #[arg(short, long, value_name = "MAPPING_FILE", global = true)]
    pub mapping: Option<PathBuf>,

    /// Print debug messages on stderr. Might include sensitive information
    #[arg(short, long, global = true)]
    pub logging: bool,
}

/// Actions of the git credential API, plus tooling.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Look up credentials for the request on stdin
    Get,

    /// Store credentials (not supported, pass is managed separately)
    Store,

    /// Erase credentials (not supported, pass is managed separately)
    Erase,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Commands {
    /// Whether git invoked this action through the credential API.
    pub fn is_credential_action(&self) -> bool {
        !matches!(self, Commands::Completions { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Commands::Get => "get",
            Commands::Store => "store",
            Commands::Erase => "erase",
            Commands::Completions { .. } => "completions",
        }
    }
}

/// Whether `PASS_GIT_HELPER_SKIP` asks us to do nothing.
pub fn skip_requested() -> bool {
    std::env::var_os(SKIP_ENV).is_some()
}

/// Install the stderr log subscriber.
///
/// `--logging` turns on debug output for this crate. Without it,
/// `RUST_LOG` is honored when set and nothing is logged otherwise.
pub fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("pass_git_helper=debug")
    } else {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => return,
        }
    };

    // stdout belongs to the credential protocol.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
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
    fn parses_action_and_global_flags() {
        let cli = Cli::try_parse_from(["pass-git-helper", "-m", "map.ini", "-l", "get"]).unwrap();
        assert!(matches!(cli.command, Commands::Get));
        assert_eq!(cli.mapping, Some(PathBuf::from("map.ini")));
        assert!(cli.logging);
    }

    #[test]
    fn flags_may_follow_the_action() {
        let cli = Cli::try_parse_from(["pass-git-helper", "get", "--mapping", "m.ini"]).unwrap();
        assert_eq!(cli.mapping, Some(PathBuf::from("m.ini")));
        assert!(!cli.logging);
    }

    #[test]
    fn rejects_unknown_action() {
        assert!(Cli::try_parse_from(["pass-git-helper", "fetch"]).is_err());
    }

    #[test]
    fn completions_are_not_a_credential_action() {
        let cli = Cli::try_parse_from(["pass-git-helper", "completions", "bash"]).unwrap();
        assert!(!cli.command.is_credential_action());
        assert!(Commands::Store.is_credential_action());
        assert_eq!(Commands::Erase.name(), "erase");
    }
}
