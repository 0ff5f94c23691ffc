//! Command-line interface of the `js5` binary.
//!
//! The cache directory comes from `--root` or the `JS5_CACHE_ROOT`
//! environment variable.
//!
//! # Example
//!
//! ```no_run
//! use clap::Parser;
//! use js5_tools::cli::{Cli, Command};
//!
//! let cli = Cli::parse_from(["js5", "--root", "./cache", "verify"]);
//! assert!(matches!(cli.command, Command::Verify { .. }));
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Maintenance tools for JS5 caches
#[derive(Debug, Clone, Parser)]
#[command(name = "js5", about = "Maintenance tools for JS5 caches", version)]
pub struct Cli {
    /// Cache directory
    #[arg(long, short, env = "JS5_CACHE_ROOT", default_value = "./cache")]
    pub root: PathBuf,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Tool to run
    #[command(subcommand)]
    pub command: Command,
}

/// Tools
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Check every listed file against its reference table
    Verify,

    /// Copy the cache into a new, contiguous store
    Defrag {
        /// Directory of the new store, which must not hold one yet
        output: PathBuf,
    },

    /// Repair damaged files from another copy of the cache
    Aggregate {
        /// Directory of the other cache
        other: PathBuf,
    },

    /// Print the checksum table served to clients
    Checksum {
        /// Include Whirlpool digests and the trailer
        #[arg(long)]
        whirlpool: bool,

        /// Write the encoded table to this file
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// List the entries of one type's reference table
    Dump {
        /// Type to list
        #[arg(value_parser = clap::value_parser!(u8).range(0..255))]
        type_id: u8,
    },
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["js5", "--root", "/srv/cache", "defrag", "/tmp/out"]).unwrap();
        assert_eq!(cli.root, PathBuf::from("/srv/cache"));
        assert!(matches!(cli.command, Command::Defrag { ref output } if output == &PathBuf::from("/tmp/out")));

        let cli = Cli::try_parse_from(["js5", "checksum", "--whirlpool", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Command::Checksum {
                whirlpool: true,
                output: None
            }
        ));

        assert!(Cli::try_parse_from(["js5", "dump", "255"]).is_err());
        assert!(Cli::try_parse_from(["js5", "dump", "3"]).is_ok());
    }
}
