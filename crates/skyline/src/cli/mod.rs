//! Command-line interface for skyline.
//!
//! This module provides the CLI structure for the `skyline` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, DecodeCommand, FavoritesCommand, LookupCommand, ServeCommand,
};

use crate::logging::Verbosity;

/// skyline - Travel companion backend
///
/// Decodes boarding pass barcodes, stores scan results, looks up flight
/// times and keeps a list of favorite flights.
#[derive(Debug, Parser)]
#[command(name = "skyline")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the decode HTTP service
    Serve(ServeCommand),

    /// Decode barcodes in a local image file
    Decode(DecodeCommand),

    /// Look up departure and arrival times of a flight
    Lookup(LookupCommand),

    /// Manage favorite flights
    #[command(subcommand)]
    Favorites(FavoritesCommand),

    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn cli_with(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            command: Command::Favorites(FavoritesCommand::Clear),
        }
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "skyline");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(cli_with(0, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli_with(3, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli_with(0, false).verbosity(), Verbosity::Normal);
        assert_eq!(cli_with(1, false).verbosity(), Verbosity::Verbose);
        assert_eq!(cli_with(2, false).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from(["skyline", "serve", "--host", "127.0.0.1", "-p", "9000"])
            .unwrap();
        match cli.command {
            Command::Serve(cmd) => {
                assert_eq!(cmd.host.as_deref(), Some("127.0.0.1"));
                assert_eq!(cmd.port, Some(9000));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_serve_defaults() {
        let cli = Cli::try_parse_from(["skyline", "serve"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Serve(ServeCommand {
                host: None,
                port: None
            })
        ));
    }

    #[test]
    fn test_parse_decode() {
        let cli = Cli::try_parse_from(["skyline", "decode", "ticket.png", "--json"]).unwrap();
        match cli.command {
            Command::Decode(cmd) => {
                assert_eq!(cmd.file, PathBuf::from("ticket.png"));
                assert!(cmd.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_lookup() {
        let cli = Cli::try_parse_from(["skyline", "lookup", "LH 400", "2024-03-01"]).unwrap();
        match cli.command {
            Command::Lookup(cmd) => {
                assert_eq!(cmd.flight, "LH 400");
                assert_eq!(cmd.date, "2024-03-01");
                assert!(!cmd.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_favorites_toggle() {
        let cli = Cli::try_parse_from(["skyline", "favorites", "toggle", "LH400"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Favorites(FavoritesCommand::Toggle { ref id }) if id == "LH400"
        ));
    }

    #[test]
    fn test_parse_config_validate() {
        let cli = Cli::try_parse_from(["skyline", "config", "validate", "-f", "/tmp/c.toml"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Validate { file: Some(_) })
        ));
    }

    #[test]
    fn test_parse_with_config() {
        let cli =
            Cli::try_parse_from(["skyline", "-c", "/custom/config.toml", "config", "path"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["skyline", "favorites", "list", "-v", "-q"]).unwrap();
        assert_eq!(cli.verbose, 1);
        assert!(cli.quiet);
    }

    #[test]
    fn test_lookup_requires_date() {
        assert!(Cli::try_parse_from(["skyline", "lookup", "LH400"]).is_err());
    }
}
