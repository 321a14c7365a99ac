//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Serve command arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Address to bind (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides config and PORT)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Decode command arguments.
#[derive(Debug, Args)]
pub struct DecodeCommand {
    /// Image file to scan
    pub file: PathBuf,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Lookup command arguments.
#[derive(Debug, Args)]
pub struct LookupCommand {
    /// Flight designator, e.g. "LH 400"
    pub flight: String,

    /// Departure date, e.g. 2024-03-01
    pub date: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Favorite flight commands.
#[derive(Debug, Subcommand)]
pub enum FavoritesCommand {
    /// List favorite flight ids
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Add or remove a favorite
    Toggle {
        /// Flight id
        id: String,
    },

    /// Check whether an id is a favorite
    Check {
        /// Flight id
        id: String,
    },

    /// Remove all favorites
    Clear,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
