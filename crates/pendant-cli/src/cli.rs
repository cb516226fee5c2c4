//! CLI argument definitions for `pendant-data`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use pendant_persistence::Domain;

#[derive(Parser)]
#[command(
    name = "pendant-data",
    version,
    about = "Inspect, back up and restore teaching pendant data",
    long_about = "Maintenance tool for the teaching pendant data directory.\n\n\
                  Shows the state of the four domain files, prints their contents\n\
                  and manages timestamped backups."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Data directory (default: <AppData>/TeachingPendantData).
    #[arg(long = "data-dir", value_name = "DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the state of every domain file.
    Status,

    /// Print one domain's data as JSON.
    Show {
        /// movement, teaching, setup or system.
        #[arg(value_name = "DOMAIN")]
        domain: Domain,
    },

    /// Copy the domain files into a new timestamped backup.
    Backup,

    /// List backups, newest first.
    Backups,

    /// Restore a backup by folder name.
    Restore {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Write the effective settings to persistence.toml.
    InitConfig {
        /// Target file (default: the user's config directory).
        #[arg(long, value_name = "PATH")]
        path: Option<PathBuf>,

        /// Replace an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
