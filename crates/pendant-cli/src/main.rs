//! Teaching pendant data maintenance CLI.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use pendant_cli::commands::{
    run_backup, run_backups, run_init_config, run_restore, run_show, run_status,
};
use pendant_cli::logging::{LogConfig, LogFormat, init_logging};
use pendant_cli::summary::{backups_table, save_table, status_table};
use pendant_persistence::{FileState, PersistenceConfig};

mod cli;

use crate::cli::{Cli, Command, LogFormatArg};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }

    let mut config = PersistenceConfig::load();
    if let Some(dir) = &cli.data_dir {
        config.data_dir = Some(dir.clone());
    }

    let exit_code = match cli.command {
        Command::Status => {
            let statuses = run_status(&config);
            println!("Data: {}", config.layout().root().display());
            println!("{}", status_table(&statuses));
            let broken = statuses.iter().any(|s| {
                matches!(
                    s.state,
                    FileState::Corrupt { .. } | FileState::Unreadable { .. }
                )
            });
            i32::from(broken)
        }
        Command::Show { domain } => match run_show(&config, domain) {
            Ok(json) => {
                println!("{json}");
                0
            }
            Err(error) => fail(&error),
        },
        Command::Backup => match run_backup(&config) {
            Ok(dir) => {
                println!("Backup created: {}", dir.display());
                0
            }
            Err(error) => fail(&error),
        },
        Command::Backups => {
            let backups = run_backups(&config);
            if backups.is_empty() {
                println!("No backups in {}", config.layout().backup_root().display());
            } else {
                println!("{}", backups_table(&backups));
            }
            0
        }
        Command::Restore { name } => match run_restore(&config, &name) {
            Ok(report) => {
                println!("{}", save_table(&report));
                i32::from(!report.is_success())
            }
            Err(error) => fail(&error),
        },
        Command::InitConfig { path, force } => {
            let path = path.unwrap_or_else(PersistenceConfig::config_path);
            match run_init_config(&config, &path, force) {
                Ok(()) => {
                    println!("Settings written: {}", path.display());
                    0
                }
                Err(error) => fail(&error),
            }
        }
    };
    std::process::exit(exit_code);
}

fn fail(error: &anyhow::Error) -> i32 {
    eprintln!("error: {error:#}");
    1
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !cli.verbosity.is_present();
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
