//! preview - live-preview coordination engine CLI.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};

use preview_core::cli::{Cli, Commands, check::run_check, watch::run_watch};
use preview_core::config::PreviewConfig;
use preview_core::logger;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let start = match cli.dir() {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("failed to read current directory")?,
    };
    let config = PreviewConfig::load(cli.config.as_deref(), &start)?;

    match &cli.command {
        Commands::Check { dir, export } => {
            let report = run_check(config, dir.as_deref(), export.as_deref())?;
            Ok(if report.is_clean() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Watch { dir } => {
            run_watch(config, dir.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
