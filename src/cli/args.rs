//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Live-preview engine CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: preview.toml, searched upward)
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Load a project once and report diagnostics and triaged errors
    #[command(visible_alias = "c")]
    Check {
        /// Project directory (default: [watch].root or the current directory)
        #[arg(value_hint = clap::ValueHint::DirPath)]
        dir: Option<PathBuf>,

        /// Write the debug export as JSON to this file
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        export: Option<PathBuf>,
    },

    /// Load a project and keep applying file changes until Ctrl+C
    #[command(visible_alias = "w")]
    Watch {
        /// Project directory (default: [watch].root or the current directory)
        #[arg(value_hint = clap::ValueHint::DirPath)]
        dir: Option<PathBuf>,
    },
}

impl Cli {
    /// Directory argument of the active subcommand, if one was given.
    pub fn dir(&self) -> Option<&PathBuf> {
        match &self.command {
            Commands::Check { dir, .. } | Commands::Watch { dir } => dir.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_check_with_export() {
        let cli = Cli::parse_from(["preview", "check", "app", "--export", "out.json", "-v"]);
        assert!(cli.verbose);
        assert_eq!(cli.dir(), Some(&PathBuf::from("app")));
        match cli.command {
            Commands::Check { export, .. } => assert_eq!(export, Some(PathBuf::from("out.json"))),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_watch_defaults() {
        let cli = Cli::parse_from(["preview", "--color", "never", "watch"]);
        assert_eq!(cli.color, ColorChoice::Never);
        assert!(cli.config.is_none());
        assert!(cli.dir().is_none());
    }
}
