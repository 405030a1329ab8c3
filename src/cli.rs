// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `pedigree`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pedigree",
    version,
    about = "Generate a static family history site from an ancestry.",
    long_about = None
)]
pub struct CliArgs {
    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PEDIGREE_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Generate the site.
    Generate {
        /// Path to the project file (TOML).
        #[arg(long, value_name = "PATH", default_value = "Pedigree.toml")]
        config: PathBuf,

        /// Path to the ancestry file (TOML).
        #[arg(long, value_name = "PATH")]
        ancestry: PathBuf,

        /// Override `[project].concurrency`.
        #[arg(long, value_name = "N")]
        concurrency: Option<usize>,
    },

    /// Resolve the selected plugins and print their batches, without
    /// generating anything.
    Plugins {
        /// Path to the project file (TOML).
        #[arg(long, value_name = "PATH", default_value = "Pedigree.toml")]
        config: PathBuf,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
