// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `cascade`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "cascade",
    version,
    about = "Incremental asset pipeline: compile, minify and aggregate files as they change.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the settings file (TOML).
    ///
    /// A missing file means default settings.
    #[arg(long, value_name = "PATH", default_value = "Cascade.toml")]
    pub settings: String,

    /// Project root to scan and watch.
    ///
    /// Default: the directory containing the settings file.
    #[arg(long, value_name = "DIR")]
    pub root: Option<String>,

    /// Process every handled file under the root once, then exit.
    #[arg(long)]
    pub once: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CASCADE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the engine set and which engines would handle each file, but
    /// don't write anything.
    #[arg(long)]
    pub dry_run: bool,
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
