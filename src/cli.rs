// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::engine::InputOptions;

/// Command-line arguments for `phpguard`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "phpguard",
    version,
    about = "Watch a PHP project and re-run the tests for the files you change.",
    long_about = None
)]
pub struct CliArgs {
    /// Project directory holding `phpguard.yml` (or `phpguard.yml.dist`).
    ///
    /// Default: the current working directory.
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Force code coverage on, whatever the config says.
    #[arg(long)]
    pub coverage: bool,

    /// Only run rules carrying one of these tags (comma separated).
    #[arg(long, value_name = "TAGS", value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Only run rules in this group.
    #[arg(long, value_name = "NAME")]
    pub group: Option<String>,

    /// Run every plugin's full suite at startup.
    #[arg(long)]
    pub all: bool,

    /// Run every full suite once and exit instead of watching.
    #[arg(long)]
    pub once: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PHPGUARD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load and validate the config, print the rules, run nothing.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// The flags handlers see through the context.
    pub fn input_options(&self) -> InputOptions {
        InputOptions {
            coverage: self.coverage,
            tags: self
                .tags
                .iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            group: self.group.clone(),
        }
    }
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

pub fn parse() -> CliArgs {
    CliArgs::parse()
}
