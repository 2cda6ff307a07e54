use anyhow::Result;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use crate::guest::noop::NOOP_GUEST;

#[derive(Parser, Debug)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = env!("CARGO_PKG_DESCRIPTION"),
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List installed plugins, communicators, guests and capabilities
    List(ListArgs),

    /// Validate the given machine manifest
    Validate(ManifestArgs),

    /// Select backends for every machine and wait until each is ready
    Check(ManifestArgs),

    /// Invoke a guest capability
    Invoke(InvokeArgs),

    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

impl Commands {
    /// Returns the log level requested by the subcommand.
    pub fn log_level(&self) -> LogLevel {
        match self {
            Commands::List(opts) => opts.log_level,
            Commands::Validate(opts) | Commands::Check(opts) => opts.log_level,
            Commands::Invoke(opts) => opts.log_level,
            Commands::Completions(_) => LogLevel::Warn,
        }
    }
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Set the log level
    #[arg(short, long, default_value = "info")]
    pub log_level: LogLevel,
}

#[derive(Args, Debug)]
pub struct ManifestArgs {
    /// Path to the YAML machine manifest
    #[arg(short, long, default_value = "machines.yml")]
    pub file: Utf8PathBuf,

    /// Set the log level
    #[arg(short, long, default_value = "info")]
    pub log_level: LogLevel,
}

#[derive(Args, Debug)]
pub struct InvokeArgs {
    /// Guest whose capability is invoked
    #[arg(short, long, default_value = NOOP_GUEST)]
    pub guest: String,

    /// Capability name (e.g. change_host_name)
    #[arg(short, long)]
    pub capability: String,

    /// Positional capability arguments, each parsed as a YAML value
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Set the log level
    #[arg(short, long, default_value = "info")]
    pub log_level: LogLevel,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}

/// Represents log levels for controlling the verbosity of logging output.
///
/// This enum maps directly to the log levels used by the `tracing` crate.
/// For example, specifying `--log-level debug` also shows every registration
/// and every skipped no-op capability.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

pub fn parse_args() -> Result<Cli> {
    Ok(Cli::parse())
}
