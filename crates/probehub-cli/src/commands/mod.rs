//! CLI command definitions and dispatch.

pub mod info;
pub mod run;
pub mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use probehub_common::config::ProbehubConfig;
use probehub_common::constants::{DEFAULT_CONTEXT_DIR, DEFAULT_PROGRAMS_DIR};

/// probehub — kernel tracing context server.
#[derive(Parser, Debug)]
#[command(name = "phub", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Directory containing probe source files.
    #[arg(long, global = true, default_value = DEFAULT_PROGRAMS_DIR)]
    pub programs_dir: PathBuf,

    /// Base directory for published context artifacts.
    #[arg(long, global = true, default_value = DEFAULT_CONTEXT_DIR)]
    pub context_dir: PathBuf,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP tracing server.
    Serve(serve::ServeArgs),
    /// Run a tracing tool directly, without the server.
    Run(run::RunArgs),
    /// Report the host's kernel and BPF capabilities.
    Info(info::InfoArgs),
}

impl Cli {
    /// Builds the runtime configuration from the global flags.
    #[must_use]
    pub fn config(&self, host: Option<String>, port: Option<u16>) -> ProbehubConfig {
        let defaults = ProbehubConfig::default();
        ProbehubConfig {
            programs_dir: self.programs_dir.clone(),
            context_dir: self.context_dir.clone(),
            host: host.unwrap_or(defaults.host),
            port: port.unwrap_or(defaults.port),
        }
    }
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match &cli.command {
        Command::Serve(args) => serve::execute(&cli, args),
        Command::Run(args) => run::execute(&cli, args),
        Command::Info(args) => info::execute(args),
    }
}
