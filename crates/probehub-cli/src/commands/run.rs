//! `phub run` — Run a tracing tool directly, without the server.

use clap::Args;
use probehub_api::dispatch;
use probehub_bpf::registry::ProbeRegistry;
use probehub_common::error::ProbehubError;
use probehub_store::ArtifactStore;

use crate::commands::Cli;

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Tool name to run.
    pub tool: String,

    /// Tool parameters as a JSON object.
    #[arg(short, long, default_value = "{}")]
    pub params: String,
}

/// Executes the `run` command.
///
/// Builds the same components the server uses, dispatches the tool once,
/// prints the outcome as JSON, and releases the probe before exiting.
///
/// # Errors
///
/// Returns an error if `--params` is not valid JSON, the tool is unknown,
/// or probe loading fails.
pub fn execute(cli: &Cli, args: &RunArgs) -> anyhow::Result<()> {
    let config = cli.config(None, None);
    config.validate()?;

    let params: serde_json::Value =
        serde_json::from_str(&args.params).map_err(|e| ProbehubError::Config {
            message: format!("invalid --params JSON: {e}"),
        })?;

    let mut registry = ProbeRegistry::with_default_backend(&config.programs_dir);
    let store = ArtifactStore::open(&config.context_dir)?;

    let outcome = dispatch::execute(&mut registry, &store, &args.tool, &params)?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    registry.unload_all();
    Ok(())
}
