//! `phub serve` — Start the HTTP tracing server.

use clap::Args;
use probehub_api::server::{AppState, serve};
use probehub_bpf::registry::ProbeRegistry;
use probehub_common::constants::{DEFAULT_HOST, DEFAULT_PORT};
use probehub_store::ArtifactStore;

use crate::commands::Cli;

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Host to bind to.
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to bind to.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

/// Executes the `serve` command.
///
/// Validates the configuration, builds the process-scoped registry and
/// store, and runs the server until ctrl-c.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the store cannot be
/// opened, or the server fails.
pub fn execute(cli: &Cli, args: &ServeArgs) -> anyhow::Result<()> {
    let config = cli.config(Some(args.host.clone()), Some(args.port));
    config.validate()?;

    let registry = ProbeRegistry::with_default_backend(&config.programs_dir);
    let store = ArtifactStore::open(&config.context_dir)?;
    let state = AppState::new(registry, store);

    tracing::info!(
        programs_dir = %config.programs_dir.display(),
        context_dir = %config.context_dir.display(),
        "starting probehub"
    );

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(serve(&config, state))?;
    Ok(())
}
