//! `phub info` — Report the host's kernel and BPF capabilities.

use clap::Args;
use probehub_bpf::sysinfo::SystemInfo;

/// Arguments for the `info` command.
#[derive(Args, Debug)]
pub struct InfoArgs {}

/// Executes the `info` command.
///
/// Prints the host capability snapshot as pretty JSON.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be serialized.
pub fn execute(_args: &InfoArgs) -> anyhow::Result<()> {
    let info = SystemInfo::collect();
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}
