//! Tool dispatch: resolve a tool name to a probe and an effect.
//!
//! The tool table is the single source of truth for what the server can
//! do; a name missing from it is `NotFound`, never an unhandled branch.

use probehub_bpf::registry::ProbeRegistry;
use probehub_bpf::sysinfo;
use probehub_common::error::{ProbehubError, Result};
use probehub_store::ArtifactStore;
use serde::Serialize;
use serde_json::{Map, Value, json};

/// A user-invocable tool backed by a named kernel probe.
#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    /// Name the tool is invoked by.
    pub name: &'static str,
    /// Human-readable description for discovery.
    pub description: &'static str,
    /// Probe program the tool loads.
    pub program: &'static str,
}

/// Tools built into this server, one per shipped probe program.
pub const BUILTIN_TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "syscall_trace",
        description: "Trace system call entry and exit latency per process.",
        program: "syscall_trace",
    },
    ToolSpec {
        name: "network_monitor",
        description: "Monitor socket creation and outbound TCP connections.",
        program: "network_monitor",
    },
];

/// Capability names advertised by the metadata endpoint.
#[must_use]
pub fn capability_names() -> Vec<&'static str> {
    BUILTIN_TOOLS.iter().map(|t| t.name).collect()
}

/// Resolves a tool name against the built-in table.
///
/// # Errors
///
/// Returns [`ProbehubError::NotFound`] for a name not in the table.
pub fn find_tool(name: &str) -> Result<&'static ToolSpec> {
    BUILTIN_TOOLS
        .iter()
        .find(|t| t.name == name)
        .ok_or_else(|| ProbehubError::NotFound {
            kind: "tool",
            id: name.to_string(),
        })
}

/// Result of a successful tool execution.
#[derive(Debug, Clone, Serialize)]
pub struct ToolOutcome {
    /// Always `"success"` for a completed execution.
    pub status: &'static str,
    /// Human-readable summary.
    pub message: String,
}

/// Executes a tool: load-or-reuse its probe, then publish run context.
///
/// Publishes a map artifact describing the run and refreshes the metadata
/// artifact with the current loaded-program set.
///
/// # Errors
///
/// Returns [`ProbehubError::NotFound`] for an unknown tool or missing probe
/// source, [`ProbehubError::Load`] if compile/attach fails, and
/// [`ProbehubError::Io`] if artifact publication fails.
pub fn execute(
    registry: &mut ProbeRegistry,
    store: &ArtifactStore,
    tool_name: &str,
    params: &Value,
) -> Result<ToolOutcome> {
    let spec = find_tool(tool_name)?;
    let probe = registry.load(spec.program)?.name().to_string();
    tracing::info!(tool = tool_name, probe = %probe, "tool executed");

    store.write_map(
        spec.name,
        &json!({
            "tool": spec.name,
            "program": spec.program,
            "params": params,
        }),
    )?;

    let mut fields = Map::new();
    let _ = fields.insert("capabilities".to_string(), json!(capability_names()));
    let _ = fields.insert(
        "loaded_programs".to_string(),
        json!(registry.loaded_names()),
    );
    let _ = fields.insert(
        "kernel_version".to_string(),
        json!(sysinfo::kernel_version()),
    );
    store.write_metadata(&fields)?;

    Ok(ToolOutcome {
        status: "success",
        message: format!("Tool {tool_name} executed successfully"),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use probehub_bpf::backend::{LoadedProbe, ProbeBackend};

    use super::*;

    #[derive(Debug)]
    struct StubProbe(String);

    impl LoadedProbe for StubProbe {
        fn name(&self) -> &str {
            &self.0
        }
    }

    struct StubBackend {
        calls: Arc<AtomicUsize>,
    }

    impl ProbeBackend for StubBackend {
        fn compile_and_attach(&self, name: &str, _source: &str) -> Result<Box<dyn LoadedProbe>> {
            let _ = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(StubProbe(name.to_string())))
        }
    }

    fn fixture() -> (
        tempfile::TempDir,
        ProbeRegistry,
        ArtifactStore,
        Arc<AtomicUsize>,
    ) {
        let dir = tempfile::tempdir().expect("tempdir");
        let programs = dir.path().join("bpf_programs");
        std::fs::create_dir_all(&programs).expect("mkdir programs");
        std::fs::write(programs.join("syscall_trace.c"), "int p;").expect("write source");

        let calls = Arc::new(AtomicUsize::new(0));
        let registry = ProbeRegistry::new(
            programs,
            Box::new(StubBackend {
                calls: Arc::clone(&calls),
            }),
        );
        let store = ArtifactStore::open(dir.path().join("context")).expect("open store");
        (dir, registry, store, calls)
    }

    #[test]
    fn execute_loads_probe_and_publishes_artifacts() {
        let (_dir, mut registry, store, calls) = fixture();

        let outcome = execute(&mut registry, &store, "syscall_trace", &json!({"pid": 1}))
            .expect("execute");
        assert_eq!(outcome.status, "success");
        assert!(registry.is_loaded("syscall_trace"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let map_text =
            std::fs::read_to_string(store.map_path("syscall_trace")).expect("map artifact");
        let map: Value = serde_json::from_str(&map_text).expect("parse map");
        assert_eq!(map["params"]["pid"], json!(1));

        let meta_text = std::fs::read_to_string(store.metadata_path()).expect("metadata");
        let meta: Value = serde_json::from_str(&meta_text).expect("parse metadata");
        assert_eq!(meta["loaded_programs"], json!(["syscall_trace"]));
    }

    #[test]
    fn execute_twice_reuses_the_probe() {
        let (_dir, mut registry, store, calls) = fixture();

        let _ = execute(&mut registry, &store, "syscall_trace", &json!({})).expect("first");
        let _ = execute(&mut registry, &store, "syscall_trace", &json!({})).expect("second");
        assert_eq!(calls.load(Ordering::SeqCst), 1, "probe compiled once");
    }

    #[test]
    fn unknown_tool_is_not_found() {
        let (_dir, mut registry, store, _calls) = fixture();

        let err = execute(&mut registry, &store, "unknown_tool", &json!({}))
            .expect_err("unknown tool");
        assert!(matches!(
            err,
            ProbehubError::NotFound { kind: "tool", .. }
        ));
    }

    #[test]
    fn known_tool_with_missing_source_is_not_found() {
        let (_dir, mut registry, store, _calls) = fixture();

        // network_monitor is in the tool table but its source is not on disk.
        let err = execute(&mut registry, &store, "network_monitor", &json!({}))
            .expect_err("missing source");
        assert!(matches!(err, ProbehubError::NotFound { .. }));
    }
}
