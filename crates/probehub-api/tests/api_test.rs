//! End-to-end tests for the HTTP surface.
//!
//! Each test binds a real listener on an ephemeral port, serves the router
//! over a stub probe backend, and drives it with an HTTP client:
//! 1. Capability metadata shape
//! 2. Tool discovery
//! 3. Successful dispatch + published artifacts
//! 4. Error-to-status mapping (unknown tool, missing probe source)

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::net::SocketAddr;
use std::sync::Arc;

use probehub_api::server::{AppState, router};
use probehub_bpf::backend::{LoadedProbe, ProbeBackend};
use probehub_bpf::registry::ProbeRegistry;
use probehub_common::error::Result;
use probehub_store::ArtifactStore;
use serde_json::{Value, json};

#[derive(Debug)]
struct StubProbe(String);

impl LoadedProbe for StubProbe {
    fn name(&self) -> &str {
        &self.0
    }
}

struct StubBackend;

impl ProbeBackend for StubBackend {
    fn compile_and_attach(&self, name: &str, _source: &str) -> Result<Box<dyn LoadedProbe>> {
        Ok(Box::new(StubProbe(name.to_string())))
    }
}

/// Serves the router over a tempdir fixture; returns the base URL and the
/// tempdir (kept alive for the test's duration).
async fn spawn_server() -> (String, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let programs = dir.path().join("bpf_programs");
    std::fs::create_dir_all(&programs).expect("mkdir programs");
    std::fs::write(programs.join("syscall_trace.c"), "int p;").expect("write source");

    let registry = ProbeRegistry::new(programs, Box::new(StubBackend));
    let store = ArtifactStore::open(dir.path().join("context")).expect("open store");
    let state = AppState::new(registry, store);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr: SocketAddr = listener.local_addr().expect("local addr");
    let app = router(Arc::clone(&state));
    let _server = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });

    (format!("http://{addr}"), dir)
}

#[tokio::test]
async fn metadata_endpoint_reports_capabilities() {
    let (base, _dir) = spawn_server().await;

    let body: Value = reqwest::get(format!("{base}/.well-known/mcp/metadata.json"))
        .await
        .expect("request")
        .json()
        .await
        .expect("json body");

    assert!(body["version"].is_string());
    assert!(!body["kernel_version"].as_str().expect("kernel_version").is_empty());
    let capabilities = body["capabilities"].as_array().expect("capabilities");
    assert!(capabilities.contains(&json!("syscall_trace")));
    assert!(capabilities.contains(&json!("network_monitor")));
}

#[tokio::test]
async fn tool_listing_includes_descriptions() {
    let (base, _dir) = spawn_server().await;

    let body: Value = reqwest::get(format!("{base}/api/tools"))
        .await
        .expect("request")
        .json()
        .await
        .expect("json body");

    let tools = body["tools"].as_array().expect("tools");
    assert_eq!(tools.len(), 2);
    assert!(tools.iter().all(|t| t["description"].is_string()));
}

#[tokio::test]
async fn known_tool_dispatch_succeeds_and_publishes_artifacts() {
    let (base, dir) = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/api/tools/syscall_trace"))
        .json(&json!({"pid": 42}))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("json body");
    assert_eq!(body["status"], json!("success"));
    assert!(body["message"].is_string());

    let map_path = dir
        .path()
        .join("context")
        .join("maps")
        .join("syscall_trace.json");
    let map: Value =
        serde_json::from_str(&std::fs::read_to_string(map_path).expect("map artifact"))
            .expect("parse map");
    assert_eq!(map["params"]["pid"], json!(42));

    let metadata_path = dir.path().join("context").join("metadata.json");
    let metadata: Value =
        serde_json::from_str(&std::fs::read_to_string(metadata_path).expect("metadata"))
            .expect("parse metadata");
    assert_eq!(metadata["loaded_programs"], json!(["syscall_trace"]));
    assert!(metadata["last_updated"].is_string());
}

#[tokio::test]
async fn unknown_tool_maps_to_404() {
    let (base, _dir) = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/api/tools/unknown_tool"))
        .json(&json!({}))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 404);

    let body: Value = response.json().await.expect("json body");
    assert!(body["detail"].as_str().expect("detail").contains("unknown_tool"));
}

#[tokio::test]
async fn missing_probe_source_maps_to_404() {
    let (base, _dir) = spawn_server().await;
    let client = reqwest::Client::new();

    // network_monitor is a known tool, but the fixture ships no source for it.
    let response = client
        .post(format!("{base}/api/tools/network_monitor"))
        .json(&json!({}))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 404);
}
