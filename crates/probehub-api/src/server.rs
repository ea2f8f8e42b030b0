//! The axum HTTP surface.
//!
//! Routes:
//! - `GET /.well-known/mcp/metadata.json` — capability metadata.
//! - `GET /api/tools` — tool discovery with descriptions.
//! - `POST /api/tools/{tool_name}` — dispatch a tool with JSON params.
//!
//! Errors map to statuses at this boundary: `NotFound` → 404, `Load` → 502,
//! everything else → 500, all with a `{"detail": ...}` body.

use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use probehub_bpf::registry::ProbeRegistry;
use probehub_bpf::sysinfo;
use probehub_common::config::ProbehubConfig;
use probehub_common::error::{ProbehubError, Result};
use probehub_store::ArtifactStore;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::dispatch::{self, ToolOutcome};

/// Shared server state, injected at construction.
///
/// The registry and store are single-writer by design; the mutexes make
/// that explicit now that requests are handled concurrently.
pub struct AppState {
    registry: Mutex<ProbeRegistry>,
    store: Mutex<ArtifactStore>,
}

impl AppState {
    /// Wraps the process-scoped components for sharing across handlers.
    #[must_use]
    pub fn new(registry: ProbeRegistry, store: ArtifactStore) -> Arc<Self> {
        Arc::new(Self {
            registry: Mutex::new(registry),
            store: Mutex::new(store),
        })
    }

    /// Releases every loaded probe. Called at server teardown.
    pub fn unload_all(&self) {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .unload_all();
    }
}

/// Transport-level error carrying the status its cause maps to.
struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn internal(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: detail.into(),
        }
    }
}

impl From<ProbehubError> for ApiError {
    fn from(err: ProbehubError) -> Self {
        let status = match err {
            ProbehubError::NotFound { .. } => StatusCode::NOT_FOUND,
            ProbehubError::Load { .. } => StatusCode::BAD_GATEWAY,
            ProbehubError::Io { .. }
            | ProbehubError::Config { .. }
            | ProbehubError::Serialization { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            detail: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

/// Builds the router over the shared state.
#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/.well-known/mcp/metadata.json", get(get_metadata))
        .route("/api/tools", get(list_tools))
        .route("/api/tools/{tool_name}", post(execute_tool))
        .layer(TraceLayer::new_for_http())
        // Filesystem-watching clients may live on other origins.
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn get_metadata() -> Json<Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "capabilities": dispatch::capability_names(),
        "kernel_version": sysinfo::kernel_version(),
    }))
}

async fn list_tools() -> Json<Value> {
    let tools: Vec<Value> = dispatch::BUILTIN_TOOLS
        .iter()
        .map(|t| json!({ "name": t.name, "description": t.description }))
        .collect();
    Json(json!({ "tools": tools }))
}

async fn execute_tool(
    State(state): State<Arc<AppState>>,
    Path(tool_name): Path<String>,
    Json(params): Json<Value>,
) -> std::result::Result<Json<ToolOutcome>, ApiError> {
    // Compile-and-attach can block for an unbounded time; keep it off the
    // async workers. No timeout is applied.
    let outcome = tokio::task::spawn_blocking(move || {
        let mut registry = state
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let store = state.store.lock().unwrap_or_else(PoisonError::into_inner);
        dispatch::execute(&mut registry, &store, &tool_name, &params)
    })
    .await
    .map_err(|e| ApiError::internal(format!("dispatch task failed: {e}")))??;

    Ok(Json(outcome))
}

/// Runs the server until ctrl-c, then tears the registry down.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails.
pub async fn serve(config: &ProbehubConfig, state: Arc<AppState>) -> Result<()> {
    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ProbehubError::Io {
            path: addr.clone().into(),
            source,
        })?;
    tracing::info!(addr = %addr, "probehub server listening");

    axum::serve(listener, router(Arc::clone(&state)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|source| ProbehubError::Io {
            path: addr.into(),
            source,
        })?;

    tracing::info!("server stopped, releasing probes");
    state.unload_all();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to install ctrl-c handler");
    }
}
