//! # probehub-api
//!
//! The user-facing surface of probehub:
//! - **Tool dispatcher**: resolves a tool name to a kernel probe and an
//!   execution effect, publishing context artifacts along the way.
//! - **HTTP server**: axum routes for capability metadata and tool
//!   execution, mapping each error kind to its HTTP status.

pub mod dispatch;
pub mod server;
