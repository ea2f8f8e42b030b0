//! # probehub-bpf
//!
//! Kernel probe loading and lifecycle management:
//! - **Backend seam**: the compile-and-attach capability behind a trait,
//!   with an aya-based implementation when the `ebpf` feature is enabled.
//! - **Registry**: one live handle per probe name, load-or-reuse semantics,
//!   explicit unload.
//! - **Host introspection**: kernel version and BPF feature availability.
//!
//! The `ebpf` feature flag must be enabled and the host must support
//! BPF for probes to actually attach; without it the backend reports
//! probe loading as unsupported.

pub mod backend;
pub mod registry;
pub mod sysinfo;
