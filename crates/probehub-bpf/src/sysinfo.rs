//! Host kernel and BPF feature introspection.
//!
//! Used by the metadata endpoint and the `info` CLI command to report
//! whether the host can actually run probes.

use std::path::Path;

use serde::Serialize;

/// Kernel BTF type information exposed by the running kernel.
const BTF_VMLINUX: &str = "/sys/kernel/btf/vmlinux";

/// Mount point of the BPF filesystem (pinned maps and programs).
const BPF_FS: &str = "/sys/fs/bpf";

/// Controllers file present only on a cgroup v2 unified hierarchy.
const CGROUP_V2_CONTROLLERS: &str = "/sys/fs/cgroup/cgroup.controllers";

/// Snapshot of the host's tracing-relevant capabilities.
#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    /// Kernel release string, or `unknown: <cause>` if uname failed.
    pub kernel_version: String,
    /// Target architecture this binary was built for.
    pub arch: &'static str,
    /// Target operating system this binary was built for.
    pub os: &'static str,
    /// Whether the kernel exposes BTF type information.
    pub btf_enabled: bool,
    /// Whether the BPF filesystem is mounted.
    pub bpffs_mounted: bool,
    /// Whether the host runs a cgroup v2 unified hierarchy.
    pub cgroup_v2_enabled: bool,
}

impl SystemInfo {
    /// Collects a snapshot from the running host.
    #[must_use]
    pub fn collect() -> Self {
        Self {
            kernel_version: kernel_version(),
            arch: std::env::consts::ARCH,
            os: std::env::consts::OS,
            btf_enabled: Path::new(BTF_VMLINUX).exists(),
            bpffs_mounted: Path::new(BPF_FS).exists(),
            cgroup_v2_enabled: Path::new(CGROUP_V2_CONTROLLERS).exists(),
        }
    }
}

/// Returns the running kernel's release string.
///
/// Folds a uname failure into the returned string rather than erroring;
/// callers publish this verbatim in metadata.
#[must_use]
pub fn kernel_version() -> String {
    match nix::sys::utsname::uname() {
        Ok(uts) => uts.release().to_string_lossy().into_owned(),
        Err(e) => format!("unknown: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_version_is_non_empty() {
        assert!(!kernel_version().is_empty());
    }

    #[test]
    fn collect_reports_build_target() {
        let info = SystemInfo::collect();
        assert_eq!(info.os, std::env::consts::OS);
        assert!(!info.kernel_version.is_empty());
    }

    #[test]
    fn system_info_serializes_to_json_object() {
        let info = SystemInfo::collect();
        let value = serde_json::to_value(&info).expect("serialize");
        assert!(value.get("kernel_version").is_some());
        assert!(value.get("btf_enabled").is_some());
    }
}
