//! The compile-and-attach capability behind a trait seam.
//!
//! Probe loading is delegated to a [`ProbeBackend`]: given a probe name and
//! its C source text, the backend compiles the program, loads it into the
//! kernel, and attaches it to its hook points. The returned
//! [`LoadedProbe`] is the opaque backing resource; dropping it releases the
//! kernel attachment.

use probehub_common::error::{ProbehubError, Result};

/// Opaque handle to a probe that is compiled and attached in the kernel.
///
/// The registry owns these exclusively; dropping one detaches the probe.
pub trait LoadedProbe: Send + std::fmt::Debug {
    /// Name of the probe this resource backs.
    fn name(&self) -> &str;
}

/// The external compile-and-attach capability.
///
/// The call may block for an unbounded duration (kernel compilation); it is
/// not cancellable and carries no timeout.
pub trait ProbeBackend: Send {
    /// Compiles `source` and attaches the resulting program in the kernel.
    ///
    /// # Errors
    ///
    /// Returns a [`ProbehubError::Load`] if compilation or attachment fails.
    fn compile_and_attach(&self, name: &str, source: &str) -> Result<Box<dyn LoadedProbe>>;
}

/// Returns the backend compiled into this build.
///
/// With the `ebpf` feature on Linux this is the aya-based kernel loader;
/// otherwise a backend that rejects every load with an explicit error.
#[must_use]
pub fn default_backend() -> Box<dyn ProbeBackend> {
    #[cfg(all(target_os = "linux", feature = "ebpf"))]
    {
        Box::new(aya_backend::AyaBackend)
    }
    #[cfg(not(all(target_os = "linux", feature = "ebpf")))]
    {
        Box::new(UnsupportedBackend)
    }
}

/// Backend used when the build carries no kernel loader.
///
/// Every load fails explicitly rather than pretending to attach.
pub struct UnsupportedBackend;

impl ProbeBackend for UnsupportedBackend {
    fn compile_and_attach(&self, name: &str, _source: &str) -> Result<Box<dyn LoadedProbe>> {
        Err(ProbehubError::Load {
            program: name.to_string(),
            cause: "built without the `ebpf` feature; kernel probe loading is unavailable"
                .to_string(),
        })
    }
}

#[cfg(all(target_os = "linux", feature = "ebpf"))]
mod aya_backend {
    //! aya-based kernel loader.
    //!
    //! Compiles probe source with `clang -target bpf` and loads the object
    //! with aya. Tracepoint programs encode their hook point in the
    //! function name as `<category>__<name>`, e.g.
    //! `raw_syscalls__sys_enter`.

    use std::process::Command;

    use aya::programs::TracePoint;
    use probehub_common::error::{ProbehubError, Result};

    use super::{LoadedProbe, ProbeBackend};

    /// Compiles and attaches probes via clang + aya.
    pub struct AyaBackend;

    /// A probe held attached by its owning [`aya::Ebpf`] object.
    struct KernelProbe {
        name: String,
        // Dropping the Ebpf object detaches every program it loaded.
        _ebpf: aya::Ebpf,
    }

    impl std::fmt::Debug for KernelProbe {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("KernelProbe")
                .field("name", &self.name)
                .finish_non_exhaustive()
        }
    }

    impl LoadedProbe for KernelProbe {
        fn name(&self) -> &str {
            &self.name
        }
    }

    impl ProbeBackend for AyaBackend {
        fn compile_and_attach(&self, name: &str, source: &str) -> Result<Box<dyn LoadedProbe>> {
            let object = compile(name, source)?;
            let mut ebpf = aya::Ebpf::load(&object).map_err(|e| ProbehubError::Load {
                program: name.to_string(),
                cause: e.to_string(),
            })?;

            let program_names: Vec<String> =
                ebpf.programs().map(|(n, _)| n.to_string()).collect();
            for program_name in program_names {
                attach_tracepoint(&mut ebpf, name, &program_name)?;
            }

            tracing::info!(probe = name, "probe attached");
            Ok(Box::new(KernelProbe {
                name: name.to_string(),
                _ebpf: ebpf,
            }))
        }
    }

    /// Compiles `source` to a BPF object file, returning its bytes.
    fn compile(name: &str, source: &str) -> Result<Vec<u8>> {
        let scratch = tempfile::tempdir().map_err(|e| ProbehubError::Load {
            program: name.to_string(),
            cause: format!("creating scratch dir: {e}"),
        })?;
        let src_path = scratch.path().join(format!("{name}.c"));
        let obj_path = scratch.path().join(format!("{name}.o"));
        std::fs::write(&src_path, source).map_err(|e| ProbehubError::Load {
            program: name.to_string(),
            cause: format!("writing scratch source: {e}"),
        })?;

        let output = Command::new("clang")
            .args(["-O2", "-g", "-target", "bpf", "-c"])
            .arg(&src_path)
            .arg("-o")
            .arg(&obj_path)
            .output()
            .map_err(|e| ProbehubError::Load {
                program: name.to_string(),
                cause: format!("invoking clang: {e}"),
            })?;
        if !output.status.success() {
            return Err(ProbehubError::Load {
                program: name.to_string(),
                cause: format!("clang: {}", String::from_utf8_lossy(&output.stderr)),
            });
        }

        std::fs::read(&obj_path).map_err(|e| ProbehubError::Load {
            program: name.to_string(),
            cause: format!("reading compiled object: {e}"),
        })
    }

    /// Loads one tracepoint program and attaches it to the hook point
    /// encoded in its `<category>__<name>` function name.
    fn attach_tracepoint(ebpf: &mut aya::Ebpf, probe: &str, program_name: &str) -> Result<()> {
        let (category, tracepoint) =
            program_name
                .split_once("__")
                .ok_or_else(|| ProbehubError::Load {
                    program: probe.to_string(),
                    cause: format!(
                        "program {program_name} does not encode a tracepoint as <category>__<name>"
                    ),
                })?;

        let program: &mut TracePoint = ebpf
            .program_mut(program_name)
            .ok_or_else(|| ProbehubError::Load {
                program: probe.to_string(),
                cause: format!("program {program_name} missing after load"),
            })?
            .try_into()
            .map_err(|e: aya::programs::ProgramError| ProbehubError::Load {
                program: probe.to_string(),
                cause: e.to_string(),
            })?;
        program.load().map_err(|e| ProbehubError::Load {
            program: probe.to_string(),
            cause: e.to_string(),
        })?;
        let _ = program
            .attach(category, tracepoint)
            .map_err(|e| ProbehubError::Load {
                program: probe.to_string(),
                cause: e.to_string(),
            })?;
        tracing::debug!(
            probe,
            program = program_name,
            category,
            tracepoint,
            "tracepoint attached"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_backend_reports_load_error() {
        let backend = UnsupportedBackend;
        let err = backend
            .compile_and_attach("syscall_trace", "int main;")
            .expect_err("should fail without a kernel loader");
        match err {
            ProbehubError::Load { program, cause } => {
                assert_eq!(program, "syscall_trace");
                assert!(cause.contains("ebpf"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
