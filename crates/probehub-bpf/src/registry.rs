//! Probe registry: one live handle per probe name.
//!
//! The registry resolves probe names to source files under a configured
//! directory (`<programs_dir>/<name>.c`), hands the source to the
//! compile-and-attach backend, and caches the resulting handle so repeated
//! loads of the same name reuse the attached probe instead of recompiling.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use probehub_common::constants::PROGRAM_EXTENSION;
use probehub_common::error::{ProbehubError, Result};

use crate::backend::{LoadedProbe, ProbeBackend, default_backend};

/// An attached probe owned by the registry entry for its name.
///
/// At most one live handle exists per name; the backing resource is
/// released when the handle is dropped (explicit unload or teardown).
pub struct ProbeHandle {
    name: String,
    resource: Box<dyn LoadedProbe>,
}

impl ProbeHandle {
    /// Name the handle is registered under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Borrow of the opaque backing resource.
    #[must_use]
    pub fn resource(&self) -> &dyn LoadedProbe {
        self.resource.as_ref()
    }
}

impl fmt::Debug for ProbeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeHandle")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Mapping from probe name to its single live handle.
pub struct ProbeRegistry {
    programs_dir: PathBuf,
    backend: Box<dyn ProbeBackend>,
    loaded: HashMap<String, ProbeHandle>,
}

impl ProbeRegistry {
    /// Creates a registry resolving probe sources under `programs_dir`,
    /// loading them through the given backend.
    #[must_use]
    pub fn new(programs_dir: impl Into<PathBuf>, backend: Box<dyn ProbeBackend>) -> Self {
        Self {
            programs_dir: programs_dir.into(),
            backend,
            loaded: HashMap::new(),
        }
    }

    /// Creates a registry using the backend compiled into this build.
    #[must_use]
    pub fn with_default_backend(programs_dir: impl Into<PathBuf>) -> Self {
        Self::new(programs_dir, default_backend())
    }

    /// Returns the source file path for a probe name.
    #[must_use]
    pub fn program_path(&self, name: &str) -> PathBuf {
        self.programs_dir
            .join(format!("{name}.{PROGRAM_EXTENSION}"))
    }

    /// Directory the registry resolves probe sources under.
    #[must_use]
    pub fn programs_dir(&self) -> &Path {
        &self.programs_dir
    }

    /// Loads the named probe, reusing the existing handle if present.
    ///
    /// A cache hit returns the stored handle without invoking the backend.
    /// The registry is mutated only when compile-and-attach succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`ProbehubError::Config`] for an invalid name,
    /// [`ProbehubError::NotFound`] if no source file exists for the name,
    /// [`ProbehubError::Io`] if the source cannot be read, and
    /// [`ProbehubError::Load`] if the backend fails.
    pub fn load(&mut self, name: &str) -> Result<&ProbeHandle> {
        validate_name(name)?;

        if self.loaded.contains_key(name) {
            tracing::debug!(probe = name, "reusing loaded probe");
        } else {
            let path = self.program_path(name);
            if !path.exists() {
                return Err(ProbehubError::NotFound {
                    kind: "probe program",
                    id: name.to_string(),
                });
            }
            let source = std::fs::read_to_string(&path).map_err(|source| ProbehubError::Io {
                path: path.clone(),
                source,
            })?;

            tracing::info!(probe = name, path = %path.display(), "compiling and attaching probe");
            let resource = self
                .backend
                .compile_and_attach(name, &source)
                .map_err(|e| match e {
                    load @ ProbehubError::Load { .. } => load,
                    other => ProbehubError::Load {
                        program: name.to_string(),
                        cause: other.to_string(),
                    },
                })?;
            let previous = self.loaded.insert(
                name.to_string(),
                ProbeHandle {
                    name: name.to_string(),
                    resource,
                },
            );
            debug_assert!(previous.is_none());
        }

        // Present by construction of the branch above.
        self.loaded.get(name).ok_or_else(|| ProbehubError::NotFound {
            kind: "probe",
            id: name.to_string(),
        })
    }

    /// Releases the named probe and removes it from the registry.
    ///
    /// A name that was never loaded is a no-op, not an error.
    pub fn unload(&mut self, name: &str) {
        if let Some(handle) = self.loaded.remove(name) {
            tracing::info!(probe = %handle.name, "unloading probe");
            drop(handle);
        }
    }

    /// Releases every loaded probe. Used at server teardown.
    pub fn unload_all(&mut self) {
        for (name, handle) in self.loaded.drain() {
            tracing::info!(probe = %name, "unloading probe");
            drop(handle);
        }
    }

    /// Whether a handle for `name` is currently live.
    #[must_use]
    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded.contains_key(name)
    }

    /// Names of all loaded probes, sorted for stable output.
    #[must_use]
    pub fn loaded_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.loaded.keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for ProbeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeRegistry")
            .field("programs_dir", &self.programs_dir)
            .field("loaded", &self.loaded_names())
            .finish_non_exhaustive()
    }
}

/// Probe names become path components, so restrict them to a safe charset.
fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ProbehubError::Config {
            message: format!("invalid probe name: {name:?}"),
        })
    }
}
