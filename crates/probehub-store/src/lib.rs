//! # probehub-store
//!
//! Write-only publication of context artifacts to a conventional directory
//! layout, for external consumption by filesystem-watching clients or a
//! static file server:
//!
//! ```text
//! <base>/metadata.json
//! <base>/maps/<name>.json
//! <base>/traces/<name>.txt
//! ```
//!
//! Every write is a whole-file overwrite; last write wins. Callers that
//! need mutual exclusion between writers wrap the store in a lock.

use std::path::{Path, PathBuf};

use probehub_common::constants::{MAPS_SUBDIR, METADATA_FILE, TRACES_SUBDIR};
use probehub_common::error::{ProbehubError, Result};
use serde_json::{Map, Value, json};

/// Owns the on-disk artifact tree under a base directory.
#[derive(Debug)]
pub struct ArtifactStore {
    base: PathBuf,
    maps_dir: PathBuf,
    traces_dir: PathBuf,
}

impl ArtifactStore {
    /// Opens the store, creating the base directory and its `maps/` and
    /// `traces/` subdirectories if missing. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    pub fn open(base: impl Into<PathBuf>) -> Result<Self> {
        let base = base.into();
        let maps_dir = base.join(MAPS_SUBDIR);
        let traces_dir = base.join(TRACES_SUBDIR);
        for dir in [&base, &maps_dir, &traces_dir] {
            std::fs::create_dir_all(dir).map_err(|source| ProbehubError::Io {
                path: dir.clone(),
                source,
            })?;
        }
        tracing::debug!(path = %base.display(), "opened artifact store");
        Ok(Self {
            base,
            maps_dir,
            traces_dir,
        })
    }

    /// Base directory of the artifact tree.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Path of the metadata artifact.
    #[must_use]
    pub fn metadata_path(&self) -> PathBuf {
        self.base.join(METADATA_FILE)
    }

    /// Path of a named map artifact.
    #[must_use]
    pub fn map_path(&self, name: &str) -> PathBuf {
        self.maps_dir.join(format!("{name}.json"))
    }

    /// Path of a named trace artifact.
    #[must_use]
    pub fn trace_path(&self, name: &str) -> PathBuf {
        self.traces_dir.join(format!("{name}.txt"))
    }

    /// Overwrites the metadata artifact with the caller's fields merged
    /// under the reserved `last_updated` and `version` stamps.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the file write fails.
    pub fn write_metadata(&self, fields: &Map<String, Value>) -> Result<()> {
        let mut merged = fields.clone();
        let _ = merged.insert(
            "last_updated".to_string(),
            json!(chrono::Utc::now().to_rfc3339()),
        );
        let _ = merged.insert("version".to_string(), json!(env!("CARGO_PKG_VERSION")));
        write_json(&self.metadata_path(), &Value::Object(merged))
    }

    /// Overwrites the named trace artifact with `data` verbatim.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid name or a failed write.
    pub fn write_trace(&self, name: &str, data: &str) -> Result<()> {
        validate_name(name)?;
        let path = self.trace_path(name);
        std::fs::write(&path, data).map_err(|source| ProbehubError::Io { path, source })
    }

    /// Overwrites the named map artifact with `data` as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid name or a failed write.
    pub fn write_map(&self, name: &str, data: &Value) -> Result<()> {
        validate_name(name)?;
        write_json(&self.map_path(name), data)
    }
}

fn write_json(path: &Path, value: &Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    std::fs::write(path, text).map_err(|source| ProbehubError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Artifact names become path components, so restrict them to a safe charset.
fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ProbehubError::Config {
            message: format!("invalid artifact name: {name:?}"),
        })
    }
}
