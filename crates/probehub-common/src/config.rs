//! Global configuration model for the probehub server.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ProbehubError, Result};

/// Root configuration for the probehub server and CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbehubConfig {
    /// Directory containing probe source files (`<name>.c`).
    pub programs_dir: PathBuf,
    /// Base directory for published context artifacts.
    pub context_dir: PathBuf,
    /// Host the HTTP surface binds to.
    pub host: String,
    /// Port the HTTP surface binds to.
    pub port: u16,
}

impl Default for ProbehubConfig {
    fn default() -> Self {
        Self {
            programs_dir: PathBuf::from(crate::constants::DEFAULT_PROGRAMS_DIR),
            context_dir: PathBuf::from(crate::constants::DEFAULT_CONTEXT_DIR),
            host: crate::constants::DEFAULT_HOST.to_string(),
            port: crate::constants::DEFAULT_PORT,
        }
    }
}

impl ProbehubConfig {
    /// Validates the configuration before any component is constructed.
    ///
    /// # Errors
    ///
    /// Returns a [`ProbehubError::Config`] if a path is empty, the host is
    /// empty, or the port is zero.
    pub fn validate(&self) -> Result<()> {
        if self.programs_dir.as_os_str().is_empty() {
            return Err(ProbehubError::Config {
                message: "programs_dir must not be empty".to_string(),
            });
        }
        if self.context_dir.as_os_str().is_empty() {
            return Err(ProbehubError::Config {
                message: "context_dir must not be empty".to_string(),
            });
        }
        if self.host.is_empty() {
            return Err(ProbehubError::Config {
                message: "host must not be empty".to_string(),
            });
        }
        if self.port == 0 {
            return Err(ProbehubError::Config {
                message: "port must be non-zero".to_string(),
            });
        }
        Ok(())
    }

    /// Returns the `host:port` address the HTTP surface binds to.
    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
