//! System-wide constants and default paths.

/// Default directory containing probe source files.
pub const DEFAULT_PROGRAMS_DIR: &str = "bpf_programs";

/// Default base directory for published context artifacts.
pub const DEFAULT_CONTEXT_DIR: &str = ".well-known/mcp";

/// File extension for probe source files.
pub const PROGRAM_EXTENSION: &str = "c";

/// Metadata artifact filename under the context base directory.
pub const METADATA_FILE: &str = "metadata.json";

/// Subdirectory for map artifacts under the context base directory.
pub const MAPS_SUBDIR: &str = "maps";

/// Subdirectory for trace artifacts under the context base directory.
pub const TRACES_SUBDIR: &str = "traces";

/// Default host the HTTP surface binds to.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port the HTTP surface binds to.
pub const DEFAULT_PORT: u16 = 8000;

/// Application name used in CLI output and published metadata.
pub const APP_NAME: &str = "probehub";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "phub";
