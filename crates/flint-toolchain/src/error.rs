//! Error types for toolchain operations.

use std::path::PathBuf;

/// Errors that can occur during toolchain resolution and option migration.
#[derive(Debug, thiserror::Error)]
pub enum ToolchainError {
    /// A toolchain name outside the allow-list for the project family.
    #[error("unknown toolchain: '{name}'")]
    UnknownToolchain {
        /// The name that failed to resolve.
        name: String,
    },

    /// The toolchain installation is missing or misconfigured.
    #[error("toolchain '{name}' is not ready: {detail}")]
    NotReady {
        /// Toolchain name.
        name: String,
        /// What is missing.
        detail: String,
    },

    /// An on-disk option file could not be migrated.
    #[error("option migration failed for {}: {detail}", path.display())]
    MigrationFailure {
        /// The option file that failed.
        path: PathBuf,
        /// What went wrong.
        detail: String,
    },

    /// I/O error reading/writing option files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for toolchain operations.
pub type Result<T> = std::result::Result<T, ToolchainError>;
