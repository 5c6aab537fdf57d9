//! Error types for build parameter compilation.

/// Errors that can occur while compiling a build request.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The resolved toolchain installation is missing.
    #[error("toolchain '{name}' is not ready: {detail}")]
    ToolchainNotReady {
        /// Toolchain name.
        name: String,
        /// What is missing.
        detail: String,
    },

    /// The memory table cannot produce a valid scatter description.
    #[error("invalid memory layout: {detail}")]
    InvalidMemoryLayout {
        /// Why scatter generation is impossible.
        detail: String,
    },

    /// A bad address/size literal in the memory table.
    #[error(transparent)]
    Address(#[from] flint_core::error::CoreError),

    /// A toolchain-layer failure.
    #[error(transparent)]
    Toolchain(#[from] flint_toolchain::error::ToolchainError),

    /// I/O error writing build artifacts.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;
