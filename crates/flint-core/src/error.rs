//! Error types for the shared data model.

/// Errors that can occur in the shared data model.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// An address or size literal that is neither hex nor decimal.
    #[error("invalid address or size literal: '{value}'")]
    BadAddress {
        /// The offending literal.
        value: String,
    },

    /// A memory slot index outside the fixed 5-slot table.
    #[error("memory slot index {index} out of range (expected 1..=5)")]
    BadSlot {
        /// The offending 1-based index.
        index: u32,
    },
}

/// Result type for shared data model operations.
pub type Result<T> = std::result::Result<T, CoreError>;
