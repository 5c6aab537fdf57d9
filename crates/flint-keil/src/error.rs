//! Error types for legacy project translation.

/// Errors that can occur while translating legacy projects.
#[derive(Debug, thiserror::Error)]
pub enum KeilError {
    /// Malformed XML.
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// I/O error reading/writing project files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An element the operation requires is absent.
    #[error("missing element: {path}")]
    MissingNode {
        /// Slash-joined element path from the document root.
        path: String,
    },

    /// The document does not look like the expected project family.
    #[error("unsupported project family: {detail}")]
    UnsupportedFamily {
        /// What was found instead.
        detail: String,
    },

    /// A field-mapping resource problem.
    #[error("field mapping error: {detail}")]
    Mapping {
        /// What went wrong.
        detail: String,
    },
}

/// Result type for legacy project translation.
pub type Result<T> = std::result::Result<T, KeilError>;
