//! Error types for docmirror
//!
//! The cache exposes failures to the UI as a plain message string in the
//! per-family error slot; inside the crate errors stay structured. Rendering
//! happens exactly once, at the cache boundary, via `Display`.

use thiserror::Error;

/// Main error type for docmirror operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Remote store error: {0}")]
    Remote(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Malformed document {id}: {reason}")]
    MalformedDocument { id: String, reason: String },

    #[error("Parent {parent_id} is not cached; fetch it before mutating its '{sub}' subcollection")]
    ParentNotCached { parent_id: String, sub: String },

    #[error("Unknown subcollection '{sub}' on {family}")]
    UnknownSubcollection { family: &'static str, sub: String },

    #[error("Unknown flag field '{field}' on {family}")]
    UnknownFlagField { family: &'static str, field: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Shorthand for a malformed-document error.
    pub fn malformed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedDocument {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for docmirror operations
pub type Result<T> = std::result::Result<T, Error>;
