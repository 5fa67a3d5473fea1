//! Catalog backend errors

use std::path::PathBuf;

/// Failure reported by a catalog backend
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Backend refuses writes
    #[error("catalog is read-only, cannot insert {transformation} on {site}")]
    ReadOnly {
        /// Fully qualified transformation name
        transformation: String,
        /// Site handle
        site: String,
    },

    /// Backend could not answer
    #[error("catalog backend failure: {0}")]
    Backend(String),

    /// Snapshot file could not be read
    #[error("failed to read catalog snapshot {path}: {source}")]
    Io {
        /// Snapshot path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Snapshot file could not be parsed
    #[error("failed to parse catalog snapshot {path}: {reason}")]
    Parse {
        /// Snapshot path
        path: PathBuf,
        /// Parser message
        reason: String,
    },
}

impl CatalogError {
    /// Create a backend error
    #[inline]
    #[must_use]
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}
