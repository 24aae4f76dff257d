//! Failures of the card repository pipeline.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Hard failures while importing, refreshing or caching the card repository.
///
/// Individual records that fail validation are skipped and never reported here.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The document parsed but does not have a usable top-level shape.
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    /// The document is not valid JSON.
    #[error("failed to parse document: {0}")]
    Parse(#[from] serde_json::Error),
    /// The remote request could not be completed.
    #[error("remote request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The remote answered with a non-success status.
    #[error("remote returned HTTP status {0}")]
    Status(u16),
    /// A user-chosen file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The durable cache slot could not be written or removed.
    #[error("{context}: {source}")]
    Cache {
        /// What was being attempted.
        context: String,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The canonical set could not be serialised for the cache.
    #[error("failed to encode repository: {0}")]
    Encode(#[source] serde_json::Error),
}

impl RepositoryError {
    pub(crate) fn cache(context: impl Into<String>, source: io::Error) -> Self {
        RepositoryError::Cache {
            context: context.into(),
            source,
        }
    }
}
