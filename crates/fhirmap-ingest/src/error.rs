//! Error types for bundle ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while listing or parsing bundles.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Directory not found or not readable.
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Document Errors ===
    /// The document could not be turned into typed resources.
    #[error("malformed bundle {path}: {message}")]
    MalformedBundle { path: PathBuf, message: String },

    /// The document is valid JSON but not a bundle.
    #[error("{path} is a {resource_type}, expected a Bundle")]
    UnsupportedDocument {
        path: PathBuf,
        resource_type: String,
    },
}

impl IngestError {
    pub(crate) fn malformed(path: &std::path::Path, message: impl Into<String>) -> Self {
        Self::MalformedBundle {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
