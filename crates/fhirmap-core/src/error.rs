//! Fatal errors of a mapping run.
//!
//! Dangling references are not errors; they are collected by the
//! [`SurrogateRegistry`](crate::SurrogateRegistry) and reported after the run.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapError {
    /// Output could not be created or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Ingest(#[from] fhirmap_ingest::IngestError),

    #[error("failed to write table: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Model(#[from] fhirmap_model::ModelError),
}

impl MapError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, MapError>;
