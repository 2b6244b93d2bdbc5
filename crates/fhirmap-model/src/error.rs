use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown entity kind: {0}")]
    UnknownEntityKind(String),
    #[error("unknown table: {0}")]
    UnknownTable(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ModelError>;
