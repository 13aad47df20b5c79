//! Error types for the tsreg library layers.
//!
//! The application and CLI layers wrap these in `anyhow` with extra context;
//! everything below them returns `TsError` so callers can match on the kind.

use thiserror::Error;

/// Every failure the pipeline can surface.
#[derive(Debug, Error)]
pub enum TsError {
    #[error("Dataset not found: '{0}' is not a known regression dataset")]
    DatasetNotFound(String),

    #[error("Failed to fetch dataset: {0}")]
    DataFetch(String),

    #[error("Malformed dataset file: {0}")]
    DatasetFormat(String),

    #[error("Invalid architecture: '{0}'")]
    InvalidArchitecture(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt model artifact: {0}")]
    ArtifactCorrupt(String),

    #[error("Incompatible artifact version: found {found}, expected {expected}")]
    IncompatibleVersion { found: u32, expected: u32 },

    #[error("Tensor error: {0}")]
    Tensor(String),
}

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, TsError>;
