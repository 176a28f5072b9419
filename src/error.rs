//! Error taxonomy shared by the loader, the stores and the request paths.

use crate::engine::ChargerId;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal: the dataset cannot be served.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("dataset is not a valid feature collection: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("dataset contains no usable records ({dropped} dropped)")]
    Empty { dropped: usize },
}

/// Failures of the favorites persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("stored favorites for '{identity}' are unreadable: {source}")]
    Corrupt {
        identity: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("favorites lock poisoned")]
    Poisoned,

    #[error("favorites for '{0}' kept changing under concurrent writers")]
    Contended(String),

    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Per-request failures; none of them take the process down.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("charger {0} not found")]
    NotFound(ChargerId),

    #[error("authentication required")]
    Unauthorized,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("storage unavailable: {0}")]
    Storage(#[from] StoreError),
}

impl ServiceError {
    /// Stable machine-readable name used in response bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::InvalidCoordinate(_) => "invalid_coordinate",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Unauthorized => "unauthorized",
            ServiceError::InvalidRequest(_) => "invalid_request",
            ServiceError::Storage(_) => "storage_error",
        }
    }
}
