//! Error types for catalog loading, score persistence, feeding and settings.
//!
//! Recoverable conditions (missing files, malformed saved data) are folded into
//! defaults by the callers; these types carry what is left over.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to scan the catalog root itself. Individual food folders never
/// produce this; they are skipped instead.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to access food catalog at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why a single `data.json` could not be turned into a record.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Failed to read metadata: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed metadata: {0}")]
    Json(#[from] serde_json::Error),

    /// Valid JSON, but `null`, an array or a scalar instead of an object.
    #[error("Metadata is not a JSON object")]
    NotAnObject,
}

#[derive(Error, Debug)]
pub enum ProgressError {
    #[error("Score file I/O failed at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Score file is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("Score record is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProgressError {
    /// True for damaged contents, as opposed to a file that could not be touched.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Encoding(_) | Self::Json(_))
    }
}

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("A feed is already in progress")]
    Busy,

    #[error("Failed to save progress: {0}")]
    Persist(#[from] ProgressError),
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] ron::error::SpannedError),
}
