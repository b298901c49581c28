//! Error types for onhand-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in onhand-core
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An upload could not be decoded into a table
    #[error("failed to decode '{file_name}': {message}")]
    Decode { file_name: String, message: String },

    /// A file's header does not match the first file of its group
    #[error(
        "'{file_name}' has mismatched columns for {group_label}: expected {expected_columns:?}, found {actual_columns:?}"
    )]
    SchemaMismatch {
        file_name: String,
        group_label: String,
        expected_columns: Vec<String>,
        actual_columns: Vec<String>,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A table could not be serialized as CSV
    #[error("failed to serialize '{table}' as CSV: {source}")]
    Serialize {
        table: String,
        #[source]
        source: csv::Error,
    },

    /// Directory traversal error
    #[error("failed to traverse directory: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Name of the upload this error is about, if any
    pub fn file_name(&self) -> Option<&str> {
        match self {
            Error::Decode { file_name, .. } | Error::SchemaMismatch { file_name, .. } => {
                Some(file_name)
            }
            _ => None,
        }
    }
}
