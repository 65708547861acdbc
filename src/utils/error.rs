//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors for a whole analysis run
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Failed to read log file {path}: {source}")]
    LogRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while loading the source text of one file.
///
/// These never abort an analysis; they end up as warnings on the result.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Source not found: {0}")]
    NotFound(String),

    #[error("Unsupported source location: {0}")]
    Unsupported(String),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
