//! Error types
//!
//! `EnrichError` covers everything that aborts a run. `SearchError` is the
//! terminology collaborator's failure type; the fuzzy resolver recovers from
//! it per row and never lets it escape the pipeline.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Fatal failures of an enrichment run.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("I/O failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("I/O failure while streaming rows: {0}")]
    Stream(#[from] io::Error),
    #[error("dictionary {path} could not be decoded: {reason}")]
    Dictionary { path: PathBuf, reason: String },
    #[error("terminology lexicon {path} could not be decoded: {reason}")]
    Lexicon { path: PathBuf, reason: String },
    #[error("configuration error: {0}")]
    Config(String),
    #[error("terminology engine rejected its configuration: {0}")]
    Terminology(#[source] SearchError),
    #[error("column {index} is out of range for a row of {len} fields")]
    Column { index: usize, len: usize },
    #[error("data line {line} has {len} fields, column {index} is missing")]
    MissingColumn { line: usize, index: usize, len: usize },
    #[error("input has no header line")]
    EmptyInput,
}

impl EnrichError {
    /// Attach the offending path to an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        EnrichError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures reported by a terminology search collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("terminology engine error: {0}")]
    Engine(String),
    #[error("search timed out after {0:?}")]
    Timeout(Duration),
    #[error("terminology engine unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T, E = EnrichError> = std::result::Result<T, E>;
