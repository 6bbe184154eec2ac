//! Error taxonomy shared by the loader, enumerator and writer

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::extractor::ParseError;
use crate::model::StateId;

pub type Result<T> = std::result::Result<T, PathgenError>;

#[derive(Debug, Error)]
pub enum PathgenError {
    /// A recognized line shape whose contents could not be interpreted.
    #[error("line {line}: {message}")]
    Format { line: usize, message: String },
    /// A second non-null label for the same state.
    #[error("line {line}: state {id} already has a label")]
    DuplicateLabel { line: usize, id: StateId },
    #[error("{0} not found")]
    NotFound(String),
    #[error("invalid graph: {0}")]
    InvalidGraph(String),
    #[error("path {path_index}: cannot extract diff for '{action}' ({src} -> {dst}): {source}")]
    Extract {
        path_index: u64,
        action: String,
        src: StateId,
        dst: StateId,
        #[source]
        source: ParseError,
    },
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("I/O error: {0}")]
    Stream(#[from] io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl PathgenError {
    pub fn state_not_found(id: StateId) -> Self {
        PathgenError::NotFound(format!("state {id}"))
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PathgenError::Io {
            path: path.into(),
            source,
        }
    }
}
