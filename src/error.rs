// Error types for the symbol index

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the index, the extractors and the query layer.
///
/// Per-file variants (`FileRead`, `Parse`) are counted in build statistics
/// and never abort a build. Persistence variants are logged by the builder.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("failed to read {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("failed to write index to {path}: {source}")]
    PersistenceWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read index from {path}: {message}")]
    PersistenceRead { path: PathBuf, message: String },

    #[error("invalid query: {0}")]
    QueryInput(String),

    #[error("language not supported: {0}")]
    UnsupportedLanguage(String),

    #[error("cannot scan workspace {path}: {message}")]
    Workspace { path: PathBuf, message: String },
}

impl IndexError {
    /// True for errors that belong to a single file during a build.
    pub fn is_per_file(&self) -> bool {
        matches!(self, IndexError::FileRead { .. } | IndexError::Parse { .. })
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;
