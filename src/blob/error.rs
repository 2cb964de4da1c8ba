//! Blob store errors

use thiserror::Error;

/// errors raised by blob stores
#[derive(Debug, Error)]
pub enum BlobError {
    /// blobs are write-once
    #[error("blob already exists: {name}")]
    AlreadyExists { name: String },

    /// the name cannot be used as a blob key
    #[error("invalid blob name: {0:?}")]
    InvalidName(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("git error: {0}")]
    Git(#[from] git2::Error),
}

impl BlobError {
    /// check if the blob was already stored
    pub fn is_already_exists(&self) -> bool {
        matches!(self, BlobError::AlreadyExists { .. })
    }
}

/// result type alias for blob store operations
pub type BlobResult<T> = Result<T, BlobError>;
