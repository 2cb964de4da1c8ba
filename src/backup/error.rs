//! Backup errors

use thiserror::Error;

use crate::blob::BlobError;
use crate::filesystem::FilesystemError;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),

    #[error("blob store error: {0}")]
    Blob(#[from] BlobError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// the same path was added twice to one backup transaction
    #[error("object already exists: {0:?}")]
    ObjectExists(String),

    /// the path is empty after cleaning
    #[error("invalid path: {0:?}")]
    InvalidPath(String),

    /// the filesystem references content the store does not have
    #[error("blob {name} missing from store {store}")]
    BlobMissing { store: String, name: String },

    /// the file was stored through a different blob store
    #[error("file is stored in {found}, but this service reads from {expected}")]
    ForeignStore { expected: String, found: String },
}

impl BackupError {
    pub fn is_not_found(&self) -> bool {
        match self {
            BackupError::Filesystem(e) => e.is_not_found(),
            BackupError::BlobMissing { .. } => true,
            _ => false,
        }
    }
}

pub type BackupResult<T> = Result<T, BackupError>;
