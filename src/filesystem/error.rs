//! Filesystem error types
//!
//! Grammar errors come from the selector layer and are wrapped here, so
//! every query and commit returns a single error type.

use thiserror::Error;

use crate::filesystem::types::{PathKind, Version};
use crate::selector::SelectorError;

/// the main error type for filesystem operations
#[derive(Debug, Error)]
pub enum FilesystemError {
    /// the selector chain is malformed
    #[error("invalid selector: {0}")]
    Selector(#[from] SelectorError),

    /// the path has no file history
    #[error("file not found: {0:?}")]
    FileNotFound(String),

    /// the path has no directory history
    #[error("directory not found: {0:?}")]
    DirectoryNotFound(String),

    /// the path has history, but not at the requested version
    #[error("{kind} {path:?} has no version {version}")]
    VersionNotFound {
        kind: PathKind,
        path: String,
        version: Version,
    },

    /// Latest() was resolved against a bucket without commits
    #[error("bucket has no committed versions")]
    EmptyBucket,

    /// a single-result query matched several versions
    #[error("ambiguous version for {path:?}: {versions} versions exist, specify Version() or Latest()")]
    AmbiguousVersion { path: String, versions: usize },

    /// the transaction was committed before
    #[error("transaction {tx_id} already committed at version {version}")]
    AlreadyCommitted { tx_id: String, version: Version },

    /// I/O error while reading or writing a snapshot
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization or deserialization of a snapshot failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FilesystemError {
    /// check if this error indicates the path or version doesn't exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            FilesystemError::FileNotFound(_)
                | FilesystemError::DirectoryNotFound(_)
                | FilesystemError::VersionNotFound { .. }
                | FilesystemError::EmptyBucket
        )
    }

    /// check if this error is a malformed query
    pub fn is_grammar(&self) -> bool {
        matches!(self, FilesystemError::Selector(_))
    }

    /// check if the query matched more than one result
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, FilesystemError::AmbiguousVersion { .. })
    }

    /// check if this error comes from transaction misuse
    pub fn is_transaction_state(&self) -> bool {
        matches!(self, FilesystemError::AlreadyCommitted { .. })
    }
}

/// result type alias for filesystem operations
pub type FsResult<T> = Result<T, FilesystemError>;
