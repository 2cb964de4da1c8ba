//! Selector grammar errors.
//!
//! These are all caller mistakes: the query itself is malformed, and fixing
//! the constraint chain fixes the error.

use thiserror::Error;

use crate::selector::constraint::ConstraintType;

/// Result type for selector validation.
pub type SelectorResult<T> = Result<T, SelectorError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// more than one Version()/Latest() in the chain
    #[error("only one version constraint may be specified")]
    DuplicateVersionConstraint,

    /// more than one File() in the chain
    #[error("File() must not be specified more than once")]
    DuplicateFileConstraint,

    /// a Dir() following a File()
    #[error("file constraints may only come after all dir constraints")]
    DirAfterFile,

    /// Dir("") or File("")
    #[error("{0} constraint requires a non-empty path/name")]
    EmptyLocation(ConstraintType),

    /// a file operation without a File()
    #[error("no File() selector specified for file operation")]
    MissingFileConstraint,

    /// a directory operation with a File()
    #[error("File() selector incorrectly specified for directory operation")]
    FileConstraintOnDirectoryOp,

    /// a single-result operation without a version constraint
    #[error("version must be specified")]
    VersionRequired,
}

impl SelectorError {
    /// check if the error is about a constraint the operation needed but did not get
    pub fn is_missing_requirement(&self) -> bool {
        matches!(
            self,
            SelectorError::MissingFileConstraint | SelectorError::VersionRequired
        )
    }
}
