//! Turning a validated constraint chain into a concrete target.

use crate::filesystem::path;
use crate::filesystem::{BucketState, FilesystemError, FsResult, PathKind, Version};
use crate::selector::constraint::Constraint;
use crate::selector::validate::has_file;

/// Which version a query targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpec {
    /// no Version()/Latest() in the chain
    Unconstrained,
    Exact(Version),
}

impl VersionSpec {
    pub fn exact(&self) -> Option<&Version> {
        match self {
            VersionSpec::Exact(version) => Some(version),
            VersionSpec::Unconstrained => None,
        }
    }
}

/// The location, kind and version a constraint chain points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub path: String,
    pub kind: PathKind,
    pub version: VersionSpec,
}

/// Resolve `constraints` against `state`.
///
/// The chain must already be valid. `Latest` is scoped by the location
/// accumulated before it: with no location it means the bucket's latest
/// version, otherwise the latest version of that file or directory.
pub fn resolve(constraints: &[Constraint], state: &BucketState) -> FsResult<Resolution> {
    let mut location = String::new();
    let mut located = false;
    let mut file_seen = false;
    let mut version = VersionSpec::Unconstrained;

    for constraint in constraints {
        match constraint {
            Constraint::Dir(dir) => {
                location = path::join(&location, dir);
                located = true;
            }
            Constraint::File(name) => {
                location = path::join(&location, name);
                located = true;
                file_seen = true;
            }
            Constraint::Version(v) => version = VersionSpec::Exact(v.clone()),
            Constraint::Latest => {
                let latest = if !located {
                    state.latest().ok_or(FilesystemError::EmptyBucket)?
                } else if file_seen {
                    state
                        .file_history(&location)
                        .and_then(|history| history.latest())
                        .map(|entry| &entry.version)
                        .ok_or_else(|| FilesystemError::FileNotFound(location.clone()))?
                } else {
                    state
                        .dir_history(&location)
                        .and_then(|history| history.latest())
                        .ok_or_else(|| FilesystemError::DirectoryNotFound(location.clone()))?
                };
                version = VersionSpec::Exact(latest.clone());
            }
        }
    }

    let kind = if has_file(constraints) {
        PathKind::File
    } else {
        PathKind::Dir
    };
    Ok(Resolution {
        path: location,
        kind,
        version,
    })
}
