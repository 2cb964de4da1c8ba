//! core value types for the versioned filesystem.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A commit version.
///
/// Versions are opaque tokens, but they compare as strings and that order is
/// the commit order within a bucket. Generated versions are fixed-width
/// decimal tick counts so lexical and numeric order agree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    /// width of generated versions; wide enough for any non-negative i64
    const WIDTH: usize = 20;

    /// wrap an existing version token
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// build a version from a clock reading
    pub fn from_ticks(ticks: i64) -> Self {
        Self(format!("{:0width$}", ticks.max(0), width = Self::WIDTH))
    }

    /// the tick count of a generated version, `None` for any other token
    pub fn ticks(&self) -> Option<i64> {
        if self.0.len() != Self::WIDTH || !self.0.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        self.0.parse().ok()
    }

    /// get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// convert to owned String
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Version {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Version {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for Version {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Location of a blob in an external content-addressed store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobRef {
    /// the store the blob lives in
    pub store: String,
    /// the blob name within the store (its content hash)
    pub name: String,
}

impl BlobRef {
    pub fn new(store: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            store: store.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.store, self.name)
    }
}

/// A blob reference together with the version it was recorded at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoredBlobRef {
    pub blob_ref: BlobRef,
    pub version: Version,
}

impl StoredBlobRef {
    pub fn new(blob_ref: BlobRef, version: Version) -> Self {
        Self { blob_ref, version }
    }
}

impl fmt::Display for StoredBlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.blob_ref, self.version)
    }
}

/// What a path denotes at a given version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathKind {
    File,
    Dir,
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKind::File => write!(f, "file"),
            PathKind::Dir => write!(f, "dir"),
        }
    }
}
