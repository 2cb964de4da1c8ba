//! Per-path histories.
//!
//! A path owns up to two independent histories: one recording the versions
//! at which it existed as a directory, one recording the blob stored at it
//! as a file. Both are append-only and ordered by insertion, which is also
//! version order since commits append increasing versions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::filesystem::types::{BlobRef, StoredBlobRef, Version};

/// versions at which a path existed as a directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirHistory {
    versions: Vec<Version>,
}

impl DirHistory {
    pub fn record(&mut self, version: Version) {
        self.versions.push(version);
    }

    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    pub fn latest(&self) -> Option<&Version> {
        self.versions.last()
    }

    pub fn contains(&self, version: &Version) -> bool {
        self.versions.contains(version)
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

impl fmt::Display for DirHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, version) in self.versions.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "@{}", version)?;
        }
        Ok(())
    }
}

/// blobs stored at a path as a file, one per version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileHistory {
    entries: Vec<StoredBlobRef>,
}

impl FileHistory {
    pub fn record(&mut self, blob_ref: BlobRef, version: Version) {
        self.entries.push(StoredBlobRef::new(blob_ref, version));
    }

    pub fn entries(&self) -> &[StoredBlobRef] {
        &self.entries
    }

    pub fn versions(&self) -> impl Iterator<Item = &Version> {
        self.entries.iter().map(|entry| &entry.version)
    }

    pub fn latest(&self) -> Option<&StoredBlobRef> {
        self.entries.last()
    }

    /// the entry recorded at exactly `version`
    pub fn at(&self, version: &Version) -> Option<&StoredBlobRef> {
        self.entries.iter().find(|entry| &entry.version == version)
    }

    pub fn contains(&self, version: &Version) -> bool {
        self.at(version).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for FileHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", entry)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_history() {
        let mut history = DirHistory::default();
        assert!(history.latest().is_none());

        history.record(Version::new("1"));
        history.record(Version::new("2"));

        assert_eq!(history.len(), 2);
        assert_eq!(history.latest(), Some(&Version::new("2")));
        assert!(history.contains(&Version::new("1")));
        assert!(!history.contains(&Version::new("3")));
        assert_eq!(history.to_string(), "@1,@2");
    }

    #[test]
    fn test_file_history_lookup() {
        let mut history = FileHistory::default();
        history.record(BlobRef::new("s", "one"), Version::new("1"));
        history.record(BlobRef::new("s", "two"), Version::new("2"));

        assert_eq!(history.at(&Version::new("1")).unwrap().blob_ref.name, "one");
        assert_eq!(history.latest().unwrap().blob_ref.name, "two");
        assert!(history.at(&Version::new("9")).is_none());

        let versions: Vec<_> = history.versions().cloned().collect();
        assert_eq!(versions, vec![Version::new("1"), Version::new("2")]);
        assert_eq!(history.to_string(), "s:one@1,s:two@2");
    }
}
