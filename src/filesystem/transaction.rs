//! Put transactions.
//!
//! A transaction collects directory declarations and file placements and
//! commits them together under one new version. Nested scopes returned by
//! [`PutTransaction::dir`] write into the same pending set, so everything
//! declared through any scope of a transaction lands in the same commit.
//!
//! ```ignore
//! let mut tx = bucket.new_put_transaction();
//! tx.dir("photos").dir("2016").file("beach.jpg", blob_ref);
//! tx.dir("docs");
//! let version = tx.commit()?;
//! ```

use std::collections::{BTreeMap, BTreeSet};

use ulid::Ulid;

use crate::filesystem::bucket::Bucket;
use crate::filesystem::error::{FilesystemError, FsResult};
use crate::filesystem::path;
use crate::filesystem::types::{BlobRef, Version};

/// Declarations waiting for commit.
#[derive(Debug, Default)]
struct Pending {
    dirs: BTreeSet<String>,
    files: BTreeMap<String, BlobRef>,
}

impl Pending {
    /// register `scope/path` and all of its ancestors, returning the full path
    fn add_dir(&mut self, scope: &str, dir: &str) -> String {
        let full = path::join(scope, dir);
        self.dirs.extend(path::prefixes(&full));
        full
    }

    fn add_file(&mut self, scope: &str, name: &str, blob_ref: BlobRef) {
        self.files.insert(path::join(scope, name), blob_ref);
    }
}

/// A builder for one atomic commit into a bucket.
pub struct PutTransaction {
    id: String,
    bucket: Bucket,
    pending: Pending,
    committed: Option<Version>,
}

impl PutTransaction {
    pub(crate) fn new(bucket: Bucket) -> Self {
        Self {
            id: Ulid::new().to_string().to_lowercase(),
            bucket,
            pending: Pending::default(),
            committed: None,
        }
    }

    /// Get the transaction ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The version this transaction committed at, once committed.
    pub fn committed_version(&self) -> Option<&Version> {
        self.committed.as_ref()
    }

    /// Check whether nothing has been declared yet.
    pub fn is_empty(&self) -> bool {
        self.pending.dirs.is_empty() && self.pending.files.is_empty()
    }

    /// Declare a directory (and every ancestor of it) and return a scope
    /// rooted there.
    pub fn dir(&mut self, dir: &str) -> PutScope<'_> {
        let path = self.pending.add_dir("", dir);
        PutScope {
            pending: &mut self.pending,
            path,
        }
    }

    /// Place a file at `name`, relative to the bucket root.
    pub fn file(&mut self, name: &str, blob_ref: BlobRef) -> &mut Self {
        self.pending.add_file("", name, blob_ref);
        self
    }

    /// Commit everything declared so far as one new version.
    ///
    /// Fails if this transaction was committed before.
    pub fn commit(&mut self) -> FsResult<Version> {
        if let Some(version) = &self.committed {
            return Err(FilesystemError::AlreadyCommitted {
                tx_id: self.id.clone(),
                version: version.clone(),
            });
        }

        let version = self
            .bucket
            .commit_pending(&self.id, &self.pending.dirs, &self.pending.files);
        self.committed = Some(version.clone());
        Ok(version)
    }
}

impl std::fmt::Debug for PutTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PutTransaction")
            .field("id", &self.id)
            .field("bucket", &self.bucket.name())
            .field("dirs", &self.pending.dirs.len())
            .field("files", &self.pending.files.len())
            .field("committed", &self.committed)
            .finish()
    }
}

/// A directory scope inside a transaction.
pub struct PutScope<'tx> {
    pending: &'tx mut Pending,
    path: String,
}

impl<'tx> PutScope<'tx> {
    /// The full path this scope is rooted at.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Declare a subdirectory and return a scope rooted there.
    pub fn dir(&mut self, dir: &str) -> PutScope<'_> {
        let path = self.pending.add_dir(&self.path, dir);
        PutScope {
            pending: &mut *self.pending,
            path,
        }
    }

    /// Place a file in this directory.
    pub fn file(&mut self, name: &str, blob_ref: BlobRef) -> &mut Self {
        self.pending.add_file(&self.path, name, blob_ref);
        self
    }
}
