//! Backup transactions.
//!
//! A backup transaction gathers local objects, uploads their content to the
//! blob store under content-hash names and records all of them in the
//! category's bucket as a single filesystem commit.
//!
//! Uploads happen before the filesystem commit and are not rolled back: a
//! failure part way through leaves the blobs uploaded so far in the store,
//! unreferenced, and commits nothing.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{Read, Seek, SeekFrom};

use tracing::{debug, info};

use crate::backup::category::Category;
use crate::backup::error::{BackupError, BackupResult};
use crate::blob::{content_name, BlobStore};
use crate::filesystem::{path, BlobRef, Bucket, Version};

/// A readable, rewindable object.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// Outcome of a committed backup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupSummary {
    pub version: Version,
    /// files recorded in the commit
    pub files: usize,
    /// blobs written to the store
    pub uploaded: usize,
    /// files whose content the store already had
    pub deduplicated: usize,
}

pub struct BackupTransaction<'a> {
    category: Category,
    bucket: Bucket,
    blobs: &'a dyn BlobStore,
    objects: BTreeMap<String, Box<dyn ReadSeek + 'a>>,
}

impl<'a> BackupTransaction<'a> {
    pub(crate) fn new(category: Category, bucket: Bucket, blobs: &'a dyn BlobStore) -> Self {
        Self {
            category,
            bucket,
            blobs,
            objects: BTreeMap::new(),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Number of objects added so far.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Add an object at `path`, relative to the category root.
    pub fn put(&mut self, path: &str, object: impl ReadSeek + 'a) -> BackupResult<()> {
        let cleaned = path::clean(path);
        if cleaned.is_empty() {
            return Err(BackupError::InvalidPath(path.to_string()));
        }
        if self.objects.contains_key(&cleaned) {
            return Err(BackupError::ObjectExists(cleaned));
        }
        self.objects.insert(cleaned, Box::new(object));
        Ok(())
    }

    /// Upload every object and record them all under one new version.
    pub fn commit(self) -> BackupResult<BackupSummary> {
        let BackupTransaction {
            category,
            bucket,
            blobs,
            objects,
        } = self;

        let mut tx = bucket.new_put_transaction();
        let files = objects.len();
        let mut uploaded = 0;
        let mut deduplicated = 0;

        for (object_path, mut object) in objects {
            let hash = content_name(&mut object)?;
            object.seek(SeekFrom::Start(0))?;

            let stored = if blobs.contains(&hash)? {
                false
            } else {
                match blobs.put(&hash, &mut object) {
                    Ok(()) => true,
                    Err(e) if e.is_already_exists() => false,
                    Err(e) => return Err(e.into()),
                }
            };
            if stored {
                uploaded += 1;
                debug!(%category, path = %object_path, blob = %hash, "uploaded object");
            } else {
                deduplicated += 1;
                debug!(%category, path = %object_path, blob = %hash, "content already stored");
            }

            let (parent, name) = path::split_parent(&object_path);
            tx.dir(parent).file(name, BlobRef::new(blobs.name(), hash));
        }

        let version = tx.commit()?;
        info!(
            %category,
            %version,
            files,
            uploaded,
            deduplicated,
            "backup committed"
        );
        Ok(BackupSummary {
            version,
            files,
            uploaded,
            deduplicated,
        })
    }
}

impl fmt::Debug for BackupTransaction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackupTransaction")
            .field("category", &self.category)
            .field("bucket", &self.bucket.name())
            .field("store", &self.blobs.name())
            .field("objects", &self.objects.keys().collect::<Vec<_>>())
            .finish()
    }
}
