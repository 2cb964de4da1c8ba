//! Backup service.
//!
//! Ties the versioned filesystem to a blob store: every category gets its
//! own bucket, file content goes to the blob store under its SHA-256 name,
//! and the bucket records where each path's content lives at each version.
//!
//! ```text
//!   local files ──► BackupTransaction ──► BlobStore (content by hash)
//!                          │
//!                          ▼
//!                 Bucket "DRIVE" / "FLICKR" (path -> BlobRef history)
//! ```

mod category;
mod error;
mod transaction;

use std::sync::Arc;

use tracing::debug;

pub use category::{Category, CategoryParseError};
pub use error::{BackupError, BackupResult};
pub use transaction::{BackupSummary, BackupTransaction, ReadSeek};

use crate::blob::{BlobStore, GitBlobStore};
use crate::config::BackupConfig;
use crate::filesystem::{
    path, Bucket, FilesystemError, FilesystemService, MemoryFilesystem, PathKind, Version,
};
use crate::selector::Selector;

/// One child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub category: Category,
    /// full path from the category root
    pub path: String,
    pub kind: PathKind,
}

impl DirEntry {
    pub fn name(&self) -> &str {
        path::split_parent(&self.path).1
    }
}

/// Backs up content into categories and reads it back.
pub struct BackupService {
    config: BackupConfig,
    filesystem: MemoryFilesystem,
    blobs: Arc<dyn BlobStore>,
}

impl BackupService {
    /// Build a service over an existing filesystem and blob store. Nothing
    /// is persisted by [`BackupService::save`] unless `config.state_path`
    /// points somewhere useful.
    pub fn new(config: BackupConfig, filesystem: MemoryFilesystem, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            config,
            filesystem,
            blobs,
        }
    }

    /// Open the on-disk service described by `config`: the git blob store
    /// at `blob_path` and, if present, the filesystem snapshot at
    /// `state_path`.
    pub fn open(config: BackupConfig) -> BackupResult<Self> {
        let blobs = GitBlobStore::open_or_init(config.store_name.clone(), &config.blob_path)?;
        let filesystem = if config.state_path.exists() {
            MemoryFilesystem::load(&config.state_path, &config.filesystem)?
        } else {
            debug!(path = %config.state_path.display(), "no snapshot, starting empty");
            MemoryFilesystem::with_config(&config.filesystem)
        };
        Ok(Self::new(config, filesystem, Arc::new(blobs)))
    }

    /// Persist the filesystem snapshot to `state_path`.
    pub fn save(&self) -> BackupResult<()> {
        self.filesystem.save(&self.config.state_path)?;
        Ok(())
    }

    pub fn filesystem(&self) -> &MemoryFilesystem {
        &self.filesystem
    }

    /// The bucket holding `category`.
    pub fn bucket(&self, category: Category) -> Bucket {
        self.filesystem.bucket(category.bucket_name())
    }

    /// Start a backup into `category`.
    pub fn begin(&self, category: Category) -> BackupTransaction<'_> {
        BackupTransaction::new(category, self.bucket(category), self.blobs.as_ref())
    }

    /// Latest content of the file at `path`.
    pub fn read_file(&self, category: Category, path: &str) -> BackupResult<Vec<u8>> {
        self.read_file_at(category, path, None)
    }

    /// Content of the file at `path`, at `version` or the file's latest.
    pub fn read_file_at(
        &self,
        category: Category,
        file_path: &str,
        version: Option<&Version>,
    ) -> BackupResult<Vec<u8>> {
        let cleaned = path::clean(file_path);
        if cleaned.is_empty() {
            return Err(BackupError::InvalidPath(file_path.to_string()));
        }

        let (parent, name) = path::split_parent(&cleaned);
        let selector = dir_selector(&self.bucket(category), parent).file(name);
        let selector = match version {
            Some(version) => selector.version(version.clone()),
            None => selector.latest(),
        };
        let stored = selector.blob_ref()?;

        if stored.blob_ref.store != self.blobs.name() {
            return Err(BackupError::ForeignStore {
                expected: self.blobs.name().to_string(),
                found: stored.blob_ref.store,
            });
        }
        self.blobs
            .get(&stored.blob_ref.name)?
            .ok_or_else(|| BackupError::BlobMissing {
                store: stored.blob_ref.store.clone(),
                name: stored.blob_ref.name.clone(),
            })
    }

    /// Children of the directory at `path`, at `version` or the directory's
    /// latest version. Each child is reported once; a name that is a
    /// directory at that version is reported as a directory.
    pub fn list_dir(
        &self,
        category: Category,
        dir_path: &str,
        version: Option<&Version>,
    ) -> BackupResult<Vec<DirEntry>> {
        let dir = path::clean(dir_path);
        let base = dir_selector(&self.bucket(category), &dir);

        let version = match version {
            Some(version) => version.clone(),
            None => base
                .latest()
                .versions()?
                .into_iter()
                .next()
                .ok_or_else(|| FilesystemError::DirectoryNotFound(dir.clone()))?,
        };

        let at = base.version(version.clone());
        let mut entries = Vec::new();
        for name in at.list()? {
            let kind = if base.dir(name.as_str()).version(version.clone()).versions().is_ok() {
                PathKind::Dir
            } else {
                PathKind::File
            };
            entries.push(DirEntry {
                category,
                path: path::join(&dir, &name),
                kind,
            });
        }
        Ok(entries)
    }
}

impl std::fmt::Debug for BackupService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackupService")
            .field("state_path", &self.config.state_path)
            .field("store", &self.blobs.name())
            .field("buckets", &self.filesystem.bucket_names())
            .finish()
    }
}

/// a selector pointing at `dir`, one Dir() per segment
fn dir_selector(bucket: &Bucket, dir: &str) -> Selector {
    path::segments(dir).fold(bucket.select(), |selector, segment| selector.dir(segment))
}
