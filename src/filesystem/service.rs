//! Bucket registry.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::FilesystemConfig;
use crate::filesystem::bucket::{Bucket, BucketState};
use crate::filesystem::error::FsResult;
use crate::filesystem::version::VersionGenerator;

/// Hands out buckets by name.
pub trait FilesystemService: Send + Sync {
    /// Get the bucket called `name`, creating it on first access.
    fn bucket(&self, name: &str) -> Bucket;
}

/// Serializable state of every bucket of a [`MemoryFilesystem`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesystemSnapshot {
    pub buckets: BTreeMap<String, BucketState>,
}

/// In-memory filesystem service.
///
/// This is the reference implementation of the engine. Buckets live as long
/// as the service and are never removed.
pub struct MemoryFilesystem {
    buckets: Mutex<BTreeMap<String, Bucket>>,
    generator: Arc<VersionGenerator>,
}

impl MemoryFilesystem {
    /// Create an empty filesystem with the default configuration.
    pub fn new() -> Self {
        Self::with_config(&FilesystemConfig::default())
    }

    /// Create an empty filesystem.
    pub fn with_config(config: &FilesystemConfig) -> Self {
        Self::with_generator(VersionGenerator::from_config(config))
    }

    /// Create an empty filesystem drawing versions from `generator`.
    pub fn with_generator(generator: VersionGenerator) -> Self {
        Self {
            buckets: Mutex::new(BTreeMap::new()),
            generator: Arc::new(generator),
        }
    }

    /// Restore a filesystem from a snapshot.
    pub fn from_snapshot(snapshot: FilesystemSnapshot, config: &FilesystemConfig) -> Self {
        let generator = Arc::new(VersionGenerator::from_config(config));
        let buckets = snapshot
            .buckets
            .into_iter()
            .map(|(name, state)| {
                let bucket = Bucket::from_state(name.clone(), state, generator.clone());
                (name, bucket)
            })
            .collect();
        Self {
            buckets: Mutex::new(buckets),
            generator,
        }
    }

    /// Names of all buckets created so far.
    pub fn bucket_names(&self) -> Vec<String> {
        self.buckets.lock().keys().cloned().collect()
    }

    /// Capture the state of every bucket.
    pub fn snapshot(&self) -> FilesystemSnapshot {
        let buckets = self
            .buckets
            .lock()
            .iter()
            .map(|(name, bucket)| (name.clone(), bucket.snapshot()))
            .collect();
        FilesystemSnapshot { buckets }
    }

    /// Write a JSON snapshot to `path`, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> FsResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let snapshot = self.snapshot();
        let bytes = serde_json::to_vec_pretty(&snapshot)?;
        fs::write(path, bytes)?;
        info!(path = %path.display(), buckets = snapshot.buckets.len(), "saved snapshot");
        Ok(())
    }

    /// Load a JSON snapshot written by [`MemoryFilesystem::save`].
    pub fn load(path: impl AsRef<Path>, config: &FilesystemConfig) -> FsResult<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let snapshot: FilesystemSnapshot = serde_json::from_slice(&bytes)?;
        info!(path = %path.display(), buckets = snapshot.buckets.len(), "loaded snapshot");
        Ok(Self::from_snapshot(snapshot, config))
    }
}

impl Default for MemoryFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FilesystemService for MemoryFilesystem {
    fn bucket(&self, name: &str) -> Bucket {
        let mut buckets = self.buckets.lock();
        buckets
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(bucket = name, "creating bucket");
                Bucket::new(name, self.generator.clone())
            })
            .clone()
    }
}

impl fmt::Display for MemoryFilesystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "buckets:")?;
        for (name, bucket) in self.buckets.lock().iter() {
            writeln!(f, "{:?}:", name)?;
            write!(f, "{}", bucket)?;
        }
        Ok(())
    }
}

impl fmt::Debug for MemoryFilesystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryFilesystem")
            .field("buckets", &self.bucket_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    //! Behavioral suite for the engine, run against the in-memory service.

    use std::thread;
    use std::time::Duration;

    use tempfile::TempDir;

    use super::*;
    use crate::filesystem::types::{BlobRef, Version};
    use crate::filesystem::version::{ClockResolution, ScriptedClock};

    fn service() -> MemoryFilesystem {
        MemoryFilesystem::with_generator(VersionGenerator::new(
            Arc::new(ScriptedClock::new([1_000])),
            Duration::ZERO,
        ))
    }

    fn sorted(mut names: Vec<String>) -> Vec<String> {
        names.sort();
        names
    }

    #[test]
    fn test_put_and_get_file() {
        let service = service();
        let bucket = service.bucket("testbucket1");

        let input = BlobRef::new("store_a", "store_a_abcd");
        let mut tx = bucket.new_put_transaction();
        tx.file("a", input.clone());
        tx.commit().unwrap();

        let stored = bucket.select().file("a").latest().blob_ref().unwrap();
        assert_eq!(stored.blob_ref, input);
    }

    #[test]
    fn test_multiple_result_ref_is_ambiguous() {
        let service = service();
        let bucket = service.bucket("testbucket1");

        for name in ["store_a_abcd1", "store_a_abcd2"] {
            let mut tx = bucket.new_put_transaction();
            tx.file("a", BlobRef::new("store_a", name));
            tx.commit().unwrap();
        }

        let err = bucket.select().file("a").blob_ref().unwrap_err();
        assert!(err.is_ambiguous(), "unexpected error: {}", err);
    }

    #[test]
    fn test_single_version_ref_still_requires_version() {
        let service = service();
        let bucket = service.bucket("b");
        let mut tx = bucket.new_put_transaction();
        tx.file("a", BlobRef::new("s", "n"));
        tx.commit().unwrap();

        let err = bucket.select().file("a").blob_ref().unwrap_err();
        assert!(err.is_grammar(), "unexpected error: {}", err);
    }

    #[test]
    fn test_multiple_result_versions() {
        let service = service();
        let bucket = service.bucket("testbucket1");

        for name in ["store_a_abcd1", "store_a_abcd2"] {
            let mut tx = bucket.new_put_transaction();
            tx.file("a", BlobRef::new("store_a", name));
            tx.commit().unwrap();
        }

        let versions = bucket.select().file("a").versions().unwrap();
        assert_eq!(versions.len(), 2);
        assert_ne!(versions[0], versions[1]);
    }

    #[test]
    fn test_latest_file() {
        let service = service();
        let bucket = service.bucket("testbucket1");

        let in1 = BlobRef::new("store_a1", "store_a_abcd1");
        let mut tx = bucket.new_put_transaction();
        tx.file("a", in1);
        tx.commit().unwrap();

        let in2 = BlobRef::new("store_a2", "store_a_abcd2");
        let mut tx = bucket.new_put_transaction();
        tx.file("a", in2.clone());
        tx.commit().unwrap();

        let stored = bucket.select().file("a").latest().blob_ref().unwrap();
        assert_eq!(stored.blob_ref, in2);

        let stored = bucket.select().latest().file("a").blob_ref().unwrap();
        assert_eq!(stored.blob_ref, in2);
    }

    #[test]
    fn test_latest_scoped_to_path_vs_bucket() {
        let service = service();
        let bucket = service.bucket("b");

        let mut tx = bucket.new_put_transaction();
        tx.file("a", BlobRef::new("s", "a1"));
        let first = tx.commit().unwrap();

        let mut tx = bucket.new_put_transaction();
        tx.file("other", BlobRef::new("s", "o1"));
        tx.commit().unwrap();

        // "a" did not change in the latest commit
        let stored = bucket.select().file("a").latest().blob_ref().unwrap();
        assert_eq!(stored.version, first);

        let err = bucket.select().latest().file("a").blob_ref().unwrap_err();
        assert!(err.is_not_found(), "unexpected error: {}", err);
    }

    #[test]
    fn test_put_dir() {
        let service = service();
        let bucket = service.bucket("testbucket1");

        let mut tx = bucket.new_put_transaction();
        tx.dir("a");
        tx.commit().unwrap();

        assert_eq!(bucket.select().list().unwrap(), vec!["a"]);
        assert!(bucket.select().dir("a").list().unwrap().is_empty());
    }

    #[test]
    fn test_multiple_version_dir() {
        let service = service();
        let bucket = service.bucket("testbucket1");

        let mut tx1 = bucket.new_put_transaction();
        tx1.dir("a");
        tx1.dir("b");
        tx1.commit().unwrap();

        let mut tx2 = bucket.new_put_transaction();
        tx2.dir("a");
        tx2.dir("c");
        tx2.commit().unwrap();

        let all = sorted(bucket.select().list().unwrap());
        assert_eq!(all, vec!["a", "b", "c"]);

        let latest = sorted(bucket.select().latest().list().unwrap());
        assert_eq!(latest, vec!["a", "c"]);

        let versions = bucket.select().dir("a").versions().unwrap();
        assert_eq!(versions.len(), 2);
        assert_ne!(versions[0], versions[1]);
    }

    #[test]
    fn test_listing_is_one_level() {
        let service = service();
        let bucket = service.bucket("b");

        let mut tx = bucket.new_put_transaction();
        tx.dir("a");
        tx.commit().unwrap();

        let mut tx = bucket.new_put_transaction();
        tx.dir("a").dir("b").file("c", BlobRef::new("s", "abc"));
        tx.commit().unwrap();

        let names = bucket.select().dir("a").list().unwrap();
        assert_eq!(names, vec!["b"]);

        let names = bucket.select().dir("a").dir("b").list().unwrap();
        assert_eq!(names, vec!["c"]);
    }

    #[test]
    fn test_nested_transaction_paths() {
        let service = service();
        let bucket = service.bucket("testbucket1");

        let mut tx = bucket.new_put_transaction();
        tx.dir("x/y").dir("z");
        tx.dir("a").dir("b/c").file("d", BlobRef::new("store_a", "store_a_abcd"));
        tx.commit().unwrap();
        assert!(tx.commit().is_err());

        let files = bucket.select().dir("x").dir("y").dir("z").list().unwrap();
        assert!(files.is_empty());

        let stored = bucket
            .select()
            .dir("a/b/c")
            .file("d")
            .latest()
            .blob_ref()
            .unwrap();
        assert_eq!(stored.blob_ref, BlobRef::new("store_a", "store_a_abcd"));

        let mut tx = bucket.new_put_transaction();
        tx.dir("x/y").file("z", BlobRef::new("store_b", "store_b_xyz"));
        tx.dir("a").dir("b/c").file("d", BlobRef::new("store_b", "store_b_abcd"));
        tx.commit().unwrap();

        assert!(bucket.select().dir("a/b/c").file("d").blob_ref().is_err());
        let latest = bucket
            .select()
            .latest()
            .dir("a/b/c")
            .file("d")
            .blob_ref()
            .unwrap();
        assert_eq!(latest.blob_ref, BlobRef::new("store_b", "store_b_abcd"));
        assert_eq!(bucket.select().dir("a/b/c").file("d").versions().unwrap().len(), 2);
    }

    #[test]
    fn test_kind_independence_across_versions() {
        let service = service();
        let bucket = service.bucket("b");

        let mut tx = bucket.new_put_transaction();
        tx.dir("a/b");
        let as_dir = tx.commit().unwrap();

        let mut tx = bucket.new_put_transaction();
        tx.dir("a").file("b", BlobRef::new("s", "ab"));
        let as_file = tx.commit().unwrap();

        let root_versions = bucket.select().versions().unwrap();
        assert_eq!(root_versions, vec![as_dir.clone(), as_file.clone()]);

        let ab = bucket.select().dir("a").dir("b");
        assert!(ab.version(as_dir.clone()).list().is_ok());
        assert!(ab.version(as_file.clone()).list().unwrap_err().is_not_found());

        let ab_file = bucket.select().dir("a").file("b");
        assert!(ab_file.version(as_dir).blob_ref().unwrap_err().is_not_found());
        assert_eq!(
            ab_file.version(as_file).blob_ref().unwrap().blob_ref,
            BlobRef::new("s", "ab")
        );
    }

    #[test]
    fn test_version_uniqueness_back_to_back() {
        let service = MemoryFilesystem::new();
        let bucket = service.bucket("b");

        let mut versions = Vec::new();
        for _ in 0..5 {
            let mut tx = bucket.new_put_transaction();
            tx.dir("a");
            versions.push(tx.commit().unwrap());
        }
        for pair in versions.windows(2) {
            assert!(pair[0] < pair[1], "versions not increasing: {:?}", versions);
        }
    }

    #[test]
    fn test_buckets_are_independent() {
        let service = service();
        let one = service.bucket("one");
        let two = service.bucket("two");

        let mut tx = one.new_put_transaction();
        tx.dir("a");
        tx.commit().unwrap();

        assert!(two.latest_version().is_none());
        assert!(two.select().list().unwrap_err().is_not_found());
        assert_eq!(service.bucket_names(), vec!["one", "two"]);

        // same name, same bucket
        assert_eq!(service.bucket("one").latest_version(), one.latest_version());
    }

    #[test]
    fn test_concurrent_commits_get_distinct_versions() {
        let service = Arc::new(service());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let service = service.clone();
                thread::spawn(move || {
                    let bucket = service.bucket("shared");
                    let mut tx = bucket.new_put_transaction();
                    tx.file(&format!("f{}", i), BlobRef::new("s", format!("n{}", i)));
                    tx.commit().unwrap()
                })
            })
            .collect();

        let mut versions: Vec<Version> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        versions.sort();
        versions.dedup();
        assert_eq!(versions.len(), 4);
    }

    #[test]
    fn test_snapshot_roundtrip_through_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/state.json");

        let service = service();
        let bucket = service.bucket("DRIVE");
        let mut tx = bucket.new_put_transaction();
        tx.dir("docs").file("a.txt", BlobRef::new("s", "hash"));
        let version = tx.commit().unwrap();
        service.save(&path).unwrap();

        let restored = MemoryFilesystem::load(&path, &FilesystemConfig::default()).unwrap();
        assert_eq!(restored.snapshot(), service.snapshot());

        let bucket = restored.bucket("DRIVE");
        assert_eq!(bucket.latest_version(), Some(version.clone()));

        // commits continue after the restored latest version
        let mut tx = bucket.new_put_transaction();
        tx.dir("docs");
        assert!(tx.commit().unwrap() > version);
    }

    #[test]
    fn test_restore_at_coarser_resolution_keeps_committing() {
        let service = MemoryFilesystem::with_config(
            &FilesystemConfig::new().clock_resolution(ClockResolution::Micros),
        );
        let mut tx = service.bucket("b").new_put_transaction();
        tx.dir("a");
        let fine = tx.commit().unwrap();

        let config = FilesystemConfig::new().clock_resolution(ClockResolution::Seconds);
        let restored = MemoryFilesystem::from_snapshot(service.snapshot(), &config);
        let mut tx = restored.bucket("b").new_put_transaction();
        tx.dir("a");
        let next = tx.commit().unwrap();

        assert!(next > fine);
        assert_eq!(next.ticks(), fine.ticks().map(|t| t + 1));
    }

    #[test]
    fn test_display_lists_buckets() {
        let service = service();
        let mut tx = service.bucket("b").new_put_transaction();
        tx.dir("a");
        tx.commit().unwrap();

        let dump = service.to_string();
        assert!(dump.starts_with("buckets:\n\"b\":\nlatest version: "));
        assert!(dump.contains("a file versions: - dir versions: @"));
    }
}
