//! Buckets: independent versioned namespaces.
//!
//! A bucket keeps two maps keyed by path, one of directory histories and
//! one of file histories, plus the latest committed version. A path's kind
//! is therefore decided per version by which map has an entry at that
//! version; the same name may be a directory in one commit and a file in
//! the next.
//!
//! Writers are serialized by a per-bucket commit lock. A commit applies all
//! of its history entries and the new latest version under one write-lock
//! acquisition, so readers see either none or all of it.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Bound;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::filesystem::history::{DirHistory, FileHistory};
use crate::filesystem::path;
use crate::filesystem::transaction::PutTransaction;
use crate::filesystem::types::{BlobRef, Version};
use crate::filesystem::version::VersionGenerator;
use crate::selector::Selector;

/// The stored state of one bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketState {
    latest: Option<Version>,
    dirs: BTreeMap<String, DirHistory>,
    files: BTreeMap<String, FileHistory>,
}

impl BucketState {
    /// the most recently committed version
    pub fn latest(&self) -> Option<&Version> {
        self.latest.as_ref()
    }

    pub fn dir_history(&self, path: &str) -> Option<&DirHistory> {
        self.dirs.get(path)
    }

    pub fn file_history(&self, path: &str) -> Option<&FileHistory> {
        self.files.get(path)
    }

    /// Names of the direct children of `dir` that have an entry, in either
    /// map, at one of `versions`.
    pub fn children_at(&self, dir: &str, versions: &[Version]) -> BTreeSet<String> {
        let prefix = path::descendant_prefix(dir);
        let mut names = BTreeSet::new();

        let dirs = self
            .dirs
            .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded))
            .take_while(|(p, _)| p.starts_with(&prefix))
            .filter(|(_, history)| versions.iter().any(|v| history.contains(v)))
            .map(|(p, _)| p);
        let files = self
            .files
            .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded))
            .take_while(|(p, _)| p.starts_with(&prefix))
            .filter(|(_, history)| versions.iter().any(|v| history.contains(v)))
            .map(|(p, _)| p);

        for candidate in dirs.chain(files) {
            if let Some(name) = path::child_name(candidate, dir) {
                names.insert(name.to_string());
            }
        }
        names
    }

    /// Record one commit.
    fn apply(
        &mut self,
        version: &Version,
        dirs: &BTreeSet<String>,
        files: &BTreeMap<String, BlobRef>,
    ) {
        for dir in dirs {
            self.dirs
                .entry(dir.clone())
                .or_default()
                .record(version.clone());
        }
        for (file, blob_ref) in files {
            self.files
                .entry(file.clone())
                .or_default()
                .record(blob_ref.clone(), version.clone());
        }
        self.latest = Some(version.clone());
    }
}

impl fmt::Display for BucketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let latest = self.latest.as_ref().map(Version::as_str).unwrap_or("none");
        writeln!(f, "latest version: {}", latest)?;

        let paths: BTreeSet<&String> = self.dirs.keys().chain(self.files.keys()).collect();
        for p in paths {
            let name = if p.is_empty() { "/" } else { p.as_str() };
            write!(f, "{} file versions: ", name)?;
            match self.files.get(p) {
                Some(history) => write!(f, "{}", history)?,
                None => write!(f, "-")?,
            }
            write!(f, " dir versions: ")?;
            match self.dirs.get(p) {
                Some(history) => writeln!(f, "{}", history)?,
                None => writeln!(f, "-")?,
            }
        }
        Ok(())
    }
}

/// A named, independently versioned namespace of directories and files.
///
/// Clone this to share across threads - it uses Arc internally.
#[derive(Clone)]
pub struct Bucket {
    inner: Arc<BucketInner>,
}

struct BucketInner {
    name: String,
    state: RwLock<BucketState>,
    /// Serializes read-latest / generate / apply across commits.
    commit_lock: Mutex<()>,
    generator: Arc<VersionGenerator>,
}

impl Bucket {
    pub(crate) fn new(name: impl Into<String>, generator: Arc<VersionGenerator>) -> Self {
        Self::from_state(name, BucketState::default(), generator)
    }

    pub(crate) fn from_state(
        name: impl Into<String>,
        state: BucketState,
        generator: Arc<VersionGenerator>,
    ) -> Self {
        Self {
            inner: Arc::new(BucketInner {
                name: name.into(),
                state: RwLock::new(state),
                commit_lock: Mutex::new(()),
                generator,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Open a transaction that commits into this bucket.
    pub fn new_put_transaction(&self) -> PutTransaction {
        PutTransaction::new(self.clone())
    }

    /// Start a query against this bucket.
    pub fn select(&self) -> Selector {
        Selector::new(self.clone())
    }

    /// The latest committed version, if any commit happened.
    pub fn latest_version(&self) -> Option<Version> {
        self.inner.state.read().latest.clone()
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> BucketState {
        self.inner.state.read().clone()
    }

    /// Execute a function with read access to the state.
    pub(crate) fn with_state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&BucketState) -> T,
    {
        let state = self.inner.state.read();
        f(&state)
    }

    /// Stamp the pending entries with a fresh version and apply them.
    pub(crate) fn commit_pending(
        &self,
        tx_id: &str,
        dirs: &BTreeSet<String>,
        files: &BTreeMap<String, BlobRef>,
    ) -> Version {
        let _guard = self.inner.commit_lock.lock();

        let latest = self.latest_version();
        let version = self.inner.generator.next_after(latest.as_ref());

        self.inner.state.write().apply(&version, dirs, files);

        info!(
            bucket = %self.inner.name,
            tx_id,
            %version,
            dirs = dirs.len(),
            files = files.len(),
            "committed transaction"
        );
        version
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.state.read())
    }
}

impl fmt::Debug for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("Bucket")
            .field("name", &self.inner.name)
            .field("latest", &state.latest)
            .field("dirs", &state.dirs.len())
            .field("files", &state.files.len())
            .finish()
    }
}
