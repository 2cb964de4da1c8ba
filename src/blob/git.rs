//! Blob store backed by a bare git repository.
//!
//! Each blob is a git blob object kept alive by a ref named
//! `refs/blobs/{name}`. A ref that already exists means the name is taken,
//! which gives the write-once semantics the store requires.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use git2::{ErrorCode, Repository};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::blob::error::{BlobError, BlobResult};
use crate::blob::BlobStore;

const REF_PREFIX: &str = "refs/blobs/";

pub struct GitBlobStore {
    name: String,
    path: PathBuf,
    repo: Mutex<Repository>,
}

impl GitBlobStore {
    /// Open an existing store.
    pub fn open(name: impl Into<String>, path: impl AsRef<Path>) -> BlobResult<Self> {
        let path = path.as_ref();
        let repo = Repository::open_bare(path)?;
        Ok(Self::from_repo(name.into(), path, repo))
    }

    /// Initialize a new store, creating the directory if needed.
    pub fn init(name: impl Into<String>, path: impl AsRef<Path>) -> BlobResult<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;
        let repo = Repository::init_bare(path)?;
        info!(path = %path.display(), "initialized blob store");
        Ok(Self::from_repo(name.into(), path, repo))
    }

    /// Open the store at `path`, or initialize one if nothing is there.
    pub fn open_or_init(name: impl Into<String>, path: impl AsRef<Path>) -> BlobResult<Self> {
        let name = name.into();
        let path = path.as_ref();
        match Repository::open_bare(path) {
            Ok(repo) => Ok(Self::from_repo(name, path, repo)),
            Err(e) if e.code() == ErrorCode::NotFound => Self::init(name, path),
            Err(e) => Err(e.into()),
        }
    }

    fn from_repo(name: String, path: &Path, repo: Repository) -> Self {
        Self {
            name,
            path: path.to_path_buf(),
            repo: Mutex::new(repo),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ref_name(name: &str) -> BlobResult<String> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(BlobError::InvalidName(name.to_string()));
        }
        Ok(format!("{}{}", REF_PREFIX, name))
    }
}

impl BlobStore for GitBlobStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn put(&self, name: &str, data: &mut dyn Read) -> BlobResult<()> {
        let ref_name = Self::ref_name(name)?;

        let mut bytes = Vec::new();
        data.read_to_end(&mut bytes)?;

        let repo = self.repo.lock();
        if has_reference(&repo, &ref_name)? {
            return Err(BlobError::AlreadyExists {
                name: name.to_string(),
            });
        }

        let oid = repo.blob(&bytes)?;
        repo.reference(&ref_name, oid, false, &format!("store blob {}", name))
            .map_err(|e| {
                if e.code() == ErrorCode::Exists {
                    BlobError::AlreadyExists {
                        name: name.to_string(),
                    }
                } else {
                    BlobError::Git(e)
                }
            })?;

        debug!(store = %self.name, blob = name, size = bytes.len(), "stored blob");
        Ok(())
    }

    fn get(&self, name: &str) -> BlobResult<Option<Vec<u8>>> {
        let ref_name = Self::ref_name(name)?;
        let repo = self.repo.lock();

        let reference = match repo.find_reference(&ref_name) {
            Ok(reference) => reference,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let blob = reference.peel_to_blob()?;
        Ok(Some(blob.content().to_vec()))
    }

    fn contains(&self, name: &str) -> BlobResult<bool> {
        let ref_name = Self::ref_name(name)?;
        let repo = self.repo.lock();
        has_reference(&repo, &ref_name)
    }
}

/// whether `ref_name` exists; errors other than "not found" propagate
fn has_reference(repo: &Repository, ref_name: &str) -> BlobResult<bool> {
    match repo.find_reference(ref_name) {
        Ok(_) => Ok(true),
        Err(e) if e.code() == ErrorCode::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

impl fmt::Debug for GitBlobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitBlobStore")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, GitBlobStore) {
        let dir = TempDir::new().unwrap();
        let store = GitBlobStore::init("git", dir.path().join("blobs")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_put_get() {
        let (_dir, store) = setup();
        store.put("abc123", &mut &b"payload"[..]).unwrap();

        assert_eq!(store.get("abc123").unwrap(), Some(b"payload".to_vec()));
        assert!(store.contains("abc123").unwrap());
        assert_eq!(store.get("missing").unwrap(), None);
        assert!(!store.contains("missing").unwrap());
    }

    #[test]
    fn test_put_existing_name_fails() {
        let (_dir, store) = setup();
        store.put("abc", &mut &b"one"[..]).unwrap();

        let err = store.put("abc", &mut &b"two"[..]).unwrap_err();
        assert!(err.is_already_exists());
        assert_eq!(store.get("abc").unwrap(), Some(b"one".to_vec()));
    }

    #[test]
    fn test_invalid_names() {
        let (_dir, store) = setup();
        for name in ["", "a/b", "../x", "a b"] {
            let err = store.put(name, &mut &b"x"[..]).unwrap_err();
            assert!(matches!(err, BlobError::InvalidName(_)), "accepted {:?}", name);
        }
    }

    #[test]
    fn test_open_or_init_reopens() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blobs");

        let store = GitBlobStore::open_or_init("git", &path).unwrap();
        store.put("keep", &mut &b"data"[..]).unwrap();
        drop(store);

        let store = GitBlobStore::open_or_init("git", &path).unwrap();
        assert_eq!(store.get("keep").unwrap(), Some(b"data".to_vec()));
        assert_eq!(store.path(), path.as_path());
    }

    #[test]
    fn test_corrupt_reference_is_an_error() {
        let (dir, store) = setup();
        let refs = dir.path().join("blobs/refs/blobs");
        std::fs::create_dir_all(&refs).unwrap();
        std::fs::write(refs.join("broken"), "not an object id\n").unwrap();

        assert!(store.contains("broken").is_err());
        assert!(store.put("broken", &mut &b"x"[..]).is_err());
        assert!(!store.contains("absent").unwrap());
    }

    #[test]
    fn test_open_missing_fails() {
        let dir = TempDir::new().unwrap();
        assert!(GitBlobStore::open("git", dir.path().join("nope")).is_err());
    }
}
