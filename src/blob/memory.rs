//! In-memory blob store, for tests and throwaway runs.

use std::collections::HashMap;
use std::io::Read;

use parking_lot::RwLock;

use crate::blob::error::{BlobError, BlobResult};
use crate::blob::BlobStore;

#[derive(Debug)]
pub struct MemoryBlobStore {
    name: String,
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

impl BlobStore for MemoryBlobStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn put(&self, name: &str, data: &mut dyn Read) -> BlobResult<()> {
        if name.is_empty() {
            return Err(BlobError::InvalidName(name.to_string()));
        }
        if self.blobs.read().contains_key(name) {
            return Err(BlobError::AlreadyExists {
                name: name.to_string(),
            });
        }

        let mut bytes = Vec::new();
        data.read_to_end(&mut bytes)?;

        let mut blobs = self.blobs.write();
        if blobs.contains_key(name) {
            return Err(BlobError::AlreadyExists {
                name: name.to_string(),
            });
        }
        blobs.insert(name.to_string(), bytes);
        Ok(())
    }

    fn get(&self, name: &str) -> BlobResult<Option<Vec<u8>>> {
        Ok(self.blobs.read().get(name).cloned())
    }

    fn contains(&self, name: &str) -> BlobResult<bool> {
        Ok(self.blobs.read().contains_key(name))
    }
}
