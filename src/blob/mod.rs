//! Blob content stores.
//!
//! File content lives outside the filesystem engine, in a store that maps a
//! content name to bytes. Names are write-once: `put` on a taken name fails.
//! The backup layer names blobs by content hash (see [`content_name`]).

mod error;
mod git;
mod hash;
mod memory;

use std::io::Read;

pub use error::{BlobError, BlobResult};
pub use git::GitBlobStore;
pub use hash::{content_name, content_name_bytes};
pub use memory::MemoryBlobStore;

/// A named, write-once content store.
pub trait BlobStore: Send + Sync {
    /// The store name recorded in every `BlobRef` pointing into it.
    fn name(&self) -> &str;

    /// Store `data` under `name`. Fails if the name is taken.
    fn put(&self, name: &str, data: &mut dyn Read) -> BlobResult<()>;

    /// Fetch the content stored under `name`, `None` if absent.
    fn get(&self, name: &str) -> BlobResult<Option<Vec<u8>>>;

    fn contains(&self, name: &str) -> BlobResult<bool> {
        Ok(self.get(name)?.is_some())
    }
}
