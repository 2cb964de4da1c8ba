//! versioned filesystem engine
//!
//! Each bucket is an independent namespace holding the history of every
//! directory and file ever committed to it. Nothing is ever overwritten: a
//! commit appends one new version to each path it touches.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │              FilesystemService (MemoryFilesystem)         │
//! │        bucket registry, JSON snapshot save / load         │
//! └───────────────────────────────────────────────────────────┘
//!                              │ bucket(name)
//!                              ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │                          Bucket                           │
//! │   RwLock<BucketState>: latest + dir / file histories      │
//! │   commit lock + VersionGenerator                          │
//! └───────────────────────────────────────────────────────────┘
//!           │ new_put_transaction()          │ select()
//!           ▼                                ▼
//!  ┌──────────────────┐             ┌──────────────────┐
//!  │  PutTransaction  │             │     Selector     │
//!  │  dir() / file()  │             │ list / blob_ref  │
//!  │     commit()     │             │    / versions    │
//!  └──────────────────┘             └──────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use backupfs::filesystem::{BlobRef, FilesystemService, MemoryFilesystem};
//!
//! let fs = MemoryFilesystem::new();
//! let bucket = fs.bucket("DRIVE");
//!
//! let mut tx = bucket.new_put_transaction();
//! tx.dir("docs").file("notes.txt", BlobRef::new("local", "9f86d0..."));
//! let version = tx.commit()?;
//!
//! let names = bucket.select().dir("docs").latest().list()?;
//! let stored = bucket.select().dir("docs").file("notes.txt").latest().blob_ref()?;
//! ```

mod bucket;
mod error;
mod history;
pub mod path;
mod service;
mod transaction;
mod types;
mod version;

pub use bucket::{Bucket, BucketState};
pub use error::{FilesystemError, FsResult};
pub use history::{DirHistory, FileHistory};
pub use service::{FilesystemService, FilesystemSnapshot, MemoryFilesystem};
pub use transaction::{PutScope, PutTransaction};
pub use types::{BlobRef, PathKind, StoredBlobRef, Version};
pub use version::{ClockResolution, SystemClock, VersionClock, VersionGenerator};
