//! backupfs - a versioned backup filesystem
//!
//! Backed-up files are organized into categories, each stored in its own
//! versioned bucket. Every backup is one commit: it appends a new version to
//! the history of each file and directory it touches, so any earlier state
//! can still be listed and read. File content lives in a write-once blob
//! store (a bare git repository on disk), named by its SHA-256.
//!
//! # Example
//!
//! ```no_run
//! use std::io::Cursor;
//! use backupfs::backup::{BackupService, Category};
//! use backupfs::config::BackupConfig;
//!
//! let service = BackupService::open(BackupConfig::in_dir("./.backupfs")).unwrap();
//! let mut tx = service.begin(Category::Drive);
//! tx.put("docs/notes.txt", Cursor::new(b"hello".to_vec())).unwrap();
//! let summary = tx.commit().unwrap();
//! service.save().unwrap();
//!
//! let content = service.read_file(Category::Drive, "docs/notes.txt").unwrap();
//! assert_eq!(content, b"hello");
//! println!("backed up at version {}", summary.version);
//! ```

pub mod backup;
pub mod blob;
pub mod config;
pub mod filesystem;
pub mod selector;
