//! Configuration for the filesystem engine and the backup service.

use std::path::PathBuf;
use std::time::Duration;

use crate::filesystem::ClockResolution;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesystemConfig {
    /// Granularity of the clock that versions are drawn from.
    pub clock_resolution: ClockResolution,
    /// How long a commit waits before re-reading the clock when the reading
    /// does not yet exceed the bucket's latest version.
    pub retry_interval: Duration,
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        Self {
            clock_resolution: ClockResolution::Millis,
            retry_interval: Duration::from_millis(1),
        }
    }
}

impl FilesystemConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the clock resolution.
    pub fn clock_resolution(mut self, value: ClockResolution) -> Self {
        self.clock_resolution = value;
        self
    }

    /// Set the retry interval.
    pub fn retry_interval(mut self, value: Duration) -> Self {
        self.retry_interval = value;
        self
    }
}

/// Backup service configuration.
#[derive(Debug, Clone)]
pub struct BackupConfig {
    /// Where the filesystem snapshot (the metadata) is kept.
    pub state_path: PathBuf,
    /// Directory of the git repository holding blob content.
    pub blob_path: PathBuf,
    /// Store name recorded in every blob reference.
    pub store_name: String,
    /// Engine settings.
    pub filesystem: FilesystemConfig,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from(".backupfs/state.json"),
            blob_path: PathBuf::from(".backupfs/blobs"),
            store_name: "local".to_string(),
            filesystem: FilesystemConfig::default(),
        }
    }
}

impl BackupConfig {
    /// Create a configuration rooted at `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            state_path: dir.join("state.json"),
            blob_path: dir.join("blobs"),
            ..Default::default()
        }
    }

    pub fn state_path(mut self, value: impl Into<PathBuf>) -> Self {
        self.state_path = value.into();
        self
    }

    pub fn blob_path(mut self, value: impl Into<PathBuf>) -> Self {
        self.blob_path = value.into();
        self
    }

    pub fn store_name(mut self, value: impl Into<String>) -> Self {
        self.store_name = value.into();
        self
    }

    pub fn filesystem(mut self, value: FilesystemConfig) -> Self {
        self.filesystem = value;
        self
    }
}
