//! Persistence of the previous snapshot and the first-run marker.
//!
//! Two small seams keep the orchestrator independent of the filesystem:
//!
//! - [`SnapshotStore`] loads and replaces the last observed friend counts.
//!   Loading never fails; a missing or corrupt file reads as an empty
//!   snapshot.
//! - [`RunLatch`] answers "is this the first run?" exactly once with `true`.
//!
//! File-backed and in-memory implementations are provided for both.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use friendwatch_types::Snapshot;
use tracing::{debug, info, warn};

/// Errors raised when state cannot be written.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A filesystem operation failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The snapshot could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Storage for the last observed snapshot.
pub trait SnapshotStore {
    /// Read the previous snapshot, or an empty one if none is usable.
    fn load(&self) -> Snapshot;

    /// Replace the stored snapshot entirely.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the snapshot cannot be durably written.
    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError>;
}

/// One-way first-run marker.
pub trait RunLatch {
    /// Return `true` and record initialization if the marker is absent;
    /// return `false` on every later call.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the marker cannot be created.
    fn check_and_set(&self) -> Result<bool, StoreError>;
}

// ---------------------------------------------------------------------------
// File-backed implementations
// ---------------------------------------------------------------------------

/// Snapshot store backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    /// Create a store reading and writing `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Snapshot {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no previous snapshot");
                return Snapshot::new();
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "previous snapshot unreadable, starting from empty"
                );
                return Snapshot::new();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "previous snapshot corrupt, starting from empty"
                );
                Snapshot::new()
            }
        }
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let content = serde_json::to_vec(snapshot)?;

        // Write to temp file, then rename so a crash never leaves a torn file.
        let tmp_path = self.temp_path();
        let mut file = File::create(&tmp_path).map_err(|e| StoreError::io(&tmp_path, e))?;
        file.write_all(&content)
            .and_then(|()| file.sync_all())
            .map_err(|e| StoreError::io(&tmp_path, e))?;
        drop(file);
        std::fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::io(&self.path, e))?;

        debug!(
            path = %self.path.display(),
            accounts = snapshot.len(),
            "snapshot saved"
        );
        Ok(())
    }
}

/// First-run latch backed by the existence of a marker file.
///
/// The marker holds an RFC 3339 timestamp for operators; its content is
/// never read back.
#[derive(Debug, Clone)]
pub struct FileRunLatch {
    path: PathBuf,
}

impl FileRunLatch {
    /// Create a latch using `path` as the marker.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RunLatch for FileRunLatch {
    fn check_and_set(&self) -> Result<bool, StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        file.write_all(Utc::now().to_rfc3339().as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|e| StoreError::io(&self.path, e))?;

        info!(path = %self.path.display(), "first run, marker written");
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// In-memory implementations
// ---------------------------------------------------------------------------

/// Snapshot store held in memory.
///
/// Clones share the same underlying snapshot, so a test can keep a handle
/// and inspect what a run saved.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    inner: Arc<Mutex<Snapshot>>,
}

impl MemorySnapshotStore {
    /// Create a store pre-populated with `snapshot`.
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            inner: Arc::new(Mutex::new(snapshot)),
        }
    }

    /// A copy of the currently stored snapshot.
    pub fn current(&self) -> Snapshot {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Snapshot {
        self.current()
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = snapshot.clone();
        Ok(())
    }
}

/// First-run latch held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryRunLatch {
    initialized: Arc<Mutex<bool>>,
}

impl MemoryRunLatch {
    /// A latch that has already been set, simulating a later run.
    pub fn initialized() -> Self {
        Self {
            initialized: Arc::new(Mutex::new(true)),
        }
    }
}

impl RunLatch for MemoryRunLatch {
    fn check_and_set(&self) -> Result<bool, StoreError> {
        let mut initialized = self
            .initialized
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let first = !*initialized;
        *initialized = true;
        Ok(first)
    }
}
