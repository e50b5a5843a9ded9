//! File storage for the `/files/{name}` routes.
//!
//! Every name maps to a file directly inside the configured base directory.
//! Names that could escape the directory are rejected before touching the
//! filesystem. Access to a single name is coordinated through a lock created
//! on demand: readers share it, writers hold it exclusively, and unrelated
//! names never contend.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no base directory configured")]
    NotConfigured,
    #[error("invalid file name: {0:?}")]
    InvalidName(String),
    #[error("{name}: {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    /// True when the file simply does not exist (or is not a regular file).
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

pub struct FileStore {
    base_dir: Option<PathBuf>,
    locks: Mutex<HashMap<String, Arc<RwLock<()>>>>,
}

impl FileStore {
    pub fn new(base_dir: Option<PathBuf>) -> Self {
        Self {
            base_dir,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    /// Resolves `name` to a path directly under the base directory.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, StoreError> {
        let base = self.base_dir.as_ref().ok_or(StoreError::NotConfigured)?;
        if !is_safe_name(name) {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        Ok(base.join(name))
    }

    /// Reads the whole file. Only regular files are served.
    pub async fn read(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.resolve(name)?;

        let lock = self.lock_for(name).await;
        let result = {
            let _shared = lock.read().await;
            read_regular_file(&path).await
        };
        drop(lock);
        self.release(name).await;

        result.map_err(|source| StoreError::Io {
            name: name.to_string(),
            source,
        })
    }

    /// Creates or truncates the file and writes `contents` in full.
    ///
    /// Concurrent writes to the same name are serialized, so the file ends up
    /// holding exactly one of the bodies.
    pub async fn write(&self, name: &str, contents: &[u8]) -> Result<(), StoreError> {
        let path = self.resolve(name)?;

        let lock = self.lock_for(name).await;
        let result = {
            let _exclusive = lock.write().await;
            write_regular_file(&path, contents).await
        };
        drop(lock);
        self.release(name).await;

        result.map_err(|source| StoreError::Io {
            name: name.to_string(),
            source,
        })
    }

    async fn lock_for(&self, name: &str) -> Arc<RwLock<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone()
    }

    // Drops the map entry once no request holds a handle to it.
    async fn release(&self, name: &str) {
        let mut locks = self.locks.lock().await;
        if let Some(lock) = locks.get(name) {
            if Arc::strong_count(lock) == 1 {
                locks.remove(name);
            }
        }
    }

    #[cfg(test)]
    async fn tracked_locks(&self) -> usize {
        self.locks.lock().await.len()
    }
}

// Symlinks are not followed, so nothing outside the base directory is served.
async fn read_regular_file(path: &Path) -> io::Result<Vec<u8>> {
    let meta = tokio::fs::symlink_metadata(path).await?;
    if !meta.is_file() {
        return Err(io::Error::new(io::ErrorKind::NotFound, "not a regular file"));
    }
    tokio::fs::read(path).await
}

async fn write_regular_file(path: &Path, contents: &[u8]) -> io::Result<()> {
    match tokio::fs::symlink_metadata(path).await {
        Ok(meta) if meta.file_type().is_symlink() => {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "refusing to write through a symlink",
            ));
        }
        _ => {}
    }
    tokio::fs::write(path, contents).await
}

fn is_safe_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\', '\0'])
}
