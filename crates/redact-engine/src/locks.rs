//! Per-document exclusion

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per canonical document path
#[derive(Debug, Default)]
pub struct DocumentLocks {
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl DocumentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other operation holds `path`
    pub async fn lock(&self, path: &Path) -> OwnedMutexGuard<()> {
        // Clone out of the map so no shard lock is held across the await
        let mutex = self.locks.entry(path.to_path_buf()).or_default().clone();
        mutex.lock_owned().await
    }

    /// Drop entries nobody holds or waits on
    pub fn prune(&self) {
        self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
