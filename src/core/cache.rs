//! Process-wide store of discovered anime folders, persisted as a JSON snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Mutex;

use super::{AnimeFolder, CoreError};

/// Snapshot format version. Bump when the on-disk layout changes.
pub const CACHE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheSnapshot {
    version: u32,
    saved_at: DateTime<Utc>,
    folders: Vec<AnimeFolder>,
}

/// What `FolderCache::put` did with a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// The path was unknown.
    Inserted,
    /// The path was known; `changed` is false when only the timestamp moved.
    Updated { changed: bool },
    /// The cached entry is newer; nothing was written.
    Stale,
}

/// Result of a bounded flush at shutdown.
#[derive(Debug)]
pub enum FlushOutcome {
    Flushed,
    Failed(CoreError),
    TimedOut,
}

/// Anime folders keyed by path.
///
/// All writes go through one async mutex, so concurrent scans never lose an
/// update and `flush` always serializes a consistent snapshot.
#[derive(Debug)]
pub struct FolderCache {
    file: PathBuf,
    entries: Mutex<BTreeMap<PathBuf, AnimeFolder>>,
    flush_lock: Mutex<()>,
}

impl FolderCache {
    /// An empty cache that will flush to `file`.
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            entries: Mutex::new(BTreeMap::new()),
            flush_lock: Mutex::new(()),
        }
    }

    /// Loads the snapshot at `file`.
    ///
    /// A missing file yields an empty cache. A corrupt snapshot or one written
    /// by an unknown version is logged and discarded; it never blocks startup.
    /// Only genuine read failures (permissions, I/O) are returned.
    pub async fn load(file: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let cache = Self::new(file);

        let content = match tokio::fs::read_to_string(&cache.file).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!("No cache at {:?}, starting empty", cache.file);
                return Ok(cache);
            }
            Err(source) => {
                return Err(CoreError::CacheIo {
                    path: cache.file.clone(),
                    source,
                })
            }
        };

        match serde_json::from_str::<CacheSnapshot>(&content) {
            Ok(snapshot) if snapshot.version == CACHE_VERSION => {
                let mut entries = cache.entries.lock().await;
                for folder in snapshot.folders {
                    entries.insert(folder.path.clone(), folder);
                }
                tracing::info!(
                    "Loaded {} anime folders from {:?}",
                    entries.len(),
                    cache.file
                );
            }
            Ok(snapshot) => {
                tracing::warn!(
                    "Cache {:?} has version {}, expected {}. Starting empty.",
                    cache.file,
                    snapshot.version,
                    CACHE_VERSION
                );
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse cache {:?}: {}. Starting empty.",
                    cache.file,
                    e
                );
            }
        }

        Ok(cache)
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Every cached folder, ordered by path. Read-only.
    pub async fn restore(&self) -> Vec<AnimeFolder> {
        self.entries.lock().await.values().cloned().collect()
    }

    pub async fn contains(&self, path: &Path) -> bool {
        self.entries.lock().await.contains_key(path)
    }

    pub async fn get(&self, path: &Path) -> Option<AnimeFolder> {
        self.entries.lock().await.get(path).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Upserts by path. The entry with the later `discovered_at` wins.
    pub async fn put(&self, folder: AnimeFolder) -> PutOutcome {
        let mut entries = self.entries.lock().await;
        match entries.get_mut(&folder.path) {
            None => {
                entries.insert(folder.path.clone(), folder);
                PutOutcome::Inserted
            }
            Some(existing) if existing.discovered_at > folder.discovered_at => PutOutcome::Stale,
            Some(existing) => {
                let changed = existing.metadata != folder.metadata
                    || existing.display_name != folder.display_name;
                *existing = folder;
                PutOutcome::Updated { changed }
            }
        }
    }

    pub async fn remove(&self, path: &Path) -> Option<AnimeFolder> {
        self.entries.lock().await.remove(path)
    }

    /// Writes the current state durably.
    ///
    /// The snapshot is taken under the entry lock, then written to a temp file
    /// that is synced and renamed over the previous snapshot.
    pub async fn flush(&self) -> Result<(), CoreError> {
        let _flushing = self.flush_lock.lock().await;

        let snapshot = CacheSnapshot {
            version: CACHE_VERSION,
            saved_at: Utc::now(),
            folders: self.restore().await,
        };
        let json = serde_json::to_vec_pretty(&snapshot)?;

        let io_err = |source| CoreError::CacheIo {
            path: self.file.clone(),
            source,
        };

        if let Some(parent) = self.file.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let temp = self.file.with_extension("json.tmp");
        let mut file = tokio::fs::File::create(&temp).await.map_err(io_err)?;
        tokio::io::AsyncWriteExt::write_all(&mut file, &json)
            .await
            .map_err(io_err)?;
        file.sync_all().await.map_err(io_err)?;
        drop(file);
        tokio::fs::rename(&temp, &self.file).await.map_err(io_err)?;

        tracing::info!(
            "Flushed {} anime folders to {:?}",
            snapshot.folders.len(),
            self.file
        );
        Ok(())
    }

    /// `flush` with an upper bound on how long shutdown waits for it.
    pub async fn flush_with_timeout(&self, timeout: Duration) -> FlushOutcome {
        match tokio::time::timeout(timeout, self.flush()).await {
            Ok(Ok(())) => FlushOutcome::Flushed,
            Ok(Err(e)) => {
                tracing::error!("Failed to flush cache: {}", e);
                FlushOutcome::Failed(e)
            }
            Err(_) => {
                tracing::error!("Cache flush did not finish within {:?}", timeout);
                FlushOutcome::TimedOut
            }
        }
    }
}
