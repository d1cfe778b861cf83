//! Walks one root path and streams the anime folders found beneath it.
//!
//! The walk runs on Tokio's blocking pool and hands every classified folder to a
//! relay task. The relay upserts it into the [`FolderCache`] (which decides
//! found vs. updated) and forwards the resulting [`ScanEvent`] immediately, so a
//! consumer sees discoveries while the walk is still running.

use chrono::Utc;
use globset::GlobSet;
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

use super::classifier::{FolderClassifier, FolderListing, ListedFile};
use super::ignore::is_ignored;
use super::{
    build_globset_from_patterns, AnimeFolder, CoreError, FolderCache, PathDispatcher, PutOutcome,
    ScanEvent, META_EPISODES, META_TOTAL_SIZE, META_VIDEO_COUNT,
};
use crate::config::AppConfig;
use crate::utils::video_detection::{extension_set, is_video_file};

/// Walk settings shared by every scan of one reader.
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    pub video_extensions: HashSet<String>,
    pub ignore: GlobSet,
    pub follow_links: bool,
    pub max_depth: Option<usize>,
}

impl ReaderOptions {
    pub fn from_config(config: &AppConfig) -> Result<Self, CoreError> {
        Ok(Self {
            video_extensions: extension_set(&config.video_extensions),
            ignore: build_globset_from_patterns(&config.ignore_patterns)?,
            follow_links: config.follow_links,
            max_depth: config.max_scan_depth,
        })
    }
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            video_extensions: extension_set(&[]),
            ignore: GlobSet::empty(),
            follow_links: false,
            max_depth: None,
        }
    }
}

/// Creates per-root scans. Cheap to clone; holds no per-scan state.
#[derive(Clone)]
pub struct FolderReader {
    cache: Arc<FolderCache>,
    classifier: Arc<dyn FolderClassifier>,
    paths: Arc<PathDispatcher>,
    options: ReaderOptions,
}

impl std::fmt::Debug for FolderReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FolderReader")
            .field("cache", &self.cache.file())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl FolderReader {
    pub fn new(
        cache: Arc<FolderCache>,
        classifier: Arc<dyn FolderClassifier>,
        paths: Arc<PathDispatcher>,
        options: ReaderOptions,
    ) -> Self {
        Self {
            cache,
            classifier,
            paths,
            options,
        }
    }

    /// Starts scanning `root`. Must be called from within a Tokio runtime.
    pub fn scan(&self, root: impl Into<PathBuf>) -> ScanStream {
        self.scan_with_cancel(root, CancellationToken::new())
    }

    /// Starts scanning `root`; cancelling `cancel` ends the stream with
    /// `Failed(Cancelled)` at the next directory entry.
    pub fn scan_with_cancel(&self, root: impl Into<PathBuf>, cancel: CancellationToken) -> ScanStream {
        let root = root.into();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (found_tx, found_rx) = mpsc::unbounded_channel();

        let walker = Walker {
            root: root.clone(),
            options: self.options.clone(),
            classifier: self.classifier.clone(),
            paths: self.paths.clone(),
            cancel: cancel.clone(),
        };

        tracing::info!("Scanning {:?} for anime folders", root);
        let walk = tokio::task::spawn_blocking(move || walker.run(found_tx));
        tokio::spawn(relay(
            root.clone(),
            self.cache.clone(),
            found_rx,
            walk,
            event_tx,
            cancel,
        ));

        ScanStream { rx: event_rx }
    }
}

/// The events of one root's scan, in discovery order, ending with exactly one
/// terminal event.
#[derive(Debug)]
pub struct ScanStream {
    rx: mpsc::UnboundedReceiver<ScanEvent>,
}

impl ScanStream {
    /// The next event, or `None` once the terminal event has been taken.
    pub async fn next(&mut self) -> Option<ScanEvent> {
        self.rx.recv().await
    }

    /// Drains the stream. Mostly useful in tests.
    pub async fn collect(mut self) -> Vec<ScanEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.next().await {
            events.push(event);
        }
        events
    }
}

async fn relay(
    root: PathBuf,
    cache: Arc<FolderCache>,
    mut found_rx: mpsc::UnboundedReceiver<AnimeFolder>,
    walk: JoinHandle<Result<usize, CoreError>>,
    events: mpsc::UnboundedSender<ScanEvent>,
    cancel: CancellationToken,
) {
    while let Some(folder) = found_rx.recv().await {
        let path = folder.path.clone();
        let event = match cache.put(folder.clone()).await {
            PutOutcome::Inserted => ScanEvent::FolderFound(folder),
            PutOutcome::Updated { changed } => {
                tracing::debug!("Known folder {:?} rediscovered (changed: {})", path, changed);
                ScanEvent::FolderUpdated(folder)
            }
            PutOutcome::Stale => {
                ScanEvent::FolderUpdated(cache.get(&path).await.unwrap_or(folder))
            }
        };

        if events.send(event).is_err() {
            tracing::warn!("Scan consumer for {:?} went away, cancelling walk", root);
            cancel.cancel();
        }
    }

    let terminal = match walk.await {
        Ok(Ok(discovered)) => {
            tracing::info!("Scan of {:?} complete: {} anime folders", root, discovered);
            ScanEvent::Complete { root, discovered }
        }
        Ok(Err(error)) => {
            tracing::error!("Scan of {:?} failed: {}", root, error);
            ScanEvent::Failed { root, error }
        }
        Err(join) => {
            tracing::error!("Scan task for {:?} did not finish: {}", root, join);
            ScanEvent::Failed {
                root,
                error: CoreError::Join(join),
            }
        }
    };
    events.send(terminal).ok();
}

/// The blocking half of a scan.
struct Walker {
    root: PathBuf,
    options: ReaderOptions,
    classifier: Arc<dyn FolderClassifier>,
    paths: Arc<PathDispatcher>,
    cancel: CancellationToken,
}

impl Walker {
    fn run(self, found: mpsc::UnboundedSender<AnimeFolder>) -> Result<usize, CoreError> {
        let root_meta = fs::metadata(&self.root).map_err(|e| CoreError::from_io(e, &self.root))?;
        if !root_meta.is_dir() {
            return Err(CoreError::NotADirectory(self.root.clone()));
        }

        let mut walk = WalkDir::new(&self.root)
            .follow_links(self.options.follow_links)
            .sort_by_file_name();
        if let Some(depth) = self.options.max_depth {
            walk = walk.max_depth(depth);
        }

        let root = &self.root;
        let ignore = &self.options.ignore;
        let entries = walk.into_iter().filter_entry(|entry| {
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            !(entry.file_type().is_dir() && is_ignored(relative, ignore))
        });

        let mut discovered = 0;
        for entry in entries {
            if self.cancel.is_cancelled() {
                tracing::info!("Scan of {:?} cancelled after {} folders", root, discovered);
                return Err(CoreError::Cancelled);
            }

            let entry = entry.map_err(|e| CoreError::from_walk(e, root))?;
            if !entry.file_type().is_dir() {
                continue;
            }

            let listing = self.list(entry.path())?;
            if !self.classifier.is_anime_folder(&listing) {
                continue;
            }

            discovered += 1;
            if found.send(self.describe(&listing)).is_err() {
                return Err(CoreError::Cancelled);
            }
        }

        Ok(discovered)
    }

    /// Lists the files directly inside `dir`.
    fn list(&self, dir: &Path) -> Result<FolderListing, CoreError> {
        let io_err = |e| CoreError::from_io(e, dir);
        let mut files = Vec::new();

        for item in fs::read_dir(dir).map_err(io_err)? {
            let item = item.map_err(io_err)?;
            let path = item.path();
            let file_type = item.file_type().map_err(|e| CoreError::from_io(e, &path))?;

            let metadata = if file_type.is_symlink() {
                match fs::metadata(&path) {
                    Ok(target) => target,
                    // Dangling link
                    Err(_) => continue,
                }
            } else {
                item.metadata().map_err(|e| CoreError::from_io(e, &path))?
            };

            if metadata.is_file() {
                files.push(ListedFile {
                    is_video: is_video_file(&path, &self.options.video_extensions),
                    size: metadata.len(),
                    path,
                });
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(FolderListing {
            path: dir.to_path_buf(),
            files,
        })
    }

    fn describe(&self, listing: &FolderListing) -> AnimeFolder {
        let episodes: Vec<String> = listing
            .videos()
            .map(|f| f.file_name().into_owned())
            .collect();
        let total_size: u64 = listing.videos().map(|f| f.size).sum();

        let mut metadata = BTreeMap::new();
        metadata.insert(META_VIDEO_COUNT.to_string(), json!(episodes.len()));
        metadata.insert(META_TOTAL_SIZE.to_string(), json!(total_size));
        metadata.insert(META_EPISODES.to_string(), json!(episodes));

        AnimeFolder {
            path: listing.path.clone(),
            display_name: self.paths.display_name(&listing.path),
            discovered_at: Utc::now(),
            metadata,
        }
    }
}
