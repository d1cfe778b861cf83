//! Defines the process-root state of the application.

use crate::config::{self, AppConfig};
use crate::core::folder_reader::ReaderOptions;
use crate::core::{CoreError, FolderCache, FolderReader, PathDispatcher};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Holds the state shared by the event loop, IPC handlers and scan tasks.
///
/// This struct is wrapped in an `Arc<Mutex<...>>`. The cache carries its own
/// async lock, so holding the state mutex never waits on a scan.
pub struct AppState {
    /// The application's configuration settings.
    pub config: AppConfig,
    /// Directory override for config and cache files (tests, portable installs).
    pub data_dir: Option<PathBuf>,
    pub paths: Arc<PathDispatcher>,
    /// Every anime folder ever discovered, restored to each freshly loaded page.
    pub cache: Arc<FolderCache>,
    /// Cancellation handles of scan batches that have not settled yet.
    pub active_batches: HashMap<u64, CancellationToken>,
    next_batch_id: u64,
    /// Set once window close has started the shutdown flush.
    pub is_shutting_down: bool,
}

impl AppState {
    pub fn new(config: AppConfig, data_dir: Option<PathBuf>, cache: Arc<FolderCache>) -> Self {
        let paths = Arc::new(PathDispatcher::new(
            data_dir.clone(),
            config.player_path.clone(),
        ));
        Self {
            config,
            data_dir,
            paths,
            cache,
            active_batches: HashMap::new(),
            next_batch_id: 0,
            is_shutting_down: false,
        }
    }

    /// Loads config and cache from disk.
    ///
    /// An unreadable cache is logged and replaced by an empty one; losing the
    /// cache only costs a rescan.
    pub async fn bootstrap(data_dir: Option<PathBuf>) -> Self {
        let config = config::settings::load_config(data_dir.as_deref()).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}. Using defaults.", e);
            AppConfig::default()
        });

        let paths = PathDispatcher::new(data_dir.clone(), config.player_path.clone());
        match paths.player() {
            Some(player) => tracing::info!("Using media player {:?}", player),
            None => tracing::warn!("No media player configured or found on PATH"),
        }
        let cache_file = paths
            .cache_file()
            .unwrap_or_else(|| PathBuf::from("anime-folders.json"));
        let cache = match FolderCache::load(&cache_file).await {
            Ok(cache) => cache,
            Err(e) => {
                tracing::error!("Failed to load cache: {}. Starting empty.", e);
                FolderCache::new(cache_file)
            }
        };

        Self::new(config, data_dir, Arc::new(cache))
    }

    /// A reader configured from the current settings.
    pub fn folder_reader(&self) -> Result<FolderReader, CoreError> {
        Ok(FolderReader::new(
            self.cache.clone(),
            self.config.build_classifier(),
            self.paths.clone(),
            ReaderOptions::from_config(&self.config)?,
        ))
    }

    /// Registers a new scan batch and returns its id and token.
    pub fn begin_batch(&mut self) -> (u64, CancellationToken) {
        let id = self.next_batch_id;
        self.next_batch_id += 1;
        let token = CancellationToken::new();
        self.active_batches.insert(id, token.clone());
        (id, token)
    }

    pub fn end_batch(&mut self, id: u64) {
        self.active_batches.remove(&id);
    }

    pub fn is_scanning(&self) -> bool {
        !self.active_batches.is_empty()
    }

    /// Cancels every running scan. Their streams end with `Failed(Cancelled)`.
    pub fn cancel_all_scans(&mut self) {
        if self.active_batches.is_empty() {
            tracing::debug!("cancel_all_scans called, but no scan is running.");
            return;
        }
        tracing::info!("Cancelling {} running scan batches", self.active_batches.len());
        for token in self.active_batches.values() {
            token.cancel();
        }
    }

    /// Remembers the roots of the last scan and persists the config.
    pub fn remember_directories(&mut self, roots: &[PathBuf]) {
        self.config.last_directories = roots.to_vec();
        if let Err(e) = config::settings::save_config(&self.config, self.data_dir.as_deref()) {
            tracing::warn!("Failed to save config after folder selection: {}", e);
        }
    }
}
