//! Scanning, classification and caching of anime folders.
//!
//! Nothing in here knows about windows or WebViews; the `app` module consumes
//! the [`ScanStream`]s produced here and forwards them to the UI.

pub mod cache;
pub mod classifier;
pub mod error;
pub mod folder_reader;
pub mod ignore;
pub mod paths;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A directory that was classified as holding episodic video content.
///
/// `path` is the identity of the folder: the cache never holds two entries
/// with the same path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnimeFolder {
    pub path: PathBuf,
    pub display_name: String,
    pub discovered_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl AnimeFolder {
    /// Number of video files recorded in the metadata, if any.
    pub fn video_count(&self) -> Option<u64> {
        self.metadata.get(META_VIDEO_COUNT).and_then(|v| v.as_u64())
    }
}

pub const META_VIDEO_COUNT: &str = "videoCount";
pub const META_TOTAL_SIZE: &str = "totalSize";
pub const META_EPISODES: &str = "episodes";

/// A user request to scan one or more roots. Each root is scanned independently.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub root_paths: Vec<PathBuf>,
    pub issued_at: DateTime<Utc>,
}

impl ScanRequest {
    pub fn new(root_paths: Vec<PathBuf>) -> Self {
        Self {
            root_paths,
            issued_at: Utc::now(),
        }
    }
}

/// One item of a per-root scan stream.
///
/// `Complete` and `Failed` are terminal: exactly one of them ends every stream.
#[derive(Debug)]
pub enum ScanEvent {
    FolderFound(AnimeFolder),
    FolderUpdated(AnimeFolder),
    Complete { root: PathBuf, discovered: usize },
    Failed { root: PathBuf, error: CoreError },
}

impl ScanEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanEvent::Complete { .. } | ScanEvent::Failed { .. })
    }
}

pub use cache::{FlushOutcome, FolderCache, PutOutcome};
pub use classifier::{
    EpisodePatternClassifier, FolderClassifier, FolderListing, ListedFile, VideoCountClassifier,
};
pub use error::CoreError;
pub use folder_reader::{FolderReader, ScanStream};
pub use ignore::build_globset_from_patterns;
pub use paths::PathDispatcher;
