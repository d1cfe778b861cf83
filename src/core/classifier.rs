//! Pluggable policies deciding what counts as an "anime folder".
//!
//! The walker builds a [`FolderListing`] per directory and hands it to a
//! [`FolderClassifier`]; it never looks at file names itself.

use regex::Regex;
use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::LazyLock;

/// A file directly inside a listed directory.
#[derive(Debug, Clone, PartialEq)]
pub struct ListedFile {
    pub path: PathBuf,
    pub size: u64,
    pub is_video: bool,
}

impl ListedFile {
    /// The file name, with invalid UTF-8 replaced by `U+FFFD`.
    pub fn file_name(&self) -> Cow<'_, str> {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default()
    }
}

/// The direct contents of one directory, as seen during a walk.
#[derive(Debug, Clone)]
pub struct FolderListing {
    pub path: PathBuf,
    /// Files sorted by name. Subdirectories are not included.
    pub files: Vec<ListedFile>,
}

impl FolderListing {
    pub fn videos(&self) -> impl Iterator<Item = &ListedFile> {
        self.files.iter().filter(|f| f.is_video)
    }

    pub fn video_count(&self) -> usize {
        self.videos().count()
    }
}

/// Decides whether a directory is an anime folder.
pub trait FolderClassifier: Send + Sync {
    fn is_anime_folder(&self, listing: &FolderListing) -> bool;
}

/// Any `Fn(&FolderListing) -> bool` is a classifier, which keeps tests short.
impl<F> FolderClassifier for F
where
    F: Fn(&FolderListing) -> bool + Send + Sync,
{
    fn is_anime_folder(&self, listing: &FolderListing) -> bool {
        self(listing)
    }
}

/// Classifies a directory by the number of video files directly inside it.
#[derive(Debug, Clone)]
pub struct VideoCountClassifier {
    min_videos: usize,
}

impl VideoCountClassifier {
    pub fn new(min_videos: usize) -> Self {
        Self {
            min_videos: min_videos.max(1),
        }
    }
}

impl Default for VideoCountClassifier {
    fn default() -> Self {
        Self::new(1)
    }
}

impl FolderClassifier for VideoCountClassifier {
    fn is_anime_folder(&self, listing: &FolderListing) -> bool {
        listing.video_count() >= self.min_videos
    }
}

/// Classifies a directory by counting video files whose names carry an
/// episode number (`Show - 01`, `[Group] Show [03v2]`, `Show E05`, `Episode 7`).
#[derive(Debug, Clone)]
pub struct EpisodePatternClassifier {
    min_episodes: usize,
}

static EPISODE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:\b(?:episode|ep|e)\s*\.?\s*\d{1,4}\b|\s-\s\d{1,4}(?:v\d)?\b|\[\d{1,4}(?:v\d)?\])",
    )
    .expect("episode pattern is a valid regex")
});

impl EpisodePatternClassifier {
    pub fn new(min_episodes: usize) -> Self {
        Self {
            min_episodes: min_episodes.max(1),
        }
    }

    pub fn is_episode_name(&self, file_name: &str) -> bool {
        EPISODE_PATTERN.is_match(file_name)
    }
}

impl FolderClassifier for EpisodePatternClassifier {
    fn is_anime_folder(&self, listing: &FolderListing) -> bool {
        listing
            .videos()
            .filter(|f| self.is_episode_name(&f.file_name()))
            .count()
            >= self.min_episodes
    }
}
