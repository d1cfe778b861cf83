pub mod settings;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::core::{EpisodePatternClassifier, FolderClassifier, VideoCountClassifier};
use crate::utils::video_detection::DEFAULT_VIDEO_EXTENSIONS;

/// Which stock policy decides what an anime folder is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    /// At least `min_video_files` videos directly inside the folder.
    #[default]
    VideoCount,
    /// At least `min_video_files` videos with an episode number in their name.
    EpisodePattern,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub window_size: (f64, f64),
    pub window_position: (f64, f64),
    pub classifier: ClassifierKind,
    pub min_video_files: usize,
    pub video_extensions: Vec<String>,
    pub ignore_patterns: HashSet<String>,
    pub max_scan_depth: Option<usize>,
    pub follow_links: bool,
    pub flush_timeout_ms: u64,
    pub player_path: Option<PathBuf>,
    pub last_directories: Vec<PathBuf>,
}

impl AppConfig {
    pub fn flush_timeout(&self) -> Duration {
        Duration::from_millis(self.flush_timeout_ms)
    }

    /// Builds the classifier this config asks for.
    pub fn build_classifier(&self) -> Arc<dyn FolderClassifier> {
        match self.classifier {
            ClassifierKind::VideoCount => Arc::new(VideoCountClassifier::new(self.min_video_files)),
            ClassifierKind::EpisodePattern => {
                Arc::new(EpisodePatternClassifier::new(self.min_video_files))
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let ignore_patterns = [
            "$RECYCLE.BIN",
            "System Volume Information",
            "lost+found",
            ".*",
            "@eaDir",
            "node_modules",
        ]
        .iter()
        .map(|p| p.to_string())
        .collect();

        Self {
            window_size: (850.0, 720.0),
            window_position: (100.0, 100.0),
            classifier: ClassifierKind::VideoCount,
            min_video_files: 1,
            video_extensions: DEFAULT_VIDEO_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            ignore_patterns,
            max_scan_depth: None,
            follow_links: false,
            flush_timeout_ms: 5_000,
            player_path: None,
            last_directories: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FolderListing, ListedFile};

    #[test]
    fn classifier_follows_config() {
        let listing = FolderListing {
            path: PathBuf::from("/m/Movie"),
            files: vec![ListedFile {
                path: PathBuf::from("/m/Movie/Movie (2019).mkv"),
                size: 1,
                is_video: true,
            }],
        };

        let mut config = AppConfig::default();
        assert!(config.build_classifier().is_anime_folder(&listing));

        config.classifier = ClassifierKind::EpisodePattern;
        assert!(!config.build_classifier().is_anime_folder(&listing));
    }

    #[test]
    fn classifier_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ClassifierKind::EpisodePattern).unwrap();
        assert_eq!(json, "\"episode_pattern\"");
    }
}
