use std::collections::HashSet;
use std::path::Path;

/// Extensions treated as video when the config does not override them.
pub const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "m4v", "avi", "mov", "wmv", "flv", "webm", "ogm", "ogv", "mpg", "mpeg", "ts",
    "m2ts", "vob", "rmvb", "3gp",
];

/// Extensions that `mime_guess` labels as video but are never episodes.
const NEVER_VIDEO: &[&str] = &["part", "!qb", "crdownload"];

/// Determines if a file is likely to be a video file.
///
/// The configured extension list wins; otherwise the MIME type guessed from the
/// extension decides. `.ts` is ambiguous (TypeScript vs. MPEG transport stream)
/// and only counts when it is in `extensions`.
pub fn is_video_file(path: &Path, extensions: &HashSet<String>) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    let ext_lower = ext.to_lowercase();

    if extensions.contains(&ext_lower) {
        return true;
    }
    if NEVER_VIDEO.contains(&ext_lower.as_str()) || ext_lower == "ts" {
        return false;
    }

    mime_guess::from_ext(&ext_lower)
        .iter()
        .any(|m| m.type_() == mime_guess::mime::VIDEO)
}

/// Builds the lower-cased extension set, falling back to the defaults when empty.
pub fn extension_set(configured: &[String]) -> HashSet<String> {
    let set: HashSet<String> = configured
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect();
    if set.is_empty() {
        DEFAULT_VIDEO_EXTENSIONS.iter().map(|e| e.to_string()).collect()
    } else {
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_extensions_match_case_insensitively() {
        let exts = extension_set(&["MKV".to_string(), ".mp4".to_string()]);
        assert!(is_video_file(Path::new("/a/Show - 01.MKV"), &exts));
        assert!(is_video_file(Path::new("/a/Show - 02.mp4"), &exts));
        assert!(!is_video_file(Path::new("/a/cover.jpg"), &exts));
    }

    #[test]
    fn mime_fallback_catches_unlisted_video_types() {
        let exts = extension_set(&["mkv".to_string()]);
        assert!(is_video_file(Path::new("/a/clip.avi"), &exts));
        assert!(!is_video_file(Path::new("/a/app.ts"), &exts));
        assert!(!is_video_file(Path::new("/a/noext"), &exts));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let exts = extension_set(&[]);
        assert!(exts.contains("mkv"));
        assert!(exts.contains("ts"));
    }
}
