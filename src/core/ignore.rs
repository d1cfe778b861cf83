use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::path::Path;

use super::CoreError;

/// Builds a `GlobSet` from `.gitignore`-style folder patterns.
///
/// A bare name (`$RECYCLE.BIN`, `.*`) matches at any depth. A trailing `/` is
/// accepted and ignored, since the walker only prunes directories anyway.
/// Invalid individual patterns are logged and skipped.
pub fn build_globset_from_patterns(patterns: &HashSet<String>) -> Result<GlobSet, CoreError> {
    let mut builder = GlobSetBuilder::new();

    let mut sorted: Vec<&String> = patterns.iter().collect();
    sorted.sort();

    for pattern in sorted {
        let trimmed = pattern.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let trimmed = trimmed.trim_end_matches('/');

        let anchored = if trimmed.starts_with("**/") || trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("**/{}", trimmed)
        };

        match Glob::new(&anchored) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => tracing::warn!("Skipping invalid ignore pattern '{}': {}", pattern, e),
        }
    }

    Ok(builder.build()?)
}

/// `true` if `path` (relative to the scan root) should be pruned from the walk.
pub fn is_ignored(relative: &Path, ignore_set: &GlobSet) -> bool {
    !relative.as_os_str().is_empty() && ignore_set.is_match(relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(patterns: &[&str]) -> GlobSet {
        let patterns = patterns.iter().map(|s| s.to_string()).collect();
        build_globset_from_patterns(&patterns).unwrap()
    }

    #[test]
    fn bare_names_match_at_any_depth() {
        let globs = set(&["$RECYCLE.BIN", "Extras/"]);
        assert!(is_ignored(Path::new("$RECYCLE.BIN"), &globs));
        assert!(is_ignored(Path::new("Show/Extras"), &globs));
        assert!(!is_ignored(Path::new("Show/Season 1"), &globs));
    }

    #[test]
    fn hidden_folder_wildcard() {
        let globs = set(&[".*"]);
        assert!(is_ignored(Path::new("Show/.thumbnails"), &globs));
        assert!(!is_ignored(Path::new("Show"), &globs));
    }

    #[test]
    fn root_itself_is_never_ignored() {
        let globs = set(&["*"]);
        assert!(!is_ignored(Path::new(""), &globs));
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let globs = set(&["# comment", "   "]);
        assert!(globs.is_empty());
    }
}
