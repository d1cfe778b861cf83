//! Path resolution: scan roots, application data files and external tools.

use directories::ProjectDirs;
use regex::Regex;
use std::env;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

const APP_QUALIFIER: &str = "com";
const APP_ORGANIZATION: &str = "bakaru";
const APP_NAME: &str = "Bakaru";
const CACHE_FILE: &str = "anime-folders.json";

/// Player binaries probed on `PATH` when no player is configured.
const KNOWN_PLAYERS: &[&str] = &["mpv", "vlc", "celluloid", "mplayer"];

/// Bracketed release tags: `[Group]`, `(1080p)`, `{Hash}`.
static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[[^\]]*\]|\([^)]*\)|\{[^}]*\}").expect("tag pattern is a valid regex")
});

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
}

/// Directory holding `config.json`: the override if given, else the platform config dir.
pub fn config_dir(data_dir_override: Option<&Path>) -> Option<PathBuf> {
    match data_dir_override {
        Some(dir) => Some(dir.to_path_buf()),
        None => project_dirs().map(|d| d.config_dir().to_path_buf()),
    }
}

/// Resolves every path the application needs.
///
/// A data directory override replaces the platform directories entirely;
/// tests point it at a temp dir.
#[derive(Debug, Clone)]
pub struct PathDispatcher {
    data_dir_override: Option<PathBuf>,
    player_override: Option<PathBuf>,
}

impl PathDispatcher {
    pub fn new(data_dir_override: Option<PathBuf>, player_override: Option<PathBuf>) -> Self {
        Self {
            data_dir_override,
            player_override,
        }
    }

    pub fn config_dir(&self) -> Option<PathBuf> {
        config_dir(self.data_dir_override.as_deref())
    }

    /// Location of the persisted anime-folder cache.
    pub fn cache_file(&self) -> Option<PathBuf> {
        match &self.data_dir_override {
            Some(dir) => Some(dir.join(CACHE_FILE)),
            None => project_dirs().map(|d| d.cache_dir().join(CACHE_FILE)),
        }
    }

    /// Where the folder picker opens by default.
    pub fn default_library_dir(&self) -> Option<PathBuf> {
        dirs::video_dir().or_else(dirs::home_dir)
    }

    /// Makes a user-selected path absolute and lexically clean.
    ///
    /// The path is canonicalized when it exists (without Windows `\\?\` prefixes);
    /// otherwise it is only cleaned so that a missing root still reaches the
    /// walker and fails there.
    pub fn normalize(&self, path: &Path) -> PathBuf {
        if let Ok(canonical) = dunce::canonicalize(path) {
            return canonical;
        }
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        };
        clean(&absolute)
    }

    /// The external media player, either configured or found on `PATH`.
    pub fn player(&self) -> Option<PathBuf> {
        if let Some(player) = &self.player_override {
            if player.is_file() {
                return Some(player.clone());
            }
            tracing::warn!("Configured player {:?} does not exist, probing PATH", player);
        }
        find_player_in(env::var_os("PATH"))
    }

    /// A readable title for a folder: release-group and quality tags stripped,
    /// separators turned into spaces.
    pub fn display_name(&self, path: &Path) -> String {
        let raw = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        let stripped = TAG_PATTERN.replace_all(&raw, " ");
        let spaced: String = stripped
            .chars()
            .map(|c| if c == '_' || c == '.' { ' ' } else { c })
            .collect();
        let title = spaced.split_whitespace().collect::<Vec<_>>().join(" ");

        if title.is_empty() {
            raw
        } else {
            title
        }
    }
}

impl Default for PathDispatcher {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Removes `.` and resolves `..` without touching the filesystem.
fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// The first known player that is an executable on `search_path`.
fn find_player_in<P: AsRef<OsStr>>(search_path: Option<P>) -> Option<PathBuf> {
    let cwd = env::current_dir().ok()?;
    let search_path: Option<&OsStr> = search_path.as_ref().map(|p| p.as_ref());
    KNOWN_PLAYERS
        .iter()
        .find_map(|name| which::which_in(name, search_path, &cwd).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_strips_release_tags() {
        let d = PathDispatcher::default();
        assert_eq!(
            d.display_name(Path::new("/m/[SubsPlease] Sousou no Frieren (1080p) [ABCD1234]")),
            "Sousou no Frieren"
        );
        assert_eq!(d.display_name(Path::new("/m/Cowboy_Bebop.1998")), "Cowboy Bebop 1998");
    }

    #[test]
    fn display_name_falls_back_to_raw_name() {
        let d = PathDispatcher::default();
        assert_eq!(d.display_name(Path::new("/m/[Only Tags]")), "[Only Tags]");
    }

    #[test]
    fn normalize_cleans_missing_paths() {
        let d = PathDispatcher::default();
        let p = d.normalize(Path::new("/definitely/not/../here/./anime"));
        assert_eq!(p, PathBuf::from("/definitely/here/anime"));
    }

    #[test]
    fn normalize_canonicalizes_existing_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("Show")).unwrap();
        let d = PathDispatcher::default();

        let p = d.normalize(&dir.path().join("Show").join(".."));
        assert_eq!(p, dunce::canonicalize(dir.path()).unwrap());
        assert!(!p.to_string_lossy().starts_with(r"\\?\"));
    }

    #[test]
    fn override_redirects_data_files() {
        let d = PathDispatcher::new(Some(PathBuf::from("/tmp/bakaru-test")), None);
        assert_eq!(d.config_dir(), Some(PathBuf::from("/tmp/bakaru-test")));
        assert_eq!(
            d.cache_file(),
            Some(PathBuf::from("/tmp/bakaru-test/anime-folders.json"))
        );
    }

    #[test]
    fn configured_player_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let player = dir.path().join("myplayer");
        std::fs::write(&player, b"").unwrap();
        let d = PathDispatcher::new(None, Some(player.clone()));
        assert_eq!(d.player(), Some(player));
    }

    #[cfg(unix)]
    #[test]
    fn players_on_path_must_be_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let mpv = dir.path().join("mpv");
        std::fs::write(&mpv, b"#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&mpv, std::fs::Permissions::from_mode(0o644)).unwrap();
        assert_eq!(find_player_in(Some(dir.path())), None);

        std::fs::set_permissions(&mpv, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(find_player_in(Some(dir.path())), Some(mpv));
    }

    #[test]
    fn free_config_dir_matches_dispatcher() {
        let dir = Path::new("/tmp/bakaru-test");
        assert_eq!(config_dir(Some(dir)), Some(dir.to_path_buf()));
        assert_eq!(config_dir(None), PathDispatcher::default().config_dir());
    }
}
