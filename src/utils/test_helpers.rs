use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;

static LOGGING_INIT: Once = Once::new();

/// Initializes the tracing subscriber for tests.
///
/// Guarded by a `Once` so parallel tests install the global subscriber exactly
/// one time. Honors `RUST_LOG`.
pub fn setup_test_logging() {
    LOGGING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Creates `count` small fake episode files named `<dir> - NN.mkv` inside `dir`.
pub fn create_episodes(dir: &Path, count: usize) -> Vec<PathBuf> {
    fs::create_dir_all(dir).expect("Failed to create episode dir");
    (1..=count)
        .map(|n| {
            let file = dir.join(format!("{} - {:02}.mkv", dir_name(dir), n));
            fs::write(&file, b"not really a video").expect("Failed to write episode");
            file
        })
        .collect()
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Episode".to_string())
}

/// Returns true when the current process runs as root (UID 0).
/// Permission-sensitive tests are skipped in that case.
#[cfg(any(test, doctest))]
#[inline]
pub fn running_as_root() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: geteuid has no preconditions and no side effects.
        unsafe { libc::geteuid() == 0 }
    }
    #[cfg(not(unix))]
    {
        false
    }
}
