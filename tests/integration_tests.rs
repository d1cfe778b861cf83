//! Integration tests for the Bakaru scan pipeline.
//!
//! These drive the application through the same IPC entry point the WebView
//! uses, with an async MPSC channel standing in for the event loop.

use bakaru::app::{self, events::UserEvent, proxy::EventProxy, state::AppState};
use bakaru::app::file_dialog::DialogService;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

/// Contains the test infrastructure.
mod helpers {
    use super::*;
    use std::fs;

    /// A test double for the `EventLoopProxy` using a tokio MPSC channel.
    #[derive(Clone)]
    pub struct TestEventProxy {
        pub sender: mpsc::UnboundedSender<UserEvent>,
    }

    impl EventProxy for TestEventProxy {
        fn send_event(&self, event: UserEvent) {
            if let Err(e) = self.sender.send(event) {
                panic!("Test receiver dropped: {}", e);
            }
        }
    }

    /// Always "picks" the configured folders.
    pub struct ScriptedDialog {
        pub picks: Mutex<Option<Vec<PathBuf>>>,
    }

    impl DialogService for ScriptedDialog {
        fn pick_directories(&self, _start_dir: Option<&Path>) -> Option<Vec<PathBuf>> {
            self.picks.lock().unwrap().clone()
        }

        fn show_error(&self, _title: &str, _message: &str) {}
    }

    /// `TestHarness` sets up an isolated library and data directory per test.
    pub struct TestHarness {
        pub state: Arc<Mutex<AppState>>,
        pub proxy: TestEventProxy,
        pub event_rx: mpsc::UnboundedReceiver<UserEvent>,
        pub dialog: Arc<ScriptedDialog>,
        pub library: PathBuf,
        pub data_dir: PathBuf,
        _temp_dir: TempDir,
    }

    impl TestHarness {
        pub async fn new() -> Self {
            let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
            let library = temp_dir.path().join("anime");
            let data_dir = temp_dir.path().join("data");
            fs::create_dir_all(&library).unwrap();
            let (event_tx, event_rx) = mpsc::unbounded_channel();

            let state = AppState::bootstrap(Some(data_dir.clone())).await;

            Self {
                state: Arc::new(Mutex::new(state)),
                proxy: TestEventProxy { sender: event_tx },
                event_rx,
                dialog: Arc::new(ScriptedDialog {
                    picks: Mutex::new(None),
                }),
                library,
                data_dir,
                _temp_dir: temp_dir,
            }
        }

        /// Creates `count` episode files inside `library/<rel>`.
        pub fn create_show(&self, rel: &str, count: usize) {
            let dir = self.library.join(rel);
            fs::create_dir_all(&dir).expect("Failed to create show dir");
            for n in 1..=count {
                fs::write(dir.join(format!("Episode {:02}.mkv", n)), b"video")
                    .expect("Failed to write episode");
            }
        }

        pub fn pick(&self, paths: Vec<PathBuf>) {
            *self.dialog.picks.lock().unwrap() = Some(paths);
        }

        pub fn send_ipc(&self, command: &str) {
            app::handle_ipc_message(
                format!(r#"{{"command":"{}","payload":null}}"#, command),
                self.dialog.clone(),
                self.proxy.clone(),
                self.state.clone(),
            );
        }

        /// Collects events until the batch end flag.
        pub async fn wait_for_batch_end(&mut self) -> Vec<UserEvent> {
            let mut events = Vec::new();
            loop {
                match tokio::time::timeout(Duration::from_secs(10), self.event_rx.recv()).await {
                    Ok(Some(UserEvent::FlagAddAnimeFolderEnd)) => {
                        events.push(UserEvent::FlagAddAnimeFolderEnd);
                        return events;
                    }
                    Ok(Some(event)) => events.push(event),
                    _ => panic!("Scan batch did not finish within timeout; got {:?}", events),
                }
            }
        }

        pub async fn next_event(&mut self) -> UserEvent {
            tokio::time::timeout(Duration::from_secs(10), self.event_rx.recv())
                .await
                .expect("No event within timeout")
                .expect("Event channel closed")
        }
    }

    pub fn added_names(events: &[UserEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                UserEvent::AddAnimeFolder(f) => Some(f.display_name.clone()),
                _ => None,
            })
            .collect()
    }
}

use helpers::{added_names, TestHarness};

#[tokio::test]
async fn scan_streams_anime_folders_between_flags() {
    let mut harness = TestHarness::new().await;
    harness.create_show("A", 5);
    std::fs::create_dir_all(harness.library.join("B")).unwrap();
    harness.create_show("C/nested", 3);
    harness.pick(vec![harness.library.clone()]);

    harness.send_ipc("openSelectFolderDialog");
    let events = harness.wait_for_batch_end().await;

    assert!(matches!(events.first(), Some(UserEvent::FlagAddAnimeFolderStart)));
    assert_eq!(added_names(&events), vec!["A", "nested"]);
    assert!(!events
        .iter()
        .any(|e| matches!(e, UserEvent::ShowError { .. })));
}

#[tokio::test]
async fn valid_and_missing_roots_settle_independently() {
    let mut harness = TestHarness::new().await;
    harness.create_show("Show", 2);
    let missing = harness.library.join("nonexistent");
    harness.pick(vec![harness.library.clone(), missing]);

    harness.send_ipc("openSelectFolderDialog");
    let events = harness.wait_for_batch_end().await;

    assert_eq!(added_names(&events), vec!["Show"]);
    assert!(events.iter().any(|e| matches!(
        e,
        UserEvent::ShowError { title, .. } if title == "Folder not found"
    )));
    assert!(matches!(events.last(), Some(UserEvent::FlagAddAnimeFolderEnd)));
}

#[tokio::test]
async fn cache_survives_restart_and_is_restored_on_initialize() {
    let mut harness = TestHarness::new().await;
    harness.create_show("[Group] Cowboy Bebop (1998)", 26);
    harness.pick(vec![harness.library.clone()]);
    harness.send_ipc("openSelectFolderDialog");
    harness.wait_for_batch_end().await;

    let handle = app::tasks::flush_cache_then_quit(harness.proxy.clone(), harness.state.clone())
        .expect("first shutdown request starts the flush");
    assert!(matches!(
        handle.await.unwrap(),
        bakaru::core::FlushOutcome::Flushed
    ));
    assert!(matches!(harness.next_event().await, UserEvent::FlushFinished));
    assert!(
        app::tasks::flush_cache_then_quit(harness.proxy.clone(), harness.state.clone()).is_none()
    );

    // Simulated restart over the same data directory.
    let restarted = AppState::bootstrap(Some(harness.data_dir.clone())).await;
    harness.state = Arc::new(Mutex::new(restarted));
    harness.send_ipc("initialize");

    match harness.next_event().await {
        UserEvent::RestoreAnimeFolders(folders) => {
            assert_eq!(folders.len(), 1);
            assert_eq!(folders[0].display_name, "Cowboy Bebop");
            assert_eq!(folders[0].video_count(), Some(26));
        }
        other => panic!("Expected RestoreAnimeFolders, got {:?}", other),
    }
}

#[tokio::test]
async fn rescan_after_restart_reports_updates() {
    let mut harness = TestHarness::new().await;
    harness.create_show("A", 5);
    harness.pick(vec![harness.library.clone()]);
    harness.send_ipc("openSelectFolderDialog");
    harness.wait_for_batch_end().await;
    app::tasks::flush_cache_then_quit(harness.proxy.clone(), harness.state.clone())
        .unwrap()
        .await
        .unwrap();
    harness.next_event().await;

    harness.state = Arc::new(Mutex::new(
        AppState::bootstrap(Some(harness.data_dir.clone())).await,
    ));
    harness.create_show("A", 6);
    harness.send_ipc("openSelectFolderDialog");
    let events = harness.wait_for_batch_end().await;

    assert!(added_names(&events).is_empty());
    let updated: Vec<Option<u64>> = events
        .iter()
        .filter_map(|e| match e {
            UserEvent::UpdateAnimeFolder(f) => Some(f.video_count()),
            _ => None,
        })
        .collect();
    assert_eq!(updated, vec![Some(6)]);
}

#[tokio::test]
async fn unknown_and_malformed_ipc_messages_are_ignored() {
    let mut harness = TestHarness::new().await;
    app::handle_ipc_message(
        "not json".to_string(),
        harness.dialog.clone(),
        harness.proxy.clone(),
        harness.state.clone(),
    );
    harness.send_ipc("doesNotExist");
    harness.send_ipc("minimizeMainWindow");

    assert!(matches!(harness.next_event().await, UserEvent::MinimizeWindow));
}

#[tokio::test]
async fn selected_roots_are_remembered_in_config() {
    let mut harness = TestHarness::new().await;
    harness.pick(vec![harness.library.clone()]);
    harness.send_ipc("openSelectFolderDialog");
    harness.wait_for_batch_end().await;

    let config = bakaru::config::settings::load_config(Some(&harness.data_dir)).unwrap();
    assert_eq!(
        config.last_directories,
        vec![std::fs::canonicalize(&harness.library).unwrap()]
    );
}
