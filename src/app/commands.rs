//! Contains the command handlers that are callable from the frontend via IPC.
//!
//! Each function in this module corresponds to a specific `IpcMessage::command`.
//! Handlers interact with the `AppState` and the `core` logic, and report back
//! to the UI through `UserEvent`s.

use super::events::UserEvent;
use super::helpers::lock_state;
use super::proxy::EventProxy;
use super::state::AppState;
use super::tasks::start_folder_scan;
use crate::app::file_dialog::DialogService;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// Opens the native multi-select folder picker and scans every chosen folder.
///
/// `FlagAddAnimeFolderStart` is sent before the picker opens. If the user
/// cancels, `FlagAddAnimeFolderEnd` follows immediately; otherwise it is sent
/// by the scan batch once all roots have settled.
pub fn open_select_folder_dialog<P: EventProxy, D: DialogService + ?Sized>(
    dialog: &D,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) -> Option<JoinHandle<()>> {
    proxy.send_event(UserEvent::FlagAddAnimeFolderStart);

    let start_dir = {
        let state_guard = lock_state(&state);
        state_guard
            .config
            .last_directories
            .first()
            .and_then(|dir| dir.parent().map(|p| p.to_path_buf()))
            .or_else(|| state_guard.paths.default_library_dir())
    };

    match dialog.pick_directories(start_dir.as_deref()) {
        Some(roots) => start_folder_scan(roots, proxy, state),
        None => {
            tracing::info!("User cancelled folder selection.");
            proxy.send_event(UserEvent::FlagAddAnimeFolderEnd);
            None
        }
    }
}

/// Sends the whole cache to a freshly loaded page.
pub async fn initialize<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>) {
    let cache = lock_state(&state).cache.clone();
    let folders = cache.restore().await;
    tracing::info!("Restoring {} anime folders to the UI", folders.len());
    proxy.send_event(UserEvent::RestoreAnimeFolders(folders));
}

/// Asks the event loop to minimize the main window.
pub fn minimize_main_window<P: EventProxy>(proxy: P) {
    proxy.send_event(UserEvent::MinimizeWindow);
}

/// Cancels every running scan. Each batch still ends with its end flag.
pub fn cancel_scans(state: Arc<Mutex<AppState>>) {
    lock_state(&state).cancel_all_scans();
}
