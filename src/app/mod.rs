//! The desktop shell: IPC routing, event delivery and background tasks.

pub mod commands;
pub mod events;
pub mod file_dialog;
pub mod helpers;
pub mod proxy;
pub mod state;
pub mod tasks;

use std::sync::{Arc, Mutex};
use tao::window::Window;
use wry::WebView;

use events::{IpcMessage, UserEvent};
use file_dialog::DialogService;
use proxy::EventProxy;
use state::AppState;

/// Routes a raw IPC message from the WebView to its command handler.
pub fn handle_ipc_message<P: EventProxy, D: DialogService + ?Sized>(
    message: String,
    dialog: Arc<D>,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let msg: IpcMessage = match serde_json::from_str(&message) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::warn!("Ignoring malformed IPC message {:?}: {}", message, e);
            return;
        }
    };

    tracing::debug!("IPC command '{}'", msg.command);
    match msg.command.as_str() {
        "openSelectFolderDialog" => {
            commands::open_select_folder_dialog(dialog.as_ref(), proxy, state);
        }
        "initialize" => {
            tokio::spawn(commands::initialize(proxy, state));
        }
        "minimizeMainWindow" => commands::minimize_main_window(proxy),
        "cancelScans" => commands::cancel_scans(state),
        other => tracing::warn!("Unknown IPC command: {}", other),
    }
}

/// What the event loop should do after a user event has been handled.
#[derive(Debug, PartialEq, Eq)]
pub enum EventOutcome {
    Continue,
    Exit,
}

/// Delivers a `UserEvent` on the UI thread: page events become script calls,
/// the rest act on the window or show a native dialog.
pub fn handle_user_event<D: DialogService + ?Sized>(
    event: UserEvent,
    webview: &WebView,
    window: &Window,
    dialog: &D,
) -> EventOutcome {
    match event {
        UserEvent::MinimizeWindow => window.set_minimized(true),
        UserEvent::ShowError { title, message } => dialog.show_error(&title, &message),
        UserEvent::FlushFinished => return EventOutcome::Exit,
        page_event => {
            if let Some(script) = page_event.to_script() {
                if let Err(e) = webview.evaluate_script(&script) {
                    tracing::error!("Failed to deliver {:?} to the page: {}", page_event.js_function(), e);
                }
            }
        }
    }
    EventOutcome::Continue
}
