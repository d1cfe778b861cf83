//! Defines the event and message structures for communication between the backend and frontend.

use serde::Deserialize;

use crate::core::AnimeFolder;

/// Events sent from the Rust backend to the event loop (UI thread).
///
/// Most variants map onto a `window.*` function in the frontend; the window
/// and dialog variants are handled natively by the event loop.
#[derive(Debug)]
pub enum UserEvent {
    /// A scan batch has begun (`window.flagAddAnimeFolderStart`).
    FlagAddAnimeFolderStart,
    /// A folder unknown to the cache was discovered (`window.addAnimeFolder`).
    AddAnimeFolder(AnimeFolder),
    /// A cached folder was discovered again (`window.updateAnimeFolder`).
    UpdateAnimeFolder(AnimeFolder),
    /// Every root of the batch has settled (`window.flagAddAnimeFolderEnd`).
    FlagAddAnimeFolderEnd,
    /// The whole cache, sent when the page has loaded (`window.restoreAnimeFolders`).
    RestoreAnimeFolders(Vec<AnimeFolder>),
    /// A non-fatal error to show in a native message dialog.
    ShowError { title: String, message: String },
    /// Minimize the main window.
    MinimizeWindow,
    /// The shutdown flush has finished (or timed out); the event loop may exit.
    FlushFinished,
}

impl UserEvent {
    /// The frontend function this event invokes, if it is forwarded to the page.
    pub fn js_function(&self) -> Option<&'static str> {
        match self {
            UserEvent::FlagAddAnimeFolderStart => Some("flagAddAnimeFolderStart"),
            UserEvent::AddAnimeFolder(_) => Some("addAnimeFolder"),
            UserEvent::UpdateAnimeFolder(_) => Some("updateAnimeFolder"),
            UserEvent::FlagAddAnimeFolderEnd => Some("flagAddAnimeFolderEnd"),
            UserEvent::RestoreAnimeFolders(_) => Some("restoreAnimeFolders"),
            UserEvent::ShowError { .. } | UserEvent::MinimizeWindow | UserEvent::FlushFinished => {
                None
            }
        }
    }

    /// Builds the script that delivers this event to the page.
    pub fn to_script(&self) -> Option<String> {
        let function = self.js_function()?;
        let payload = match self {
            UserEvent::AddAnimeFolder(folder) | UserEvent::UpdateAnimeFolder(folder) => {
                serde_json::to_string(folder)
            }
            UserEvent::RestoreAnimeFolders(folders) => serde_json::to_string(folders),
            _ => Ok(String::new()),
        };

        match payload {
            Ok(payload) => Some(format!(
                "window.{f} && window.{f}({p});",
                f = function,
                p = payload
            )),
            Err(e) => {
                tracing::error!("Failed to serialize payload for {}: {}", function, e);
                None
            }
        }
    }
}

/// A message received from the WebView via the IPC channel.
#[derive(Deserialize, Debug)]
pub struct IpcMessage {
    /// The name of the command to execute.
    pub command: String,
    /// The payload associated with the command, as a JSON value.
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    #[test]
    fn flags_call_functions_without_arguments() {
        assert_eq!(
            UserEvent::FlagAddAnimeFolderEnd.to_script().unwrap(),
            "window.flagAddAnimeFolderEnd && window.flagAddAnimeFolderEnd();"
        );
    }

    #[test]
    fn folders_are_passed_as_camel_case_json() {
        let folder = AnimeFolder {
            path: PathBuf::from("/media/anime/Show"),
            display_name: "Show".to_string(),
            discovered_at: Utc::now(),
            metadata: BTreeMap::new(),
        };
        let script = UserEvent::AddAnimeFolder(folder).to_script().unwrap();
        assert!(script.starts_with("window.addAnimeFolder && window.addAnimeFolder({"));
        assert!(script.contains("\"displayName\":\"Show\""));
    }

    #[test]
    fn native_events_are_not_forwarded() {
        assert!(UserEvent::MinimizeWindow.to_script().is_none());
        assert!(UserEvent::FlushFinished.to_script().is_none());
    }

    #[test]
    fn ipc_message_payload_is_optional() {
        let msg: IpcMessage = serde_json::from_str(r#"{"command":"initialize"}"#).unwrap();
        assert_eq!(msg.command, "initialize");
        assert!(msg.payload.is_null());
    }
}
