//! An abstraction layer for native dialogs to enable testing.

use std::path::{Path, PathBuf};

/// Defines a common interface for folder pickers and message boxes.
/// This allows for a mock implementation during tests, avoiding the need
/// to interact with actual OS dialog windows.
pub trait DialogService: Send + Sync {
    /// Opens a multi-select directory picker. `None` when the user cancels.
    fn pick_directories(&self, start_dir: Option<&Path>) -> Option<Vec<PathBuf>>;

    /// Shows a blocking error message box.
    fn show_error(&self, title: &str, message: &str);
}

/// The production implementation that uses the `rfd` crate to show native OS dialogs.
pub struct NativeDialogService;

impl DialogService for NativeDialogService {
    fn pick_directories(&self, start_dir: Option<&Path>) -> Option<Vec<PathBuf>> {
        let mut dialog = rfd::FileDialog::new().set_title("Add anime folders");
        if let Some(dir) = start_dir {
            dialog = dialog.set_directory(dir);
        }
        dialog.pick_folders().filter(|paths| !paths.is_empty())
    }

    fn show_error(&self, title: &str, message: &str) {
        rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Error)
            .set_title(title)
            .set_description(message)
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }
}
