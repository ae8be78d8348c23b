//! Configuration surface.
//!
//! There is no settings dialog; instead the settings file itself is the
//! form. "Configure" writes the current settings, opens the JSON in the
//! system editor, waits for the editor to close, and then re-reads and
//! validates the result. Anything malformed is rejected with a warning so
//! invalid values never reach the control loop.

use crate::settings::Settings;

/// Presents the current settings for editing and returns the updated
/// settings, or `None` when the user cancelled or made no valid change.
///
/// `present` may block waiting for the user; the controller invokes it on
/// a dedicated thread.
pub trait ConfigUi: Send + Sync {
    fn present(&self, current: &Settings) -> Option<Settings>;
}

#[cfg(windows)]
pub use editor::EditorConfigUi;

#[cfg(windows)]
mod editor {
    use super::ConfigUi;
    use crate::alert;
    use crate::settings::{self, Settings, SettingsStore};
    use std::process::Command;

    /// Edits the settings file in Notepad.
    pub struct EditorConfigUi {
        store: SettingsStore,
    }

    impl EditorConfigUi {
        pub fn new(store: SettingsStore) -> Self {
            Self { store }
        }
    }

    impl ConfigUi for EditorConfigUi {
        fn present(&self, current: &Settings) -> Option<Settings> {
            if !self.store.save(current) {
                alert::show_warning("Nudge", "Could not write the settings file for editing.");
                return None;
            }

            tracing::info!(path = %self.store.path().display(), "Opening settings editor");
            let status = Command::new("notepad.exe").arg(self.store.path()).status();
            if let Err(e) = status {
                alert::show_warning("Nudge", &format!("Could not open the settings editor: {e}"));
                return None;
            }

            let edited = match self.store.try_load() {
                Ok(edited) => edited,
                Err(e) => {
                    alert::show_warning(
                        "Nudge",
                        &format!("The edited settings were discarded:\n\n{e}"),
                    );
                    return None;
                }
            };

            if let Err(e) = settings::validate(&edited) {
                alert::show_warning(
                    "Nudge",
                    &format!("The edited settings were discarded:\n\n{e}"),
                );
                return None;
            }

            if edited == *current {
                return None;
            }

            Some(edited)
        }
    }
}
