//! File-backed web-search preference.
//!
//! Stored as a one-key TOML document at `~/.groundchat/preferences.toml`.
//! A missing or unreadable file reads as "disabled".

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use groundchat_core::preference::PreferenceStore;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
struct PreferenceFile {
    #[serde(default)]
    web_search_enabled: bool,
}

#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FilePreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Preferences at the default location.
    pub fn default_location() -> Self {
        Self::new(crate::AppConfig::config_dir().join("preferences.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> PreferenceFile {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return PreferenceFile::default(),
        };
        toml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "Ignoring unreadable preferences file");
            PreferenceFile::default()
        })
    }
}

impl PreferenceStore for FilePreferences {
    fn web_search_enabled(&self) -> bool {
        self.read().web_search_enabled
    }

    fn set_web_search_enabled(&self, enabled: bool) -> std::io::Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string(&PreferenceFile {
            web_search_enabled: enabled,
        })
        .map_err(std::io::Error::other)?;
        std::fs::write(&self.path, content)
    }
}
