//! The web-search preference collaborator.
//!
//! The chat path only ever reads the flag, once per turn. Writing it is the
//! job of whatever settings surface the application exposes.

use std::sync::atomic::{AtomicBool, Ordering};

pub trait PreferenceStore: Send + Sync {
    /// Whether search augmentation is enabled. Defaults to `false`.
    fn web_search_enabled(&self) -> bool;

    /// Persist a new value for the flag.
    fn set_web_search_enabled(&self, enabled: bool) -> std::io::Result<()>;
}

/// Process-local preferences, mostly for tests and one-shot runs.
#[derive(Debug, Default)]
pub struct InMemoryPreferences {
    web_search: AtomicBool,
}

impl InMemoryPreferences {
    pub fn new(web_search_enabled: bool) -> Self {
        Self {
            web_search: AtomicBool::new(web_search_enabled),
        }
    }
}

impl PreferenceStore for InMemoryPreferences {
    fn web_search_enabled(&self) -> bool {
        self.web_search.load(Ordering::Acquire)
    }

    fn set_web_search_enabled(&self, enabled: bool) -> std::io::Result<()> {
        self.web_search.store(enabled, Ordering::Release);
        Ok(())
    }
}
