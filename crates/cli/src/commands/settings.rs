//! `groundchat settings` — The only place preferences are written.

use groundchat_config::FilePreferences;
use groundchat_core::preference::PreferenceStore;

pub fn web_search(state: Option<bool>) -> Result<(), Box<dyn std::error::Error>> {
    let preferences = FilePreferences::default_location();

    if let Some(enabled) = state {
        preferences.set_web_search_enabled(enabled)?;
        tracing::debug!(path = %preferences.path().display(), enabled, "Saved preference");
    }

    let label = if preferences.web_search_enabled() { "on" } else { "off" };
    println!("web-search: {label}");
    Ok(())
}
