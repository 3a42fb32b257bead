//! `groundchat doctor` — Diagnose configuration.

use groundchat_config::{AppConfig, ConfigError, FilePreferences};
use groundchat_core::preference::PreferenceStore;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 GroundChat Doctor — Configuration Diagnostics");
    println!("================================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file found: {}", config_path.display());
    } else {
        println!("  ⚠️  No config file, using defaults (run `groundchat init`)");
    }

    match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid, credentials present");
            println!("     Endpoint:     {}", config.base_url);
            println!("     Model:        {}", config.default_model);
            println!("     Search keys:  {}", config.search_keys.len());
        }
        Err(ConfigError::Missing(var)) => {
            println!("  ❌ {var} is not set");
            issues += 1;
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            issues += 1;
        }
    }

    let preferences = FilePreferences::default_location();
    println!(
        "  ✅ Web search: {} ({})",
        if preferences.web_search_enabled() { "on" } else { "off" },
        preferences.path().display()
    );

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
