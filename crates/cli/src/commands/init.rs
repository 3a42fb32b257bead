//! `groundchat init` — First-time setup.

use groundchat_config::{API_KEY_ENV, AppConfig, SEARCH_KEYS_ENV};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("GroundChat — First-Time Setup");
    println!("=============================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("  Config file exists, leaving it alone: {}", config_path.display());
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Wrote {}", config_path.display());
    }

    println!();
    println!("Next, export your credentials:");
    println!("  export {API_KEY_ENV}=sk-...");
    println!("  export {SEARCH_KEYS_ENV}=key-one,key-two");
    println!();
    println!("Then try: groundchat chat");

    Ok(())
}
