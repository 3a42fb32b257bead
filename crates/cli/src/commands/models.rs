//! `groundchat models` — List models offered by the endpoint.

use groundchat_providers::list_models_or_fallback;

use crate::runtime::Runtime;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let runtime = Runtime::load()?;
    let models = list_models_or_fallback(runtime.provider.as_ref()).await;

    println!("Available models ({}):\n", runtime.config.base_url);
    for model in &models {
        let marker = if *model == runtime.config.default_model { "*" } else { " " };
        println!("  {marker} {model}");
    }
    println!();
    println!("  * = default (set default_model in config.toml or GROUNDCHAT_MODEL)");

    Ok(())
}
