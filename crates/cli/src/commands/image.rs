//! `groundchat image` — Generate one image.

use groundchat_core::provider::ChatProvider;

use crate::runtime::Runtime;

pub async fn run(prompt: &str) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = Runtime::load()?;
    let url = runtime.provider.generate_image(prompt).await?;
    println!("{url}");
    Ok(())
}
