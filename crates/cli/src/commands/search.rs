//! `groundchat search` — Print the context block a chat turn would receive.

use groundchat_search::{Searcher, format_context};
use groundchat_tools::web_search::NO_RESULTS;

use crate::runtime::Runtime;

pub async fn run(query: &str) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = Runtime::load()?;
    match runtime.searcher.search(query).await {
        Some(result) => println!("{}", format_context(&result)),
        None => println!("{NO_RESULTS}"),
    }
    Ok(())
}
