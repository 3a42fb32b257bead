//! Web search tool, backed by the credential-rotating search client.
//!
//! The model can ask for a search mid-turn; the result set is rendered with
//! the same formatter used for turn augmentation. An exhausted or failed
//! search is not an error for the model, it just reads "No results found.".

use std::sync::Arc;

use async_trait::async_trait;
use groundchat_core::error::ToolError;
use groundchat_core::provider::ToolDefinition;
use groundchat_core::tool::Tool;
use groundchat_search::{Searcher, format_context};
use tracing::debug;

pub const NAME: &str = "web_search";
pub const NO_RESULTS: &str = "No results found.";

const DESCRIPTION: &str = "Search the web for current information. Returns recent web pages and news with titles, summaries, and source URLs.";

fn schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string",
                "description": "The search query"
            }
        },
        "required": ["query"]
    })
}

/// The `web_search` declaration, offered only while search is enabled.
pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: NAME.into(),
        description: DESCRIPTION.into(),
        parameters: schema(),
    }
}

pub struct WebSearchTool {
    searcher: Arc<dyn Searcher>,
}

impl WebSearchTool {
    pub fn new(searcher: Arc<dyn Searcher>) -> Self {
        Self { searcher }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn parameters_schema(&self) -> serde_json::Value {
        schema()
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let query = arguments["query"]
            .as_str()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;

        debug!(query = %query, "Running web_search tool");

        Ok(match self.searcher.search(query).await {
            Some(result) => format_context(&result),
            None => NO_RESULTS.to_string(),
        })
    }
}
