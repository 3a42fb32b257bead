//! Built-in tools for GroundChat.
//!
//! The model is always offered `generate_image`, and `web_search` while the
//! search preference is on. [`registry`] wires both to their backends; the
//! `definition()` functions give the static declarations without needing
//! live collaborators.

pub mod generate_image;
pub mod web_search;

use std::sync::Arc;

use groundchat_core::provider::{ChatProvider, ToolDefinition};
use groundchat_core::tool::ToolRegistry;
use groundchat_search::Searcher;

pub use generate_image::GenerateImageTool;
pub use web_search::WebSearchTool;

/// Declarations offered for one turn. `generate_image` always comes first.
pub fn declarations(search_enabled: bool) -> Vec<ToolDefinition> {
    let mut tools = vec![generate_image::definition()];
    if search_enabled {
        tools.push(web_search::definition());
    }
    tools
}

/// Build a registry able to execute every declared tool.
pub fn registry(provider: Arc<dyn ChatProvider>, searcher: Arc<dyn Searcher>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(GenerateImageTool::new(provider)));
    registry.register(Box::new(WebSearchTool::new(searcher)));
    registry
}
