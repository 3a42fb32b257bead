//! Conversation assembly for one chat turn.
//!
//! Produces the ordered message list and the tool declarations for a
//! request:
//!
//! 1. **System**: a timestamp line, then the caller's prompt after a blank
//!    line when one is given
//! 2. **History**: verbatim, in the order given
//! 3. **User**: the new message, prefixed with formatted search context
//!    when search is enabled and produced a result
//!
//! Search is best effort. A missing result leaves the user message exactly
//! as typed, and a disabled flag means the searcher is never consulted.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use groundchat_core::message::Message;
use groundchat_core::provider::ToolDefinition;
use groundchat_search::{Searcher, format_context_at};
use tracing::{debug, info};

/// Placed between the search context and the user's own words.
pub const AUGMENT_INSTRUCTION: &str =
    "Using the search results above where relevant, respond to the following message:";

// ── Types ─────────────────────────────────────────────────────────────────

/// Messages and tools ready to be put into a chat request.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
}

pub struct ConversationAssembler {
    searcher: Option<Arc<dyn Searcher>>,
}

// ── Assembly ──────────────────────────────────────────────────────────────

impl ConversationAssembler {
    pub fn new(searcher: Arc<dyn Searcher>) -> Self {
        Self {
            searcher: Some(searcher),
        }
    }

    /// An assembler that never augments, whatever the flag says.
    pub fn without_search() -> Self {
        Self { searcher: None }
    }

    pub async fn build(
        &self,
        user_message: &str,
        history: &[Message],
        system_prompt: Option<&str>,
        search_enabled: bool,
    ) -> AssembledRequest {
        self.build_at(user_message, history, system_prompt, search_enabled, Utc::now())
            .await
    }

    /// Assemble with an explicit clock reading, used for the system
    /// timestamp and the search capture time.
    pub async fn build_at(
        &self,
        user_message: &str,
        history: &[Message],
        system_prompt: Option<&str>,
        search_enabled: bool,
        now: DateTime<Utc>,
    ) -> AssembledRequest {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(system_content(system_prompt, now)));
        messages.extend(history.iter().cloned());

        let user_content = if search_enabled {
            self.augment(user_message, now).await
        } else {
            user_message.to_string()
        };
        messages.push(Message::user(user_content));

        let tools = groundchat_tools::declarations(search_enabled);

        debug!(
            messages = messages.len(),
            tools = tools.len(),
            search_enabled,
            "Assembled conversation"
        );

        AssembledRequest { messages, tools }
    }

    async fn augment(&self, user_message: &str, now: DateTime<Utc>) -> String {
        let Some(searcher) = &self.searcher else {
            debug!("Search enabled but no searcher configured");
            return user_message.to_string();
        };

        match searcher.search(user_message).await {
            Some(result) => {
                info!(
                    web = result.web.len(),
                    news = result.news.len(),
                    "Augmenting message with search context"
                );
                format!(
                    "{}\n\n{AUGMENT_INSTRUCTION}\n{user_message}",
                    format_context_at(&result, now)
                )
            }
            None => {
                debug!("No search context, sending message unmodified");
                user_message.to_string()
            }
        }
    }
}

fn system_content(system_prompt: Option<&str>, now: DateTime<Utc>) -> String {
    let mut content = format!(
        "Current date and time: {}",
        now.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if let Some(prompt) = system_prompt.filter(|p| !p.trim().is_empty()) {
        content.push_str("\n\n");
        content.push_str(prompt);
    }
    content
}
