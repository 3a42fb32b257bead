//! Wiring shared by the commands that talk to the network.

use std::sync::Arc;
use std::time::Duration;

use groundchat_agent::{ChatSession, ConversationAssembler};
use groundchat_config::{AppConfig, FilePreferences};
use groundchat_core::preference::PreferenceStore;
use groundchat_core::provider::ChatProvider;
use groundchat_providers::OpenAiCompatProvider;
use groundchat_search::{SearchClient, Searcher};

pub struct Runtime {
    pub config: AppConfig,
    pub provider: Arc<dyn ChatProvider>,
    pub searcher: Arc<dyn Searcher>,
}

impl Runtime {
    /// Load config and build the provider and search client.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

        let provider = OpenAiCompatProvider::from_config(&config)?;
        let searcher = SearchClient::brave(
            config.search_keys.clone(),
            &config.search.url,
            Duration::from_secs(config.search.timeout_secs),
        )?
        .with_max_attempts(config.search.max_attempts);

        Ok(Self {
            config,
            provider: Arc::new(provider),
            searcher: Arc::new(searcher),
        })
    }

    pub fn session(&self, preferences: Arc<dyn PreferenceStore>) -> ChatSession {
        let tools = groundchat_tools::registry(self.provider.clone(), self.searcher.clone());
        let session = ChatSession::new(
            self.provider.clone(),
            ConversationAssembler::new(self.searcher.clone()),
            preferences,
            Arc::new(tools),
            &self.config.default_model,
        )
        .with_temperature(self.config.default_temperature);

        match &self.config.system_prompt {
            Some(prompt) => session.with_system_prompt(prompt),
            None => session,
        }
    }

    pub fn preferences() -> Arc<dyn PreferenceStore> {
        Arc::new(FilePreferences::default_location())
    }
}
