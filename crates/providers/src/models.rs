//! Model listing with a built-in fallback.

use groundchat_core::provider::ChatProvider;
use tracing::{debug, warn};

/// Offered when the endpoint cannot list its models.
pub const FALLBACK_MODELS: &[&str] = &["gpt-4o-mini", "gpt-4o", "gpt-4.1-mini", "o3-mini"];

/// List the provider's models, or [`FALLBACK_MODELS`] on any failure or an
/// empty listing.
pub async fn list_models_or_fallback(provider: &dyn ChatProvider) -> Vec<String> {
    match provider.list_models().await {
        Ok(models) if !models.is_empty() => {
            debug!(provider = %provider.name(), count = models.len(), "Listed models");
            models
        }
        Ok(_) => {
            warn!(provider = %provider.name(), "Endpoint listed no models, using fallback list");
            fallback()
        }
        Err(e) => {
            warn!(provider = %provider.name(), error = %e, "Model listing failed, using fallback list");
            fallback()
        }
    }
}

fn fallback() -> Vec<String> {
    FALLBACK_MODELS.iter().map(|m| m.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use groundchat_core::error::ChatError;
    use groundchat_core::provider::{ChatRequest, EventStream};

    struct Listing(Result<Vec<String>, ChatError>);

    #[async_trait]
    impl ChatProvider for Listing {
        fn name(&self) -> &str {
            "listing"
        }

        async fn stream(&self, _request: ChatRequest) -> Result<EventStream, ChatError> {
            Err(ChatError::Transport("not used".into()))
        }

        async fn list_models(&self) -> Result<Vec<String>, ChatError> {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn returns_listed_models() {
        let provider = Listing(Ok(vec!["local-model".into()]));
        assert_eq!(list_models_or_fallback(&provider).await, vec!["local-model"]);
    }

    #[tokio::test]
    async fn falls_back_on_error() {
        let provider = Listing(Err(ChatError::RequestFailed {
            status: 500,
            body: "boom".into(),
        }));
        let models = list_models_or_fallback(&provider).await;
        assert_eq!(models.len(), FALLBACK_MODELS.len());
        assert_eq!(models[0], "gpt-4o-mini");
    }

    #[tokio::test]
    async fn falls_back_on_empty_listing() {
        let provider = Listing(Ok(vec![]));
        assert_eq!(list_models_or_fallback(&provider).await, fallback());
    }
}
