//! Image generation tool.
//!
//! A single best-effort call to the provider's image endpoint. Failures are
//! returned as [`ToolError::ExecutionFailed`] and reach the model as text.

use std::sync::Arc;

use async_trait::async_trait;
use groundchat_core::error::ToolError;
use groundchat_core::provider::{ChatProvider, ToolDefinition};
use groundchat_core::tool::Tool;
use tracing::{debug, info};

pub const NAME: &str = "generate_image";

const DESCRIPTION: &str =
    "Generate an image from a text description. Returns the URL of the generated image.";

fn schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "prompt": {
                "type": "string",
                "description": "A detailed description of the image to generate"
            }
        },
        "required": ["prompt"]
    })
}

/// The `generate_image` declaration, always offered to the model.
pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: NAME.into(),
        description: DESCRIPTION.into(),
        parameters: schema(),
    }
}

pub struct GenerateImageTool {
    provider: Arc<dyn ChatProvider>,
}

impl GenerateImageTool {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Tool for GenerateImageTool {
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
        let prompt = arguments["prompt"]
            .as_str()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'prompt' argument".into()))?;

        debug!(provider = %self.provider.name(), "Requesting image");

        let url = self
            .provider
            .generate_image(prompt)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: NAME.into(),
                reason: e.to_string(),
            })?;

        info!(url = %url, "Image generated");
        Ok(format!("Image generated: {url}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groundchat_core::error::ChatError;
    use groundchat_core::provider::{ChatRequest, EventStream};

    struct ImageOnly(Result<String, ChatError>);

    #[async_trait]
    impl ChatProvider for ImageOnly {
        fn name(&self) -> &str {
            "image-only"
        }

        async fn stream(&self, _request: ChatRequest) -> Result<EventStream, ChatError> {
            Err(ChatError::Transport("not used".into()))
        }

        async fn generate_image(&self, _prompt: &str) -> Result<String, ChatError> {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn returns_image_url() {
        let tool = GenerateImageTool::new(Arc::new(ImageOnly(Ok("https://img/1.png".into()))));
        let output = tool
            .execute(serde_json::json!({"prompt": "a lighthouse at dusk"}))
            .await
            .unwrap();
        assert_eq!(output, "Image generated: https://img/1.png");
    }

    #[tokio::test]
    async fn endpoint_failure_is_execution_failure() {
        let tool = GenerateImageTool::new(Arc::new(ImageOnly(Err(ChatError::RequestFailed {
            status: 400,
            body: "content policy".into(),
        }))));
        let err = tool
            .execute(serde_json::json!({"prompt": "x"}))
            .await
            .unwrap_err();
        match err {
            ToolError::ExecutionFailed { tool_name, reason } => {
                assert_eq!(tool_name, NAME);
                assert!(reason.contains("content policy"));
            }
            other => panic!("expected ExecutionFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn blank_prompt_is_invalid() {
        let tool = GenerateImageTool::new(Arc::new(ImageOnly(Ok(String::new()))));
        assert!(tool.execute(serde_json::json!({"prompt": "  "})).await.is_err());
    }
}
