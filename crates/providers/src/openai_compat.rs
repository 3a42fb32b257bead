//! OpenAI-compatible provider implementation.
//!
//! Works with any endpoint exposing `/chat/completions`, `/models` and
//! `/images/generations` under a common base URL with bearer auth.
//!
//! Supports:
//! - Streaming chat completions (SSE) with tool declarations
//! - Model listing
//! - Single-shot image generation

use std::time::Duration;

use async_trait::async_trait;
use groundchat_config::AppConfig;
use groundchat_core::error::ChatError;
use groundchat_core::message::Message;
use groundchat_core::provider::{ChatProvider, ChatRequest, EventStream, ToolDefinition};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::sse::decode_events;

/// An OpenAI-compatible chat endpoint.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    image_model: String,
    image_size: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ChatError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            image_model: "dall-e-3".into(),
            image_size: "1024x1024".into(),
            client,
        })
    }

    /// Build the provider described by the loaded configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, ChatError> {
        Ok(Self::new("openai", &config.base_url, config.api_key())?
            .with_image_settings(&config.image.model, &config.image.size))
    }

    /// Override the model and size used for image generation.
    pub fn with_image_settings(mut self, model: impl Into<String>, size: impl Into<String>) -> Self {
        self.image_model = model.into();
        self.image_size = size.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Convert our Message types to OpenAI API format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str().into(),
                content: Some(m.content.clone()),
                tool_calls: if m.tool_calls.is_empty() {
                    None
                } else {
                    Some(
                        m.tool_calls
                            .iter()
                            .map(|tc| ApiToolCall {
                                id: tc.id.clone(),
                                r#type: "function".into(),
                                function: ApiFunction {
                                    name: tc.name.clone(),
                                    arguments: tc.arguments.clone(),
                                },
                            })
                            .collect(),
                    )
                },
                tool_call_id: m.tool_call_id.clone(),
            })
            .collect()
    }

    /// Convert tool definitions to OpenAI API format.
    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<ApiToolDefinition> {
        tools
            .iter()
            .map(|t| ApiToolDefinition {
                r#type: "function".into(),
                function: ApiToolFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect()
    }

    fn chat_body(request: &ChatRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "stream": true,
            "temperature": request.temperature,
        });

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
        }
        body
    }

    async fn error_for(response: reqwest::Response) -> ChatError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        warn!(status, body = %body, "Endpoint returned error");
        ChatError::RequestFailed { status, body }
    }
}

#[async_trait]
impl ChatProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn stream(&self, request: ChatRequest) -> Result<EventStream, ChatError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::chat_body(&request);

        debug!(
            provider = %self.name,
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending streaming request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        if response.status().as_u16() != 200 {
            return Err(Self::error_for(response).await);
        }

        Ok(Box::pin(decode_events(Box::pin(response.bytes_stream()))))
    }

    async fn list_models(&self) -> Result<Vec<String>, ChatError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        let body: ModelsResponse = response
            .json()
            .await
            .map_err(|e| ChatError::Decode(e.to_string()))?;

        Ok(body
            .data
            .into_iter()
            .filter_map(|m| m.id.or(m.name))
            .collect())
    }

    async fn generate_image(&self, prompt: &str) -> Result<String, ChatError> {
        let url = format!("{}/images/generations", self.base_url);
        let body = ImageRequest {
            prompt,
            model: &self.image_model,
            size: &self.image_size,
        };

        debug!(provider = %self.name, model = %self.image_model, "Sending image request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        let body: ImageResponse = response
            .json()
            .await
            .map_err(|e| ChatError::Decode(e.to_string()))?;

        body.data
            .into_iter()
            .find_map(|d| d.url)
            .ok_or_else(|| ChatError::Decode("image response contained no URL".into()))
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ApiToolCall {
    id: String,
    r#type: String,
    function: ApiFunction,
}

#[derive(Debug, Serialize)]
struct ApiFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize)]
struct ApiToolDefinition {
    r#type: String,
    function: ApiToolFunction,
}

#[derive(Debug, Serialize)]
struct ApiToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    prompt: &'a str,
    model: &'a str,
    size: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use groundchat_core::message::MessageToolCall;
    use groundchat_core::provider::StreamEvent;

    #[test]
    fn from_config_trims_base_url() {
        let config = AppConfig {
            api_key: Some("sk-test".into()),
            base_url: "http://localhost:1234/v1/".into(),
            ..AppConfig::default()
        };
        let provider = OpenAiCompatProvider::from_config(&config).unwrap();
        assert_eq!(provider.base_url(), "http://localhost:1234/v1");
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn chat_body_shape() {
        let request = ChatRequest::new(
            "gpt-4o-mini",
            vec![Message::system("sys"), Message::user("hi")],
            vec![ToolDefinition {
                name: "generate_image".into(),
                description: "Generate an image".into(),
                parameters: serde_json::json!({"type": "object"}),
            }],
        );
        let body = OpenAiCompatProvider::chat_body(&request);
        assert_eq!(body["stream"], true);
        assert_eq!(body["model"], "gpt-4o-mini");
        assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "generate_image");
    }

    #[test]
    fn chat_body_omits_empty_tools() {
        let request = ChatRequest::new("m", vec![Message::user("hi")], vec![]);
        let body = OpenAiCompatProvider::chat_body(&request);
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn message_conversion_with_tool_calls() {
        let msg = Message::assistant_with_tool_calls(
            "",
            vec![MessageToolCall {
                id: "call_1".into(),
                name: "web_search".into(),
                arguments: r#"{"query":"rust"}"#.into(),
            }],
        );
        let api_msgs = OpenAiCompatProvider::to_api_messages(&[msg, Message::tool_result("call_1", "ok")]);
        let tc = api_msgs[0].tool_calls.as_ref().unwrap();
        assert_eq!(tc[0].function.name, "web_search");
        assert_eq!(api_msgs[1].role, "tool");
        assert_eq!(api_msgs[1].tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn parse_models_with_id_or_name() {
        let data = r#"{"data":[{"id":"gpt-4o"},{"name":"local-llama"},{"object":"model"}]}"#;
        let parsed: ModelsResponse = serde_json::from_str(data).unwrap();
        let ids: Vec<String> = parsed.data.into_iter().filter_map(|m| m.id.or(m.name)).collect();
        assert_eq!(ids, vec!["gpt-4o", "local-llama"]);
    }

    mod http {
        use super::*;
        use axum::Json;
        use axum::Router;
        use axum::http::{HeaderMap, StatusCode};
        use axum::routing::{get, post};

        async fn serve(app: Router) -> String {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });
            format!("http://{addr}/v1")
        }

        async fn chat(headers: HeaderMap, Json(body): Json<serde_json::Value>) -> (StatusCode, String) {
            let authorized = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                == Some("Bearer sk-test");
            if !authorized {
                return (StatusCode::UNAUTHORIZED, r#"{"error":"bad key"}"#.into());
            }
            assert_eq!(body["stream"], true);
            (
                StatusCode::OK,
                concat!(
                    "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
                    "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
                    "data: [DONE]\n\n",
                )
                .into(),
            )
        }

        fn app() -> Router {
            Router::new()
                .route("/v1/chat/completions", post(chat))
                .route(
                    "/v1/models",
                    get(|| async { Json(serde_json::json!({"data":[{"id":"gpt-4o"}]})) }),
                )
                .route(
                    "/v1/images/generations",
                    post(|Json(body): Json<serde_json::Value>| async move {
                        assert_eq!(body["size"], "1024x1024");
                        Json(serde_json::json!({"data":[{"url":"https://img.example/1.png"}]}))
                    }),
                )
        }

        #[tokio::test]
        async fn streams_events_over_http() {
            let base = serve(app()).await;
            let provider = OpenAiCompatProvider::new("test", base, "sk-test").unwrap();

            let stream = provider
                .stream(ChatRequest::new("m", vec![Message::user("hi")], vec![]))
                .await
                .unwrap();
            let events: Vec<StreamEvent> = stream.map(|e| e.unwrap()).collect().await;
            assert_eq!(
                events,
                vec![
                    StreamEvent::TextDelta("Hel".into()),
                    StreamEvent::TextDelta("lo".into()),
                    StreamEvent::End
                ]
            );
        }

        #[tokio::test]
        async fn non_success_status_fails_before_decoding() {
            let base = serve(app()).await;
            let provider = OpenAiCompatProvider::new("test", base, "wrong").unwrap();

            let err = match provider
                .stream(ChatRequest::new("m", vec![Message::user("hi")], vec![]))
                .await
            {
                Ok(_) => panic!("expected the request to fail"),
                Err(e) => e,
            };
            match err {
                ChatError::RequestFailed { status, body } => {
                    assert_eq!(status, 401);
                    assert!(body.contains("bad key"));
                }
                other => panic!("expected RequestFailed, got {other:?}"),
            }
        }

        #[tokio::test]
        async fn lists_models_and_generates_images() {
            let base = serve(app()).await;
            let provider = OpenAiCompatProvider::new("test", base, "sk-test").unwrap();

            assert_eq!(provider.list_models().await.unwrap(), vec!["gpt-4o"]);
            assert_eq!(
                provider.generate_image("a red fox").await.unwrap(),
                "https://img.example/1.png"
            );
        }
    }
}
