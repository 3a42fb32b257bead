//! Provider trait — the abstraction over the remote LLM endpoint.
//!
//! A provider knows how to send a conversation to an OpenAI-compatible
//! backend and hand back a lazy stream of [`StreamEvent`]s, list the models
//! it serves, and make a best-effort image generation call.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::error::ChatError;
use crate::message::Message;

/// A chat completion request. Providers render it into their wire format.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// The model to use (e.g., "gpt-4o-mini")
    pub model: String,

    /// The conversation messages, system message first
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    pub temperature: f32,

    /// Tools the model may call
    pub tools: Vec<ToolDefinition>,
}

pub fn default_temperature() -> f32 {
    0.7
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>, tools: Vec<ToolDefinition>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: default_temperature(),
            tools,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// A tool declaration sent to the LLM so it knows what it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// One decoded event from a streaming chat response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A non-empty fragment of assistant text.
    TextDelta(String),

    /// The raw `tool_calls` JSON of one event. Fragments of a single call
    /// may span many events; merging is up to the consumer.
    ToolCallDelta(String),

    /// The stream finished, either on the `[DONE]` sentinel or because the
    /// byte source closed.
    End,
}

/// Lazy, single-pass sequence of stream events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, ChatError>> + Send>>;

/// The core provider trait.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// A human-readable name for this provider.
    fn name(&self) -> &str;

    /// Send a streaming chat request.
    ///
    /// A non-success status fails here, before any event is decoded.
    async fn stream(&self, request: ChatRequest) -> Result<EventStream, ChatError>;

    /// List available model ids.
    async fn list_models(&self) -> Result<Vec<String>, ChatError> {
        Ok(Vec::new())
    }

    /// Generate an image and return its URL.
    async fn generate_image(&self, _prompt: &str) -> Result<String, ChatError> {
        Err(ChatError::Transport(format!(
            "Provider '{}' does not support image generation",
            self.name()
        )))
    }
}
