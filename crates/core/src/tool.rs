//! Tool trait — capabilities the model can invoke instead of answering.
//!
//! GroundChat ships two: `generate_image` and `web_search`. Each is declared
//! to the model through a [`ToolDefinition`] and executed by the registry
//! once its streamed call has been fully reassembled.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::ToolError;
use crate::message::MessageToolCall;
use crate::provider::ToolDefinition;

/// The result of a tool execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    /// The call ID this result is for
    pub call_id: String,

    /// Whether the tool executed successfully
    pub success: bool,

    /// The output content (sent back to the model)
    pub output: String,
}

/// The core Tool trait.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool.
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments, returning its output text.
    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools, keyed by name.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Execute a reassembled tool call.
    ///
    /// Failures are folded into an unsuccessful [`ToolResult`] so the model
    /// sees them as a tool response instead of the turn aborting.
    pub async fn execute(&self, call: &MessageToolCall) -> ToolResult {
        let outcome = match self.tools.get(&call.name) {
            None => Err(ToolError::NotFound(call.name.clone())),
            Some(tool) => match parse_arguments(&call.arguments) {
                Ok(arguments) => tool.execute(arguments).await,
                Err(e) => Err(e),
            },
        };

        match outcome {
            Ok(output) => ToolResult {
                call_id: call.id.clone(),
                success: true,
                output,
            },
            Err(e) => {
                tracing::warn!(tool = %call.name, error = %e, "Tool call failed");
                ToolResult {
                    call_id: call.id.clone(),
                    success: false,
                    output: e.to_string(),
                }
            }
        }
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_arguments(raw: &str) -> Result<serde_json::Value, ToolError> {
    if raw.trim().is_empty() {
        return Ok(serde_json::Value::Object(serde_json::Map::new()));
    }
    serde_json::from_str(raw).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}
