//! Reassembly of streamed tool calls.
//!
//! The decoder hands over each event's raw `tool_calls` array untouched.
//! One logical call usually spans many events: the first fragment carries
//! the id and function name, later ones carry slices of the argument JSON.
//! Fragments are keyed by their `index` and merged until the stream ends.

use std::collections::BTreeMap;

use groundchat_core::message::MessageToolCall;
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct Fragment {
    #[serde(default)]
    index: Option<usize>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<FunctionFragment>,
}

#[derive(Debug, Deserialize)]
struct FunctionFragment {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

#[derive(Debug, Default)]
struct PartialCall {
    id: Option<String>,
    name: Option<String>,
    arguments: String,
}

/// Merges `ToolCallDelta` payloads into complete calls.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    calls: BTreeMap<usize, PartialCall>,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw `tool_calls` payload. Unparseable payloads are dropped.
    pub fn push(&mut self, raw: &str) {
        let fragments: Vec<Fragment> = match serde_json::from_str(raw) {
            Ok(fragments) => fragments,
            Err(e) => {
                warn!(error = %e, "Dropping malformed tool-call fragment");
                return;
            }
        };

        for (position, fragment) in fragments.into_iter().enumerate() {
            let call = self
                .calls
                .entry(fragment.index.unwrap_or(position))
                .or_default();

            if let Some(id) = fragment.id.filter(|id| !id.is_empty()) {
                call.id = Some(id);
            }
            if let Some(function) = fragment.function {
                if let Some(name) = function.name.filter(|n| !n.is_empty()) {
                    call.name = Some(name);
                }
                if let Some(arguments) = function.arguments {
                    call.arguments.push_str(&arguments);
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Complete calls in index order. Calls that never received a function
    /// name cannot be executed and are discarded.
    pub fn finish(self) -> Vec<MessageToolCall> {
        self.calls
            .into_iter()
            .filter_map(|(index, call)| {
                let Some(name) = call.name else {
                    warn!(index, "Discarding tool call without a function name");
                    return None;
                };
                Some(MessageToolCall {
                    id: call.id.unwrap_or_else(|| format!("call_{index}")),
                    name,
                    arguments: call.arguments,
                })
            })
            .collect()
    }
}
