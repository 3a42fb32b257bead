//! # GroundChat Core
//!
//! Domain types, traits, and error definitions shared by every GroundChat
//! crate: chat messages, tool declarations, the stream event union, the
//! provider and tool traits, and the web-search preference collaborator.
//!
//! Every collaborator is a trait here so the orchestration layer can be
//! driven by fakes in tests and by the HTTP implementations in production.

pub mod error;
pub mod message;
pub mod preference;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{ChatError, SearchError, ToolError};
pub use message::{Message, MessageToolCall, Role};
pub use preference::{InMemoryPreferences, PreferenceStore};
pub use provider::{ChatProvider, ChatRequest, EventStream, StreamEvent, ToolDefinition};
pub use tool::{Tool, ToolRegistry, ToolResult};
