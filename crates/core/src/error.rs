//! Error types for the GroundChat domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum. Configuration errors live
//! with the configuration loader.

use thiserror::Error;

/// Failures of the chat, models and image endpoints.
///
/// All of these are fatal for the request that produced them.
#[derive(Debug, Clone, Error)]
pub enum ChatError {
    #[error("Chat request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

/// Failures of a single search attempt.
///
/// Everything except [`SearchError::Configuration`] is retryable with the
/// next credential in the pool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("Search is misconfigured: {0}")]
    Configuration(String),

    #[error("Search credential was rejected (401)")]
    InvalidCredential,

    #[error("Search credential is rate limited (429)")]
    RateLimited,

    #[error("Search access forbidden (403)")]
    AccessForbidden,

    #[error("Search transport error: {0}")]
    Transport(String),
}

impl SearchError {
    /// Whether another attempt with a fresh credential may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Configuration(_))
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}
