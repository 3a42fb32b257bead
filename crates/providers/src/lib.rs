//! Chat provider implementations for GroundChat.
//!
//! [`OpenAiCompatProvider`] implements `groundchat_core::ChatProvider` against
//! any OpenAI-compatible endpoint. Streaming bodies are decoded by [`sse`].

pub mod models;
pub mod openai_compat;
pub mod sse;

pub use models::{FALLBACK_MODELS, list_models_or_fallback};
pub use openai_compat::OpenAiCompatProvider;
pub use sse::{SseDecoder, decode_events};
