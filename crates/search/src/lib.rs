//! Web search for GroundChat.
//!
//! - [`rotator`] spreads requests across a pool of search credentials.
//! - [`client`] issues the requests, classifies failures and retries with
//!   the next credential, degrading to "no result" on exhaustion.
//! - [`format`] renders a result set into the bounded context block that is
//!   prepended to the user's message.

pub mod client;
pub mod format;
pub mod model;
pub mod rotator;

pub use client::{BraveTransport, RetryState, SearchClient, SearchTransport, Searcher};
pub use format::{format_context, format_context_at};
pub use model::{NewsResult, SearchResult, WebResult};
pub use rotator::CredentialRotator;
