//! Search client: one request per attempt, a fresh credential per attempt.
//!
//! The retry policy is a closed state machine:
//!
//! ```text
//! Attempt(n) --fetch--> Classify --200--------------------> Success
//!                           |--401/403/429/transport, n<max--> Attempt(n+1)
//!                           `--otherwise--------------------> Exhausted
//! ```
//!
//! Network I/O sits behind [`SearchTransport`] so the policy can be driven
//! by scripted transports in tests. Exhaustion yields `None`; search is a
//! best-effort enhancement and never fails the chat turn.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use groundchat_core::error::SearchError;
use tracing::{debug, info, warn};

use crate::model::SearchResult;
use crate::rotator::CredentialRotator;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fixed query parameters sent with every search.
pub const RESULT_COUNT: &str = "25";
pub const FRESHNESS: &str = "pd";
pub const SAFE_SEARCH: &str = "moderate";

/// Performs exactly one search request with the given credential.
#[async_trait]
pub trait SearchTransport: Send + Sync {
    async fn fetch(&self, query: &str, credential: &str) -> Result<SearchResult, SearchError>;
}

/// Anything that can turn a query into an optional result.
///
/// This is the seam the conversation assembler depends on.
#[async_trait]
pub trait Searcher: Send + Sync {
    async fn search(&self, query: &str) -> Option<SearchResult>;
}

/// Map an HTTP status to the failure it signals. `None` means success.
pub fn classify_status(status: u16) -> Option<SearchError> {
    match status {
        200 => None,
        401 => Some(SearchError::InvalidCredential),
        403 => Some(SearchError::AccessForbidden),
        429 => Some(SearchError::RateLimited),
        other => Some(SearchError::Transport(format!("unexpected status {other}"))),
    }
}

/// States of the retry loop.
#[derive(Debug, PartialEq, Eq)]
pub enum RetryState {
    /// About to make the given (1-based) attempt.
    Attempt(u32),
    Success(SearchResult),
    Exhausted,
}

impl RetryState {
    /// Transition after attempt `attempt` of `max_attempts` produced `outcome`.
    pub fn after(
        attempt: u32,
        max_attempts: u32,
        outcome: Result<SearchResult, SearchError>,
    ) -> Self {
        match outcome {
            Ok(result) => Self::Success(result),
            Err(e) if e.is_retryable() && attempt < max_attempts => Self::Attempt(attempt + 1),
            Err(_) => Self::Exhausted,
        }
    }
}

/// HTTP transport for the Brave web search API.
pub struct BraveTransport {
    client: reqwest::Client,
    url: String,
}

impl BraveTransport {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl SearchTransport for BraveTransport {
    async fn fetch(&self, query: &str, credential: &str) -> Result<SearchResult, SearchError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("q", query),
                ("count", RESULT_COUNT),
                ("freshness", FRESHNESS),
                ("safesearch", SAFE_SEARCH),
            ])
            .header("Accept", "application/json")
            .header("X-Subscription-Token", credential)
            .send()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        if let Some(err) = classify_status(response.status().as_u16()) {
            return Err(err);
        }

        response
            .json::<SearchResult>()
            .await
            .map_err(|e| SearchError::Transport(format!("failed to decode search response: {e}")))
    }
}

/// Search client rotating across a credential pool.
pub struct SearchClient {
    rotator: CredentialRotator,
    transport: Arc<dyn SearchTransport>,
    max_attempts: u32,
}

impl SearchClient {
    pub fn new(rotator: CredentialRotator, transport: Arc<dyn SearchTransport>) -> Self {
        Self {
            rotator,
            transport,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Brave-backed client over the given credential pool.
    pub fn brave(
        credentials: Vec<String>,
        url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SearchError> {
        let rotator = CredentialRotator::new(credentials)?;
        let transport = BraveTransport::new(url, timeout)?;
        Ok(Self::new(rotator, Arc::new(transport)))
    }

    /// Set the default attempt budget (at least one attempt is always made).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Search with an explicit attempt budget.
    pub async fn search_with_attempts(&self, query: &str, max_attempts: u32) -> Option<SearchResult> {
        let max_attempts = max_attempts.max(1);
        let mut state = RetryState::Attempt(1);

        loop {
            match state {
                RetryState::Attempt(attempt) => {
                    let credential = self.rotator.next();
                    debug!(attempt, max_attempts, "Search attempt");
                    let outcome = self.transport.fetch(query, credential).await;
                    if let Err(ref e) = outcome {
                        warn!(attempt, max_attempts, error = %e, "Search attempt failed");
                    }
                    state = RetryState::after(attempt, max_attempts, outcome);
                }
                RetryState::Success(result) => {
                    info!(
                        web = result.web.len(),
                        news = result.news.len(),
                        "Search succeeded"
                    );
                    return Some(result);
                }
                RetryState::Exhausted => {
                    warn!(max_attempts, "Search attempts exhausted, continuing without context");
                    return None;
                }
            }
        }
    }
}

#[async_trait]
impl Searcher for SearchClient {
    async fn search(&self, query: &str) -> Option<SearchResult> {
        self.search_with_attempts(query, self.max_attempts).await
    }
}

impl std::fmt::Debug for SearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchClient")
            .field("rotator", &self.rotator)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}
