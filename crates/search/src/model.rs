//! Search result payloads.
//!
//! The endpoint nests each result list under its section
//! (`{"web":{"results":[...]},"news":{"results":[...]}}`); we flatten that
//! into [`SearchResult`] on deserialization. Results are never cached.

use serde::{Deserialize, Serialize};

/// One organic web hit. A hit without a title still parses; the formatter
/// skips it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// One news hit. `age` is the endpoint's human-readable publish age
/// (e.g. "3 hours ago").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub age: Option<String>,
}

/// The result of one successful search call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "SearchResponse")]
pub struct SearchResult {
    pub web: Vec<WebResult>,
    pub news: Vec<NewsResult>,
}

impl SearchResult {
    pub fn is_empty(&self) -> bool {
        self.web.is_empty() && self.news.is_empty()
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    web: Option<Section<WebResult>>,
    #[serde(default)]
    news: Option<Section<NewsResult>>,
}

#[derive(Deserialize)]
struct Section<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

impl From<SearchResponse> for SearchResult {
    fn from(raw: SearchResponse) -> Self {
        Self {
            web: raw.web.map(|s| s.results).unwrap_or_default(),
            news: raw.news.map(|s| s.results).unwrap_or_default(),
        }
    }
}
