//! Renders a [`SearchResult`] into the context block injected into a user turn.
//!
//! Output is deterministic for a given capture time: a header with the UTC
//! timestamp, up to [`MAX_WEB_RESULTS`] numbered web entries, up to
//! [`MAX_NEWS_RESULTS`] bulleted news entries, and a closing instruction.
//! Untitled entries are skipped and empty sections are left out entirely.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::model::SearchResult;

pub const MAX_WEB_RESULTS: usize = 25;
pub const MAX_NEWS_RESULTS: usize = 3;

pub const CONTEXT_INSTRUCTION: &str = "Use the search results above to ground your answer in current information and cite sources where relevant.";

/// Format with the current time as the capture timestamp.
pub fn format_context(result: &SearchResult) -> String {
    format_context_at(result, Utc::now())
}

pub fn format_context_at(result: &SearchResult, captured_at: DateTime<Utc>) -> String {
    let mut out = format!(
        "Web search results (captured {}):\n",
        captured_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    let web: Vec<_> = result
        .web
        .iter()
        .filter(|hit| !hit.title.trim().is_empty())
        .take(MAX_WEB_RESULTS)
        .collect();
    if !web.is_empty() {
        out.push('\n');
        for (i, hit) in web.into_iter().enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, hit.title.trim());
            if let Some(description) = non_empty(&hit.description) {
                let _ = writeln!(out, "   {description}");
            }
            if let Some(url) = non_empty(&hit.url) {
                let _ = writeln!(out, "   Source: {url}");
            }
        }
    }

    let news: Vec<_> = result
        .news
        .iter()
        .filter(|hit| !hit.title.trim().is_empty())
        .take(MAX_NEWS_RESULTS)
        .collect();
    if !news.is_empty() {
        out.push_str("\nRecent news:\n");
        for hit in news {
            let _ = writeln!(out, "- {}", hit.title.trim());
            if let Some(description) = non_empty(&hit.description) {
                let _ = writeln!(out, "  {description}");
            }
            if let Some(age) = non_empty(&hit.age) {
                let _ = writeln!(out, "  Published: {age}");
            }
        }
    }

    out.push('\n');
    out.push_str(CONTEXT_INSTRUCTION);
    out
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
