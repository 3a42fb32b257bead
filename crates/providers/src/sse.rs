//! Server-sent-event decoding for streaming chat completions.
//!
//! The body of an accepted streaming request is a sequence of lines; the
//! ones prefixed with `data:` carry a JSON chunk, and `data: [DONE]` ends the
//! stream. [`SseDecoder`] is the synchronous line machine, and
//! [`decode_events`] drives it lazily from an async byte stream.
//!
//! Malformed or unrecognized lines are skipped, never fatal. A line longer
//! than [`MAX_LINE_BYTES`] is discarded as it arrives instead of buffered. A
//! byte source
//! that closes without the sentinel counts as a normal end (the caller went
//! away or the server hung up cleanly); a transport error while reading is
//! surfaced once and ends the sequence.

use futures::{Stream, StreamExt};
use groundchat_core::error::ChatError;
use groundchat_core::provider::StreamEvent;
use memchr::memchr;
use serde::Deserialize;
use tracing::{trace, warn};

pub const DATA_PREFIX: &str = "data:";
pub const DONE_SENTINEL: &str = "[DONE]";

/// Longest line the decoder will hold while waiting for its newline.
pub const MAX_LINE_BYTES: usize = 1 << 20;

/// What a single line decodes to.
#[derive(Debug, PartialEq, Eq)]
enum Line {
    Skip,
    Done,
    Delta {
        text: Option<String>,
        tool_calls: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<serde_json::Value>,
}

fn parse_line(line: &str) -> Line {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return Line::Skip;
    };
    let payload = payload.trim();

    if payload == DONE_SENTINEL {
        return Line::Done;
    }

    let response = match serde_json::from_str::<StreamResponse>(payload) {
        Ok(response) => response,
        Err(e) => {
            trace!(data = %payload, error = %e, "Skipping malformed SSE event");
            return Line::Skip;
        }
    };

    let Some(choice) = response.choices.into_iter().next() else {
        trace!(data = %payload, "Skipping SSE event without choices");
        return Line::Skip;
    };

    let text = choice.delta.content.filter(|c| !c.is_empty());
    let tool_calls = choice.delta.tool_calls.map(|v| v.to_string());

    if text.is_none() && tool_calls.is_none() {
        return Line::Skip;
    }
    Line::Delta { text, tool_calls }
}

/// Incremental line decoder: feed it bytes, pull events out.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    /// Start of the first unconsumed line.
    read: usize,
    /// Everything before this offset is known to hold no newline.
    scanned: usize,
    /// Dropping the rest of an oversized line.
    skipping: bool,
    queued: Option<StreamEvent>,
    closed: bool,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of the response body.
    pub fn push(&mut self, chunk: &[u8]) {
        if self.done {
            return;
        }
        if self.read > 0 {
            self.buffer.drain(..self.read);
            self.scanned -= self.read;
            self.read = 0;
        }
        self.buffer.extend_from_slice(chunk);
    }

    /// Mark the byte source as finished. A trailing line without a newline
    /// is still decoded; after that the decoder yields [`StreamEvent::End`].
    pub fn close(&mut self) {
        if !self.closed && self.buffer.len() > self.read {
            self.buffer.push(b'\n');
        }
        self.closed = true;
    }

    /// Whether the decoder has reached its terminal state.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Next event from complete buffered lines, or `None` if more bytes are
    /// needed. Once `End` has been returned nothing else is.
    pub fn next_event(&mut self) -> Option<StreamEvent> {
        if self.done {
            return None;
        }
        if let Some(event) = self.queued.take() {
            return Some(event);
        }

        while let Some(offset) = memchr(b'\n', &self.buffer[self.scanned..]) {
            let start = self.read;
            let end = self.scanned + offset;
            self.read = end + 1;
            self.scanned = self.read;

            if std::mem::take(&mut self.skipping) {
                continue;
            }

            let parsed = match std::str::from_utf8(&self.buffer[start..end]) {
                Ok(line) => parse_line(line.trim_end_matches('\r')),
                Err(e) => {
                    trace!(error = %e, "Skipping SSE line with invalid UTF-8");
                    continue;
                }
            };

            match parsed {
                Line::Skip => continue,
                Line::Done => return Some(self.finish()),
                Line::Delta { text, tool_calls } => {
                    let tool_event = tool_calls.map(StreamEvent::ToolCallDelta);
                    match text {
                        Some(text) => {
                            self.queued = tool_event;
                            return Some(StreamEvent::TextDelta(text));
                        }
                        None => return tool_event,
                    }
                }
            }
        }
        self.scanned = self.buffer.len();

        let pending = self.buffer.len() - self.read;
        if pending > MAX_LINE_BYTES {
            if !self.skipping {
                warn!(limit = MAX_LINE_BYTES, "Discarding oversized SSE line");
            }
            self.buffer.truncate(self.read);
            self.scanned = self.read;
            self.skipping = true;
        }

        if self.closed {
            return Some(self.finish());
        }
        None
    }

    fn finish(&mut self) -> StreamEvent {
        self.done = true;
        self.buffer.clear();
        self.read = 0;
        self.scanned = 0;
        self.skipping = false;
        self.queued = None;
        StreamEvent::End
    }
}

/// Lazily decode a response body into stream events.
///
/// The returned stream is single-pass: it polls `source` only when the
/// consumer asks for the next event and stops polling after `End`.
pub fn decode_events<S, B, E>(source: S) -> impl Stream<Item = Result<StreamEvent, ChatError>> + Send
where
    S: Stream<Item = Result<B, E>> + Unpin + Send,
    B: AsRef<[u8]> + Send,
    E: std::fmt::Display + Send,
{
    futures::stream::unfold(Some((source, SseDecoder::new())), |state| async move {
        let (mut source, mut decoder) = state?;
        loop {
            if let Some(event) = decoder.next_event() {
                let next = if decoder.is_done() {
                    None
                } else {
                    Some((source, decoder))
                };
                return Some((Ok(event), next));
            }

            match source.next().await {
                Some(Ok(chunk)) => decoder.push(chunk.as_ref()),
                Some(Err(e)) => {
                    return Some((Err(ChatError::StreamInterrupted(e.to_string())), None));
                }
                None => decoder.close(),
            }
        }
    })
}
