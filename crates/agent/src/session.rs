//! A chat session: one streamed turn at a time, with tool execution.
//!
//! The session reads the web-search preference once when a turn starts,
//! assembles the request, and streams it. Text deltas go to the caller's
//! sink as they arrive. If the model asks for tools instead of (or besides)
//! answering, the calls are executed, their results appended, and the
//! conversation re-sent until the model answers in text or the iteration
//! limit is hit. The last permitted request offers no tools.

use std::sync::Arc;

use futures::StreamExt;
use groundchat_core::error::{ChatError, ToolError};
use groundchat_core::message::{Message, MessageToolCall};
use groundchat_core::preference::PreferenceStore;
use groundchat_core::provider::{ChatProvider, ChatRequest, StreamEvent, ToolDefinition};
use groundchat_core::tool::ToolRegistry;
use tracing::{debug, info, warn};

use crate::assembler::ConversationAssembler;
use crate::tool_calls::ToolCallAccumulator;

pub const DEFAULT_MAX_ITERATIONS: u32 = 5;

/// What a finished turn produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// The final assistant text.
    pub reply: String,

    /// Messages to append to the caller's history: the user message as
    /// typed, any tool round-trips, and the final assistant message.
    pub messages: Vec<Message>,
}

/// Everything one streamed response contained.
struct StreamedReply {
    text: String,
    tool_calls: Vec<MessageToolCall>,
}

pub struct ChatSession {
    provider: Arc<dyn ChatProvider>,
    assembler: ConversationAssembler,
    preferences: Arc<dyn PreferenceStore>,
    tools: Arc<ToolRegistry>,
    model: String,
    temperature: f32,
    system_prompt: Option<String>,
    max_iterations: u32,
}

impl ChatSession {
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        assembler: ConversationAssembler,
        preferences: Arc<dyn PreferenceStore>,
        tools: Arc<ToolRegistry>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            assembler,
            preferences,
            tools,
            model: model.into(),
            temperature: groundchat_core::provider::default_temperature(),
            system_prompt: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Set the maximum number of requests per turn. At least one is made.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Drive one user turn to completion.
    ///
    /// Search failures never fail the turn. A rejected request or a broken
    /// stream does.
    pub async fn run_turn<F>(
        &self,
        user_message: &str,
        history: &[Message],
        mut on_text: F,
    ) -> Result<TurnOutcome, ChatError>
    where
        F: FnMut(&str),
    {
        let search_enabled = self.preferences.web_search_enabled();

        info!(
            model = %self.model,
            history = history.len(),
            search_enabled,
            "Starting chat turn"
        );

        let assembled = self
            .assembler
            .build(
                user_message,
                history,
                self.system_prompt.as_deref(),
                search_enabled,
            )
            .await;

        let mut messages = assembled.messages;
        let mut appended = vec![Message::user(user_message)];

        let mut iteration = 0;
        loop {
            iteration += 1;
            let last = iteration >= self.max_iterations;
            let offered: Vec<ToolDefinition> = if last {
                Vec::new()
            } else {
                assembled.tools.clone()
            };

            debug!(iteration, tools = offered.len(), "Chat request iteration");

            let request = ChatRequest::new(&self.model, messages.clone(), offered.clone())
                .with_temperature(self.temperature);
            let reply = self.stream_reply(request, &mut on_text).await?;

            if reply.tool_calls.is_empty() || last {
                if !reply.tool_calls.is_empty() {
                    warn!(
                        iterations = iteration,
                        "Max tool iterations reached, ignoring further tool calls"
                    );
                }
                appended.push(Message::assistant(reply.text.clone()));
                return Ok(TurnOutcome {
                    reply: reply.text,
                    messages: appended,
                });
            }

            debug!(tool_count = reply.tool_calls.len(), "Executing tool calls");

            let assistant = Message::assistant_with_tool_calls(reply.text, reply.tool_calls.clone());
            messages.push(assistant.clone());
            appended.push(assistant);

            for call in &reply.tool_calls {
                let output = self.execute_tool(call, &offered).await;
                let result = Message::tool_result(&call.id, output);
                messages.push(result.clone());
                appended.push(result);
            }
        }
    }

    async fn stream_reply<F>(
        &self,
        request: ChatRequest,
        on_text: &mut F,
    ) -> Result<StreamedReply, ChatError>
    where
        F: FnMut(&str),
    {
        let mut events = self.provider.stream(request).await?;
        let mut text = String::new();
        let mut accumulator = ToolCallAccumulator::new();

        while let Some(event) = events.next().await {
            match event? {
                StreamEvent::TextDelta(delta) => {
                    on_text(&delta);
                    text.push_str(&delta);
                }
                StreamEvent::ToolCallDelta(raw) => accumulator.push(&raw),
                StreamEvent::End => break,
            }
        }

        Ok(StreamedReply {
            text,
            tool_calls: accumulator.finish(),
        })
    }

    /// Run a call the model made. Tools not offered this turn are refused.
    async fn execute_tool(&self, call: &MessageToolCall, offered: &[ToolDefinition]) -> String {
        if !offered.iter().any(|t| t.name == call.name) {
            warn!(tool = %call.name, "Model called a tool that was not offered");
            return ToolError::NotFound(call.name.clone()).to_string();
        }

        let result = self.tools.execute(call).await;
        debug!(tool = %call.name, success = result.success, "Tool executed");
        result.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use groundchat_core::message::Role;
    use groundchat_core::preference::InMemoryPreferences;
    use groundchat_core::provider::EventStream;
    use groundchat_search::{SearchResult, Searcher, WebResult};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Script = Result<Vec<Result<StreamEvent, ChatError>>, ChatError>;

    struct ScriptedProvider {
        scripts: Mutex<VecDeque<Script>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedProvider {
        fn new(scripts: Vec<Script>) -> Arc<Self> {
            Arc::new(Self {
                scripts: Mutex::new(scripts.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<ChatRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn stream(&self, request: ChatRequest) -> Result<EventStream, ChatError> {
            self.requests.lock().unwrap().push(request);
            let script = self
                .scripts
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(vec![Ok(StreamEvent::End)]));
            let events = script?;
            Ok(Box::pin(futures::stream::iter(events)))
        }
    }

    struct CountingSearcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Searcher for CountingSearcher {
        async fn search(&self, query: &str) -> Option<SearchResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Some(SearchResult {
                web: vec![WebResult {
                    title: format!("About {query}"),
                    description: None,
                    url: None,
                }],
                news: vec![],
            })
        }
    }

    fn text(t: &str) -> Result<StreamEvent, ChatError> {
        Ok(StreamEvent::TextDelta(t.into()))
    }

    fn tool_delta(raw: &str) -> Result<StreamEvent, ChatError> {
        Ok(StreamEvent::ToolCallDelta(raw.into()))
    }

    fn session(
        provider: Arc<ScriptedProvider>,
        search_enabled: bool,
    ) -> (ChatSession, Arc<CountingSearcher>) {
        let searcher = Arc::new(CountingSearcher {
            calls: AtomicUsize::new(0),
        });
        let tools = groundchat_tools::registry(provider.clone(), searcher.clone());
        let session = ChatSession::new(
            provider,
            ConversationAssembler::new(searcher.clone()),
            Arc::new(InMemoryPreferences::new(search_enabled)),
            Arc::new(tools),
            "test-model",
        );
        (session, searcher)
    }

    fn names(tools: &[ToolDefinition]) -> Vec<&str> {
        tools.iter().map(|t| t.name.as_str()).collect()
    }

    #[tokio::test]
    async fn text_turn_streams_to_sink() {
        let provider = ScriptedProvider::new(vec![Ok(vec![
            text("Hel"),
            text("lo"),
            Ok(StreamEvent::End),
        ])]);
        let (session, searcher) = session(provider.clone(), false);

        let mut seen = Vec::new();
        let outcome = session
            .run_turn("hi", &[], |delta| seen.push(delta.to_string()))
            .await
            .unwrap();

        assert_eq!(seen, vec!["Hel", "lo"]);
        assert_eq!(outcome.reply, "Hello");
        assert_eq!(
            outcome.messages,
            vec![Message::user("hi"), Message::assistant("Hello")]
        );
        assert_eq!(searcher.calls.load(Ordering::SeqCst), 0);

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "test-model");
        assert_eq!(names(&requests[0].tools), vec!["generate_image"]);
    }

    #[tokio::test]
    async fn enabled_preference_searches_and_offers_tool() {
        let provider = ScriptedProvider::new(vec![Ok(vec![text("ok"), Ok(StreamEvent::End)])]);
        let (session, searcher) = session(provider.clone(), true);

        session.run_turn("rust", &[], |_| {}).await.unwrap();

        assert_eq!(searcher.calls.load(Ordering::SeqCst), 1);
        let request = &provider.requests()[0];
        assert_eq!(names(&request.tools), vec!["generate_image", "web_search"]);
        let user = request.messages.last().unwrap();
        assert!(user.content.contains("1. About rust"));
        assert!(user.content.ends_with("\nrust"));
    }

    #[tokio::test]
    async fn tool_call_round_trip() {
        let provider = ScriptedProvider::new(vec![
            Ok(vec![
                tool_delta(r#"[{"index":0,"id":"call_1","function":{"name":"web_search","arguments":"{\"query\":"}}]"#),
                tool_delta(r#"[{"index":0,"function":{"arguments":"\"tides\"}"}}]"#),
                Ok(StreamEvent::End),
            ]),
            Ok(vec![text("High tide at noon."), Ok(StreamEvent::End)]),
        ]);
        let (session, searcher) = session(provider.clone(), true);

        let outcome = session.run_turn("tides?", &[], |_| {}).await.unwrap();

        assert_eq!(outcome.reply, "High tide at noon.");
        let roles: Vec<Role> = outcome.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::Tool, Role::Assistant]
        );
        assert_eq!(outcome.messages[1].tool_calls[0].arguments, r#"{"query":"tides"}"#);
        assert_eq!(outcome.messages[2].tool_call_id.as_deref(), Some("call_1"));
        assert!(outcome.messages[2].content.contains("1. About tides"));

        // One search for augmentation, one for the tool call.
        assert_eq!(searcher.calls.load(Ordering::SeqCst), 2);

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        let follow_up = requests[1].messages.last().unwrap();
        assert_eq!(follow_up.role, Role::Tool);
    }

    #[tokio::test]
    async fn undeclared_tool_is_refused() {
        let provider = ScriptedProvider::new(vec![
            Ok(vec![
                tool_delta(r#"[{"index":0,"id":"c","function":{"name":"web_search","arguments":"{\"query\":\"x\"}"}}]"#),
                Ok(StreamEvent::End),
            ]),
            Ok(vec![text("done"), Ok(StreamEvent::End)]),
        ]);
        let (session, searcher) = session(provider, false);

        let outcome = session.run_turn("x", &[], |_| {}).await.unwrap();

        assert_eq!(searcher.calls.load(Ordering::SeqCst), 0);
        assert!(outcome.messages[2].content.contains("Tool not found: web_search"));
    }

    #[tokio::test]
    async fn last_iteration_offers_no_tools() {
        let call = r#"[{"index":0,"id":"c","function":{"name":"generate_image","arguments":"{\"prompt\":\"p\"}"}}]"#;
        let provider = ScriptedProvider::new(vec![
            Ok(vec![tool_delta(call), Ok(StreamEvent::End)]),
            Ok(vec![text("partial"), tool_delta(call), Ok(StreamEvent::End)]),
        ]);
        let (session, _) = session(provider.clone(), false);
        let session = session.with_max_iterations(2);

        let outcome = session.run_turn("draw", &[], |_| {}).await.unwrap();

        assert_eq!(outcome.reply, "partial");
        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].tools.is_empty());
    }

    #[tokio::test]
    async fn rejected_request_fails_the_turn() {
        let provider = ScriptedProvider::new(vec![Err(ChatError::RequestFailed {
            status: 401,
            body: "invalid key".into(),
        })]);
        let (session, _) = session(provider, false);

        let err = session.run_turn("hi", &[], |_| {}).await.unwrap_err();
        assert!(matches!(err, ChatError::RequestFailed { status: 401, .. }));
    }

    #[tokio::test]
    async fn interrupted_stream_fails_the_turn() {
        let provider = ScriptedProvider::new(vec![Ok(vec![
            text("par"),
            Err(ChatError::StreamInterrupted("connection reset".into())),
        ])]);
        let (session, _) = session(provider, false);

        let mut seen = String::new();
        let err = session
            .run_turn("hi", &[], |d| seen.push_str(d))
            .await
            .unwrap_err();
        assert_eq!(seen, "par");
        assert!(matches!(err, ChatError::StreamInterrupted(_)));
    }
}
