//! Test doubles: a scripted completion provider and a recording dialer.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::AppError;
use crate::llm::provider::{LLMProvider, LLMResponse, Message, TokenUsage};
use crate::tools::definition::{ToolCall, ToolDefinition};
use crate::tools::dialer::Dialer;

/// A recorded call to `MockProvider`.
#[derive(Debug, Clone)]
pub struct MockChatCall {
    pub model: String,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Completion provider that replays a FIFO of scripted responses.
pub struct MockProvider {
    responses: Mutex<VecDeque<LLMResponse>>,
    call_log: Mutex<Vec<MockChatCall>>,
    fail_on: Option<usize>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::with_responses(Vec::new())
    }

    pub fn with_responses(responses: Vec<LLMResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            call_log: Mutex::new(Vec::new()),
            fail_on: None,
        }
    }

    /// Provider whose `n`th call (0-based) fails as an upstream error.
    pub fn failing_at(n: usize) -> Self {
        Self::new().fail_on_call(n)
    }

    pub fn fail_on_call(mut self, n: usize) -> Self {
        self.fail_on = Some(n);
        self
    }

    fn usage() -> TokenUsage {
        TokenUsage {
            input_tokens: 10,
            output_tokens: 5,
            estimated: false,
        }
    }

    pub fn text_response(text: &str) -> LLMResponse {
        LLMResponse {
            content: text.to_string(),
            usage: Self::usage(),
            model: "mock".to_string(),
            finish_reason: Some("stop".to_string()),
            tool_calls: vec![],
        }
    }

    pub fn tool_call_response(tool_name: &str, args: Value) -> LLMResponse {
        Self::multi_tool_call_response(vec![(tool_name, args)])
    }

    pub fn multi_tool_call_response(calls: Vec<(&str, Value)>) -> LLMResponse {
        LLMResponse {
            content: String::new(),
            usage: Self::usage(),
            model: "mock".to_string(),
            finish_reason: Some("tool_calls".to_string()),
            tool_calls: calls
                .into_iter()
                .map(|(name, arguments)| ToolCall {
                    id: format!("call_{}", uuid::Uuid::new_v4()),
                    name: name.to_string(),
                    arguments,
                })
                .collect(),
        }
    }

    pub async fn calls(&self) -> Vec<MockChatCall> {
        self.call_log.lock().await.clone()
    }

    async fn respond(&self, call: MockChatCall) -> Result<LLMResponse, AppError> {
        let index = {
            let mut log = self.call_log.lock().await;
            log.push(call);
            log.len() - 1
        };
        if self.fail_on == Some(index) {
            return Err(AppError::UpstreamCompletionFailed(
                "mock upstream unavailable".to_string(),
            ));
        }
        Ok(self
            .responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Self::text_response("Mock response")))
    }
}

#[async_trait]
impl LLMProvider for MockProvider {
    fn provider_name(&self) -> &'static str {
        "mock"
    }

    async fn chat(
        &self,
        model: &str,
        messages: Vec<Message>,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<LLMResponse, AppError> {
        self.respond(MockChatCall {
            model: model.to_string(),
            messages,
            tools: Vec::new(),
            temperature,
            max_tokens,
        })
        .await
    }

    async fn chat_with_tools(
        &self,
        model: &str,
        messages: Vec<Message>,
        tools: &[ToolDefinition],
        temperature: f64,
        max_tokens: u32,
    ) -> Result<LLMResponse, AppError> {
        self.respond(MockChatCall {
            model: model.to_string(),
            messages,
            tools: tools.to_vec(),
            temperature,
            max_tokens,
        })
        .await
    }
}

/// Dialer with scripted outcomes for `open`, `open_with` and `activate_app`.
pub struct RecordingDialer {
    outcomes: [bool; 3],
    delay: Option<Duration>,
    attempts: std::sync::Mutex<Vec<String>>,
}

impl RecordingDialer {
    pub fn new(outcomes: [bool; 3]) -> Self {
        Self {
            outcomes,
            delay: None,
            attempts: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Every attempt blocks for `delay` before reporting its outcome.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }

    fn record(&self, attempt: String, outcome: bool) -> bool {
        self.attempts.lock().unwrap().push(attempt);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        outcome
    }
}

impl Dialer for RecordingDialer {
    fn open(&self, uri: &str) -> bool {
        self.record(format!("open {uri}"), self.outcomes[0])
    }

    fn open_with(&self, app: &str, uri: &str) -> bool {
        self.record(format!("open_with {app} {uri}"), self.outcomes[1])
    }

    fn activate_app(&self, name: &str) -> bool {
        self.record(format!("activate {name}"), self.outcomes[2])
    }
}

/// Dialer that panics on first use.
pub struct PanickingDialer;

impl Dialer for PanickingDialer {
    fn open(&self, _uri: &str) -> bool {
        panic!("dialer exploded")
    }

    fn open_with(&self, _app: &str, _uri: &str) -> bool {
        panic!("dialer exploded")
    }

    fn activate_app(&self, _name: &str) -> bool {
        panic!("dialer exploded")
    }
}
