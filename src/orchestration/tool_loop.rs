use std::sync::Arc;

use serde::Serialize;

use crate::error::AppError;
use crate::llm::provider::{LLMProvider, LLMResponse, TokenUsage};
use crate::models::llm::GenerationParams;
use crate::orchestration::conversation::Conversation;
use crate::orchestration::tool_events::log_tool_results;
use crate::tools::definition::ToolResult;
use crate::tools::executor::ToolExecutor;

#[derive(Debug, Clone, Serialize)]
pub struct CompletionOutcome {
    pub text: String,
    pub tool_calls: Vec<ToolResult>,
    pub usage: TokenUsage,
    pub model: String,
}

/// Drives one request: a first completion, optional tool execution, and a
/// second completion that turns tool output into the final answer.
#[derive(Clone)]
pub struct Orchestrator {
    provider: Arc<dyn LLMProvider>,
    tools: ToolExecutor,
    params: GenerationParams,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn LLMProvider>, tools: ToolExecutor, params: GenerationParams) -> Self {
        Self {
            provider,
            tools,
            params,
        }
    }

    pub fn tools(&self) -> &ToolExecutor {
        &self.tools
    }

    pub async fn complete(
        &self,
        mut conversation: Conversation,
        model: &str,
        allow_tools: bool,
    ) -> Result<CompletionOutcome, AppError> {
        let first = if allow_tools {
            self.provider
                .chat_with_tools(
                    model,
                    conversation.messages().to_vec(),
                    self.tools.definitions(),
                    self.params.temperature,
                    self.params.max_tokens,
                )
                .await
        } else {
            self.provider
                .chat(
                    model,
                    conversation.messages().to_vec(),
                    self.params.temperature,
                    self.params.max_tokens,
                )
                .await
        }
        .map_err(upstream_failure)?;

        let mut usage = first.usage.clone();
        if !allow_tools || first.tool_calls.is_empty() {
            tracing::info!(
                model = %first.model,
                chars = first.content.len(),
                tokens = usage.total(),
                finish_reason = first.finish_reason.as_deref().unwrap_or("unknown"),
                "completion finished without tool calls"
            );
            return Ok(CompletionOutcome {
                text: first.content,
                tool_calls: Vec::new(),
                usage,
                model: first.model,
            });
        }

        let LLMResponse {
            tool_calls,
            finish_reason,
            ..
        } = first;
        tracing::info!(
            count = tool_calls.len(),
            finish_reason = finish_reason.as_deref().unwrap_or("unknown"),
            "model requested tool calls"
        );
        let results = self.tools.execute_all(tool_calls.clone()).await;
        log_tool_results(&results);
        conversation.push_tool_round(tool_calls, &results);

        let second = self
            .provider
            .chat(
                model,
                conversation.messages().to_vec(),
                self.params.temperature,
                self.params.max_tokens,
            )
            .await
            .map_err(upstream_failure)?;
        usage.accumulate(&second.usage);

        tracing::info!(
            model = %second.model,
            chars = second.content.len(),
            tools = results.len(),
            tokens = usage.total(),
            finish_reason = second.finish_reason.as_deref().unwrap_or("unknown"),
            "completion with tools finished"
        );
        Ok(CompletionOutcome {
            text: second.content,
            tool_calls: results,
            usage,
            model: second.model,
        })
    }
}

fn upstream_failure(err: AppError) -> AppError {
    tracing::error!(error = %err, "completion call failed");
    match err {
        AppError::UpstreamCompletionFailed(_) => err,
        other => AppError::UpstreamCompletionFailed(other.to_string()),
    }
}
