use std::collections::HashSet;

use crate::error::AppError;
use crate::llm::provider::{Message, MessageRole};
use crate::tools::definition::{ToolCall, ToolResult};

/// Ordered turns exchanged with the completion API for a single request.
///
/// Every tool turn answers a distinct call id issued by the assistant turn
/// that precedes the run of tool turns it belongs to.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(system_prompt: &str, user_message: &str) -> Self {
        Self {
            messages: vec![Message::system(system_prompt), Message::user(user_message)],
        }
    }

    /// Accepts client-supplied history. It must be non-empty and end in a user turn.
    pub fn from_history(messages: Vec<Message>) -> Result<Self, AppError> {
        let Some(last) = messages.last() else {
            return Err(AppError::InvalidConversation("conversation is empty".to_string()));
        };
        if last.role != MessageRole::User {
            return Err(AppError::InvalidConversation(
                "conversation must end with a user turn".to_string(),
            ));
        }
        validate_turns(&messages)?;
        Ok(Self { messages })
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Appends the assistant's tool-call turn followed by one tool turn per
    /// result. `results` must be in the same order as `calls`.
    pub fn push_tool_round(&mut self, calls: Vec<ToolCall>, results: &[ToolResult]) {
        debug_assert!(calls
            .iter()
            .zip(results)
            .all(|(c, r)| c.id == r.tool_call_id));
        self.messages.push(Message::assistant_tool_calls(calls));
        for res in results {
            self.messages
                .push(Message::tool_result(res.tool_call_id.clone(), res.result.clone()));
        }
    }
}

fn validate_turns(messages: &[Message]) -> Result<(), AppError> {
    let mut pending: HashSet<&str> = HashSet::new();
    for (idx, msg) in messages.iter().enumerate() {
        match msg.role {
            MessageRole::Tool => {
                let id = msg.tool_call_id.as_deref().ok_or_else(|| {
                    AppError::InvalidConversation(format!("tool turn {idx} has no tool_call_id"))
                })?;
                if !pending.remove(id) {
                    return Err(AppError::InvalidConversation(format!(
                        "tool turn {idx} answers '{id}', which the preceding assistant turn did not request"
                    )));
                }
            }
            MessageRole::Assistant => {
                pending = msg
                    .tool_calls
                    .iter()
                    .flatten()
                    .map(|c| c.id.as_str())
                    .collect();
            }
            MessageRole::System | MessageRole::User => {
                if msg.content.is_none() {
                    return Err(AppError::InvalidConversation(format!("turn {idx} has no content")));
                }
                pending.clear();
            }
        }
    }
    Ok(())
}
